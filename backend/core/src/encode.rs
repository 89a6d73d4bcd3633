//! Inline image references: uploads become `data:` URIs before they are sent
//! to the vision model or shown as thumbnails.

use std::io::Read;

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::{PicscribeError, Result};

/// Prefix of every URI produced by this module. The label is fixed regardless of content.
pub const DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Read the whole resource and return it as a `data:image/png;base64,...` URI.
pub fn encode_reader<R: Read>(mut reader: R) -> Result<String> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(encode_bytes(&buf))
}

pub fn encode_bytes(bytes: &[u8]) -> String {
    format!("{DATA_URI_PREFIX}{}", STANDARD.encode(bytes))
}

/// Decode any `data:<mime>;base64,<payload>` URI back into bytes.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| PicscribeError::InvalidDataUri("missing `data:` scheme".into()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| PicscribeError::InvalidDataUri("missing `,` separator".into()))?;
    if !meta.ends_with(";base64") {
        return Err(PicscribeError::InvalidDataUri("payload is not base64".into()));
    }
    STANDARD
        .decode(payload)
        .map_err(|e| PicscribeError::InvalidDataUri(e.to_string()))
}

/// MIME type declared by a data URI, if any.
pub fn data_uri_mime(uri: &str) -> Option<&str> {
    let meta = uri.strip_prefix("data:")?.split_once(',')?.0;
    let mime = meta.split(';').next()?;
    (!mime.is_empty()).then_some(mime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    #[test]
    fn encodes_with_png_prefix() {
        let uri = encode_bytes(b"hello");
        assert_eq!(uri, "data:image/png;base64,aGVsbG8=");
    }

    #[test]
    fn reader_roundtrip_reproduces_bytes() {
        let samples: Vec<Vec<u8>> = vec![
            vec![0],
            vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a],
            (0..=255u8).collect(),
            (0..4099u32).map(|i| (i * 31 % 251) as u8).collect(),
        ];
        for bytes in samples {
            let uri = encode_reader(Cursor::new(bytes.clone())).unwrap();
            assert_eq!(decode_data_uri(&uri).unwrap(), bytes);
        }
    }

    #[test]
    fn reader_cursor_is_consumed() {
        let mut cursor = Cursor::new(vec![1u8, 2, 3]);
        encode_reader(&mut cursor).unwrap();
        assert_eq!(cursor.position(), 3);
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "connection reset"))
        }
    }

    #[test]
    fn read_failure_is_reported() {
        let err = encode_reader(Broken).unwrap_err();
        assert!(matches!(err, PicscribeError::Io(_)));
    }

    #[test]
    fn rejects_malformed_uris() {
        assert!(decode_data_uri("http://example.com/a.png").is_err());
        assert!(decode_data_uri("data:image/png;base64").is_err());
        assert!(decode_data_uri("data:text/plain,hello").is_err());
        assert!(decode_data_uri("data:image/png;base64,@@@").is_err());
    }

    #[test]
    fn reads_declared_mime() {
        assert_eq!(data_uri_mime(&encode_bytes(b"x")), Some("image/png"));
        assert_eq!(data_uri_mime("data:;base64,AA=="), None);
    }
}
