use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use crate::encode::encode_bytes;
use crate::error::{PicscribeError, Result};

/// Column names of the image table, in display order.
pub const COLUMNS: [&str; 4] = ["image_id", "image", "name", "description"];

/// Opaque identity assigned to an upload. Keys rows across reconciliation cycles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random identity for a newly received upload.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ImageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identity of one user session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for SessionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A file as handed over by the upload mechanism, already encoded as a data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub image_id: ImageId,
    pub name: String,
    pub image: String,
    /// Size of the raw file in bytes.
    pub size: usize,
}

impl UploadedImage {
    pub fn new(
        image_id: impl Into<ImageId>,
        name: impl Into<String>,
        data: impl AsRef<[u8]>,
    ) -> Self {
        let data = data.as_ref();
        Self {
            image_id: image_id.into(),
            name: name.into(),
            image: encode_bytes(data),
            size: data.len(),
        }
    }
}

/// One row of the image table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRow {
    pub image_id: ImageId,
    /// Inline `data:` URI of the image bytes.
    pub image: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// The table shown to the user: one row per currently uploaded image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImageTable {
    rows: Vec<ImageRow>,
}

impl ImageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from rows as-is. Later rows with an id already seen are dropped.
    pub fn from_rows(rows: impl IntoIterator<Item = ImageRow>) -> Self {
        let mut table = Self::new();
        for row in rows {
            if !table.contains(&row.image_id) {
                table.rows.push(row);
            }
        }
        table
    }

    pub fn columns(&self) -> &'static [&'static str] {
        &COLUMNS
    }

    pub fn rows(&self) -> &[ImageRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: &ImageId) -> Option<&ImageRow> {
        self.rows.iter().find(|r| &r.image_id == id)
    }

    pub fn contains(&self, id: &ImageId) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ImageId> {
        self.rows.iter().map(|r| &r.image_id)
    }

    /// Overwrite the description of one row.
    pub fn set_description(&mut self, id: &ImageId, description: impl Into<String>) -> Result<()> {
        let row = self
            .rows
            .iter_mut()
            .find(|r| &r.image_id == id)
            .ok_or_else(|| PicscribeError::RowNotFound(id.clone()))?;
        row.description = description.into();
        Ok(())
    }
}

impl Serialize for ImageTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ImageTable", 2)?;
        s.serialize_field("columns", &COLUMNS)?;
        s.serialize_field("rows", &self.rows)?;
        s.end()
    }
}
