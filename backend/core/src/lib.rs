pub mod defaults;
pub mod encode;
pub mod error;
pub mod reconcile;
pub mod session;
pub mod traits;
pub mod types;

pub use encode::{data_uri_mime, decode_data_uri, encode_bytes, encode_reader, DATA_URI_PREFIX};
pub use error::{PicscribeError, Result};
pub use reconcile::reconcile;
pub use session::{
    DescribeOutcome, DescribeScope, DescribeStatus, Session, SessionStore, SessionView,
};
pub use traits::{VisionProvider, VisionRequest, VisionResponse};
pub use types::{ImageId, ImageRow, ImageTable, SessionId, UploadedImage, COLUMNS};
