//! Image table reconciliation.
//!
//! Every interaction hands over the full list of currently uploaded images.
//! The new table is keyed by `image_id`: uploads that were already present keep
//! their description, new uploads start with an empty one, and rows whose
//! upload disappeared are dropped. `image` and `name` always come from the
//! current upload.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{PicscribeError, Result};
use crate::types::{ImageId, ImageRow, ImageTable, UploadedImage};

/// Merge the current uploads into the previously retained table.
///
/// Rows follow upload order. An upload list that repeats an `image_id` is
/// rejected and nothing is produced.
pub fn reconcile(uploads: &[UploadedImage], previous: Option<&ImageTable>) -> Result<ImageTable> {
    let mut seen = HashSet::with_capacity(uploads.len());
    for upload in uploads {
        if !seen.insert(&upload.image_id) {
            return Err(PicscribeError::DuplicateImageId(upload.image_id.clone()));
        }
    }

    let carried: HashMap<&ImageId, &str> = previous
        .map(|table| {
            table
                .rows()
                .iter()
                .map(|r| (&r.image_id, r.description.as_str()))
                .collect()
        })
        .unwrap_or_default();

    let rows: Vec<ImageRow> = uploads
        .iter()
        .map(|upload| ImageRow {
            image_id: upload.image_id.clone(),
            image: upload.image.clone(),
            name: upload.name.clone(),
            description: carried
                .get(&upload.image_id)
                .map(|d| d.to_string())
                .unwrap_or_default(),
        })
        .collect();

    let dropped = previous
        .map(|t| t.ids().filter(|id| !seen.contains(id)).count())
        .unwrap_or(0);
    debug!(rows = rows.len(), dropped, "Reconciled image table");

    Ok(ImageTable::from_rows(rows))
}
