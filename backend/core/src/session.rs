//! Per-user session state.
//!
//! A session owns the current upload list and the image table derived from it,
//! plus the prompt and the row selection / edit history the table UI works on.
//! Sessions live in a [`SessionStore`] from creation until they are removed or
//! reaped for inactivity.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{PicscribeError, Result};
use crate::reconcile::reconcile;
use crate::types::{ImageId, ImageRow, ImageTable, SessionId, UploadedImage};

/// Which rows a describe request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescribeScope {
    #[default]
    All,
    Selected,
    /// Only rows whose description is still empty.
    Empty,
}

/// Result of describing one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DescribeOutcome {
    pub image_id: ImageId,
    #[serde(flatten)]
    pub status: DescribeStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DescribeStatus {
    Described { description: String },
    Failed { error: String },
}

impl DescribeOutcome {
    pub fn described(image_id: ImageId, description: impl Into<String>) -> Self {
        Self {
            image_id,
            status: DescribeStatus::Described {
                description: description.into(),
            },
        }
    }

    pub fn failed(image_id: ImageId, error: impl Into<String>) -> Self {
        Self {
            image_id,
            status: DescribeStatus::Failed {
                error: error.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, DescribeStatus::Described { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    uploads: Vec<UploadedImage>,
    table: ImageTable,
    prompt: String,
    selected: Vec<ImageId>,
    edited: Vec<ImageId>,
    created_at: DateTime<Utc>,
    last_seen: DateTime<Utc>,
}

/// Serializable snapshot of a session, as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub prompt: String,
    pub table: ImageTable,
    pub selected: Vec<ImageId>,
    pub edited: Vec<ImageId>,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl Session {
    pub fn new(prompt: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            uploads: Vec::new(),
            table: ImageTable::new(),
            prompt: prompt.into(),
            selected: Vec::new(),
            edited: Vec::new(),
            created_at: now,
            last_seen: now,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn table(&self) -> &ImageTable {
        &self.table
    }

    pub fn uploads(&self) -> &[UploadedImage] {
        &self.uploads
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn last_seen(&self) -> DateTime<Utc> {
        self.last_seen
    }

    pub fn touch(&mut self) {
        self.last_seen = Utc::now();
    }

    /// Replace the upload list and reconcile the table against it.
    ///
    /// On error the session is left unchanged.
    pub fn set_uploads(&mut self, uploads: Vec<UploadedImage>) -> Result<&ImageTable> {
        let table = reconcile(&uploads, Some(&self.table))?;
        self.uploads = uploads;
        self.table = table;
        let table = &self.table;
        self.selected.retain(|id| table.contains(id));
        self.edited.retain(|id| table.contains(id));
        debug!(session_id = %self.id, rows = self.table.len(), "Session table refreshed");
        Ok(&self.table)
    }

    /// Append newly received uploads. Returns their ids.
    pub fn add_uploads(&mut self, new: Vec<UploadedImage>) -> Result<Vec<ImageId>> {
        let ids: Vec<ImageId> = new.iter().map(|u| u.image_id.clone()).collect();
        let mut uploads = self.uploads.clone();
        uploads.extend(new);
        self.set_uploads(uploads)?;
        Ok(ids)
    }

    pub fn remove_upload(&mut self, id: &ImageId) -> Result<()> {
        if !self.uploads.iter().any(|u| &u.image_id == id) {
            return Err(PicscribeError::RowNotFound(id.clone()));
        }
        let uploads = self
            .uploads
            .iter()
            .filter(|u| &u.image_id != id)
            .cloned()
            .collect();
        self.set_uploads(uploads)?;
        Ok(())
    }

    /// User edit of a description cell.
    pub fn edit_description(
        &mut self,
        id: &ImageId,
        description: impl Into<String>,
    ) -> Result<&ImageRow> {
        self.table.set_description(id, description)?;
        if !self.edited.contains(id) {
            self.edited.push(id.clone());
        }
        self.table
            .get(id)
            .ok_or_else(|| PicscribeError::RowNotFound(id.clone()))
    }

    /// Replace the row selection. Every id must name an existing row.
    pub fn select_rows(&mut self, ids: Vec<ImageId>) -> Result<()> {
        if let Some(missing) = ids.iter().find(|id| !self.table.contains(id)) {
            return Err(PicscribeError::RowNotFound(missing.clone()));
        }
        let mut selected: Vec<ImageId> = Vec::with_capacity(ids.len());
        for id in ids {
            if !selected.contains(&id) {
                selected.push(id);
            }
        }
        self.selected = selected;
        Ok(())
    }

    pub fn selected_rows(&self) -> Vec<&ImageRow> {
        self.rows_for(&self.selected)
    }

    pub fn edited_rows(&self) -> Vec<&ImageRow> {
        self.rows_for(&self.edited)
    }

    fn rows_for(&self, ids: &[ImageId]) -> Vec<&ImageRow> {
        self.table
            .rows()
            .iter()
            .filter(|r| ids.contains(&r.image_id))
            .collect()
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) -> Result<()> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(PicscribeError::InvalidPrompt("prompt cannot be empty".into()));
        }
        self.prompt = prompt;
        Ok(())
    }

    /// Snapshot of `(image_id, data URI)` pairs to send for description.
    pub fn describe_targets(&self, scope: DescribeScope) -> Vec<(ImageId, String)> {
        self.table
            .rows()
            .iter()
            .filter(|r| match scope {
                DescribeScope::All => true,
                DescribeScope::Selected => self.selected.contains(&r.image_id),
                DescribeScope::Empty => r.description.is_empty(),
            })
            .map(|r| (r.image_id.clone(), r.image.clone()))
            .collect()
    }

    /// Write successful outcomes into the table. Rows that disappeared in the
    /// meantime and failed outcomes are skipped. Returns how many rows changed.
    pub fn apply_descriptions(&mut self, outcomes: &[DescribeOutcome]) -> usize {
        let mut applied = 0;
        for outcome in outcomes {
            if let DescribeStatus::Described { description } = &outcome.status {
                if self.table.set_description(&outcome.image_id, description.clone()).is_ok() {
                    applied += 1;
                }
            }
        }
        applied
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.id,
            prompt: self.prompt.clone(),
            table: self.table.clone(),
            selected: self.selected.clone(),
            edited: self.edited.clone(),
            created_at: self.created_at,
            last_seen: self.last_seen,
        }
    }
}

/// Registry of live sessions.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new session with the given default prompt.
    pub async fn create(&self, prompt: impl Into<String>) -> SessionId {
        let session = Session::new(prompt);
        let id = session.id();
        self.sessions.write().await.insert(id, session);
        info!(session_id = %id, "Session created");
        id
    }

    /// Run `f` against a session without changing its contents. Reads still
    /// count as activity.
    pub async fn with_session<R>(
        &self,
        id: SessionId,
        f: impl FnOnce(&Session) -> R,
    ) -> Result<R> {
        let mut w = self.sessions.write().await;
        let session = w.get_mut(&id).ok_or(PicscribeError::SessionNotFound(id))?;
        session.touch();
        Ok(f(session))
    }

    /// Run `f` against a session and mark it as active.
    pub async fn with_session_mut<R>(
        &self,
        id: SessionId,
        f: impl FnOnce(&mut Session) -> Result<R>,
    ) -> Result<R> {
        let mut w = self.sessions.write().await;
        let session = w.get_mut(&id).ok_or(PicscribeError::SessionNotFound(id))?;
        session.touch();
        f(session)
    }

    /// End a session, discarding its uploads and table.
    pub async fn remove(&self, id: SessionId) -> Result<()> {
        let mut w = self.sessions.write().await;
        w.remove(&id).ok_or(PicscribeError::SessionNotFound(id))?;
        info!(session_id = %id, "Session ended");
        Ok(())
    }

    /// Remove sessions not seen for longer than `ttl`. Returns how many were removed.
    ///
    /// A `ttl` reaching back past the earliest representable time removes nothing.
    pub async fn reap_idle(&self, ttl: Duration) -> usize {
        match Utc::now().checked_sub_signed(ttl) {
            Some(cutoff) => self.reap_idle_before(cutoff).await,
            None => 0,
        }
    }

    pub async fn reap_idle_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut w = self.sessions.write().await;
        let before = w.len();
        w.retain(|_, s| s.last_seen() >= cutoff);
        let reaped = before - w.len();
        if reaped > 0 {
            info!(reaped, "Reaped idle sessions");
        }
        reaped
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
