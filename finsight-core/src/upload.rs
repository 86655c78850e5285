//! Upload Job: the state machine behind a single statement upload.
//!
//! ```text
//! idle ──begin──▶ uploading ──finish──▶ succeeded | failed ──acknowledge──▶ idle
//!                     │                        │
//!                     └──────── begin ◀────────┘ (terminal states re-enable the control)
//! ```
//!
//! `begin` while `uploading` is refused: the control is disabled in that
//! state. Each job carries an abort handle so an in-flight transfer can be
//! cancelled; a cancelled transfer finishes as `failed`.

use futures_util::future::{AbortHandle, AbortRegistration};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadStatus {
    Idle,
    Uploading,
    Succeeded,
    Failed,
}

impl UploadStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Succeeded | UploadStatus::Failed)
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UploadStatus::Idle => "idle",
            UploadStatus::Uploading => "uploading",
            UploadStatus::Succeeded => "succeeded",
            UploadStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// The one file picked for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file from disk; the multipart file name is the path's final component.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "statement".to_string());
        Ok(Self { name, bytes })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_parts(self) -> (String, Vec<u8>) {
        (self.name, self.bytes)
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Body of a successful upload response. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub upload_id: Option<String>,
    #[serde(default)]
    pub count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadFailure {
    /// Non-2xx response
    Rejected { status: u16 },
    /// Network unreachable, connection reset, and the like
    Transport(String),
    Cancelled,
}

impl UploadFailure {
    /// Rejection and transport failure read the same to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            UploadFailure::Rejected { .. } | UploadFailure::Transport(_) => "Upload failed",
            UploadFailure::Cancelled => "Upload cancelled",
        }
    }
}

impl fmt::Display for UploadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadFailure::Rejected { status } => write!(f, "upload rejected with status {status}"),
            UploadFailure::Transport(e) => write!(f, "upload transport error: {e}"),
            UploadFailure::Cancelled => f.write_str("upload cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Succeeded(Option<UploadReceipt>),
    Failed(UploadFailure),
}

impl UploadOutcome {
    pub fn status(&self) -> UploadStatus {
        match self {
            UploadOutcome::Succeeded(_) => UploadStatus::Succeeded,
            UploadOutcome::Failed(_) => UploadStatus::Failed,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            UploadOutcome::Succeeded(_) => "File uploaded successfully!",
            UploadOutcome::Failed(f) => f.user_message(),
        }
    }
}

/// Identifies one `begin`; completions carrying an older id are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UploadTicketId(u64);

#[derive(Debug)]
pub struct UploadJob {
    status: UploadStatus,
    file_name: Option<String>,
    generation: u64,
    abort: Option<AbortHandle>,
    last_outcome: Option<UploadOutcome>,
}

impl Default for UploadJob {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadJob {
    pub fn new() -> Self {
        Self {
            status: UploadStatus::Idle,
            file_name: None,
            generation: 0,
            abort: None,
            last_outcome: None,
        }
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    /// Whether the control accepts a new selection.
    pub fn is_enabled(&self) -> bool {
        self.status != UploadStatus::Uploading
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn last_outcome(&self) -> Option<&UploadOutcome> {
        self.last_outcome.as_ref()
    }

    /// Move to `uploading`. Returns `None` if a transfer is already in flight.
    ///
    /// The returned registration must wrap the transfer future
    /// (`futures_util::future::Abortable`) so `cancel` can stop it.
    pub fn begin(&mut self, file_name: &str) -> Option<(UploadTicketId, AbortRegistration)> {
        if !self.is_enabled() {
            return None;
        }
        let (handle, registration) = AbortHandle::new_pair();
        self.generation += 1;
        self.status = UploadStatus::Uploading;
        self.file_name = Some(file_name.to_string());
        self.abort = Some(handle);
        self.last_outcome = None;
        tracing::debug!(file = file_name, generation = self.generation, "upload job: idle -> uploading");
        Some((UploadTicketId(self.generation), registration))
    }

    /// Record the terminal outcome for `ticket`. Returns false for stale tickets.
    pub fn finish(&mut self, ticket: UploadTicketId, outcome: UploadOutcome) -> bool {
        if ticket.0 != self.generation || self.status != UploadStatus::Uploading {
            tracing::debug!(ticket = ticket.0, generation = self.generation, "ignoring stale upload completion");
            return false;
        }
        self.status = outcome.status();
        self.abort = None;
        tracing::debug!(status = %self.status, "upload job finished");
        self.last_outcome = Some(outcome);
        true
    }

    /// Abort the in-flight transfer, if any. The transfer's completion then
    /// reports `UploadFailure::Cancelled` through `finish`.
    pub fn cancel(&mut self) -> bool {
        match (&self.status, self.abort.as_ref()) {
            (UploadStatus::Uploading, Some(handle)) => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    /// The user has seen the terminal status: reset to `idle`.
    pub fn acknowledge(&mut self) {
        if self.status.is_terminal() {
            self.status = UploadStatus::Idle;
            self.file_name = None;
        }
    }
}
