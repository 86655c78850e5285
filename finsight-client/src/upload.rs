//! Upload Controller: drives one Upload Job through `POST /api/upload`.
//!
//! The controller reads the session credential at selection time and
//! attaches it when present. It never consults the session guard, so an
//! unauthenticated upload is only rejected by the service.

use finsight_core::{
    Credential, SelectedFile, SessionContext, StoreError, UploadFailure, UploadJob, UploadOutcome, UploadReceipt,
    UploadStatus, UploadTicketId,
};
use futures_util::future::Abortable;
use reqwest::multipart::{Form, Part};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

use crate::api::{with_bearer, ApiClient};

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("an upload is already in progress")]
    Busy,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("upload state lock poisoned")]
    Poisoned,
}

/// Handle to a transfer started by [`UploadController::select_file`].
#[derive(Debug)]
pub struct UploadTicket {
    id: UploadTicketId,
    handle: JoinHandle<UploadOutcome>,
    job: Arc<Mutex<UploadJob>>,
}

impl UploadTicket {
    /// Wait for the terminal outcome. The job has already recorded it when this returns.
    pub async fn wait(self) -> UploadOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                let outcome = UploadOutcome::Failed(UploadFailure::Transport(format!("upload task ended: {e}")));
                if let Ok(mut job) = self.job.lock() {
                    job.finish(self.id, outcome.clone());
                }
                outcome
            }
        }
    }
}

#[derive(Debug)]
pub struct UploadController {
    api: ApiClient,
    session: SessionContext,
    job: Arc<Mutex<UploadJob>>,
}

impl UploadController {
    pub fn new(api: ApiClient, session: SessionContext) -> Self {
        Self {
            api,
            session,
            job: Arc::new(Mutex::new(UploadJob::new())),
        }
    }

    pub fn status(&self) -> UploadStatus {
        self.job
            .lock()
            .map(|j| j.status())
            .unwrap_or(UploadStatus::Failed)
    }

    /// False while a transfer is in flight.
    pub fn is_enabled(&self) -> bool {
        self.job.lock().map(|j| j.is_enabled()).unwrap_or(false)
    }

    pub fn last_outcome(&self) -> Option<UploadOutcome> {
        self.job.lock().ok().and_then(|j| j.last_outcome().cloned())
    }

    /// Start uploading `file`.
    ///
    /// The job is `uploading` when this returns and the transfer is already
    /// running on the tokio runtime, so this must be called from within one.
    pub fn select_file(&self, file: SelectedFile) -> Result<UploadTicket, UploadError> {
        let credential = self.session.get()?;
        if credential.is_none() {
            tracing::warn!("uploading without a session credential");
        }

        let (id, registration) = {
            let mut job = self.job.lock().map_err(|_| UploadError::Poisoned)?;
            job.begin(file.name()).ok_or(UploadError::Busy)?
        };
        tracing::info!(file = file.name(), bytes = file.len(), "upload started");

        let api = self.api.clone();
        let job = Arc::clone(&self.job);
        let handle = tokio::spawn(async move {
            let outcome = match Abortable::new(transfer(api, credential, file), registration).await {
                Ok(outcome) => outcome,
                Err(_aborted) => UploadOutcome::Failed(UploadFailure::Cancelled),
            };
            match &outcome {
                UploadOutcome::Succeeded(_) => tracing::info!("upload succeeded"),
                UploadOutcome::Failed(f) => tracing::warn!(failure = %f, "upload failed"),
            }
            if let Ok(mut job) = job.lock() {
                job.finish(id, outcome.clone());
            }
            outcome
        });

        Ok(UploadTicket {
            id,
            handle,
            job: Arc::clone(&self.job),
        })
    }

    /// Select and wait in one step.
    pub async fn upload(&self, file: SelectedFile) -> Result<UploadOutcome, UploadError> {
        Ok(self.select_file(file)?.wait().await)
    }

    /// Abort the in-flight transfer. Returns false when nothing was uploading.
    pub fn cancel(&self) -> bool {
        let cancelled = self.job.lock().map(|mut j| j.cancel()).unwrap_or(false);
        if cancelled {
            tracing::info!("upload cancelled");
        }
        cancelled
    }

    /// Reset a terminal job to `idle` once the user has seen the result.
    pub fn acknowledge(&self) {
        if let Ok(mut job) = self.job.lock() {
            job.acknowledge();
        }
    }
}

impl Drop for UploadController {
    /// Navigating away drops the controller; the transfer goes with it.
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn transfer(api: ApiClient, credential: Option<Credential>, file: SelectedFile) -> UploadOutcome {
    let (name, bytes) = file.into_parts();
    let form = Form::new().part("file", Part::bytes(bytes).file_name(name));

    let resp = with_bearer(api.post("/api/upload"), credential.as_ref())
        .multipart(form)
        .send()
        .await;

    match resp {
        Err(e) => UploadOutcome::Failed(UploadFailure::Transport(e.to_string())),
        Ok(resp) if resp.status().is_success() => {
            // the receipt is informational; an unreadable body is still a success
            let receipt = resp.json::<UploadReceipt>().await.ok();
            UploadOutcome::Succeeded(receipt)
        }
        Ok(resp) => UploadOutcome::Failed(UploadFailure::Rejected {
            status: resp.status().as_u16(),
        }),
    }
}
