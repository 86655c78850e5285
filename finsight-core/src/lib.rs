//! finsight-core: session, upload and dashboard state for the finsight client

pub mod credential;
pub mod dashboard;
pub mod session;
pub mod transaction;
pub mod upload;

pub use credential::{Credential, CredentialStore, MemoryCredentialStore, SessionContext, StoreError};
pub use dashboard::{CategorySlice, Dashboard, DashboardSource, FlowPoint, Summary};
pub use session::{Guarded, SessionGuard, SessionState, View};
pub use transaction::{Direction, Transaction};
pub use upload::{
    SelectedFile, UploadFailure, UploadJob, UploadOutcome, UploadReceipt, UploadStatus, UploadTicketId,
};
