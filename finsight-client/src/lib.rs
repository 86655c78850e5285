//! finsight-client: HTTP boundary to the finsight auth and ingestion services

pub mod api;
pub mod auth;
pub mod upload;

pub use api::{ApiClient, ApiConfig, ApiError, DEFAULT_BASE_URL};
pub use auth::{AuthError, AuthGateway, LoginOutcome, RegisterOutcome};
pub use upload::{UploadController, UploadError, UploadTicket};
