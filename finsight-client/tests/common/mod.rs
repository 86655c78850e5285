//! In-process fake of the finsight services, bound to an ephemeral port.

#![allow(dead_code)]

use axum::Router;
use finsight_client::{ApiClient, ApiConfig};
use finsight_core::{Credential, MemoryCredentialStore, SessionContext};
use std::sync::Arc;

pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Base URL of a port nothing listens on.
pub async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn api(base_url: &str) -> ApiClient {
    ApiClient::new(&ApiConfig::new(base_url)).unwrap()
}

pub fn session_with(token: Option<&str>) -> SessionContext {
    match token.and_then(Credential::new) {
        Some(c) => SessionContext::new(Arc::new(MemoryCredentialStore::with_credential(c))),
        None => SessionContext::in_memory(),
    }
}

pub fn token_of(session: &SessionContext) -> Option<String> {
    session.get().unwrap().map(|c| c.as_str().to_string())
}
