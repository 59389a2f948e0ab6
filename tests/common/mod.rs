//! Common test infrastructure
//!
//! This module provides all the infrastructure needed for end-to-end tests.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestServer, TestClient};
//! use reqwest::StatusCode;
//!
//! #[tokio::test]
//! async fn test_list_songs() {
//!     let server = TestServer::spawn().await;
//!     let client = TestClient::authenticated(server.base_url.clone());
//!
//!     let response = client.list_songs().await;
//!     assert_eq!(response.status(), StatusCode::OK);
//! }
//! ```

mod client;
mod constants;
mod fixtures;
mod server;

// Public API - this is what tests import
pub use client::TestClient;
pub use constants::*;
#[allow(unused_imports)]
pub use fixtures::{fake_mp3_bytes, wav_bytes};
#[allow(unused_imports)]
pub use server::{TestServer, TestServerOptions};
