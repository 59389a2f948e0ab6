//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all mosic-server endpoints.
//!
//! When API routes or request formats change, update only this file.

#![allow(dead_code)]

use super::constants::*;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;

/// HTTP test client sending an optional API key with every request
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
    api_key: Option<String>,
}

impl TestClient {
    /// Creates a client that sends no API key
    pub fn new(base_url: String) -> Self {
        Self::with_api_key(base_url, None)
    }

    /// Creates a client sending `api_key` in the `X-API-Key` header
    pub fn with_api_key(base_url: String, api_key: Option<&str>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            base_url,
            api_key: api_key.map(str::to_string),
        }
    }

    /// Creates a client holding the key test servers are configured with
    pub fn authenticated(base_url: String) -> Self {
        Self::with_api_key(base_url, Some(TEST_API_KEY))
    }

    fn with_key(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("X-API-Key", key),
            None => request,
        }
    }

    async fn get(&self, path: &str) -> Response {
        self.with_key(self.client.get(format!("{}{}", self.base_url, path)))
            .send()
            .await
            .expect("GET request failed")
    }

    // ========================================================================
    // Status
    // ========================================================================

    /// GET /
    pub async fn home(&self) -> Response {
        self.get("/").await
    }

    // ========================================================================
    // Songs
    // ========================================================================

    /// GET /play
    pub async fn list_songs(&self) -> Response {
        self.get("/play").await
    }

    /// POST /play
    pub async fn create_song(&self, song: Value) -> Response {
        self.with_key(self.client.post(format!("{}/play", self.base_url)))
            .json(&song)
            .send()
            .await
            .expect("Create song request failed")
    }

    /// POST /play/upload with a single `file` part and optional text parts
    pub async fn upload_song(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        content_type: &str,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Response {
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .expect("Invalid content type");

        let mut form = Form::new();
        if let Some(title) = title {
            form = form.text("title", title.to_string());
        }
        form = form.part("file", part);
        if let Some(description) = description {
            form = form.text("description", description.to_string());
        }

        self.upload_form(form).await
    }

    /// POST /play/upload with an arbitrary form
    pub async fn upload_form(&self, form: Form) -> Response {
        self.with_key(self.client.post(format!("{}/play/upload", self.base_url)))
            .multipart(form)
            .send()
            .await
            .expect("Upload request failed")
    }

    /// GET /play/{id}/stats
    pub async fn get_stats(&self, id: &str) -> Response {
        self.get(&format!("/play/{}/stats", id)).await
    }

    /// GET /play/{id}/stream
    pub async fn stream_song(&self, id: &str) -> Response {
        self.get(&format!("/play/{}/stream", id)).await
    }

    // ========================================================================
    // Static media
    // ========================================================================

    /// GET an absolute path such as a song's `audio_url`
    pub async fn get_path(&self, path: &str) -> Response {
        self.get(path).await
    }
}
