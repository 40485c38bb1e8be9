use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::trace;

use super::source::{Activity, Form, JobRecord, JobSource};
use crate::config::SourceConfig;
use crate::error::SourceError;

/// JSON client for the system of record.
///
/// `GET {base}/api/jobs/{id}`, `.../activities` and `.../forms`, all with
/// basic auth. A 404 means the job does not exist.
pub struct HttpJobSource {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl HttpJobSource {
    pub fn new(config: &SourceConfig, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, SourceError> {
        let url = format!("{}{path}", self.base_url);
        trace!(%url, "GET");
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(SourceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await.map_err(classify)?;
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| SourceError::Malformed(format!("{url}: {e}")))
    }
}

fn classify(err: reqwest::Error) -> SourceError {
    if err.is_timeout() {
        SourceError::Timeout
    } else {
        SourceError::Network(err)
    }
}

impl JobSource for HttpJobSource {
    async fn get_job(&self, id: u32) -> Result<Option<JobRecord>, SourceError> {
        self.get_json(&format!("/api/jobs/{id}")).await
    }

    async fn get_activities(&self, id: u32) -> Result<Vec<Activity>, SourceError> {
        Ok(self
            .get_json(&format!("/api/jobs/{id}/activities"))
            .await?
            .unwrap_or_default())
    }

    async fn get_forms(&self, id: u32) -> Result<Vec<Form>, SourceError> {
        Ok(self
            .get_json(&format!("/api/jobs/{id}/forms"))
            .await?
            .unwrap_or_default())
    }
}
