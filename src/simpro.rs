use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use serde::Deserialize;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimproError {
    #[error("SimPRO authentication failed: {0}")]
    Auth(String),
    #[error("SimPRO request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("SimPRO returned {status} for {endpoint}")]
    Status { status: u16, endpoint: String },
    #[error("{0}")]
    Validation(String),
}

/// Connection settings for one SimPRO build.
#[derive(Debug, Clone)]
pub struct SimproConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub company_id: u32,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// A job attachment as SimPRO returns it. `base64_data` is only present when
/// the file was requested with `?display=Base64`.
#[derive(Debug, Clone, Deserialize)]
pub struct SimproAttachment {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Filename")]
    pub filename: String,
    #[serde(rename = "MimeType", default)]
    pub mime_type: Option<String>,
    #[serde(rename = "FileSizeBytes", default)]
    pub file_size_bytes: Option<u64>,
    #[serde(rename = "Base64Data", default)]
    pub base64_data: Option<String>,
}

pub fn validate_job_id(job_id: u32) -> Result<(), SimproError> {
    if job_id == 0 {
        return Err(SimproError::Validation(
            "Invalid job ID. Must be a positive integer.".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_file_id(file_id: &str) -> Result<(), SimproError> {
    if file_id.trim().is_empty() {
        return Err(SimproError::Validation(
            "Invalid file ID. Must be a non-empty string.".to_string(),
        ));
    }
    Ok(())
}

/// SimPRO REST client with OAuth2 client-credentials authentication. The
/// access token is cached until shortly before its expiry and refreshed on
/// demand.
pub struct SimproClient {
    config: SimproConfig,
    http: reqwest::Client,
    token: Mutex<Option<CachedToken>>,
}

impl SimproClient {
    pub fn new(config: SimproConfig) -> Self {
        SimproClient {
            config,
            http: reqwest::Client::new(),
            token: Mutex::new(None),
        }
    }

    fn cached_token(&self) -> Option<String> {
        let guard = self.token.lock().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().and_then(|t| {
            // Refresh slightly early so in-flight requests don't race expiry.
            if t.expires_at > Utc::now() + Duration::seconds(30) {
                Some(t.access_token.clone())
            } else {
                None
            }
        })
    }

    async fn authenticate(&self) -> Result<String, SimproError> {
        let url = format!("{}/oauth/token", self.config.base_url);
        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SimproError::Auth(format!(
                "{} {}",
                response.status().as_u16(),
                response.status().canonical_reason().unwrap_or("")
            )));
        }

        let auth: AuthResponse = response.json().await?;
        let token = CachedToken {
            access_token: auth.access_token,
            expires_at: Utc::now() + Duration::seconds(auth.expires_in),
        };

        let mut guard = self.token.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(token.clone());
        info!("SimPRO authentication successful");
        Ok(token.access_token)
    }

    async fn access_token(&self) -> Result<String, SimproError> {
        if let Some(token) = self.cached_token() {
            return Ok(token);
        }
        self.authenticate().await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<T, SimproError> {
        let token = self.access_token().await?;
        let url = format!("{}{}", self.config.base_url, endpoint);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .header("Content-Type", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("SimPRO request to {} failed with {}", endpoint, status);
            return Err(SimproError::Status {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
            });
        }

        Ok(response.json().await?)
    }

    /// Jobs scheduled for a date (YYYY-MM-DD), passed through as raw JSON.
    pub async fn get_jobs_for_date(&self, date: &str) -> Result<serde_json::Value, SimproError> {
        let endpoint = format!(
            "/api/v1.0/companies/{}/jobs?date={}",
            self.config.company_id, date
        );
        self.get_json(&endpoint).await
    }

    /// Lists a job's file attachments (metadata only).
    pub async fn get_job_attachments(
        &self,
        job_id: u32,
    ) -> Result<Vec<SimproAttachment>, SimproError> {
        validate_job_id(job_id)?;
        let endpoint = format!(
            "/api/v1.0/companies/{}/jobs/{}/attachments/files/?columns=ID,Filename,MimeType,FileSizeBytes",
            self.config.company_id, job_id
        );
        let attachments: Vec<SimproAttachment> = self.get_json(&endpoint).await?;
        info!(
            "Retrieved {} attachments for job {}",
            attachments.len(),
            job_id
        );
        Ok(attachments)
    }

    /// Fetches one attachment with its Base64-encoded file data.
    pub async fn get_attachment_base64(
        &self,
        job_id: u32,
        file_id: &str,
    ) -> Result<SimproAttachment, SimproError> {
        validate_job_id(job_id)?;
        validate_file_id(file_id)?;
        let endpoint = format!(
            "/api/v1.0/companies/{}/jobs/{}/attachments/files/{}?display=Base64",
            self.config.company_id, job_id, file_id
        );
        self.get_json(&endpoint).await
    }
}
