use std::env;

use crate::simpro::SimproConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub host: String,
    pub max_upload_mb: usize,
    pub simpro: Option<SimproConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Config {
            port: env::var("PHOTO_REPORT_PORT")
                .unwrap_or_else(|_| "18650".to_string())
                .parse()?,
            host: env::var("PHOTO_REPORT_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            max_upload_mb: env::var("PHOTO_REPORT_MAX_UPLOAD_MB")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            simpro: Self::simpro_from_env()?,
        })
    }

    /// SimPRO settings are optional: without them the import routes answer
    /// 503 while uploads and report generation keep working.
    fn simpro_from_env() -> Result<Option<SimproConfig>, Box<dyn std::error::Error>> {
        let base_url = env::var("SIMPRO_BASE_URL").ok();
        let client_id = env::var("SIMPRO_CLIENT_ID").ok();
        let client_secret = env::var("SIMPRO_CLIENT_SECRET").ok();

        match (base_url, client_id, client_secret) {
            (Some(base_url), Some(client_id), Some(client_secret)) => Ok(Some(SimproConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                client_id,
                client_secret,
                company_id: env::var("SIMPRO_COMPANY_ID")
                    .unwrap_or_else(|_| "0".to_string())
                    .parse()?,
            })),
            (None, None, None) => Ok(None),
            _ => Err("SIMPRO_BASE_URL, SIMPRO_CLIENT_ID and SIMPRO_CLIENT_SECRET must be set together".into()),
        }
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb as u64 * 1024 * 1024
    }
}
