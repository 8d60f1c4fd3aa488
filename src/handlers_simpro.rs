use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use warp::{reject, Rejection, Reply};

use crate::mimetype_detector;
use crate::photo_store::{PhotoOrigin, PhotoRecord, PhotoStore};
use crate::simpro::{SimproAttachment, SimproClient, SimproError};
use crate::warp_helpers::{
    NotFoundError, SessionQuery, SimproNotConfigured, UpstreamError, ValidationError,
};

#[derive(Debug, Deserialize)]
pub struct JobsQuery {
    pub date: Option<String>,
}

fn require_client(client: Option<Arc<SimproClient>>) -> Result<Arc<SimproClient>, Rejection> {
    client.ok_or_else(|| reject::custom(SimproNotConfigured))
}

fn simpro_rejection(job_id: u32, err: SimproError) -> Rejection {
    match err {
        SimproError::Validation(message) => reject::custom(ValidationError { message }),
        SimproError::Status { status: 404, .. } => reject::custom(NotFoundError {
            message: format!("Job {} not found in SimPRO", job_id),
        }),
        other => {
            error!("SimPRO request for job {} failed: {}", job_id, other);
            reject::custom(UpstreamError {
                message: format!("SimPRO request failed: {}", other),
            })
        }
    }
}

/// Proxies SimPRO's jobs listing; defaults to today when no date is given.
pub async fn list_jobs(
    query: JobsQuery,
    client: Option<Arc<SimproClient>>,
) -> Result<impl Reply, Rejection> {
    let client = require_client(client)?;
    let date = query
        .date
        .unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string());

    match client.get_jobs_for_date(&date).await {
        Ok(jobs) => Ok(warp::reply::json(&jobs)),
        Err(e) => {
            error!("Failed to fetch jobs for {}: {}", date, e);
            Err(reject::custom(UpstreamError {
                message: format!("Failed to fetch jobs: {}", e),
            }))
        }
    }
}

fn is_image_attachment(att: &SimproAttachment) -> bool {
    match att.mime_type.as_deref() {
        Some(mime) => mimetype_detector::is_image_mime(mime),
        None => mimetype_detector::from_name(&att.filename).is_some(),
    }
}

/// Imports a job's image attachments into the session working set. Individual
/// attachment failures are logged and skipped so one broken file doesn't sink
/// the whole import.
pub async fn import_job_photos(
    job_id: u32,
    query: SessionQuery,
    client: Option<Arc<SimproClient>>,
    store: PhotoStore,
) -> Result<impl Reply, Rejection> {
    let client = require_client(client)?;

    let attachments = client
        .get_job_attachments(job_id)
        .await
        .map_err(|e| simpro_rejection(job_id, e))?;

    let images: Vec<SimproAttachment> = attachments
        .into_iter()
        .filter(is_image_attachment)
        .collect();

    if images.is_empty() {
        return Err(reject::custom(NotFoundError {
            message: format!("No photos found for job {}", job_id),
        }));
    }

    let mut imported = Vec::new();
    let mut already_present = 0usize;
    for att in &images {
        let photo_id = format!("simpro_{}", att.id);
        // Ids are unique within a working set; a re-import must not
        // duplicate records already there.
        if store.contains(query.name(), &photo_id) {
            already_present += 1;
            continue;
        }

        let full = match client.get_attachment_base64(job_id, &att.id).await {
            Ok(full) => full,
            Err(e) => {
                warn!("Failed to fetch attachment {} for job {}: {}", att.id, job_id, e);
                continue;
            }
        };

        let Some(base64_data) = full.base64_data else {
            warn!("Attachment {} for job {} has no Base64 data", att.id, job_id);
            continue;
        };

        let bytes = match BASE64.decode(base64_data.as_bytes()) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Attachment {} for job {} is not valid Base64: {}", att.id, job_id, e);
                continue;
            }
        };

        let mime = full
            .mime_type
            .or_else(|| att.mime_type.clone())
            .or_else(|| mimetype_detector::from_name(&att.filename).map(|m| m.to_string()))
            .unwrap_or_else(|| "image/jpeg".to_string());

        imported.push(PhotoRecord::new(
            photo_id,
            full.filename,
            PhotoOrigin::Imported,
            mime,
            bytes,
        ));
    }

    if imported.is_empty() && already_present == 0 {
        return Err(reject::custom(UpstreamError {
            message: format!("Failed to retrieve photo attachments for job {}", job_id),
        }));
    }

    let total = store.add(query.name(), imported.clone());
    info!(
        "Imported {}/{} photos from job {} into session '{}'",
        imported.len(),
        images.len(),
        job_id,
        query.name()
    );

    Ok(warp::reply::json(&json!({
        "imported": imported.len(),
        "total": total,
        "photos": imported,
    })))
}
