use futures_util::TryStreamExt;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use warp::multipart::{FormData, Part};
use warp::{reject, Buf, Rejection, Reply};

use crate::config::Config;
use crate::mimetype_detector;
use crate::photo_store::{generate_upload_id, PhotoOrigin, PhotoRecord, PhotoStore};
use crate::warp_helpers::{NotFoundError, SessionQuery, ValidationError};

#[derive(Debug, Serialize)]
pub struct PhotosResponse {
    pub photos: Vec<PhotoRecord>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

pub async fn upload_photos(
    query: SessionQuery,
    form: FormData,
    store: PhotoStore,
    config: Arc<Config>,
) -> Result<impl Reply, Rejection> {
    let parts: Vec<Part> = form.try_collect().await.map_err(|e| {
        reject::custom(ValidationError {
            message: format!("Invalid multipart body: {}", e),
        })
    })?;

    let mut added = Vec::new();
    for part in parts {
        let filename = match part.filename() {
            Some(name) => name.to_string(),
            // Non-file fields are not part of the upload contract.
            None => continue,
        };

        let mime = match mimetype_detector::from_name(&filename) {
            Some(mime) => mime.to_string(),
            None => {
                return Err(reject::custom(ValidationError {
                    message: format!("{} is not a valid image file", filename),
                }))
            }
        };

        let data = read_part_bytes(part).await?;
        if data.len() as u64 > config.max_upload_bytes() {
            return Err(reject::custom(ValidationError {
                message: format!(
                    "{} is too large. Maximum size is {}MB",
                    filename, config.max_upload_mb
                ),
            }));
        }

        added.push(PhotoRecord::new(
            generate_upload_id(),
            filename,
            PhotoOrigin::Uploaded,
            mime,
            data,
        ));
    }

    if added.is_empty() {
        return Err(reject::custom(ValidationError {
            message: "No image files in upload".to_string(),
        }));
    }

    let total = store.add(query.name(), added.clone());
    info!(
        "Uploaded {} photos to session '{}' ({} total)",
        added.len(),
        query.name(),
        total
    );

    Ok(warp::reply::json(&json!({
        "added": added.len(),
        "total": total,
        "photos": added,
    })))
}

async fn read_part_bytes(part: Part) -> Result<Vec<u8>, Rejection> {
    part.stream()
        .try_fold(Vec::new(), |mut acc, mut buf| async move {
            while buf.has_remaining() {
                let chunk = buf.chunk();
                acc.extend_from_slice(chunk);
                let len = chunk.len();
                buf.advance(len);
            }
            Ok(acc)
        })
        .await
        .map_err(|e| {
            reject::custom(ValidationError {
                message: format!("Failed to read uploaded file: {}", e),
            })
        })
}

pub async fn list_photos(query: SessionQuery, store: PhotoStore) -> Result<impl Reply, Rejection> {
    let photos = store.list_sorted(query.name());
    let total = photos.len();
    Ok(warp::reply::json(&PhotosResponse { photos, total }))
}

pub async fn rename_photo(
    id: String,
    query: SessionQuery,
    body: RenameRequest,
    store: PhotoStore,
) -> Result<impl Reply, Rejection> {
    if body.name.trim().is_empty() {
        return Err(reject::custom(ValidationError {
            message: "Photo name must not be empty".to_string(),
        }));
    }

    match store.rename(query.name(), &id, &body.name) {
        Some(photo) => Ok(warp::reply::json(&photo)),
        None => Err(reject::custom(NotFoundError {
            message: format!("Photo {} not found", id),
        })),
    }
}

pub async fn delete_photo(
    id: String,
    query: SessionQuery,
    store: PhotoStore,
) -> Result<impl Reply, Rejection> {
    if store.remove(query.name(), &id) {
        Ok(warp::reply::json(&json!({ "deleted": id })))
    } else {
        Err(reject::custom(NotFoundError {
            message: format!("Photo {} not found", id),
        }))
    }
}

pub async fn clear_photos(query: SessionQuery, store: PhotoStore) -> Result<impl Reply, Rejection> {
    store.clear(query.name());
    info!("Cleared session '{}'", query.name());
    Ok(warp::reply::json(&json!({ "cleared": true })))
}
