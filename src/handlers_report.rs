use chrono::Utc;
use log::{error, info};
use serde::Deserialize;
use serde_json::json;
use warp::{reject, Rejection, Reply};

use crate::paginator::{self, LayoutConfig};
use crate::pdf_renderer;
use crate::photo_store::PhotoStore;
use crate::warp_helpers::{RenderFailure, ValidationError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    #[serde(default)]
    pub session: Option<String>,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub job_name: Option<String>,
    #[serde(default)]
    pub job_number: Option<String>,
}

impl ReportRequest {
    fn session(&self) -> &str {
        self.session.as_deref().unwrap_or("default")
    }

    fn title(&self) -> String {
        match &self.job_name {
            Some(name) => format!("Job {}", name),
            None => "Photo Grid Report".to_string(),
        }
    }
}

/// Filename scheme kept from the app this service replaces:
/// job-{n}-photos-{count}items-{pages}pages-{date}.pdf
fn pdf_filename(photo_count: usize, page_count: usize, job_number: Option<&str>) -> String {
    let date = Utc::now().format("%Y-%m-%d");
    let job_part = job_number
        .map(|n| format!("job-{}-", n))
        .unwrap_or_default();
    format!(
        "{}photos-{}items-{}pages-{}.pdf",
        job_part, photo_count, page_count, date
    )
}

/// Computes the layout without rendering it, for a client-side preview.
/// Zero photos is a valid empty layout, not an error.
pub async fn layout_preview(
    body: ReportRequest,
    store: PhotoStore,
) -> Result<impl Reply, Rejection> {
    let photos = store.list_sorted(body.session());
    let pages = paginator::paginate(&photos, &body.layout).map_err(|e| {
        reject::custom(ValidationError {
            message: e.to_string(),
        })
    })?;

    Ok(warp::reply::json(&json!({
        "pages": pages,
        "totalPages": pages.len(),
        "totalPhotos": photos.len(),
        "layout": body.layout,
    })))
}

/// Runs the full pipeline: natural-sorted working set -> paginate -> PDF.
pub async fn generate_pdf(
    body: ReportRequest,
    store: PhotoStore,
) -> Result<impl Reply, Rejection> {
    let photos = store.list_sorted(body.session());
    if photos.is_empty() {
        return Err(reject::custom(ValidationError {
            message: "No photos to generate PDF".to_string(),
        }));
    }

    // Fail configuration errors as 400 before the render task starts.
    let page_count = paginator::page_count(photos.len(), &body.layout).map_err(|e| {
        reject::custom(ValidationError {
            message: e.to_string(),
        })
    })?;

    let photo_count = photos.len();
    let layout = body.layout.clone();
    let title = body.title();

    // Decoding and embedding images is CPU-bound; keep it off the runtime.
    let pdf = tokio::task::spawn_blocking(move || {
        let pages = paginator::paginate(&photos, &layout)?;
        Ok::<_, anyhow::Error>(pdf_renderer::render_pdf(&pages, &layout, &title)?)
    })
    .await
    .map_err(|e| {
        error!("PDF render task panicked: {}", e);
        reject::custom(RenderFailure {
            message: "PDF generation failed".to_string(),
        })
    })?
    .map_err(|e| {
        error!("PDF generation failed: {:#}", e);
        reject::custom(RenderFailure {
            message: format!("PDF generation failed: {}", e),
        })
    })?;

    let filename = pdf_filename(photo_count, page_count, body.job_number.as_deref());
    info!(
        "Generated PDF '{}' ({} photos, {} pages, {} bytes)",
        filename,
        photo_count,
        page_count,
        pdf.len()
    );

    let reply = warp::reply::with_header(pdf, "content-type", "application/pdf");
    let reply = warp::reply::with_header(
        reply,
        "content-disposition",
        format!("attachment; filename=\"{}\"", filename),
    );
    Ok(reply)
}
