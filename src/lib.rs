pub mod config;
pub mod handlers_photo;
pub mod handlers_report;
pub mod handlers_simpro;
pub mod mimetype_detector;
pub mod natural_sort;
pub mod paginator;
pub mod pdf_renderer;
pub mod photo_store;
pub mod simpro;
pub mod warp_helpers;
