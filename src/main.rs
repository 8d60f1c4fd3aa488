use log::{error, info, warn};
use std::net::{IpAddr, TcpListener};
use std::sync::Arc;
use warp::Filter;

use photo_report::config::Config;
use photo_report::photo_store::PhotoStore;
use photo_report::simpro::SimproClient;
use photo_report::warp_helpers::{
    cors, handle_rejection, health_check, with_config, with_simpro, with_store,
};
use photo_report::{handlers_photo, handlers_report, handlers_simpro, warp_helpers};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = Arc::new(Config::from_env()?);
    let port = config.port;
    let host: IpAddr = config.host.parse()?;

    info!("Starting photo-report server on port {}", port);
    info!("Max upload size: {}MB", config.max_upload_mb);

    // Check if port is available BEFORE initializing services
    if !is_port_available(&config.host, port) {
        error!(
            "Port {} is already in use. Please stop any existing photo-report instances or use a different port.",
            port
        );
        return Err(format!("Port {} is already in use", port).into());
    }

    let store = PhotoStore::new();

    let simpro = match &config.simpro {
        Some(simpro_config) => {
            info!("SimPRO integration enabled for {}", simpro_config.base_url);
            Some(Arc::new(SimproClient::new(simpro_config.clone())))
        }
        None => {
            warn!("SimPRO credentials not set, job import routes disabled");
            None
        }
    };

    let health_routes = build_health_routes();
    let photo_routes = build_photo_routes(store.clone(), config.clone());
    let simpro_routes = build_simpro_routes(simpro, store.clone());
    let report_routes = build_report_routes(store);

    let routes = health_routes
        .or(photo_routes)
        .or(simpro_routes)
        .or(report_routes)
        .with(cors())
        .with(warp::log("photo_report"))
        .recover(handle_rejection);

    info!(
        "Server started successfully, listening on http://{}:{}",
        config.host, port
    );

    warp::serve(routes).run((host, port)).await;

    Ok(())
}

fn is_port_available(host: &str, port: u16) -> bool {
    TcpListener::bind((host, port)).is_ok()
}

fn build_health_routes() -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone
{
    warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(health_check)
}

fn build_photo_routes(
    store: PhotoStore,
    config: Arc<Config>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let max_upload = config.max_upload_bytes();

    let api_photos_upload = warp::path("api")
        .and(warp::path("photos"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::query::<warp_helpers::SessionQuery>())
        .and(warp::multipart::form().max_length(max_upload * 2))
        .and(with_store(store.clone()))
        .and(with_config(config))
        .and_then(handlers_photo::upload_photos);

    let api_photos_list = warp::path("api")
        .and(warp::path("photos"))
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<warp_helpers::SessionQuery>())
        .and(with_store(store.clone()))
        .and_then(handlers_photo::list_photos);

    let api_photo_rename = warp::path("api")
        .and(warp::path("photos"))
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::put())
        .and(warp::query::<warp_helpers::SessionQuery>())
        .and(warp::body::json::<handlers_photo::RenameRequest>())
        .and(with_store(store.clone()))
        .and_then(handlers_photo::rename_photo);

    let api_photo_delete = warp::path("api")
        .and(warp::path("photos"))
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::delete())
        .and(warp::query::<warp_helpers::SessionQuery>())
        .and(with_store(store.clone()))
        .and_then(handlers_photo::delete_photo);

    let api_photos_clear = warp::path("api")
        .and(warp::path("photos"))
        .and(warp::path::end())
        .and(warp::delete())
        .and(warp::query::<warp_helpers::SessionQuery>())
        .and(with_store(store))
        .and_then(handlers_photo::clear_photos);

    api_photos_upload
        .or(api_photos_list)
        .or(api_photo_rename)
        .or(api_photo_delete)
        .or(api_photos_clear)
}

fn build_simpro_routes(
    simpro: Option<Arc<SimproClient>>,
    store: PhotoStore,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let api_jobs_list = warp::path("api")
        .and(warp::path("simpro"))
        .and(warp::path("jobs"))
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<handlers_simpro::JobsQuery>())
        .and(with_simpro(simpro.clone()))
        .and_then(handlers_simpro::list_jobs);

    let api_job_import = warp::path("api")
        .and(warp::path("simpro"))
        .and(warp::path("jobs"))
        .and(warp::path::param::<u32>())
        .and(warp::path("import"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::query::<warp_helpers::SessionQuery>())
        .and(with_simpro(simpro))
        .and(with_store(store))
        .and_then(handlers_simpro::import_job_photos);

    api_jobs_list.or(api_job_import)
}

fn build_report_routes(
    store: PhotoStore,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let api_report_layout = warp::path("api")
        .and(warp::path("report"))
        .and(warp::path("layout"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json::<handlers_report::ReportRequest>())
        .and(with_store(store.clone()))
        .and_then(handlers_report::layout_preview);

    let api_report_pdf = warp::path("api")
        .and(warp::path("report"))
        .and(warp::path("pdf"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json::<handlers_report::ReportRequest>())
        .and(with_store(store))
        .and_then(handlers_report::generate_pdf);

    api_report_layout.or(api_report_pdf)
}
