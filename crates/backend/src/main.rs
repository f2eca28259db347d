pub mod domain;
pub mod shared;
pub mod system;

use axum::http::{header, Method};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::shared::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_dir = std::path::Path::new("target").join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("backend.log"))?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,sqlx=warn,sea_orm=warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(log_file))
                .with_ansi(false),
        )
        .init();

    let config = Arc::new(shared::config::load_config()?);
    let db = shared::data::db::connect(&config).await?;

    let state = AppState {
        db,
        config: config.clone(),
    };

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(
            config
                .urls
                .client_url
                .parse::<axum::http::HeaderValue>()
                .map_err(|_| anyhow::anyhow!("Invalid client_url in configuration"))?,
        );

    let admin_routes = Router::new()
        .route(
            "/Account/Users",
            get(system::handlers::users::list)
                .put(system::handlers::users::update)
                .delete(system::handlers::users::delete),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            system::auth::middleware::require_admin,
        ));

    let protected_routes = Router::new()
        .route("/Playground/:id", get(domain::playground::handlers::get_by_id))
        .route(
            "/Playground/byname",
            get(domain::playground::handlers::get_by_name),
        )
        .route(
            "/Playground/onlynames",
            get(domain::playground::handlers::only_names),
        )
        .route("/Playdevice", post(domain::playdevice::handlers::update))
        .route("/Playdevice/:fid", get(domain::playdevice::handlers::get))
        .route(
            "/Playdevice/:fid/Picture",
            get(domain::playdevice::handlers::get_picture)
                .put(domain::playdevice::handlers::put_picture),
        )
        .route(
            "/Defect",
            post(domain::defect::handlers::create).put(domain::defect::handlers::update),
        )
        .route("/Defect/:tid", get(domain::defect::handlers::get_by_tid))
        .route(
            "/Defect/Picture/:tid",
            get(domain::defect::handlers::get_picture)
                .put(domain::defect::handlers::put_picture),
        )
        .route(
            "/Defect/:tid/Picture",
            post(domain::defect::handlers::attach_picture),
        )
        .route("/Inspection", post(domain::inspection::handlers::submit))
        .route("/Inspection/Types", get(domain::inspection::handlers::types))
        .route(
            "/Inspection/renovationtypes",
            get(domain::inspection::handlers::renovation_types),
        )
        .route("/Document/:fid", get(domain::document::get))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            system::auth::middleware::require_auth,
        ));

    let public_routes = Router::new()
        .route("/", get(system::handlers::home::index))
        .route("/Account/Login", post(system::handlers::auth::login))
        .route(
            "/Account/Register",
            get(system::handlers::register::form).post(system::handlers::register::submit),
        )
        .route(
            "/Playground/mapimage",
            get(domain::playground::handlers::map_image),
        )
        .route(
            "/Collections/Playgrounds/Items",
            get(domain::playground::handlers::collection_items),
        )
        .route(
            "/Collections/Playgrounds/Items/:fid",
            get(domain::playground::handlers::collection_item),
        );

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .layer(middleware::from_fn(
            system::middleware::request_logger::request_logger,
        ))
        .layer(cors)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Starting server on {}", addr);

    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
            tracing::error!(
                "Port {} is already in use, is another instance running?",
                config.server.port
            );
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };

    axum::serve(listener, app).await?;

    Ok(())
}
