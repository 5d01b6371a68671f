mod handlers;
mod state;

use actix_cors::Cors;
use actix_web::{http::header, web, App, HttpServer};
use tracing::info;
use tracing_actix_web::TracingLogger;

use crate::config::AppConfig;
use crate::error::RoyaltyError;

pub use state::AppState;

/// Register every API route on `cfg`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(handlers::json_error))
        .app_data(web::QueryConfig::default().error_handler(handlers::query_error))
        .route(
            "/api/royalty/calculate",
            web::post().to(handlers::calculate),
        )
        .route("/api/settings", web::get().to(handlers::get_settings))
        .route("/api/settings", web::put().to(handlers::put_settings))
        .route("/api/settings", web::patch().to(handlers::patch_settings))
        .route("/api/settings/reset", web::post().to(handlers::reset_settings))
        .route("/api/royalties", web::post().to(handlers::save_royalty))
        .route("/api/royalties", web::get().to(handlers::list_royalties))
        // Must precede the `{id}` routes.
        .route(
            "/api/royalties/export",
            web::get().to(handlers::export_royalties),
        )
        .route("/api/royalties/{id}", web::get().to(handlers::get_royalty))
        .route(
            "/api/royalties/{id}",
            web::delete().to(handlers::delete_royalty),
        );
}

fn cors(origins: &[String]) -> Cors {
    origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600)
}

pub async fn start_server(config: AppConfig) -> Result<(), RoyaltyError> {
    let data = web::Data::new(AppState::from_config(&config)?);
    let origins = config.server.cors_origins.clone();
    let addr = (config.server.host.clone(), config.server.port);

    info!(
        host = %addr.0,
        port = addr.1,
        database = %config.storage.database_path.display(),
        "starting royalty API server"
    );
    println!(
        "Starting royalty calculator API on http://{}:{}",
        addr.0, addr.1
    );

    HttpServer::new(move || {
        App::new()
            .wrap(cors(&origins))
            .wrap(TracingLogger::default())
            .app_data(data.clone())
            .configure(configure)
    })
    .bind(addr)?
    .run()
    .await?;
    Ok(())
}
