use actix_files::Files;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use log::info;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tera::Tera;

use crate::config::Config;
use crate::constants::MAX_FILE_SIZE;
use crate::handlers;
use crate::services::preview::ObjectUrlRegistry;
use crate::services::store::SessionStore;
use crate::services::{ExtractionBackend, HttpExtractionClient};

const CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

pub async fn run(config: Config) -> std::io::Result<()> {
    let host = config.host.clone();
    let port = config.port;

    print_banner(&host, port);
    info!("Server running at http://{}:{}/", host, port);
    info!("OCR backend: {}", config.ocr_endpoint);

    let startup_time = Instant::now();
    let tera = Tera::new(&config.templates_glob()).map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Failed to initialize Tera templates: {}", e),
        )
    })?;

    let client = HttpExtractionClient::new(&config);
    let backend: Arc<dyn ExtractionBackend> = Arc::new(client.clone());
    let store = SessionStore::new(ObjectUrlRegistry::new(), config.session_ttl_secs);

    let sweeper = store.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            sweeper.cleanup().await;
        }
    });

    let state = AppState {
        config: config.clone(),
        tera,
        store,
        client,
        backend,
    };

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .configure(|cfg| state.configure(cfg))
    })
    .bind((host, port))?
    .run()
    .await?;

    info!("Server stopped. Uptime: {:?}", startup_time.elapsed());
    Ok(())
}

/// Shared services handed to every worker.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub tera: Tera,
    pub store: SessionStore,
    pub client: HttpExtractionClient,
    pub backend: Arc<dyn ExtractionBackend>,
}

impl AppState {
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.tera.clone()))
            .app_data(web::Data::new(self.store.clone()))
            .app_data(web::Data::new(self.client.clone()))
            .app_data(web::Data::from(self.backend.clone()))
            .app_data(web::JsonConfig::default().limit(MAX_FILE_SIZE as usize));
        configure_routes(cfg);
        cfg.service(Files::new("/static", self.config.static_dir.clone()));
    }
}

fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::index))
        .route("/api/state", web::get().to(handlers::get_state))
        .route("/api/file", web::post().to(handlers::upload_file))
        .route("/api/extract", web::post().to(handlers::perform_ocr))
        .route("/api/text", web::put().to(handlers::edit_text))
        .route(
            "/api/transform/{kind}",
            web::post().to(handlers::transform_text),
        )
        .route(
            "/api/toggle-original",
            web::post().to(handlers::toggle_original),
        )
        .route("/api/dismiss-error", web::post().to(handlers::dismiss_error))
        .route("/api/clear", web::post().to(handlers::clear_all))
        .route("/api/download", web::post().to(handlers::create_download))
        .route("/api/backend", web::get().to(handlers::backend_status))
        .route("/blob/{id}", web::get().to(handlers::get_blob))
        .route("/healthz", web::get().to(|| async { "OK" }));
}

fn print_banner(host: &str, port: u16) {
    let banner = r#"
  ___   ____ ____    ____            _
 / _ \ / ___|  _ \  |  _ \  ___  ___| | __
| | | | |   | |_) | | | | |/ _ \/ __| |/ /
| |_| | |___|  _ <  | |_| |  __/\__ \   <
 \___/ \____|_| \_\ |____/ \___||___/_|\_\
"#;
    println!("{}", banner);
    println!("         OCR Desk started at: http://{}:{}\n", host, port);
}
