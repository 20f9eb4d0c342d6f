use actix_cors::Cors;
use actix_web::{dev::Service, middleware, web, App, HttpServer};
use anyhow::{anyhow, Context};
use contest_api::{
    chain_client::JsonRpcChainClient, config::Config, handlers, metrics,
    pinning_client::PinataClient, services::ContestService,
};
use contest_core::ContestBook;
use dotenv::dotenv;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize tracing
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false)
        .json()
        .init();

    info!("Starting Contest API...");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config
        .validate()
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;

    info!("Configuration loaded successfully");

    metrics::init().context("Failed to register metrics")?;

    // Open the contest book
    let book = Arc::new(
        ContestBook::open(&config.storage_config()).context("Failed to open contest store")?,
    );

    info!(data_dir = %config.storage.data_dir, "Contest store opened");

    // Initialize collaborators
    let chain = Arc::new(JsonRpcChainClient::new(&config.chain)?);
    if config.pinning.jwt.is_empty() {
        warn!("Pinning JWT is not set; /api/pinFile will fail");
    }
    let pinning = Arc::new(PinataClient::new(&config.pinning)?);

    info!(rpc_url = %config.chain.rpc_url, "Chain client initialized");

    let service = Arc::new(ContestService::new(book, chain, pinning));
    let service_data = web::Data::new(service.clone());

    // Start HTTP server
    let server_config = config.server.clone();

    info!(
        "Starting HTTP server on {}:{}",
        server_config.host, server_config.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(service_data.clone())
            .wrap_fn(|req, srv| {
                let method = req.method().to_string();
                let started = Instant::now();
                let fut = srv.call(req);
                async move {
                    let res = fut.await?;
                    let path = res
                        .request()
                        .match_pattern()
                        .unwrap_or_else(|| "unmatched".to_string());
                    metrics::HTTP_REQUEST_DURATION
                        .with_label_values(&[method.as_str(), path.as_str()])
                        .observe(started.elapsed().as_secs_f64());
                    metrics::HTTP_REQUESTS_TOTAL
                        .with_label_values(&[method.as_str(), path.as_str(), res.status().as_str()])
                        .inc();
                    Ok(res)
                }
            })
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(middleware::Logger::default())
            .wrap(middleware::NormalizePath::trim())
            .configure(handlers::configure_routes)
    })
    .workers(server_config.workers)
    .bind((server_config.host, server_config.port))?
    .run()
    .await?;

    service.shutdown()?;

    info!("Contest API stopped");
    Ok(())
}
