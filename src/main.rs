mod api {
    pub mod endpoints;
    pub mod middleware;
    pub mod rest;
    pub mod security;
    pub mod state;
}
mod dao {
    pub mod documents;
    pub mod store;
}
mod model {
    pub mod apperror;
    pub mod config;
    pub mod dates;
    pub mod db;
    pub mod models;
    pub mod records;
}
mod service {
    pub mod aggregation;
    pub mod analytics;
}

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::api::endpoints::{category_performance, dashboard_summary, recent_rentals, rentals_trend, report, revenue, station_performance, top_cars};
use crate::api::middleware::timing_middleware;
use crate::api::security::JwtSecurityService;
use crate::api::state::AppState;
use crate::dao::documents::DocumentDao;
use crate::dao::store::{ConfiguredStore, PostgresDocumentStore, SeedDocumentStore};
use crate::model::apperror::{ApplicationError, ErrorType};
use crate::model::config::{ApplicationArguments, Config, DatabaseType, HttpsConfig, LoggingConfig};
use crate::service::analytics::AnalyticsService;

use actix_web::middleware::from_fn;
use actix_web::{App, HttpServer, web};
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use clap::Parser;
use prometheus::IntGauge;
use rustls::pki_types::PrivateKeyDer;
use rustls::{ServerConfig, SupportedProtocolVersion};
use rustls_pemfile::{certs, pkcs8_private_keys};
use sqlx::{Pool, Postgres, pool::PoolOptions};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = ApplicationArguments::parse();

    let config = get_config(&args.config_file)?;

    init_tracing(&config.logging)?;

    let (store, connection_pool) = init_store(&config.database.db_type).await?;

    let jwt_service = JwtSecurityService::from_config(&config.security).map_err(|err| std::io::Error::other(format!("Failed to initialize JWT validation: {err}")))?;

    let state = web::Data::new(AppState::new(jwt_service, AnalyticsService::new(store)));

    let prometheus = PrometheusMetricsBuilder::new("")
        .endpoint("/metrics")
        .mask_unmatched_patterns("UNKNOWN")
        .build()
        .map_err(|err| std::io::Error::other(format!("Failed to create Prometheus metrics: {err}")))?;

    if let Some(connection_pool) = connection_pool {
        register_pool_metrics(&prometheus, connection_pool)?;
    }

    let server_init = HttpServer::new(move || {
        App::new()
            .wrap(prometheus.clone())
            .wrap(from_fn(timing_middleware))
            .app_data(state.clone())
            .service(dashboard_summary)
            .service(revenue)
            .service(rentals_trend)
            .service(top_cars)
            .service(station_performance)
            .service(category_performance)
            .service(recent_rentals)
            .service(report)
    });

    let bind_address = config.server.bind_address.as_str();
    let server_init = if let Some(http_port) = config.server.http_port {
        info!("Listening for HTTP on {}:{}", bind_address, http_port);
        server_init.bind((bind_address, http_port))?
    } else {
        server_init
    };
    let server_init = if let Some(https_config) = &config.server.https_config {
        let ssl_builder = ssl_builder(https_config).map_err(|err| std::io::Error::other(format!("Failed to create SSL/TLS configuration: {err}")))?;
        info!("Listening for HTTPS on {}:{}", bind_address, https_config.port);
        server_init.bind_rustls_0_23((bind_address, https_config.port), ssl_builder).map_err(|err| std::io::Error::other(format!("Failed to bind HTTPS server: {err}")))?
    } else {
        server_init
    };

    server_init.workers(config.server.workers).run().await
}

/**
 * Initializes structured logging from the logging section of the configuration.
 *
 * `RUST_LOG` sets the base filter, `directives` are added on top of it.
 *
 * #Arguments
 * `logging`: The logging configuration.
 *
 * #Returns
 * A `Result` indicating success or failure.
 */
fn init_tracing(logging: &LoggingConfig) -> Result<(), std::io::Error> {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    for directive in &logging.directives {
        let directive = directive.parse::<Directive>().map_err(|err| std::io::Error::other(format!("Invalid log directive {directive}: {err}")))?;
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(logging.target)
        .with_thread_ids(logging.thread_ids)
        .with_thread_names(logging.thread_names)
        .with_line_number(logging.line_number)
        .with_level(logging.level)
        .with_ansi(logging.ansi)
        .with_file(logging.file)
        .try_init()
        .map_err(|err| std::io::Error::other(format!("Failed to initialize logging: {err}")))
}

/**
 * Creates the configured document store.
 *
 * #Arguments
 * `db_type`: The database section of the configuration.
 *
 * #Returns
 * The store, and the connection pool when the store is backed by `PostgreSQL`.
 */
async fn init_store(db_type: &DatabaseType) -> Result<(ConfiguredStore, Option<Arc<Pool<Postgres>>>), std::io::Error> {
    match db_type {
        DatabaseType::Postgresql { connection_string, max_connections, min_connections, acquire_timeout, acquire_slow_threshold, idle_timeout, max_lifetime } => {
            let connection_pool = PoolOptions::<Postgres>::new()
                .max_connections(*max_connections)
                .min_connections(*min_connections)
                .acquire_timeout(Duration::from_millis(*acquire_timeout))
                .acquire_slow_threshold(Duration::from_millis(*acquire_slow_threshold))
                .idle_timeout(Duration::from_millis(*idle_timeout))
                .max_lifetime(Duration::from_millis(*max_lifetime))
                .connect(connection_string.as_str())
                .await
                .map_err(|err| std::io::Error::other(format!("Failed to create database pool: {err}")))?;
            let connection_pool = Arc::new(connection_pool);
            info!("Reading documents from PostgreSQL");
            Ok((ConfiguredStore::Postgres(PostgresDocumentStore::new(DocumentDao::new(), connection_pool.clone())), Some(connection_pool)))
        }
        DatabaseType::SeedFile { path } => {
            let store = SeedDocumentStore::from_file(path).map_err(|err| std::io::Error::other(format!("Failed to load seed file: {err}")))?;
            info!("Reading documents from seed file {}", path);
            Ok((ConfiguredStore::Seed(store), None))
        }
    }
}

/**
 * Registers connection pool gauges and refreshes them every second in a separate thread.
 *
 * #Arguments
 * `prometheus_metrics`: The Prometheus metrics instance to register the gauges with.
 * `connection_pool`: The connection pool to gather metrics from.
 */
fn register_pool_metrics(prometheus_metrics: &PrometheusMetrics, connection_pool: Arc<Pool<Postgres>>) -> Result<(), std::io::Error> {
    let max_connections_gauge = register_gauge(prometheus_metrics, "max_connections", "Connection pool maximum")?;
    let min_connections_gauge = register_gauge(prometheus_metrics, "min_connections", "Connection pool minimum")?;
    let active_connections_gauge = register_gauge(prometheus_metrics, "active_connections", "Connection pool active")?;
    let idle_connections_gauge = register_gauge(prometheus_metrics, "idle_connections", "Connection pool idle")?;
    thread::spawn(move || {
        loop {
            max_connections_gauge.set(i64::from(connection_pool.options().get_max_connections()));
            min_connections_gauge.set(i64::from(connection_pool.options().get_min_connections()));
            active_connections_gauge.set(i64::from(connection_pool.size()));
            idle_connections_gauge.set(i64::try_from(connection_pool.num_idle()).unwrap_or(i64::MAX));
            thread::sleep(Duration::from_secs(1));
        }
    });
    Ok(())
}

fn register_gauge(prometheus_metrics: &PrometheusMetrics, name: &str, help: &str) -> Result<IntGauge, std::io::Error> {
    let gauge = IntGauge::new(name, help).map_err(|err| std::io::Error::other(format!("Failed to create {name} gauge: {err}")))?;
    prometheus_metrics.registry.register(Box::new(gauge.clone())).map_err(|err| std::io::Error::other(format!("Failed to register {name} gauge: {err}")))?;
    Ok(gauge)
}

/**
 * Initializes the SSL/TLS configuration for the server.
 *
 * #Arguments
 * `https_config`: The HTTPS configuration containing the certificate and private key files.
 *
 * #Returns
 * A `Result` containing the initialized `ServerConfig` or an `ApplicationError` if initialization fails.
 */
fn ssl_builder(https_config: &HttpsConfig) -> Result<ServerConfig, ApplicationError> {
    let config_builder = ServerConfig::builder_with_protocol_versions(&get_protocol_versions());
    let cert_file = &mut std::io::BufReader::new(
        std::fs::File::open(&https_config.certificate_file).map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to read certificate file: {err}")))?,
    );
    let key_file = &mut std::io::BufReader::new(
        std::fs::File::open(&https_config.private_key_file).map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to read private key file: {err}")))?,
    );
    let cert_chain = certs(cert_file).collect::<Result<Vec<_>, _>>().map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to convert certificate to der: {err}")))?;
    let private_key = pkcs8_private_keys(key_file)
        .next()
        .ok_or_else(|| ApplicationError::new(ErrorType::Initialization, "No PKCS#8 private key found".to_string()))?
        .map(PrivateKeyDer::Pkcs8)
        .map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to convert private key to der: {err}")))?;
    config_builder
        .with_no_client_auth()
        .with_single_cert(cert_chain, private_key)
        .map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to create server config: {err}")))
}

fn get_protocol_versions() -> Vec<&'static SupportedProtocolVersion> {
    vec![&rustls::version::TLS13]
}

/**
 * Reads the configuration from the specified file.
 *
 * #Arguments
 * `config_file`: The path to the configuration file.
 *
 * #Returns
 * A `Result` containing the parsed `Config` or an `std::io::Error` if reading or parsing fails.
*/
fn get_config(config_file: &str) -> Result<Config, std::io::Error> {
    let config_str: String = std::fs::read_to_string(config_file).map_err(|err| std::io::Error::other(format!("Failed to read config file: {err}")))?;
    let config: Config = toml::from_str(&config_str).map_err(|err| std::io::Error::other(format!("Failed to parse config file: {err}")))?;
    Ok(config)
}
