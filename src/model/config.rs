use clap::{Parser, command};
use serde::{Deserialize, Serialize};

/**
 * Command-line arguments for the application.
 */
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct ApplicationArguments {
    /**
     * Path to the configuration file.
     */
    #[arg(short, long)]
    pub config_file: String,
}

/**
 * Represents the configuration for the application.
 */
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /**
     * Logging configuration for the application.
     */
    pub logging: LoggingConfig,
    /**
     * Security configuration for the application.
     */
    pub security: AppSecurity,
    /**
     * Server configuration for the application.
     */
    pub server: Server,
    /**
     * Database configuration for the application.
     */
    pub database: Database,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /**
     * Whether to log the target of the log message.
     */
    pub target: bool,
    /**
     * Whether to log thread IDs .
     */
    pub thread_ids: bool,
    /**
     * Whether to log thread names.
     */
    pub thread_names: bool,
    /**
     * Whether to log line numbers.
     */
    pub line_number: bool,
    /**
     * Whether to log the log level.
     */
    pub level: bool,
    /**
     * Whether to use ANSI colors in logs.
     */
    pub ansi: bool,
    /**
     * Whether to log the source file.
     */
    pub file: bool,
    /**
     * Additional filter directives, e.g. `car_rental_analytics=debug`.
     */
    pub directives: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { target: true, thread_ids: true, thread_names: true, line_number: true, level: true, ansi: true, file: true, directives: vec![] }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    /**
     * Where the dashboard documents are read from.
     */
    pub db_type: DatabaseType,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DatabaseType {
    /**
     * `PostgreSQL` database holding documents in a JSONB table.
     */
    #[serde(rename_all = "camelCase")]
    Postgresql { connection_string: String, max_connections: u32, min_connections: u32, acquire_timeout: u64, acquire_slow_threshold: u64, idle_timeout: u64, max_lifetime: u64 },
    /**
     * JSON file with one array of documents per collection, loaded once at startup.
     */
    #[serde(rename_all = "camelCase")]
    SeedFile { path: String },
}

/**
 * Bearer token validation settings.
 */
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSecurity {
    /**
     * Key used to verify incoming JWTs.
     */
    pub jwt_key: JwtKeyType,
    /**
     * Reject tokens whose `admin` claim is not true.
     */
    #[serde(default)]
    pub require_admin: bool,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub enum JwtKeyType {
    /**
     * PEM encoded public key file (RS*, ES*, EdDSA).
     */
    #[serde(rename_all = "camelCase")]
    PublicKeyFile { path: String, algorithm: String },
    /**
     * Shared secret for HS* algorithms.
     */
    #[serde(rename_all = "camelCase")]
    SharedSecret { secret: String, algorithm: String },
}

/**
 * Represents the server configuration for the application.
 */
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    /**
     * Number of worker threads for the server.
     */
    pub workers: usize,
    /**
     * Address to bind to.
     */
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /**
     * HTTP port for the server.
     */
    pub http_port: Option<u16>,
    /**
     * HTTPS configuration for the server.
     */
    pub https_config: Option<HttpsConfig>,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

/**
 * Represents the HTTPS configuration for the server.
 */
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpsConfig {
    /**
     * Port for the HTTPS server.
     */
    pub port: u16,
    /**
     * Path to the certificate file.
     */
    pub certificate_file: String,
    /**
     * Path to the private key file.
     */
    pub private_key_file: String,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_config_serialization_postgresql() {
        let config = Config {
            logging: LoggingConfig::default(),
            database: Database {
                db_type: DatabaseType::Postgresql {
                    connection_string: "postgres://localhost/rental".to_string(),
                    max_connections: 5,
                    min_connections: 1,
                    acquire_timeout: 30,
                    acquire_slow_threshold: 60,
                    idle_timeout: 300,
                    max_lifetime: 3600,
                },
            },
            security: AppSecurity { jwt_key: JwtKeyType::SharedSecret { secret: "test".to_string(), algorithm: "HS256".to_string() }, require_admin: true },
            server: Server { workers: 4, bind_address: "0.0.0.0".to_string(), http_port: Some(8080), https_config: None },
        };
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config.logging.target, deserialized.logging.target);
        assert_eq!(config.logging.thread_ids, deserialized.logging.thread_ids);
        assert_eq!(config.logging.line_number, deserialized.logging.line_number);
        assert_eq!(config.logging.level, deserialized.logging.level);
        assert_eq!(config.logging.ansi, deserialized.logging.ansi);
        assert_eq!(config.logging.file, deserialized.logging.file);
        assert_eq!(config.logging.directives, deserialized.logging.directives);
        assert_eq!(config.server.workers, deserialized.server.workers);
        assert_eq!(config.server.bind_address, deserialized.server.bind_address);
        assert_eq!(config.server.http_port, deserialized.server.http_port);
        assert!(deserialized.server.https_config.is_none());
        assert_eq!(deserialized.security.jwt_key, JwtKeyType::SharedSecret { secret: "test".to_string(), algorithm: "HS256".to_string() });
        assert!(deserialized.security.require_admin);
        assert!(matches!(deserialized.database.db_type, DatabaseType::Postgresql { max_connections: 5, .. }));
    }

    #[test]
    fn test_config_parse_seed_file() {
        let config_str = r#"
            [logging]
            target = true
            threadIds = false
            threadNames = false
            lineNumber = true
            level = true
            ansi = false
            file = false
            directives = ["car_rental_analytics=debug"]

            [security.jwtKey.publicKeyFile]
            path = "./config/jwt_public_key.pem"
            algorithm = "RS256"

            [server]
            workers = 2
            httpPort = 8080

            [database.dbType.seedFile]
            path = "./config/seed.json"
        "#;
        let config: Config = toml::from_str(config_str).unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert!(!config.security.require_admin);
        assert_eq!(config.security.jwt_key, JwtKeyType::PublicKeyFile { path: "./config/jwt_public_key.pem".to_string(), algorithm: "RS256".to_string() });
        assert!(matches!(config.database.db_type, DatabaseType::SeedFile { ref path } if path == "./config/seed.json"));
        assert_eq!(config.logging.directives, vec!["car_rental_analytics=debug".to_string()]);
    }
}
