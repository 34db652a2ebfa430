// Configuration module
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// 0 means one worker per CPU core
    #[serde(default)]
    pub workers: usize,
}

/// Database connection descriptor
///
/// `host` may be a hostname or an absolute Unix socket directory
/// (e.g. a Cloud SQL mount under `/cloudsql`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_db_host")]
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    #[serde(default = "default_db_name")]
    pub dbname: String,
    #[serde(default = "default_db_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
    /// Table whose first row is served. Must be a bare SQL identifier.
    #[serde(default = "default_table")]
    pub table: String,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_true")]
    pub log_to_console: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            host: default_db_host(),
            port: default_db_port(),
            dbname: default_db_name(),
            user: default_db_user(),
            password: String::new(),
            table: default_table(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_to_console: true,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            database: DatabaseSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_name() -> String {
    "postgres".to_string()
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_table() -> String {
    "global".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

fn default_true() -> bool {
    true
}

impl ServerConfig {
    /// Load configuration: TOML file when present, defaults otherwise,
    /// then environment overrides, then validation.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let mut config = if path.as_ref().exists() {
            Self::from_file(path.as_ref())?
        } else {
            eprintln!("Warning: {} not found, using defaults", path.as_ref().display());
            Self::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        let config: ServerConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Credentials must never live in source; the environment (or a secret
    /// manager writing into it) is the expected channel in deployments.
    ///
    /// Supported environment variables:
    /// - CREDFETCH_HOST / CREDFETCH_PORT: bind address
    /// - CREDFETCH_DB_HOST / CREDFETCH_DB_PORT: database endpoint
    /// - CREDFETCH_DB_NAME / CREDFETCH_DB_USER / CREDFETCH_DB_PASSWORD
    /// - CREDFETCH_DB_TABLE: table whose first row is served
    pub fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        use std::env;

        if let Ok(host) = env::var("CREDFETCH_HOST") {
            self.server.host = host;
        }

        if let Ok(port_str) = env::var("CREDFETCH_PORT") {
            self.server.port = port_str
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid CREDFETCH_PORT value: {}", port_str))?;
        }

        if let Ok(host) = env::var("CREDFETCH_DB_HOST") {
            self.database.host = host;
        }

        if let Ok(port_str) = env::var("CREDFETCH_DB_PORT") {
            self.database.port = port_str
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid CREDFETCH_DB_PORT value: {}", port_str))?;
        }

        if let Ok(dbname) = env::var("CREDFETCH_DB_NAME") {
            self.database.dbname = dbname;
        }

        if let Ok(user) = env::var("CREDFETCH_DB_USER") {
            self.database.user = user;
        }

        if let Ok(password) = env::var("CREDFETCH_DB_PASSWORD") {
            self.database.password = password;
        }

        if let Ok(table) = env::var("CREDFETCH_DB_TABLE") {
            self.database.table = table;
        }

        Ok(())
    }

    /// Validate configuration settings
    pub fn validate(&self) -> anyhow::Result<()> {
        // Validate port range
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        if self.database.port == 0 {
            return Err(anyhow::anyhow!("Database port cannot be 0"));
        }

        if self.database.host.is_empty() {
            return Err(anyhow::anyhow!("Database host cannot be empty"));
        }

        if self.database.dbname.is_empty() {
            return Err(anyhow::anyhow!("Database name cannot be empty"));
        }

        if self.database.user.is_empty() {
            return Err(anyhow::anyhow!("Database user cannot be empty"));
        }

        // The table name is interpolated into the fixed statement and must
        // never be an injection vector.
        if !is_bare_identifier(&self.database.table) {
            return Err(anyhow::anyhow!(
                "Invalid table name '{}'. Must be a bare SQL identifier",
                self.database.table
            ));
        }

        // Validate log level
        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            ));
        }

        // Validate log format
        let valid_formats = ["compact", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_formats.join(", ")
            ));
        }

        Ok(())
    }
}

impl DatabaseSettings {
    /// Render the libpq-style keyword/value connection string.
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={}",
            quote(&self.host),
            self.port,
            quote(&self.dbname),
            quote(&self.user),
            quote(&self.password)
        )
    }
}

/// True when `s` is a bare SQL identifier: `[A-Za-z_][A-Za-z0-9_]*`.
fn is_bare_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {},
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Quote a connection-string value.
///
/// Values containing whitespace, quotes, or backslashes are wrapped in
/// single quotes with backslash escaping, per libpq syntax. Empty values
/// render as `''`.
fn quote(value: &str) -> String {
    let needs_quoting = value.is_empty()
        || value.chars().any(|c| c.is_whitespace() || c == '\'' || c == '\\');
    if !needs_quoting {
        return value.to_string();
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_port() {
        let mut config = ServerConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = ServerConfig::default();
        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_format() {
        let mut config = ServerConfig::default();
        config.logging.format = "pretty-ish".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_db_user_rejected() {
        let mut config = ServerConfig::default();
        config.database.user = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_table_must_be_bare_identifier() {
        let mut config = ServerConfig::default();
        for bad in ["global; DROP TABLE users", "with space", "1starts_with_digit", ""] {
            config.database.table = bad.to_string();
            assert!(config.validate().is_err(), "accepted table name {:?}", bad);
        }
        for good in ["global", "_private", "Creds2"] {
            config.database.table = good.to_string();
            assert!(config.validate().is_ok(), "rejected table name {:?}", good);
        }
    }

    #[test]
    fn test_connection_string_plain_values() {
        let db = DatabaseSettings::default();
        assert_eq!(
            db.connection_string(),
            "host=localhost port=5432 dbname=postgres user=postgres password=''"
        );
    }

    #[test]
    fn test_connection_string_escapes_special_characters() {
        let db = DatabaseSettings {
            host: "/cloudsql/project:us-east4:rag".to_string(),
            port: 5432,
            dbname: "rag_global".to_string(),
            user: "postgres".to_string(),
            password: r"V%p]K'n<F1\|3g J".to_string(),
            table: "global".to_string(),
        };
        let dsn = db.connection_string();
        assert!(dsn.contains(r"password='V%p]K\'n<F1\\|3g J'"), "got: {}", dsn);
        // Unix socket paths have no characters needing quotes
        assert!(dsn.contains("host=/cloudsql/project:us-east4:rag"));
    }

    #[test]
    fn test_from_file_parses_partial_sections() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            "[database]\nhost = \"db.internal\"\ndbname = \"rag_global\"\n"
        )
        .expect("write config");

        let config = ServerConfig::from_file(file.path()).expect("parse");
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.dbname, "rag_global");
        // Omitted values fall back to defaults
        assert_eq!(config.database.table, "global");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("CREDFETCH_DB_PASSWORD", "from-env");
        std::env::set_var("CREDFETCH_DB_TABLE", "tenants");

        let mut config = ServerConfig::default();
        config.apply_env_overrides().expect("overrides");

        std::env::remove_var("CREDFETCH_DB_PASSWORD");
        std::env::remove_var("CREDFETCH_DB_TABLE");

        assert_eq!(config.database.password, "from-env");
        assert_eq!(config.database.table, "tenants");
    }

    #[test]
    fn test_invalid_env_port_rejected() {
        std::env::set_var("CREDFETCH_DB_PORT", "not-a-port");
        let mut config = ServerConfig::default();
        let result = config.apply_env_overrides();
        std::env::remove_var("CREDFETCH_DB_PORT");
        assert!(result.is_err());
    }
}
