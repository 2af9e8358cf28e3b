//! Command line and environment configuration

use clap::Parser;
use rbac_authz::{RetryPolicy, StoreConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Domain RBAC API Server
#[derive(Parser, Debug, Clone)]
#[command(
    name = "rbac-server",
    version,
    about = "Multi-tenant RBAC enforcement and policy administration service",
    long_about = None
)]
pub struct Args {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "RBAC_HOST")]
    pub host: String,

    /// Port to listen on
    #[arg(short = 'p', long, default_value = "6543", env = "PORT")]
    pub port: u16,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Table holding the tuples
    #[arg(long, default_value = "casbin_rule", env = "TABLE_NAME")]
    pub table_name: String,

    /// Flat policy file, used when no database is configured
    #[arg(long, env = "POLICY_PATH")]
    pub policy_path: Option<PathBuf>,

    /// Deployment environment; `development` forces ./policy.csv
    #[arg(long = "env", env = "ENV")]
    pub environment: Option<String>,

    /// Store connection attempts before giving up
    #[arg(long, default_value = "5", env = "STORE_CONNECT_RETRIES")]
    pub connect_retries: u32,

    /// Delay between store connection attempts, in milliseconds
    #[arg(long, default_value = "2000", env = "STORE_CONNECT_DELAY_MS")]
    pub connect_delay_ms: u64,

    /// Reload the snapshot from the store every N seconds (0 disables)
    #[arg(long, default_value = "0", env = "RELOAD_INTERVAL_SECS")]
    pub reload_interval_secs: u64,

    /// Enable JSON logging format
    #[arg(long, env = "RBAC_JSON_LOGS")]
    pub json_logs: bool,

    /// Log level (trace, debug, info, warn, error). `RUST_LOG`, when set,
    /// takes precedence with full filter directives.
    #[arg(short = 'l', long, default_value = "info", env = "RBAC_LOG_LEVEL")]
    pub log_level: String,
}

impl Args {
    pub fn is_development(&self) -> bool {
        self.environment.as_deref() == Some("development")
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.connect_retries, Duration::from_millis(self.connect_delay_ms))
    }

    /// Backend chosen from the settings
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::select(
            self.is_development(),
            self.database_url.clone(),
            Some(self.table_name.clone()),
            self.policy_path.clone(),
            self.retry_policy(),
        )
    }

    pub fn reload_interval(&self) -> Option<Duration> {
        (self.reload_interval_secs > 0).then(|| Duration::from_secs(self.reload_interval_secs))
    }

    /// Parsed `--log-level`; `None` if it is not a plain level name
    pub fn tracing_level(&self) -> Option<tracing::Level> {
        self.log_level.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["rbac-server"]);

        assert_eq!(args.host, "0.0.0.0");
        assert_eq!(args.port, 6543);
        assert_eq!(args.table_name, "casbin_rule");
        assert_eq!(args.connect_retries, 5);
        assert_eq!(args.connect_delay_ms, 2000);
        assert!(args.reload_interval().is_none());
        assert!(!args.json_logs);
    }

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from([
            "rbac-server",
            "--host",
            "127.0.0.1",
            "--port",
            "9090",
            "--database-url",
            "",
            "--env",
            "production",
            "--policy-path",
            "/etc/rbac/policy.csv",
            "--reload-interval-secs",
            "30",
        ]);

        assert_eq!(args.host, "127.0.0.1");
        assert_eq!(args.port, 9090);
        assert_eq!(args.reload_interval(), Some(Duration::from_secs(30)));
        assert!(matches!(args.store_config(), StoreConfig::File { .. }));
    }

    #[test]
    fn test_development_forces_local_file() {
        let args = Args::parse_from([
            "rbac-server",
            "--env",
            "development",
            "--policy-path",
            "/x.csv",
        ]);
        assert!(args.is_development());
        match args.store_config() {
            StoreConfig::File { path } => assert_eq!(path, PathBuf::from("./policy.csv")),
            other => panic!("unexpected store config: {:?}", other),
        }
    }

    #[test]
    fn test_retry_policy_from_args() {
        let args = Args::parse_from([
            "rbac-server",
            "--connect-retries",
            "3",
            "--connect-delay-ms",
            "10",
        ]);
        assert_eq!(args.retry_policy(), RetryPolicy::new(3, Duration::from_millis(10)));
    }

    #[test]
    fn test_log_level_not_read_from_rust_log() {
        let command = Args::command();
        let arg = command
            .get_arguments()
            .find(|arg| arg.get_id() == "log_level")
            .unwrap();
        assert_eq!(arg.get_env().and_then(|env| env.to_str()), Some("RBAC_LOG_LEVEL"));
    }

    #[test]
    fn test_tracing_level() {
        let args = Args::parse_from(["rbac-server", "--log-level", "debug"]);
        assert_eq!(args.tracing_level(), Some(tracing::Level::DEBUG));

        let args = Args::parse_from(["rbac-server", "--log-level", "rbac_authz=debug"]);
        assert_eq!(args.tracing_level(), None);
    }
}
