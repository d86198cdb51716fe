use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use std::{env, str::FromStr, time::Duration};

/// Which object-storage backend the gateway fronts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackend {
    /// AWS S3, credentials from the standard AWS environment.
    S3,
    /// Files under `storage_dir`.
    Disk,
    /// Process memory; lost on restart.
    Memory,
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub storage_backend: StorageBackend,
    pub storage_dir: String,
    pub request_timeout: Duration,
    pub max_upload_bytes: usize,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Permission-gated gateway for object storage buckets")]
pub struct Args {
    /// Host to bind to (overrides BUCKET_GATEWAY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides BUCKET_GATEWAY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides BUCKET_GATEWAY_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Storage backend (overrides BUCKET_GATEWAY_STORAGE_BACKEND)
    #[arg(long, value_enum)]
    pub storage_backend: Option<StorageBackend>,

    /// Root directory for the disk backend (overrides BUCKET_GATEWAY_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Per-request timeout in seconds (overrides BUCKET_GATEWAY_REQUEST_TIMEOUT_SECS)
    #[arg(long)]
    pub request_timeout_secs: Option<u64>,

    /// Largest accepted request body (overrides BUCKET_GATEWAY_MAX_UPLOAD_BYTES)
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP gateway (default)
    Serve,
    /// Apply the database schema and exit
    Migrate,
    /// Create a user and print a fresh API token
    CreateUser { username: String },
    /// Disable a user; their tokens stop authenticating
    DeactivateUser { username: String },
    /// Print an additional API token for an existing user
    IssueToken { username: String },
    /// Register a bucket and print its id
    CreateBucket {
        /// Physical bucket name at the storage backend
        #[arg(long)]
        name: String,
        #[arg(long)]
        region: String,
        /// Key prefix scoping every object of this bucket
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Add a permission grant for a user on a bucket
    Grant {
        #[arg(long)]
        username: String,
        #[arg(long)]
        bucket_id: i64,
        #[arg(long)]
        view: bool,
        #[arg(long)]
        upload: bool,
        #[arg(long)]
        delete: bool,
    },
    /// Show permission grants
    ListGrants {
        #[arg(long)]
        username: Option<String>,
    },
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and the command to run.
    pub fn from_env_and_args() -> Result<(Self, Command)> {
        Self::resolve(Args::parse(), |name| env::var(name).ok())
    }

    /// Merge parsed CLI args over values looked up through `env`.
    pub fn resolve(args: Args, env: impl Fn(&str) -> Option<String>) -> Result<(Self, Command)> {
        let env_host = env("BUCKET_GATEWAY_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let env_port = env_parsed(&env, "BUCKET_GATEWAY_PORT", 8000u16)?;
        let env_db = env("BUCKET_GATEWAY_DATABASE_URL")
            .unwrap_or_else(|| "sqlite://./data/gateway.db".into());
        let env_backend = match env("BUCKET_GATEWAY_STORAGE_BACKEND") {
            Some(value) => <StorageBackend as ValueEnum>::from_str(&value, true).map_err(|err| {
                anyhow!("parsing BUCKET_GATEWAY_STORAGE_BACKEND value `{}`: {}", value, err)
            })?,
            None => StorageBackend::S3,
        };
        let env_storage =
            env("BUCKET_GATEWAY_STORAGE_DIR").unwrap_or_else(|| "./data/objects".into());
        let env_timeout = env_parsed(&env, "BUCKET_GATEWAY_REQUEST_TIMEOUT_SECS", 30u64)?;
        let env_max_upload =
            env_parsed(&env, "BUCKET_GATEWAY_MAX_UPLOAD_BYTES", 100 * 1024 * 1024usize)?;

        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            database_url: args.database_url.unwrap_or(env_db),
            storage_backend: args.storage_backend.unwrap_or(env_backend),
            storage_dir: args.storage_dir.unwrap_or(env_storage),
            request_timeout: Duration::from_secs(args.request_timeout_secs.unwrap_or(env_timeout)),
            max_upload_bytes: args.max_upload_bytes.unwrap_or(env_max_upload),
        };

        Ok((cfg, args.command.unwrap_or(Command::Serve)))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_parsed<T>(env: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env(name) {
        Some(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve(argv: &[&str], vars: &[(&str, &str)]) -> Result<(AppConfig, Command)> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let args = Args::try_parse_from(argv).unwrap();
        AppConfig::resolve(args, |name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_without_env_or_flags() {
        let (cfg, command) = resolve(&["bucket-gateway"], &[]).unwrap();
        assert_eq!(cfg.addr(), "0.0.0.0:8000");
        assert_eq!(cfg.storage_backend, StorageBackend::S3);
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
        assert_eq!(command, Command::Serve);
    }

    #[test]
    fn flags_override_environment() {
        let (cfg, _) = resolve(
            &["bucket-gateway", "--port", "9100", "--storage-backend", "memory"],
            &[
                ("BUCKET_GATEWAY_PORT", "9000"),
                ("BUCKET_GATEWAY_HOST", "127.0.0.1"),
                ("BUCKET_GATEWAY_STORAGE_BACKEND", "disk"),
            ],
        )
        .unwrap();
        assert_eq!(cfg.addr(), "127.0.0.1:9100");
        assert_eq!(cfg.storage_backend, StorageBackend::Memory);
    }

    #[test]
    fn malformed_environment_is_an_error() {
        let err = resolve(&["bucket-gateway"], &[("BUCKET_GATEWAY_PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("BUCKET_GATEWAY_PORT"));

        assert!(
            resolve(&["bucket-gateway"], &[("BUCKET_GATEWAY_STORAGE_BACKEND", "ftp")]).is_err()
        );
    }

    #[test]
    fn grant_subcommand_parses_flags() {
        let (_, command) = resolve(
            &[
                "bucket-gateway",
                "grant",
                "--username",
                "alice",
                "--bucket-id",
                "42",
                "--view",
            ],
            &[],
        )
        .unwrap();
        assert_eq!(
            command,
            Command::Grant {
                username: "alice".into(),
                bucket_id: 42,
                view: true,
                upload: false,
                delete: false,
            }
        );
    }
}
