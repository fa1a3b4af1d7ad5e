use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Command-line flags. Every setting is optional here so that an absent flag
/// never shadows a value from the TOML file or the environment.
#[derive(Parser, Serialize, Clone, Debug)]
#[command(name = "paste-server", version, about = "Encrypted, versioned pastebin server")]
pub struct Cli {
    /// Path to TOML config file
    #[arg(long, default_value = "./paste.toml")]
    #[serde(skip)]
    pub config: String,

    /// Output a commented TOML config template and exit
    #[arg(long)]
    #[serde(skip)]
    pub generate_config: bool,

    /// Print a freshly generated encryption key and exit
    #[arg(long)]
    #[serde(skip)]
    pub generate_key: bool,

    /// Port to listen on
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Bind address
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_address: Option<String>,

    /// Enable structured JSON logging (for Docker/production)
    #[arg(long)]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub json_logs: bool,

    /// Data directory for the SQLite database
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,

    /// SQLite file name inside the data directory
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_file: Option<String>,

    /// Encryption key (32 bytes, URL-safe base64)
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypt_key: Option<String>,

    /// How long a write waits for the SQLite lock, in milliseconds
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub busy_timeout_ms: Option<u64>,

    /// Maximum request body size in bytes
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_paste_bytes: Option<usize>,
}

/// Resolved server configuration.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Config {
    pub port: u16,
    pub bind_address: String,
    pub json_logs: bool,
    pub data_dir: String,
    pub database_file: String,
    /// Absent means an ephemeral key is generated at startup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypt_key: Option<String>,
    pub busy_timeout_ms: u64,
    pub max_paste_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_address: "0.0.0.0".to_string(),
            json_logs: false,
            data_dir: "./data".to_string(),
            database_file: "paste.db".to_string(),
            encrypt_key: None,
            busy_timeout_ms: 5000,
            max_paste_bytes: 1024 * 1024,
        }
    }
}

impl Config {
    /// Load config with layered precedence:
    /// built-in defaults < TOML file < env vars (ENCRYPT_KEY, then PASTE_*) < CLI args
    pub fn load(cli: &Cli) -> Result<Self, figment::Error> {
        Self::figment(cli).extract()
    }

    pub fn figment(cli: &Cli) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&cli.config))
            .merge(Env::raw().only(&["ENCRYPT_KEY"]))
            .merge(Env::prefixed("PASTE_"))
            .merge(Serialized::defaults(cli))
    }
}

/// Generate a commented TOML config template
pub fn generate_config_template() -> String {
    r#"# Paste Server Configuration
# Place this file at ./paste.toml or specify with --config <path>
# All settings can be overridden via environment variables (PASTE_PORT, etc.)
# or CLI flags (--port, etc.)

# Server port (default: 8080)
# port = 8080

# Bind address (default: 0.0.0.0, all interfaces)
# bind_address = "0.0.0.0"

# Enable structured JSON logging for Docker/production
# json_logs = false

# Data directory and SQLite file name
# data_dir = "./data"
# database_file = "paste.db"

# Encryption key for stored pastes: 32 random bytes, URL-safe base64.
# Generate one with: paste-server --generate-key
# Prefer setting PASTE_ENCRYPT_KEY (or ENCRYPT_KEY) in the environment.
# If unset, a random key is used for this process only and every paste
# written becomes unreadable after a restart.
# encrypt_key = ""

# How long a write waits for the SQLite lock, in milliseconds
# busy_timeout_ms = 5000

# Maximum request body size in bytes (default: 1 MiB)
# max_paste_bytes = 1048576
"#
    .to_string()
}
