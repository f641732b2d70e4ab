//! CLI argument definitions for the Dossier binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Storage backend type
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Backend {
    /// SQLite database (default, production-ready)
    Sqlite,
    /// PostgreSQL database (for shared deployments)
    Postgres,
    /// In-memory with JSON persistence (for development and ephemeral deployments)
    Inmemory,
}

/// Dossier user data server
#[derive(Parser, Debug)]
#[command(name = "dossier")]
#[command(about = "Dossier: accounts, profiles, settings and files behind one API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the Dossier server
    Serve(ServeArgs),
    /// Check health of a running Dossier server
    Health(HealthArgs),
    /// Show account, profile, settings and file totals
    Info(InfoArgs),
    /// List accounts
    Accounts(InfoArgs),
}

/// Storage options
#[derive(clap::Args, Debug, Clone)]
pub struct BackendConfig {
    /// Storage backend to use
    #[arg(short, long, default_value = "sqlite", env = "DOSSIER_BACKEND")]
    pub backend: Backend,

    /// Data directory for storage files.
    /// For SQLite: stores dossier.db
    /// For InMemory: stores dossier.json
    /// For uploads: stores files/
    #[arg(short = 'D', long, env = "DOSSIER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// PostgreSQL connection URL (required when backend=postgres)
    #[arg(long, env = "DOSSIER_POSTGRES_URL")]
    pub postgres_url: Option<String>,
}

/// Token signing options
#[derive(clap::Args, Debug, Clone)]
pub struct TokenArgs {
    /// Secret used to sign bearer tokens. A random secret is generated when
    /// unset, so tokens do not survive a restart.
    #[arg(long, env = "DOSSIER_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Token issuer claim
    #[arg(long, default_value = "dossier", env = "DOSSIER_JWT_ISSUER")]
    pub jwt_issuer: String,

    /// Token audience claim
    #[arg(long, default_value = "dossier-api", env = "DOSSIER_JWT_AUDIENCE")]
    pub jwt_audience: String,

    /// Token lifetime in seconds
    #[arg(long, default_value_t = 86_400, env = "DOSSIER_TOKEN_TTL")]
    pub token_ttl: u64,
}

/// Arguments for the serve command
#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = 3000, env = "DOSSIER_PORT")]
    pub port: u16,

    /// Bind address
    #[arg(long, default_value = "0.0.0.0", env = "DOSSIER_HOST")]
    pub host: String,

    #[command(flatten)]
    pub backend_config: BackendConfig,

    #[command(flatten)]
    pub tokens: TokenArgs,

    /// Base URL under which uploaded files are served
    #[arg(long, default_value = "http://localhost:3000/files", env = "DOSSIER_PUBLIC_URL")]
    pub public_url: String,

    /// Directory mirroring every upload. Uploads still succeed when the
    /// mirror cannot be written.
    #[arg(long, env = "DOSSIER_MIRROR_DIR")]
    pub mirror_dir: Option<PathBuf>,

    /// Email of the administrator created on first start
    #[arg(long, env = "DOSSIER_ADMIN_EMAIL", requires = "admin_password")]
    pub admin_email: Option<String>,

    /// Password of the administrator created on first start
    #[arg(long, env = "DOSSIER_ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,
}

impl ServeArgs {
    /// Serve arguments taken from defaults and environment variables only,
    /// used when no subcommand is given.
    pub fn from_env() -> Self {
        #[derive(Parser)]
        struct ServeOnly {
            #[command(flatten)]
            args: ServeArgs,
        }
        ServeOnly::parse_from(["dossier"]).args
    }
}

/// Arguments for the offline inspection commands
#[derive(clap::Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub backend_config: BackendConfig,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the health command
#[derive(clap::Args, Debug)]
pub struct HealthArgs {
    /// Base URL of the server to check
    #[arg(long, default_value = "http://127.0.0.1:3000", env = "DOSSIER_URL")]
    pub url: String,

    /// Timeout in seconds
    #[arg(short, long, default_value_t = 5)]
    pub timeout: u64,
}
