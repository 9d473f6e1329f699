// src/main.rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use recipe_api::db::models::User;
use recipe_api::server::serializers::UserCreateRequest;
use recipe_api::server::{self, AppConfig};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "recipe-api")]
#[command(author, version, about = "Recipe API server with token authentication", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init {
        /// Database path
        #[arg(short, long, default_value = "/var/lib/recipe-api/recipe-api.db")]
        db_path: String,
    },
    /// Run the HTTP API server
    Serve {
        /// Path to a TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Bind address, overriding the config file
        #[arg(short, long)]
        bind: Option<String>,
        /// Database path, overriding the config file
        #[arg(short, long)]
        db_path: Option<PathBuf>,
    },
    /// Create an administrator account
    CreateSuperuser {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        #[arg(short, long, default_value = "")]
        name: String,
        /// Database path
        #[arg(short, long, default_value = "/var/lib/recipe-api/recipe-api.db")]
        db_path: String,
        /// TOML configuration file supplying the password policy
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Build the server configuration from an optional file plus CLI overrides
fn load_config(
    config: Option<PathBuf>,
    bind: Option<String>,
    db_path: Option<PathBuf>,
) -> Result<server::ServerConfig> {
    let mut app_config = match config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            AppConfig::load(&path)?
        }
        None => AppConfig::default(),
    };

    if let Some(bind) = bind {
        app_config.server.bind = bind;
    }
    if let Some(db_path) = db_path {
        app_config.storage.db_path = db_path;
    }

    app_config.validate()?;
    app_config.to_server_config()
}

/// Validate the account details like sign-up does, then create the account
fn create_superuser(
    db_path: &str,
    email: &str,
    password: &str,
    name: &str,
    min_password_length: usize,
) -> Result<User> {
    let request = UserCreateRequest {
        email: Some(email.to_string()),
        password: Some(password.to_string()),
        name: Some(name.to_string()),
    };
    let new_user = request
        .validate(min_password_length)
        .map_err(|errors| anyhow::anyhow!("Invalid superuser details: {}", errors))?;

    recipe_api::db::init(db_path)?;
    let conn = recipe_api::db::open(db_path)?;

    if User::email_taken(&conn, &new_user.email, None)? {
        anyhow::bail!("A user with email {} already exists", new_user.email);
    }

    User::create_superuser(&conn, &new_user.email, &new_user.password, &new_user.name)
        .context("Failed to create superuser")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init { db_path }) => {
            info!("Initializing database at: {}", db_path);
            recipe_api::db::init(&db_path)?;
            println!("Database initialized successfully at: {}", db_path);
            Ok(())
        }
        Some(Commands::Serve {
            config,
            bind,
            db_path,
        }) => {
            let config = load_config(config, bind, db_path)?;
            server::run_server(config).await
        }
        Some(Commands::CreateSuperuser {
            email,
            password,
            name,
            db_path,
            config,
        }) => {
            let app_config = match config {
                Some(path) => AppConfig::load(&path)?,
                None => AppConfig::default(),
            };

            let user = create_superuser(
                &db_path,
                &email,
                &password,
                &name,
                app_config.auth.min_password_length,
            )?;
            println!("Superuser created: {}", user);
            Ok(())
        }
        None => {
            // No command provided, show help
            println!("Recipe API v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'recipe-api --help' for usage information");
            Ok(())
        }
    }
}
