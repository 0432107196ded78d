use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use quad::activity;
use quad::config::{ConfigFile, ServerConfig};
use quad::server::{AppState, create_router};
use quad::store::{SqliteStore, Store, seed_default_roles};
use quad::types::User;

const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Parser)]
#[command(name = "quad")]
#[command(about = "Forum activity and search service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// TOML file with server settings; flags given here take precedence
        #[arg(long)]
        config: Option<PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long, short)]
        port: Option<u16>,

        /// Data directory holding the database
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Initialize the server (create database and seed roles)
    Init {
        /// Data directory holding the database
        #[arg(long, default_value = DEFAULT_DATA_DIR)]
        data_dir: PathBuf,

        /// Skip interactive prompts
        #[arg(long)]
        non_interactive: bool,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Print a user's activity statistics as JSON
    Stats {
        /// User id
        user_id: String,

        /// Omit engagement metrics and the monthly activity map
        #[arg(long)]
        public: bool,

        /// Data directory holding the database
        #[arg(long, default_value = DEFAULT_DATA_DIR)]
        data_dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a user and print its id
    Create {
        /// Display name
        #[arg(long)]
        name: String,

        /// Email address (unique)
        #[arg(long)]
        email: String,

        /// Role name
        #[arg(long, default_value = "member")]
        role: String,

        /// Data directory holding the database
        #[arg(long, default_value = DEFAULT_DATA_DIR)]
        data_dir: PathBuf,
    },
}

fn is_initialized(store: &SqliteStore) -> anyhow::Result<bool> {
    Ok(store.get_role_by_name("admin")?.is_some())
}

/// Opens the database of an initialized data directory.
fn open_store(data_dir: &Path) -> anyhow::Result<SqliteStore> {
    let db_path = data_dir.join("quad.db");
    if !db_path.exists() {
        bail!("Server not initialized. Run 'quad admin init' first to create the database.");
    }

    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;
    if !is_initialized(&store)? {
        bail!("Server not initialized. Run 'quad admin init' first to create the database.");
    }
    Ok(store)
}

fn create_user(store: &dyn Store, name: &str, email: &str, role: &str) -> anyhow::Result<User> {
    let name = name.trim();
    let email = email.trim();
    if name.is_empty() {
        bail!("Name cannot be empty");
    }
    if !email.contains('@') {
        bail!("Invalid email address: {email}");
    }

    let role = store
        .get_role_by_name(role)?
        .with_context(|| format!("Unknown role '{role}'"))?;

    if store.get_user_by_email(email)?.is_some() {
        bail!("A user with email {email} already exists");
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        email: email.to_string(),
        name: name.to_string(),
        role_id: role.id,
        verified: true,
        bio: None,
        avatar_url: None,
        created_at: now,
        updated_at: now,
    };
    store.create_user(&user)?;

    info!(user_id = %user.id, role = %role.name, "created user");
    Ok(user)
}

fn run_init(data_dir: PathBuf, non_interactive: bool) -> anyhow::Result<()> {
    fs::create_dir_all(&data_dir)?;

    let db_path = data_dir.join("quad.db");
    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;

    if is_initialized(&store)? {
        bail!("Server already initialized at {}", db_path.display());
    }

    let roles = seed_default_roles(&store)?;

    println!();
    println!("========================================");
    println!("Database created at {}", db_path.display());
    println!("Seeded roles:");
    for role in &roles {
        println!("  {:<10} {} [{}]", role.name, role.color, role.capabilities);
    }
    println!("========================================");
    println!();

    if !non_interactive {
        create_admin_user_prompt(&store)?;
    }

    Ok(())
}

fn create_admin_user_prompt(store: &SqliteStore) -> anyhow::Result<()> {
    let create = inquire::Confirm::new("Would you like to create an admin user?")
        .with_default(false)
        .prompt()?;

    if !create {
        return Ok(());
    }

    let name = inquire::Text::new("Name:")
        .with_validator(|input: &str| {
            if input.trim().is_empty() {
                Err("Name cannot be empty".into())
            } else {
                Ok(inquire::validator::Validation::Valid)
            }
        })
        .prompt()?;

    let email = inquire::Text::new("Email:")
        .with_validator(|input: &str| {
            if input.contains('@') {
                Ok(inquire::validator::Validation::Valid)
            } else {
                Err("Enter a valid email address".into())
            }
        })
        .prompt()?;

    let user = create_user(store, &name, &email, "admin")?;

    println!();
    println!("========================================");
    println!("Created admin '{}' with id:", user.name);
    println!();
    println!("  {}", user.id);
    println!();
    println!("Send this id in the X-Quad-User header.");
    println!("========================================");
    println!();

    Ok(())
}

fn run_stats(data_dir: &Path, user_id: &str, public: bool) -> anyhow::Result<()> {
    let store = open_store(data_dir)?;
    if store.get_user(user_id)?.is_none() {
        bail!("User not found: {user_id}");
    }

    let stats = activity::user_stats(&store, user_id, !public)?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

fn load_server_config(
    config: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    data_dir: Option<PathBuf>,
) -> anyhow::Result<ServerConfig> {
    let mut server_config = ServerConfig::default();
    if let Some(path) = config {
        server_config = server_config.with_file(ConfigFile::load(&path)?);
    }
    if let Some(host) = host {
        server_config.host = host;
    }
    if let Some(port) = port {
        server_config.port = port;
    }
    if let Some(data_dir) = data_dir {
        server_config.data_dir = data_dir;
    }
    server_config.validate()?;
    Ok(server_config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("quad=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init {
                data_dir,
                non_interactive,
            } => {
                run_init(data_dir, non_interactive)?;
            }
            AdminCommands::User {
                command:
                    UserCommands::Create {
                        name,
                        email,
                        role,
                        data_dir,
                    },
            } => {
                let store = open_store(&data_dir)?;
                let user = create_user(&store, &name, &email, &role)?;
                println!("{}", user.id);
            }
            AdminCommands::Stats {
                user_id,
                public,
                data_dir,
            } => {
                run_stats(&data_dir, &user_id, public)?;
            }
        },
        Commands::Serve {
            config,
            host,
            port,
            data_dir,
        } => {
            let config = load_server_config(config, host, port, data_dir)?;
            let store = open_store(&config.data_dir)?;

            let state = Arc::new(AppState::new(Arc::new(store), &config));

            let app = create_router(state);
            let addr = config.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
