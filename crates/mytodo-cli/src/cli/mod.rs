//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use mytodo_core::config;
use tracing_subscriber::EnvFilter;

mod commands;

/// Env var holding a `tracing` filter directive, e.g. `mytodo=debug`.
const LOG_ENV: &str = "MYTODO_LOG";
const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Parser)]
#[command(name = "mytodo")]
#[command(version)]
#[command(about = "Manage your todo list from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the todo API (overrides MYTODO_API_URL and config)
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,
}

/// Credentials shared by `login` and `register`.
#[derive(clap::Args, Debug, Clone)]
struct CredentialArgs {
    /// Account email
    #[arg(long)]
    email: String,

    /// Account password (read from stdin when omitted)
    #[arg(long, env = "MYTODO_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login(CredentialArgs),
    /// Create an account and log into it
    Register(CredentialArgs),
    /// Forget the saved session
    Logout,
    /// Show the logged-in account
    Whoami,
    /// Manage todos
    Todos {
        #[command(subcommand)]
        command: TodoCommands,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum TodoCommands {
    /// Lists todos
    List {
        /// Only completed todos
        #[arg(long, conflicts_with = "active")]
        completed: bool,
        /// Only open todos
        #[arg(long)]
        active: bool,
    },
    /// Shows a single todo
    Show {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Adds a todo
    Add {
        #[arg(value_name = "TITLE")]
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Changes the title and/or description of a todo
    Edit {
        #[arg(value_name = "ID")]
        id: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Marks a todo as completed
    Done {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Marks a completed todo as open again
    Undo {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Deletes a todo
    Rm {
        #[arg(value_name = "ID")]
        id: String,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Save the API base URL to the config file
    SetUrl {
        #[arg(value_name = "URL")]
        url: String,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = config::Config::load().context("load config")?;

    init_logging(&config);

    // one runtime per invocation
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli, &config).await })
}

/// Logs go to stderr; stdout carries command output only.
fn init_logging(config: &config::Config) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        let directive = config.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER);
        EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn dispatch(cli: Cli, config: &config::Config) -> Result<()> {
    let Cli { command, api_url } = cli;
    let api_url = api_url.as_deref();

    match command {
        Commands::Login(args) => {
            commands::auth::login(config, api_url, &args.email, args.password).await
        }
        Commands::Register(args) => {
            commands::auth::register(config, api_url, &args.email, args.password).await
        }
        Commands::Logout => commands::auth::logout(config, api_url),
        Commands::Whoami => commands::auth::whoami(config, api_url).await,

        Commands::Todos { command } => match command {
            TodoCommands::List { completed, active } => {
                commands::todos::list(config, api_url, completed, active).await
            }
            TodoCommands::Show { id } => commands::todos::show(config, api_url, &id).await,
            TodoCommands::Add { title, description } => {
                commands::todos::add(config, api_url, &title, &description).await
            }
            TodoCommands::Edit {
                id,
                title,
                description,
            } => commands::todos::edit(config, api_url, &id, title, description).await,
            TodoCommands::Done { id } => {
                commands::todos::set_completed(config, api_url, &id, true).await
            }
            TodoCommands::Undo { id } => {
                commands::todos::set_completed(config, api_url, &id, false).await
            }
            TodoCommands::Rm { id } => commands::todos::remove(config, api_url, &id).await,
        },

        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::SetUrl { url } => commands::config::set_url(&url),
        },
    }
}
