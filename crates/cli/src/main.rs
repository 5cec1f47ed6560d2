//! TechShack CLI - terminal register and user administration.
//!
//! # Usage
//!
//! ```bash
//! # List items in stock
//! pos-cli catalog
//!
//! # Ring up two mice and a keyboard, pay 100, print the receipt
//! pos-cli sell -c alice -i 2 -i 1 -i 2 -p 100
//!
//! # Show the second page of users, sorted by position
//! pos-cli users list --sort position --page 1
//!
//! # Manage users
//! pos-cli users create -u dave -p stock
//! pos-cli users update --id 4 -u dave -p cashier
//! pos-cli users delete --id 4 --id 7
//! ```
//!
//! # Environment Variables
//!
//! - `POS_API_URL` - Backend base URL (required)
//! - `POS_API_TOKEN` - Bearer token
//! - `POS_API_TIMEOUT_SECS`, `POS_API_MAX_ATTEMPTS`, `POS_API_RETRY_BACKOFF_MS`
//! - `POS_STORE_NAME` - Name printed on receipts
//! - `POS_LOG_FORMAT` - `text` or `json`
//! - `RUST_LOG` - Log filter

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use techshack_client::table::DEFAULT_PAGE_SIZE;
use techshack_client::{ClientConfig, HttpBackend, LogFormat, UserColumn};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "pos-cli")]
#[command(author, version, about = "TechShack point-of-sale CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List items in stock
    Catalog,
    /// Ring up a sale and print the receipt
    Sell {
        /// Cashier name printed on the receipt
        #[arg(short, long)]
        cashier: String,

        /// Item id to add; repeat to add more units
        #[arg(short, long = "item", required = true)]
        items: Vec<i32>,

        /// Amount tendered
        #[arg(short, long)]
        payment: String,

        /// Checkout attempts before giving up on unrecorded lines
        #[arg(long, default_value_t = 2)]
        attempts: u32,
    },
    /// Manage users
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
}

#[derive(Subcommand)]
enum UsersAction {
    /// Show one page of users
    List {
        /// Sort column (`user_id`, `username`, `position`)
        #[arg(short, long, default_value = "user_id")]
        sort: UserColumn,

        /// Sort descending
        #[arg(short, long)]
        desc: bool,

        /// Page number, starting at 0
        #[arg(long, default_value_t = 0)]
        page: usize,

        /// Rows per page
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: usize,
    },
    /// Create a user
    Create {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        position: String,
    },
    /// Change a user's username and position
    Update {
        #[arg(long)]
        id: i32,

        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        position: String,
    },
    /// Delete users
    Delete {
        /// User id; repeat to delete several
        #[arg(long = "id", required = true)]
        ids: Vec<i32>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = ClientConfig::from_env();

    init_tracing(config.as_ref().map_or(LogFormat::Text, |c| c.log_format));

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

/// Install the global subscriber: `RUST_LOG` filter, JSON or text output.
fn init_tracing(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "techshack_client=info,techshack_cli=info".into());

    let json_layer = (format == LogFormat::Json)
        .then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (format == LogFormat::Text).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), CliError> {
    let backend = HttpBackend::new(&config.api)?;

    match cli.command {
        Commands::Catalog => commands::catalog::list(&backend).await?,
        Commands::Sell {
            cashier,
            items,
            payment,
            attempts,
        } => {
            let args = commands::sell::SaleArgs {
                cashier,
                items,
                payment,
                attempts,
            };
            commands::sell::run(&config, backend, args).await?;
        }
        Commands::Users { action } => match action {
            UsersAction::List {
                sort,
                desc,
                page,
                page_size,
            } => {
                let args = commands::users::ListArgs {
                    sort,
                    descending: desc,
                    page,
                    page_size,
                };
                commands::users::list(backend, args).await?;
            }
            UsersAction::Create { username, position } => {
                commands::users::create(backend, username, position).await?;
            }
            UsersAction::Update {
                id,
                username,
                position,
            } => commands::users::update(backend, id, username, position).await?,
            UsersAction::Delete { ids } => commands::users::delete(backend, ids).await?,
        },
    }
    Ok(())
}
