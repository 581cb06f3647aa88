use account_service::{AccountService, AccountServiceConfig, TransferFailurePolicy};
use clap::{Parser, Subcommand, ValueEnum};
use common::db;
use common::decimal::parse_amount;
use common::error::{Error, Result};
use common::model::account::AccountPatch;
use common::model::reference::ReferenceCategory;
use serde::Serialize;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Account Service CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Set the log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Use in-memory collaborators instead of PostgreSQL and HTTP gateways.
    /// Nothing is kept between invocations, so only `start`, `create` and `catalog` accept it.
    #[arg(long)]
    in_memory: bool,

    /// Database URL
    #[arg(short, long, global = true)]
    database_url: Option<String>,

    /// Database pool size
    #[arg(short, long, global = true)]
    pool_size: Option<u32>,

    /// Return an empty transfer list instead of failing when the transfer service is down
    #[arg(long, global = true)]
    degrade_transfers: bool,

    /// Commands
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Catalog {
    AccountType,
    Currency,
    Status,
}

impl From<Catalog> for ReferenceCategory {
    fn from(catalog: Catalog) -> Self {
        match catalog {
            Catalog::AccountType => ReferenceCategory::AccountType,
            Catalog::Currency => ReferenceCategory::Currency,
            Catalog::Status => ReferenceCategory::AccountStatus,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run migrations and keep the service up until Ctrl+C
    Start,
    /// Open an account for a user
    Create {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        account_type: i32,
        #[arg(long)]
        currency: i32,
    },
    /// Show an account with its owner and transfers
    Show {
        #[arg(long)]
        id: Uuid,
    },
    /// Show the account owned by a user
    ShowUser {
        #[arg(long)]
        user: i64,
    },
    /// Change alias, currency, status or account type
    Update {
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        alias: Option<String>,
        #[arg(long)]
        currency: Option<i32>,
        #[arg(long)]
        status: Option<i32>,
        #[arg(long)]
        account_type: Option<i32>,
    },
    /// Overwrite the balance of an account
    SetBalance {
        #[arg(long)]
        id: Uuid,
        #[arg(long, allow_hyphen_values = true)]
        balance: String,
    },
    /// Disable the account owned by a user
    Disable {
        #[arg(long)]
        user: i64,
    },
    /// List a reference catalogue
    Catalog {
        #[arg(value_enum)]
        catalog: Catalog,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Start => "start",
            Commands::Create { .. } => "create",
            Commands::Show { .. } => "show",
            Commands::ShowUser { .. } => "show-user",
            Commands::Update { .. } => "update",
            Commands::SetBalance { .. } => "set-balance",
            Commands::Disable { .. } => "disable",
            Commands::Catalog { .. } => "catalog",
        }
    }

    /// Commands that make sense against a store that starts empty every run
    fn supports_in_memory(&self) -> bool {
        matches!(self, Commands::Start | Commands::Create { .. } | Commands::Catalog { .. })
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match (&cli.database_url, cli.pool_size) {
        (Some(url), pool_size) => AccountServiceConfig::new(url.clone(), pool_size.unwrap_or(5)),
        (None, _) => AccountServiceConfig::from_env(),
    };
    if cli.degrade_transfers {
        config = config.with_transfer_failure_policy(TransferFailurePolicy::DegradeToEmpty);
    }

    if cli.in_memory && !cli.command.supports_in_memory() {
        return Err(Error::ValidationError(format!(
            "`{}` needs a database; in-memory state does not outlive one invocation",
            cli.command.name()
        )));
    }

    let service = if cli.in_memory {
        info!("Using in-memory collaborators");
        AccountService::in_memory(&config)?
    } else {
        config.validate()?;
        let pool = db::connect(&config.database_url, config.db_pool_size).await?;
        if matches!(cli.command, Commands::Start) {
            db::run_migrations(&pool).await?;
            info!("Migrations applied");
        }
        AccountService::with_pool(pool, &config)?
    };

    match cli.command {
        Commands::Start => {
            info!(
                "Starting account service with database pool size: {}, bank code: {}",
                config.db_pool_size, config.bank_code
            );

            info!("Account service started. Press Ctrl+C to stop.");
            match signal::ctrl_c().await {
                Ok(()) => info!("Shutting down account service..."),
                Err(err) => error!("Error waiting for Ctrl+C: {}", err),
            }
            Ok(())
        }
        Commands::Create { user, account_type, currency } => {
            print_json(&service.create_account(user, account_type, currency).await?)
        }
        Commands::Show { id } => print_json(&service.get_account_by_id(id).await?),
        Commands::ShowUser { user } => print_json(&service.get_account_by_user_id(user).await?),
        Commands::Update { id, alias, currency, status, account_type } => {
            let patch = AccountPatch {
                alias,
                currency_id: currency,
                status_id: status,
                account_type_id: account_type,
            };
            print_json(&service.update_account(id, patch).await?)
        }
        Commands::SetBalance { id, balance } => {
            let balance = parse_amount(&balance)?;
            service.update_balance(id, balance).await?;
            info!("Balance updated");
            Ok(())
        }
        Commands::Disable { user } => print_json(&service.disable_account_by_user(user).await?),
        Commands::Catalog { catalog } => {
            print_json(&service.reference_entries(catalog.into()).await?)
        }
    }
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "account_service={level},common={level}",
            level = cli.log_level
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(err) = run(cli).await {
        error!("{}", err);
        eprintln!("{}", err.public_message());
        std::process::exit(1);
    }
}
