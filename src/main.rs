use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use complainthub::config::{ClientConfig, ConfigError};
use complainthub::brands::BrandService;
use complainthub::guard::RouteGuard;
use complainthub::net::api::{BrandTicketFilter, HttpApi, Page};
use complainthub::net::types::{Category, Channel, Credentials, DateRange, NewTicket, SignupDetails, TicketStatus};
use complainthub::routes::{self, Navigation, RouteAccess};
use complainthub::session::SignupOutcome;
use complainthub::storage::{FileStorage, StorageError};
use complainthub::tickets::TicketService;
use complainthub::{SessionError, SessionStore};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("session storage unavailable: {0}")]
    Storage(#[from] StorageError),
    #[error("{}", .0.user_message())]
    Session(#[from] SessionError),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "E_CONFIG",
            Self::Storage(_) => "E_STORAGE",
            Self::Session(e) => e.error_code(),
            Self::Json(_) => "E_OUTPUT",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "complainthub", about = "ComplaintHub session and ticket CLI")]
struct Cli {
    #[arg(long, env = "COMPLAINTHUB_API_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "COMPLAINTHUB_STORAGE_PATH")]
    storage_path: Option<std::path::PathBuf>,

    /// Log at debug level instead of warn.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "COMPLAINTHUB_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long, env = "COMPLAINTHUB_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Show the restored session.
    Whoami,
    Logout,
    /// Evaluate the route table and guard for a client path.
    Check {
        path: String,
    },
    Tickets(TicketsCommand),
    /// Brand console: dashboard, queue, credits, analytics.
    Brand(BrandCommand),
}

#[derive(Args, Debug)]
struct TicketsCommand {
    #[command(subcommand)]
    command: TicketsSubcommand,
}

#[derive(Args, Debug, Clone, Copy)]
struct PageArgs {
    #[arg(long, default_value_t = 0)]
    skip: u32,
    #[arg(long, default_value_t = complainthub::net::api::DEFAULT_PAGE_SIZE)]
    limit: u32,
}

impl From<PageArgs> for Page {
    fn from(args: PageArgs) -> Self {
        Page::new(args.skip, args.limit)
    }
}

#[derive(Args, Debug, Clone)]
struct RangeArgs {
    /// ISO 8601 lower bound.
    #[arg(long)]
    start_date: Option<String>,
    #[arg(long)]
    end_date: Option<String>,
}

impl From<RangeArgs> for DateRange {
    fn from(args: RangeArgs) -> Self {
        DateRange { start_date: args.start_date, end_date: args.end_date }
    }
}

#[derive(Subcommand, Debug)]
enum TicketsSubcommand {
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    Public {
        #[command(flatten)]
        page: PageArgs,
    },
    Get {
        ticket_id: i64,
    },
    Create {
        #[arg(long)]
        brand_id: i64,
        #[arg(long)]
        description: String,
        #[arg(long, default_value = "web")]
        channel: Channel,
        #[arg(long, default_value = "complaint")]
        category: Category,
    },
    Status {
        ticket_id: i64,
        status: TicketStatus,
    },
    Respond {
        ticket_id: i64,
        message: String,
    },
    Rate {
        ticket_id: i64,
        rating: u8,
        #[arg(long)]
        comment: Option<String>,
    },
    Analytics {
        brand_id: i64,
        #[command(flatten)]
        range: RangeArgs,
    },
}

#[derive(Args, Debug)]
struct BrandCommand {
    #[command(subcommand)]
    command: BrandSubcommand,
}

#[derive(Subcommand, Debug)]
enum BrandSubcommand {
    Dashboard {
        brand_id: i64,
    },
    Tickets {
        brand_id: i64,
        #[arg(long)]
        status: Option<TicketStatus>,
        #[command(flatten)]
        page: PageArgs,
    },
    Assign {
        ticket_id: i64,
        assignee_id: i64,
    },
    Credits {
        brand_id: i64,
    },
    AddCredits {
        brand_id: i64,
        amount: f64,
    },
    Transactions {
        brand_id: i64,
        #[command(flatten)]
        page: PageArgs,
    },
    Analytics {
        brand_id: i64,
        #[command(flatten)]
        range: RangeArgs,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error [{}]: {e}", e.code());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.api_base_url = base_url;
    }
    if let Some(path) = cli.storage_path {
        config.storage_path = path;
    }

    let api = Arc::new(HttpApi::from_config(&config)?);
    let storage = Arc::new(FileStorage::open(&config.storage_path)?);
    let store = Arc::new(SessionStore::new(api.clone(), storage, config.signup_policy));
    store.initialize().await;

    match cli.command {
        Command::Login { email, password } => {
            let user = store.login(&Credentials::new(email, password)).await?;
            println!("logged in as {} <{}> ({})", user.display_name, user.email, user.role);
        }
        Command::Signup { name, email, phone, password } => {
            let details = SignupDetails { name, email, phone, password };
            match store.signup(&details).await? {
                SignupOutcome::LoggedIn(user) => {
                    println!("registered and logged in as {} ({})", user.email, user.role);
                }
                SignupOutcome::Registered(reg) => {
                    println!("registered {}; run `complainthub login` to continue", reg.email);
                }
            }
        }
        Command::Whoami => match store.user() {
            Some(user) => {
                println!("id:    {}", user.id);
                println!("name:  {}", user.display_name);
                println!("email: {}", user.email);
                println!("role:  {}", user.role);
            }
            None => println!("not logged in"),
        },
        Command::Logout => {
            store.logout()?;
            println!("logged out");
        }
        Command::Check { path } => {
            let session = store.snapshot();
            let verdict = match routes::navigate(&path, &session, config.redirect_policy) {
                Navigation::Render => "render".to_owned(),
                Navigation::Loading => "loading".to_owned(),
                Navigation::Redirect(to) => format!("redirect {to}"),
            };
            if let RouteAccess::Protected(required) = routes::route_for(&path) {
                let state = RouteGuard::new(required, config.redirect_policy).state(&session);
                tracing::debug!(?state, "guard state");
            }
            println!("{path}: {verdict}");
        }
        Command::Tickets(tickets) => {
            let service = TicketService::new(api, store);
            run_tickets(&service, tickets.command).await?;
        }
        Command::Brand(brand) => {
            let service = BrandService::new(api, store);
            run_brand(&service, brand.command).await?;
        }
    }
    Ok(())
}

async fn run_tickets(service: &TicketService, command: TicketsSubcommand) -> Result<(), CliError> {
    match command {
        TicketsSubcommand::List { page } => print_json(&service.list_tickets(page.into()).await?),
        TicketsSubcommand::Public { page } => print_json(&service.public_complaints(page.into()).await?),
        TicketsSubcommand::Get { ticket_id } => print_json(&service.get_ticket(ticket_id).await?),
        TicketsSubcommand::Create { brand_id, description, channel, category } => {
            let ticket = NewTicket { brand_id, user_id: None, channel, description, category };
            print_json(&service.create_ticket(&ticket).await?)
        }
        TicketsSubcommand::Status { ticket_id, status } => {
            print_json(&service.update_status(ticket_id, status).await?)
        }
        TicketsSubcommand::Respond { ticket_id, message } => {
            print_json(&service.add_response(ticket_id, &message).await?)
        }
        TicketsSubcommand::Rate { ticket_id, rating, comment } => {
            print_json(&service.rate_ticket(ticket_id, rating, comment.as_deref()).await?)
        }
        TicketsSubcommand::Analytics { brand_id, range } => {
            print_json(&service.ticket_analytics(brand_id, &DateRange::from(range)).await?)
        }
    }
}

async fn run_brand(service: &BrandService, command: BrandSubcommand) -> Result<(), CliError> {
    match command {
        BrandSubcommand::Dashboard { brand_id } => print_json(&service.dashboard(brand_id).await?),
        BrandSubcommand::Tickets { brand_id, status, page } => {
            let filter = BrandTicketFilter { status, page: page.into() };
            print_json(&service.tickets(brand_id, filter).await?)
        }
        BrandSubcommand::Assign { ticket_id, assignee_id } => {
            print_json(&service.assign_ticket(ticket_id, assignee_id).await?)
        }
        BrandSubcommand::Credits { brand_id } => print_json(&service.credits(brand_id).await?),
        BrandSubcommand::AddCredits { brand_id, amount } => print_json(&service.add_credits(brand_id, amount).await?),
        BrandSubcommand::Transactions { brand_id, page } => {
            print_json(&service.transactions(brand_id, page.into()).await?)
        }
        BrandSubcommand::Analytics { brand_id, range } => {
            print_json(&service.analytics(brand_id, &DateRange::from(range)).await?)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

