use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use moviescout_rs::config::Config;
use moviescout_rs::{build_services, cli, serve, AppError};

#[derive(Parser, Debug)]
#[command(name = "moviescout")]
#[command(about = "Movie search with trending searches", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "moviescout.yaml")]
    config: String,

    /// Log as JSON lines instead of human-readable text
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve,
    /// Interactive search; each line on stdin replaces the search input
    Browse,
    /// Run a single search (an empty term lists popular movies)
    Search {
        #[arg(trailing_var_arg = true)]
        term: Vec<String>,
    },
    /// Show the most searched terms
    Trending,
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "moviescout_rs=info,tower_http=info".into());

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(args: Args) -> Result<(), AppError> {
    let config = Config::load(&args.config)?;

    match args.command {
        Command::Serve => serve(&config).await,
        Command::Browse => {
            let services = build_services(&config).await?;
            cli::browse(services, config.search.debounce()).await
        }
        Command::Search { term } => {
            let services = build_services(&config).await?;
            cli::search_once(&services, &term.join(" ")).await
        }
        Command::Trending => {
            let services = build_services(&config).await?;
            cli::show_trending(&services).await
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.json_logs);

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
