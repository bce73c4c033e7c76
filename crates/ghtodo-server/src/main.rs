use std::net::SocketAddr;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use ghtodo_core::stats::{StatusFilter, TodoQuery, TodoStats};
use ghtodo_service::TodoStore;
use tokio::net::TcpListener;
use tracing::info;

use ghtodo_server::config::ServerConfig;

#[derive(Parser)]
#[command(name = "ghtodo-server", about = "Todo list backed by GitHub issues")]
struct Cli {
    #[command(flatten)]
    config: ServerConfig,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print todos and exit
    List {
        /// all, active or completed
        #[arg(long, default_value = "all")]
        status: String,
        /// Case-insensitive text to search for
        #[arg(long)]
        query: Option<String>,
    },
    /// Print completion statistics and exit
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::List { status, query }) => {
            let status = StatusFilter::from_str(&status)
                .ok_or_else(|| anyhow!("unknown status: {status}"))?;
            let adapter = ghtodo_server::build_adapter(&cli.config)?;
            let todos = adapter.list_todos().await?;
            let query = TodoQuery {
                status,
                search: query,
                ..Default::default()
            };
            for todo in query.apply(todos) {
                println!(
                    "{:<12} [{}] {}",
                    todo.id,
                    if todo.completed { "x" } else { " " },
                    todo.title
                );
            }
        }
        Some(Commands::Stats) => {
            let adapter = ghtodo_server::build_adapter(&cli.config)?;
            let todos = adapter.list_todos().await?;
            let stats = TodoStats::compute(&todos);
            println!("total:      {}", stats.total);
            println!("completed:  {}", stats.completed);
            println!("active:     {}", stats.active);
            println!("completion: {}%", stats.completion_rate);
        }
        None => {
            let addr = SocketAddr::new(cli.config.bind.parse()?, cli.config.port);
            let state = ghtodo_server::build_state(&cli.config)?;
            let listener = TcpListener::bind(addr).await?;
            info!("ghtodo-server listening on http://{addr}");
            ghtodo_server::serve(listener, state).await?;
        }
    }

    Ok(())
}
