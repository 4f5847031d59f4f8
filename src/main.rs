//! `brokerage-crm serve` runs the HTTP API; `brokerage-crm seed` resets the backend to test data.

use brokerage_crm::{
    app, connect_backend, AppState, BackendArgs, BackendSettings, FunctionsClient, ServeArgs,
};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about = "Insurance-brokerage CRM API")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the REST API.
    Serve(ServeArgs),
    /// Replace backend data with the reference test data set.
    Seed(BackendArgs),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("brokerage_crm=info,tower_http=info")),
        )
        .init();

    match Cli::parse().command {
        Command::Serve(args) => serve(args).await,
        Command::Seed(args) => {
            let settings = BackendSettings::try_from(&args)?;
            FunctionsClient::new(&settings)?.insert_test_data().await?;
            Ok(())
        }
    }
}

async fn serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let settings = BackendSettings::try_from(&args.backend)?;
    let backend = connect_backend(&args, &settings).await?;
    let state = AppState::new(backend, args.email_uniqueness);
    let app = app(state, args.request_body_limit);

    let listener = TcpListener::bind(args.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
