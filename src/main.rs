use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use gmail_export::cli::Cli;
use gmail_export::export::run_export;
use gmail_export::gmail_api::{authorize, GmailClient, GoogleTokenExchange, StdinCodeProvider};
use gmail_export::token_store::TokenStore;

#[tokio::main]
async fn main() -> ExitCode {
    // A .env file in the working directory is honored but not required.
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Missing credentials are fatal before any network call.
    let (Some(client_id), Some(client_secret)) =
        (cli.client_id.clone(), cli.client_secret.clone())
    else {
        tracing::error!("missing Google OAuth credentials");
        tracing::error!(
            "please ensure GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET are set in your environment or .env file"
        );
        return ExitCode::FAILURE;
    };

    tracing::info!("Google OAuth configuration:");
    tracing::info!(
        "- client id: {}...",
        client_id.get(..20).unwrap_or(&client_id)
    );
    tracing::info!("- redirect uri: {}", cli.redirect_uri);
    tracing::info!("- token path: {}", cli.token_path.display());

    match run(&cli, &client_id, &client_secret).await {
        Ok(count) => {
            tracing::info!(
                "data saved to {} ({} sent emails included)",
                cli.output.display(),
                count
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, client_id: &str, client_secret: &str) -> anyhow::Result<usize> {
    let store = TokenStore::new(&cli.token_path);
    let exchange = GoogleTokenExchange::new(client_id, client_secret, &cli.redirect_uri)?;
    let session = authorize(&store, &exchange, &StdinCodeProvider).await?;

    let api = GmailClient::new(reqwest::Client::new(), session.access_token);
    let count = run_export(&api, cli.max_messages, &cli.output).await?;
    Ok(count)
}
