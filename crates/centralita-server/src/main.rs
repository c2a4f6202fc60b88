use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use centralita_core::CallStore;
use centralita_server::AppState;
use openai_client::{OpenAiClient, OpenAiConfig};

#[derive(Parser)]
#[command(
    name = "centralita",
    about = "Call-triage backend — transcribe, classify, persist, broadcast",
    version
)]
struct Cli {
    /// Port to listen on
    #[arg(long, default_value_t = 4000, env = "PORT")]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// Path to the call database
    #[arg(long, default_value = "assistant.redb", env = "CENTRALITA_DB")]
    db: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "centralita=info,centralita_server=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let openai = Arc::new(OpenAiClient::new(OpenAiConfig::from_env()?));
    let store = Arc::new(CallStore::open(&cli.db)?);
    let state = AppState::new(store, openai.clone(), openai);

    centralita_server::serve(state, &cli.bind, cli.port).await
}
