use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Management CLI for the broker relay", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:11154")]
    url: String,

    /// Correlation ID to send; the relay generates one when omitted.
    #[arg(short, long)]
    correlation_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish a message to the relay's exchange
    Publish { message: String },
    /// Pull the next message off the queue
    Pull,
    /// Pull every message currently queued
    Drain,
    /// Show broker reachability and event log counters
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(id) = &cli.correlation_id {
        headers.insert("x-correlation-id", HeaderValue::from_str(id)?);
    }

    let request = match cli.command {
        Commands::Publish { message } => client
            .post(format!("{}/api/messages", cli.url))
            .json(&json!({ "message": message })),
        Commands::Pull => client.get(format!("{}/api/messages/next", cli.url)),
        Commands::Drain => client.get(format!("{}/api/messages", cli.url)),
        Commands::Health => client.get(format!("{}/health", cli.url)),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await?;

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let correlation_id = res
        .headers()
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if !status.is_success() {
        eprintln!("Error: relay returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    if let Some(id) = correlation_id {
        eprintln!("correlation id: {}", id);
    }
    Ok(())
}
