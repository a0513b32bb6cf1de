use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "poc-cli")]
#[command(about = "Query the integration status API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Liveness check
    Status,
    /// PostgreSQL and Valkey connectivity
    Db,
    /// IAM Roles Anywhere identity
    Iam,
    /// Secrets Manager test secret
    Secret,
    /// Freshness of the worker's timestamps
    Worker,
}

impl Commands {
    fn path(&self) -> &'static str {
        match self {
            Commands::Status => "/healthz",
            Commands::Db => "/db/status",
            Commands::Iam => "/iam/status",
            Commands::Secret => "/secret/status",
            Commands::Worker => "/worker/status",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let url = format!("{}{}", cli.url.trim_end_matches('/'), cli.command.path());
    let res = client.get(url).send().await?;
    print_response(res).await?;

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: status API returned {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
