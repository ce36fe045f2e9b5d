use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "dispatch-cli")]
#[command(about = "Management CLI for the dispatch engine", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, env = "DISPATCH_ADMIN_KEY", default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check engine status
    Status,
    /// List endpoints with health and load
    Endpoints,
    /// Show aggregate dispatch statistics
    Stats,
    /// Show the newest execution records
    History {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// List routing rules
    Rules,
    /// Remove an endpoint
    Deregister { id: String },
    /// Dispatch a request through the engine
    Route {
        category: String,
        /// Preferred service type for categories without a rule
        #[arg(short, long)]
        target: Option<String>,
        /// Compatibility score in [0, 1]
        #[arg(short, long)]
        compatibility: Option<f64>,
        /// JSON payload forwarded to the endpoint
        #[arg(short, long)]
        payload: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );
    let client = reqwest::Client::builder()
        .default_headers(headers)
        .build()?;

    let res = match cli.command {
        Commands::Status => client.get(format!("{}/admin/status", cli.url)).send().await?,
        Commands::Endpoints => client.get(format!("{}/admin/endpoints", cli.url)).send().await?,
        Commands::Stats => client.get(format!("{}/admin/stats", cli.url)).send().await?,
        Commands::History { limit } => {
            client
                .get(format!("{}/admin/history", cli.url))
                .query(&[("limit", limit)])
                .send()
                .await?
        }
        Commands::Rules => client.get(format!("{}/admin/rules", cli.url)).send().await?,
        Commands::Deregister { id } => {
            client
                .delete(format!("{}/admin/endpoints/{}", cli.url, id))
                .send()
                .await?
        }
        Commands::Route {
            category,
            target,
            compatibility,
            payload,
        } => {
            let payload: Value = match payload {
                Some(raw) => serde_json::from_str(&raw)?,
                None => Value::Null,
            };
            let body = json!({
                "category": category,
                "target_service_type": target,
                "compatibility_score": compatibility,
                "payload": payload,
            });
            client
                .post(format!("{}/admin/route", cli.url))
                .json(&body)
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let text = res.text().await?;
    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }
    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
