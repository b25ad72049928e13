use std::time::Duration;

use clap::{Parser, Subcommand};
use edge_gateway::security::token::issue_token;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Operator CLI for the edge gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the gateway health endpoint
    Health {
        #[arg(long, default_value = "/api/v1/health")]
        path: String,
    },
    /// Mint a bearer token signed with the shared secret
    Token {
        #[arg(long, env = "JWT_SECRET")]
        secret: String,
        #[arg(long, default_value = "operator")]
        subject: String,
        /// Role to grant; repeat for several
        #[arg(long = "role")]
        roles: Vec<String>,
        #[arg(long, default_value_t = 3600)]
        ttl_secs: u64,
    },
    /// Send a request through the gateway
    Call {
        #[arg(long)]
        path: String,
        #[arg(long)]
        token: Option<String>,
        #[arg(long, default_value = "GET")]
        method: String,
        /// JSON body to send
        #[arg(long)]
        body: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Health { path } => {
            let res = client.get(format!("{}{}", cli.url, path)).send().await?;
            print_response(res).await?;
        }
        Commands::Token {
            secret,
            subject,
            roles,
            ttl_secs,
        } => {
            let token = issue_token(secret.as_bytes(), &subject, roles, Duration::from_secs(ttl_secs))?;
            println!("{token}");
        }
        Commands::Call {
            path,
            token,
            method,
            body,
        } => {
            let method = Method::from_bytes(method.to_uppercase().as_bytes())?;

            let mut headers = HeaderMap::new();
            if let Some(token) = token {
                headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
            }

            let mut request = client
                .request(method, format!("{}{}", cli.url, path))
                .headers(headers);
            if let Some(body) = body {
                let json: Value = serde_json::from_str(&body)?;
                request = request.json(&json);
            }

            print_response(request.send().await?).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
