use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "blockscope-cli")]
#[command(about = "CLI client for the blockscope explorer facade")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:8080)
    #[arg(long, global = true, default_value = "http://127.0.0.1:8080")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the current day's blocks
    Blocks {
        /// Millisecond timestamp; the node only honors it when started with --honor-time-param
        #[arg(long)]
        time: Option<String>,
        #[command(flatten)]
        query: ListArgs,
    },
    /// Show one block's details
    Block {
        hash: String,
    },
    /// List a block's transactions
    Txs {
        hash: String,
        #[command(flatten)]
        query: ListArgs,
    },
}

#[derive(Args, Debug, Serialize)]
struct ListArgs {
    /// Substring to match
    #[arg(long)]
    search: Option<String>,
    /// Field to sort by
    #[arg(long)]
    sort_field: Option<String>,
    /// asc or desc
    #[arg(long)]
    sort_order: Option<String>,
    #[arg(long)]
    page_number: Option<u32>,
    #[arg(long)]
    page_size: Option<u32>,
}

#[derive(Serialize)]
struct BlocksQuery<'a> {
    time: Option<&'a str>,
    #[serde(flatten)]
    query: &'a ListArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let node = cli.node.trim_end_matches('/');
    let client = reqwest::Client::new();
    let req = match &cli.cmd {
        Command::Blocks { time, query } => client.get(format!("{node}/blocks")).query(&BlocksQuery {
            time: time.as_deref(),
            query,
        }),
        Command::Block { hash } => client.get(format!("{node}/blocks/{hash}")),
        Command::Txs { hash, query } => client.get(format!("{node}/blocks/{hash}/transactions")).query(query),
    };
    debug!(?req, "sending request");

    let res = req.send().await?;
    let status = res.status();
    let body = res.text().await?;
    println!("status: {}", status);
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{body}"),
    }
    Ok(())
}
