//! steemrpc CLI: query Steem-family nodes from the terminal.
//!
//! Usage:
//! ```bash
//! # Call a database method through the first reachable node
//! steemrpc call --url wss://node.example.com,https://api.example.com \
//!     --method get_block --params '[1]'
//!
//! # Call a method on another capability
//! steemrpc call --url wss://node.example.com --api follow \
//!     --method get_followers --params '["alice", null, "blog", 10]'
//!
//! # Identify the network behind a node
//! steemrpc network --url https://api.example.com
//!
//! # List known chains
//! steemrpc chains
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use steemrpc::{CallOptions, ClientConfig, Interrupt, SteemNodeRpc};

#[derive(Parser)]
#[command(
    name = "steemrpc",
    about = "Query Steem-family blockchain nodes over WebSocket or HTTP",
    long_about = "
Resilient JSON-RPC client for Steem-family nodes. Failed attempts rotate
through every --url with a growing delay; Ctrl-C aborts.

ENVIRONMENT VARIABLES:
  STEEMRPC_URL        Comma-separated node URLs
  STEEMRPC_USER       Login name for WebSocket nodes
  STEEMRPC_PASSWORD   Login password for WebSocket nodes
  RUST_LOG            Log filter (default: info)
",
    version
)]
struct Cli {
    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one `call` request and print the result
    Call {
        #[command(flatten)]
        node: NodeArgs,
        /// Remote method name, e.g. get_block
        #[arg(long)]
        method: String,
        /// Capability to address, e.g. follow or follow_api
        #[arg(long)]
        api: Option<String>,
        /// JSON array of positional arguments
        #[arg(long, default_value = "[]")]
        params: String,
    },

    /// Connect and print the identified chain parameters
    Network {
        #[command(flatten)]
        node: NodeArgs,
    },

    /// List the chains this client can identify
    Chains,
}

#[derive(Args)]
struct NodeArgs {
    /// Node URL (ws, wss, http or https); repeat or comma-separate for failover
    #[arg(long = "url", env = "STEEMRPC_URL", value_delimiter = ',', required = true)]
    urls: Vec<String>,
    #[arg(long, env = "STEEMRPC_USER", default_value = "")]
    user: String,
    #[arg(long, env = "STEEMRPC_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,
    /// Retries per phase before giving up (default: retry forever)
    #[arg(long)]
    num_retries: Option<u32>,
}

impl NodeArgs {
    fn config(self) -> ClientConfig {
        ClientConfig::new(self.urls)
            .with_credentials(self.user, self.password)
            .with_num_retries(self.num_retries)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Call {
            node,
            method,
            api,
            params,
        } => cmd_call(node, &method, api, &params).await,
        Commands::Network { node } => cmd_network(node).await,
        Commands::Chains => {
            cmd_chains();
            Ok(())
        }
    }
}

/// Interrupt that fires on Ctrl-C.
fn ctrl_c_interrupt() -> Interrupt {
    let interrupt = Interrupt::new();
    let handle = interrupt.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, aborting");
            handle.trigger();
        }
    });
    interrupt
}

async fn connect(node: NodeArgs) -> Result<SteemNodeRpc> {
    let urls = node.urls.join(", ");
    steemrpc::connect_with_interrupt(node.config(), ctrl_c_interrupt())
        .await
        .with_context(|| format!("connecting to {urls}"))
}

async fn cmd_call(node: NodeArgs, method: &str, api: Option<String>, params: &str) -> Result<()> {
    let args: Vec<Value> =
        serde_json::from_str(params).context("--params must be a JSON array")?;
    let mut rpc = connect(node).await?;

    let mut options = CallOptions::default();
    if let Some(api) = api {
        rpc.register_apis(&[api.as_str()])
            .await
            .with_context(|| format!("registering {api}"))?;
        options = options.with_api(api);
    }

    let result = rpc
        .call_with(method, args, options)
        .await
        .with_context(|| format!("calling {method}"))?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    rpc.close().await;
    Ok(())
}

async fn cmd_network(node: NodeArgs) -> Result<()> {
    let mut rpc = connect(node).await?;
    let chain = rpc
        .chain_params()
        .context("node did not identify a chain")?;

    println!("  Endpoint:  {} ({})", rpc.url(), rpc.endpoint_kind());
    println!("  Symbol:    {}", chain.steem_symbol);
    println!("  Prefix:    {}", chain.prefix);
    println!("  Chain id:  {}", chain.chain_id);
    println!("  Debt:      {}", chain.sbd_symbol);
    println!("  Vesting:   {}", chain.vests_symbol);
    rpc.close().await;
    Ok(())
}

fn cmd_chains() {
    println!("Known chains:\n");
    for (symbol, chain) in steemrpc::chains::all() {
        println!(
            "  {symbol:<6} prefix {:<4} assets {}/{}/{}",
            chain.prefix,
            chain.steem_symbol,
            chain.sbd_symbol,
            chain.vests_symbol
        );
        println!("         chain id {}", chain.chain_id);
    }
}
