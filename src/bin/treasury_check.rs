//! One-shot treasury probe for operators.
//!
//! Reads the on-chain treasury snapshot once using the same reader the HTTP
//! endpoint uses, prints the JSON, and exits non-zero only when no contract
//! address can be resolved at all.
//!
//! ```text
//! cargo run --bin treasury_check -- --token 0x... --debug
//! ```

use std::process::ExitCode;

use citadel_backend::config::rpc_endpoint_from_env;
use citadel_backend::services::treasury::{
    self, RpcCalls, TreasuryReadOptions, TreasurySettings, TreasurySnapshot,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct CliArgs {
    token: Option<String>,
    debug: bool,
}

fn parse_args<I>(raw: I) -> CliArgs
where
    I: IntoIterator<Item = String>,
{
    let mut token = None;
    let mut debug = false;

    let mut args = raw.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--token" | "-t" => token = args.next(),
            "--debug" => debug = true,
            other => {
                eprintln!("Ignoring unknown argument: {}", other);
            }
        }
    }

    CliArgs { token, debug }
}

fn render_snapshot(snapshot: &TreasurySnapshot) -> String {
    serde_json::to_string_pretty(snapshot).unwrap_or_else(|_| "{}".to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "citadel_backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = parse_args(std::env::args().skip(1));
    let settings = TreasurySettings::from_env();
    let rpc_url = rpc_endpoint_from_env();

    let calls = match RpcCalls::new(&rpc_url) {
        Ok(calls) => calls,
        Err(err) => {
            eprintln!("Cannot build RPC client: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let opts = TreasuryReadOptions {
        token_address: args.token,
        include_debug: args.debug,
    };

    // The reader's only error is the address-resolution failure; everything
    // else degrades to zeroed fields inside the snapshot.
    match treasury::read_treasury(&calls, &settings, &opts).await {
        Ok(snapshot) => {
            println!("{}", render_snapshot(&snapshot));
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("No treasury contract address configured: {}", err);
            eprintln!("Set TOKEN_CONTRACT_ADDRESS or TAX_PROCESSOR_ADDRESS, or pass --token.");
            ExitCode::FAILURE
        }
    }
}
