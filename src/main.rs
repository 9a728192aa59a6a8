//! HTTP server binary for the start/stop plugin.

use clap::{Parser, ValueEnum};
use eyre::WrapErr;
use start_stop::assignment::adapters::{github::DEFAULT_GITHUB_API_BASE, http::RetryPolicy};
use start_stop::config::EnvValues;
use start_stop::plugin::RunnerConfig;
use start_stop::server::{ServerState, serve};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "start-stop", version, about = "Start/stop task assignment plugin")]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "LISTEN_ADDR", default_value = "127.0.0.1:4000")]
    listen: SocketAddr,

    /// GitHub REST API base URL.
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_GITHUB_API_BASE)]
    github_api_url: String,

    /// Wallet database URL used when a request carries none.
    #[arg(long, env = "SUPABASE_URL")]
    supabase_url: Option<String>,

    /// Wallet database key used when a request carries none.
    #[arg(long, env = "SUPABASE_KEY", hide_env_values = true)]
    supabase_key: Option<String>,

    /// Attempts per outbound request, including the first.
    #[arg(long, default_value_t = RetryPolicy::default().max_attempts)]
    max_attempts: usize,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let state = ServerState {
        runner: RunnerConfig {
            github_api_base: cli.github_api_url,
            retry: RetryPolicy {
                max_attempts: cli.max_attempts,
                ..RetryPolicy::default()
            },
        },
        default_env: EnvValues {
            supabase_url: cli.supabase_url,
            supabase_key: cli.supabase_key,
        },
    };
    let listener = TcpListener::bind(cli.listen)
        .await
        .wrap_err_with(|| format!("failed to bind {}", cli.listen))?;
    serve(listener, state)
        .await
        .wrap_err("start/stop server exited unexpectedly")
}
