//! wfmon: workflow monitor runtime binary.
//! Hosts the gateway in-process and wraps the emitter and query API for shells.

use clap::Parser;

mod browser;
mod cli;
mod client;
mod cmd_emit;
mod cmd_serve;

fn init_tracing() {
    let filter = std::env::var("WFMON_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    let base_url = args.base_url();

    match &args.command {
        cli::Command::Serve(opts) => {
            init_tracing();
            tracing::info!(addr = %args.addr(), "wfmon gateway starting");
            cmd_serve::cmd_serve(args.addr(), opts).await?;
        }
        cli::Command::Emit(opts) => {
            cmd_emit::cmd_emit(&base_url, opts).await?;
        }
        cli::Command::Open => {
            browser::open_url(&format!("{base_url}/"))?;
        }
        cli::Command::Events(opts) => {
            client::cmd_events(&base_url, opts.limit).await?;
        }
        cli::Command::State => {
            client::cmd_state(&base_url).await?;
        }
        cli::Command::Clear => {
            client::cmd_clear(&base_url).await?;
        }
    }

    Ok(())
}
