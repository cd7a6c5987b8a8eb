use std::process::ExitCode;

use clap::Parser;
use kline::cli::{Args, Invocation};
use kline::{Reporter, report, source};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Diagnostics go to stderr; the report owns stdout.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let inv = match args.validate() {
        Ok(inv) => inv,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };
    rt.block_on(run(inv))
}

async fn run(inv: Invocation) -> ExitCode {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let connector = match source::connector_from_env(inv.source) {
        Ok(c) => c,
        // A missing key is a plain message, not a failure.
        Err(e) => {
            return match report::source_unavailable(&e, &mut out) {
                Ok(_) => ExitCode::SUCCESS,
                Err(err) => {
                    eprintln!("{err}");
                    ExitCode::FAILURE
                }
            };
        }
    };
    let reporter = match Reporter::builder()
        .with_connector(connector)
        .config(inv.config)
        .build()
    {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(1);
        }
    };

    match reporter.run(&inv.request, &mut out).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
