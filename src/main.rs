use std::io;
use std::process::ExitCode;

use bf16_dot::{amx, run, BenchConfig};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let config = BenchConfig::default();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match run(&config, amx::enable, &mut out) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "benchmark aborted");
            ExitCode::FAILURE
        }
    }
}
