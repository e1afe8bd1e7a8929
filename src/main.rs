use std::env;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use lbms::catalog::JsonBookStore;
use lbms::engine::Engine;
use lbms::settings::Settings;

fn run() -> lbms::Result<()> {
    let config = env::args().nth(1);
    let settings = Settings::load(config.as_deref())?;
    let store = match &settings.store.path {
        Some(path) => JsonBookStore::from_path(path)?,
        None => JsonBookStore::default(),
    };
    info!(books = store.len(), "book store loaded");
    let mut engine = Engine::from_settings(&settings, Box::new(store));

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    let mut pending = String::new();
    for line in stdin.lock().lines() {
        let (still_pending, response) = engine.submit(pending, &line?);
        pending = still_pending;
        if let Some(response) = response {
            writeln!(stdout, "{response}")?;
            stdout.flush()?;
        }
    }
    if !pending.is_empty() {
        info!(%pending, "input ended inside an unterminated request");
    }
    Ok(())
}

fn main() -> ExitCode {
    // logs go to stderr so responses on stdout stay clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "lbms stopped");
            ExitCode::FAILURE
        }
    }
}
