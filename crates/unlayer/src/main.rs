use std::env;
use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use unlayer_image::{ExtractSession, SessionReport};

use crate::app::App;

mod app;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let app = App::parse();
    let report = run(&app)?;

    let result = serde_json::json!({
        "changed": report.changed,
        "image": app.image,
        "extracted": report.extracted,
    });
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &result)?;
    writeln!(stdout)?;
    Ok(())
}

fn run(app: &App) -> Result<SessionReport> {
    if let Some(dir) = &app.chdir {
        env::set_current_dir(dir)
            .with_context(|| format!("failed to change into: {}", dir.display()))?;
    }

    let requests = app.requests()?;
    app.validate(&requests)?;

    tracing::debug!(image = %app.image.display(), requests = requests.len(), "starting session");
    let mut session = ExtractSession::open(&app.image)?;
    Ok(session.run(&requests)?)
}
