mod cli;
mod error;
mod logging;
mod report;
mod session;

use crate::cli::{Cli, TRIGGER_EVENT};
use crate::error::{ErrorKind, Result};
use crate::report::Reporter;
use camsync_config::Config;
use camsync_library::{RunSummary, Session, UploadEvent, upload};
use clap::Parser;
use exn::ResultExt;
use futures::StreamExt;
use std::io::Write;
use std::pin::pin;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.level());

    let connect = |config: &Config| session::build(config, &cli.mount_path, cli.dry_run);
    match execute(&cli, std::io::stdout().lock(), connect).await {
        Ok(summary) => {
            if summary.has_problems() {
                tracing::warn!(?summary, "Some files were not uploaded");
            }
            ExitCode::SUCCESS
        },
        Err(e) if matches!(&*e, ErrorKind::WrongEvent(_)) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = ?e, "camsync stopped");
            ExitCode::FAILURE
        },
    }
}

/// Everything after argument parsing.
///
/// `connect` assembles the [`Session`] from the loaded configuration. It is
/// only called for a mount event, and only once the configuration is valid.
async fn execute<W: Write>(cli: &Cli, mut out: W, connect: impl FnOnce(&Config) -> Result<Session>) -> Result<RunSummary> {
    // Mount hooks fire for every device event; only act on mounts.
    if !cli.is_trigger() {
        report::write_line(&mut out, format_args!("different event than '{TRIGGER_EVENT}', exiting..."));
        exn::bail!(ErrorKind::WrongEvent(cli.event.clone()));
    }
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let session = connect(&config)?;
    let mut reporter = Reporter::new(out, session.layout.dcim());
    run(&session, &mut reporter).await
}

/// Drive [`upload`] to the end, reporting every event.
async fn run(session: &Session, reporter: &mut Reporter<impl Write>) -> Result<RunSummary> {
    let mut events = pin!(upload(session));
    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                reporter.abort(&*e);
                return Err(e).or_raise(|| ErrorKind::Upload);
            },
        };
        reporter.event(&event);
        if let UploadEvent::Complete(summary) = event {
            return Ok(summary);
        }
    }
    exn::bail!(ErrorKind::Upload)
}
