// Entrypoint for the CLI application.
// - Keeps `main` small: set up diagnostics, build the archive client and
//   hand everything to `app::run`.
// - Invalid input is the only thing that exits with status 1.

use archivist_cli::{api::ArchiveClient, app, cli::Args, ui};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Our own executable is never uploaded, even if it sits in the folder.
    let own_name = std::env::current_exe()
        .ok()
        .and_then(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string));

    let result = ArchiveClient::from_env().and_then(|archive| {
        app::run(
            &args,
            &mut ui::TerminalPrompter,
            &archive,
            own_name.as_deref(),
        )
    });

    match result {
        Ok(outcome) => {
            tracing::debug!(?outcome, "finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            ui::print_error(&format!("{:#}", e));
            ExitCode::from(1)
        }
    }
}
