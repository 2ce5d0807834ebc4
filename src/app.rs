// Top-level flow: validate the folder, resolve metadata, enumerate files,
// dispatch the upload. Kept free of process handling so it can be driven
// from tests with a scripted prompter and a fake archive.

use crate::api::ArchiveService;
use crate::cli::Args;
use crate::error::ArchivistError;
use crate::files::build_file_mapping;
use crate::metadata::resolve;
use crate::ui::{self, Prompter};
use crate::upload::{upload_folder, Outcome};
use anyhow::{Context, Result};

/// Run one invocation. `Err` means invalid input (exit status 1); every
/// `Outcome` maps to exit status 0.
pub fn run(
    args: &Args,
    prompter: &mut dyn Prompter,
    archive: &dyn ArchiveService,
    exclude: Option<&str>,
) -> Result<Outcome> {
    let target = if args.folder.is_absolute() {
        args.folder.clone()
    } else {
        std::env::current_dir()
            .context("Failed to read current directory")?
            .join(&args.folder)
    };
    if !target.is_dir() {
        return Err(ArchivistError::FolderNotFound(target).into());
    }
    println!("Preparing to upload contents of: {}", target.display());

    let resolved = resolve(&args.metadata_flags(), args.yes, prompter)?;

    let files = match build_file_mapping(&target, exclude) {
        Ok(files) => files,
        Err(e) => {
            tracing::warn!(error = %e, "file enumeration failed");
            ui::print_error(&format!("An unexpected error occurred: {:#}", e));
            return Ok(Outcome::Failed(format!("{:#}", e)));
        }
    };

    upload_folder(
        archive,
        prompter,
        &resolved.identifier,
        &resolved.metadata,
        &files,
        args.yes,
    )
}
