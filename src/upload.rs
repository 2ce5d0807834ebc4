// Upload dispatch: confirm, hand the mapping to the archive service and
// translate the result into user-facing messages.

use crate::api::ArchiveService;
use crate::config::item_url;
use crate::files::FileMapping;
use crate::metadata::MetadataRecord;
use crate::ui::{self, Prompter};
use anyhow::Result;

/// How an upload attempt ended. None of these are process failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Uploaded { url: String, uploaded: usize, skipped: usize },
    NothingToUpload,
    Cancelled,
    AuthenticationFailed,
    Failed(String),
}

/// Upload `files` into the item named `identifier`.
///
/// Prompt errors (e.g. the terminal going away) are returned; every error
/// coming from the archive service is reported and folded into the outcome.
pub fn upload_folder(
    archive: &dyn ArchiveService,
    prompter: &mut dyn Prompter,
    identifier: &str,
    metadata: &MetadataRecord,
    files: &FileMapping,
    non_interactive: bool,
) -> Result<Outcome> {
    println!();
    println!("Starting upload process...");
    println!("→ Target Identifier: {}", identifier);

    if files.is_empty() {
        println!("No files found to upload (excluding the script itself).");
        return Ok(Outcome::NothingToUpload);
    }
    println!("Found {} file(s) to potentially upload.", files.len());

    if !non_interactive && !prompter.confirm("Do you want to proceed with the upload?")? {
        println!("Upload cancelled by user.");
        return Ok(Outcome::Cancelled);
    }

    let spinner = ui::spinner("Looking up item...");
    let item = archive.get_item(identifier);
    spinner.finish_and_clear();

    let result = item.and_then(|item| {
        if item.exists {
            tracing::info!(identifier, existing = item.files.len(), "adding to existing item");
        }
        println!("Uploading {} files with their directory structure...", files.len());
        archive.upload(&item, files, metadata)
    });

    match result {
        Ok(report) => {
            let url = item_url(identifier);
            println!();
            if !report.skipped.is_empty() {
                println!("Skipped {} file(s) already in the item.", report.skipped.len());
            }
            ui::print_success("Upload process complete.");
            println!("View your item at: {}", url);
            Ok(Outcome::Uploaded {
                url,
                uploaded: report.uploaded.len(),
                skipped: report.skipped.len(),
            })
        }
        Err(e) if e.is_authentication() => {
            tracing::warn!(error = %e, "authentication failed");
            println!();
            ui::print_error("Authentication Error: Could not connect to Archive.org.");
            println!("Please run 'ia configure' in your terminal to set up your credentials.");
            Ok(Outcome::AuthenticationFailed)
        }
        Err(e) => {
            tracing::warn!(error = %e, "upload failed");
            println!();
            ui::print_error(&format!("An unexpected error occurred: {}", e));
            Ok(Outcome::Failed(e.to_string()))
        }
    }
}
