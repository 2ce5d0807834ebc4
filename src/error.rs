// Input validation errors. These are detected before any network activity
// and make the binary exit with status 1.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchivistError {
    #[error("Error: Folder not found at '{}'", .0.display())]
    FolderNotFound(PathBuf),

    #[error(
        "Error: Cannot run in non-interactive mode (-y) without providing all required metadata via arguments.\nMissing: {}\nRequired: --identifier, --title, --creator, --mediatype",
        .0.join(", ")
    )]
    MissingRequiredFlags(Vec<String>),
}
