use crate::metadata::MetadataFlags;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "archivist")]
#[command(about = "Upload a folder's contents to the Internet Archive")]
#[command(version)]
pub struct Args {
    /// The local folder to upload. Defaults to the current directory.
    #[arg(default_value = ".")]
    pub folder: PathBuf,

    /// The unique identifier for the Archive.org item
    #[arg(short, long)]
    pub identifier: Option<String>,

    /// The title of the item
    #[arg(short, long)]
    pub title: Option<String>,

    /// The creator or author of the item
    #[arg(short, long)]
    pub creator: Option<String>,

    /// The media type (e.g. "texts", "movies", "data")
    #[arg(short, long)]
    pub mediatype: Option<String>,

    /// A description for the item
    #[arg(long)]
    pub description: Option<String>,

    /// Comma-separated subjects or tags
    #[arg(long)]
    pub subjects: Option<String>,

    /// The publication year of the item
    #[arg(long)]
    pub year: Option<String>,

    /// Skip all interactive prompts and proceed with upload
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl Args {
    pub fn metadata_flags(&self) -> MetadataFlags {
        MetadataFlags {
            identifier: self.identifier.clone(),
            title: self.title.clone(),
            creator: self.creator.clone(),
            mediatype: self.mediatype.clone(),
            description: self.description.clone(),
            subjects: self.subjects.clone(),
            year: self.year.clone(),
        }
    }
}
