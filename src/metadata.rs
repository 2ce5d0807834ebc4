// Metadata resolution: merge flag values with interactive answers into the
// record attached to the item. Flag-facing names are remapped to stored
// field names through the `FIELDS` table.

use crate::error::ArchivistError;
use crate::ui::Prompter;
use anyhow::Result;
use std::collections::BTreeMap;

/// Field name → value, as sent to the archive. Never holds `identifier`.
pub type MetadataRecord = BTreeMap<String, String>;

/// One metadata field as seen by the user and as stored on the item.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    /// Name of the command-line flag, without dashes.
    pub flag: &'static str,
    /// Name stored in the record.
    pub key: &'static str,
    pub prompt: &'static str,
    pub required: bool,
}

/// Fields in the order they are prompted for.
pub const FIELDS: [Field; 7] = [
    Field { flag: "identifier", key: "identifier", prompt: "Enter a unique identifier", required: true },
    Field { flag: "title", key: "title", prompt: "Enter a title", required: true },
    Field { flag: "creator", key: "creator", prompt: "Enter the creator/author", required: true },
    Field { flag: "mediatype", key: "mediatype", prompt: "Enter media type (e.g., texts, movies, data)", required: true },
    Field { flag: "description", key: "description", prompt: "Enter a description (optional)", required: false },
    Field { flag: "subjects", key: "subject", prompt: "Enter subjects/tags, comma-separated (optional)", required: false },
    Field { flag: "year", key: "date", prompt: "Enter year (optional)", required: false },
];

/// Metadata values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct MetadataFlags {
    pub identifier: Option<String>,
    pub title: Option<String>,
    pub creator: Option<String>,
    pub mediatype: Option<String>,
    pub description: Option<String>,
    pub subjects: Option<String>,
    pub year: Option<String>,
}

impl MetadataFlags {
    /// Trimmed value of a flag; blank values count as absent.
    pub fn value(&self, flag: &str) -> Option<&str> {
        let raw = match flag {
            "identifier" => &self.identifier,
            "title" => &self.title,
            "creator" => &self.creator,
            "mediatype" => &self.mediatype,
            "description" => &self.description,
            "subjects" => &self.subjects,
            "year" => &self.year,
            _ => &None,
        };
        raw.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    /// Required flags that were not supplied, as `--name`.
    pub fn missing_required(&self) -> Vec<String> {
        FIELDS
            .iter()
            .filter(|f| f.required && self.value(f.flag).is_none())
            .map(|f| format!("--{}", f.flag))
            .collect()
    }
}

/// Result of resolution: the item name and its descriptive metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMetadata {
    pub identifier: String,
    pub metadata: MetadataRecord,
}

/// Produce a complete record from flags, prompting for whatever is missing.
///
/// With all four required flags present nothing is asked. In
/// non-interactive mode a missing required flag is an
/// [`ArchivistError::MissingRequiredFlags`]. Otherwise each field without a
/// flag is prompted for; required fields are asked again until answered.
pub fn resolve(
    flags: &MetadataFlags,
    non_interactive: bool,
    prompter: &mut dyn Prompter,
) -> Result<ResolvedMetadata> {
    let missing = flags.missing_required();
    if !missing.is_empty() && non_interactive {
        return Err(ArchivistError::MissingRequiredFlags(missing).into());
    }

    let mut record = MetadataRecord::new();
    for field in FIELDS.iter() {
        if let Some(v) = flags.value(field.flag) {
            record.insert(field.key.to_string(), v.to_string());
        }
    }

    if !missing.is_empty() {
        println!("Please provide the metadata for your Archive.org item.");
        for field in FIELDS.iter().filter(|f| flags.value(f.flag).is_none()) {
            if let Some(v) = ask(field, prompter)? {
                record.insert(field.key.to_string(), v);
            }
        }
    }

    let identifier = record.remove("identifier").unwrap_or_default();
    Ok(ResolvedMetadata { identifier, metadata: record })
}

fn ask(field: &Field, prompter: &mut dyn Prompter) -> Result<Option<String>> {
    loop {
        let value = prompter.input(field.prompt)?.trim().to_string();
        if !value.is_empty() {
            return Ok(Some(value));
        }
        if !field.required {
            return Ok(None);
        }
        crate::ui::print_error("This field is required.");
    }
}
