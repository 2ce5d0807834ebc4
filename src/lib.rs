// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) parses arguments and hands them to `app::run`.
//
// Module responsibilities:
// - `api`: HTTP interactions with archive.org (open item, upload files)
//   behind the `ArchiveService` trait.
// - `config`: endpoints and credentials from the environment and the
//   `ia configure` config file.
// - `metadata`: merges flag values and prompt answers into the item
//   metadata record.
// - `files`: maps local files to their paths inside the item.
// - `upload`: confirmation, upload call and user-facing outcome messages.
// - `ui`: terminal prompts, spinners and colored status lines.
// - `app`: the end-to-end flow for one invocation.
pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod files;
pub mod metadata;
pub mod ui;
pub mod upload;
