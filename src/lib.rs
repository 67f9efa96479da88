//! # Quillpad (library root)
//!
//! This crate provides the core plumbing for the **Quillpad** writing
//! assistant CLI and library:
//! - AI gateway for writing feedback (`api`, `client`, `transcript`).
//! - Prompt preset handling (`template`).
//! - Document model and on-disk store (`document`, `store`).
//! - Configuration loading (`config`).
//! - CLI parsing (`commands`).
//!
//! In addition, this module exposes utilities for discovering the
//! per-platform configuration and data directories ([`config_dir`],
//! [`data_dir`]), which hold `config.yaml`, the prompt templates, and the
//! default document store root:
//!
//! - macOS: `~/Library/Application Support/com.quillpad.quill`
//! - Linux (XDG): `~/.config/quill` and `~/.local/share/quill`
//! - Windows: `C:\Users\<you>\AppData\Roaming\quillpad\quill`
//!
//! ## Modules
//! - [`api`], [`client`], [`commands`], [`config`], [`document`],
//!   [`store`], [`template`], [`transcript`]

use directories::ProjectDirs;
use std::error::Error;
use std::path::PathBuf;

pub mod api;
pub mod client;
pub mod commands;
pub mod config;
pub mod document;
pub mod store;
pub mod template;
pub mod transcript;

/// Return the per-platform configuration directory used by Quillpad.
///
/// This uses [`directories::ProjectDirs`] with the application triple
/// `("com", "quillpad", "quill")`, so you get the right place on each OS
/// (e.g., `~/.config/quill` on Linux via XDG).
///
/// The directory is **not** created by this function; callers that need it
/// should create it with `fs::create_dir_all`.
///
/// # Errors
/// Returns an error if the platform configuration directory cannot be
/// determined (rare, but possible in heavily sandboxed environments).
pub fn config_dir() -> Result<PathBuf, Box<dyn Error>> {
    let proj_dirs = ProjectDirs::from("com", "quillpad", "quill")
        .ok_or("Unable to determine config directory")?;
    Ok(proj_dirs.config_dir().to_path_buf())
}

/// Return the per-platform data directory used by Quillpad.
///
/// The default document store root is `data_dir()/documents`. Like
/// [`config_dir`], this does not create the directory.
///
/// # Errors
/// Returns an error if the platform data directory cannot be determined.
pub fn data_dir() -> Result<PathBuf, Box<dyn Error>> {
    let proj_dirs = ProjectDirs::from("com", "quillpad", "quill")
        .ok_or("Unable to determine data directory")?;
    Ok(proj_dirs.data_dir().to_path_buf())
}
