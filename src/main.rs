//! Main module for the Quillpad CLI application (quill).
//!
//! This module provides the main function and auxiliary functionality for
//! the CLI: command parsing, configuration loading and initialization, and
//! dispatch to the AI gateway and document store.
//!
//! # Examples
//!
//! Getting feedback on a draft:
//!
//! ```sh
//! quill improve draft.md
//! quill analyze draft.md
//! ```
//!
//! Initializing the application's configuration and templates:
//!
//! ```sh
//! quill init
//! ```

use clap::Parser;
use crossterm::{
    ExecutableCommand,
    style::{Color, SetForegroundColor},
};
use once_cell::sync::OnceCell;
use std::io::{BufRead, Write, stdout};
use std::path::PathBuf;
use std::{error::Error, fs};
use tracing::{debug, info};

use quillpad::api::Assistant;
use quillpad::document::{Chapter, Document, parse_keywords};
use quillpad::store::DocumentStore;
use quillpad::{commands, config, config_dir, template};

static TRACING: OnceCell<()> = OnceCell::new();

fn main() -> Result<(), Box<dyn Error>> {
    TRACING.get_or_init(|| {
        tracing_subscriber::fmt::init();
    });
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run())
}

/// Main asynchronous function of the Quillpad CLI application.
///
/// Parses command-line arguments, loads configuration (except for `init`,
/// which must work before any configuration exists), and executes the
/// appropriate command.
///
/// # Errors
///
/// Returns an error if configuration loading fails (including a missing
/// `QUILLPAD_API_KEY`) or if the command itself fails.
async fn run() -> Result<(), Box<dyn Error>> {
    let cli = commands::Cli::parse();

    if let commands::Commands::Init = cli.command {
        debug!("Initializing configuration");
        return init();
    }

    let config_path = config_dir()?.join("config.yaml");
    debug!("Loading config from: {}", config_path.display());
    let quill_config = config::load_config(config_path.to_str().ok_or("invalid config path")?)?;
    quill_config.ensure_directories()?;

    match cli.command {
        commands::Commands::Improve { file } => {
            let content = read_input(file)?;
            let assistant = Assistant::new(&quill_config)?;
            match assistant.improve_writing(&content).await {
                Ok(improved) => println!("{improved}"),
                Err(err) => {
                    eprintln!("{err}");
                    std::process::exit(1);
                }
            }
        }
        commands::Commands::Analyze { file } => {
            let content = read_input(file)?;
            let assistant = Assistant::new(&quill_config)?;
            match assistant.analyze_content(&content).await {
                Ok(analysis) => println!("{analysis}"),
                Err(err) => {
                    eprintln!("{err}");
                    std::process::exit(1);
                }
            }
        }
        commands::Commands::Chat => {
            let assistant = Assistant::new(&quill_config)?;
            chat_loop(assistant).await?;
        }
        commands::Commands::List => {
            let store = DocumentStore::new(quill_config.documents_dir())?;
            let outcome = store.load_all()?;
            for doc in &outcome.documents {
                let created = doc
                    .metadata
                    .as_ref()
                    .map(|m| m.created_at.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                let filename = doc.filename().unwrap_or("<unsaved>");
                println!("{created}  {filename}  {}", doc.title);
            }
            for failure in &outcome.failures {
                eprintln!("warning: skipping {}: {}", failure.path.display(), failure.reason);
            }
            if outcome.documents.is_empty() {
                println!("No documents saved yet.");
            }
        }
        commands::Commands::New {
            title,
            description,
            keywords,
            content,
        } => {
            let body = read_input(content)?;
            let mut document = Document::new(title);
            document.description = description;
            document.keywords = keywords.as_deref().map(parse_keywords).unwrap_or_default();
            document.chapters = vec![Chapter {
                title: "Chapter 1".to_string(),
                content: body,
                sections: Vec::new(),
            }];

            let store = DocumentStore::new(quill_config.documents_dir())?;
            let filename = store.save(&mut document)?;
            println!("Saved as {filename}");
        }
        commands::Commands::Init => unreachable!("handled above"),
    }

    Ok(())
}

/// Read the draft text from a file, or from stdin when no file is given.
fn read_input(file: Option<PathBuf>) -> Result<String, Box<dyn Error>> {
    match file {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => {
            let mut buffer = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut buffer)?;
            Ok(buffer)
        }
    }
}

/// Interactive chat loop. Context accumulates across turns; `/clear` resets
/// the transcript and `exit` leaves the loop. AI errors are printed and the
/// loop continues, so a transient failure never loses the session.
async fn chat_loop(mut assistant: Assistant) -> Result<(), Box<dyn Error>> {
    println!("Chatting with the writing assistant. Type 'exit' to quit, '/clear' to reset context.");

    let stdin = std::io::stdin();
    loop {
        let mut out = stdout();
        out.execute(SetForegroundColor(Color::Green))?;
        print!("\nYou: ");
        out.flush()?;
        out.execute(SetForegroundColor(Color::Reset))?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") {
            break;
        }
        if input == "/clear" {
            assistant.clear_history();
            println!("Context cleared.");
            continue;
        }

        match assistant.chat_with_context(input).await {
            Ok(reply) => {
                let mut out = stdout();
                out.execute(SetForegroundColor(Color::Blue))?;
                println!("\n{reply}");
                out.execute(SetForegroundColor(Color::Reset))?;
            }
            Err(err) => eprintln!("{err}"),
        }
    }

    Ok(())
}

/// Initializes the application's configuration, prompt templates, and
/// document directory.
///
/// The API key itself is never written to disk; `quill` reads it from the
/// `QUILLPAD_API_KEY` environment variable at startup.
///
/// # Errors
///
/// Returns an error if directories or files cannot be created, or if
/// serializing the defaults to YAML fails.
fn init() -> Result<(), Box<dyn Error>> {
    let config_dir = config_dir()?;
    let templates_dir = config_dir.join("templates");
    info!("Creating template config directory: {}", templates_dir.display());
    fs::create_dir_all(&templates_dir)?;

    for name in ["improve", "analyze", "chat"] {
        let template_path = templates_dir.join(format!("{name}.yaml"));
        if template_path.exists() {
            continue;
        }
        info!("Creating template file: {}", template_path.display());
        let preset = template::builtin(name).ok_or("missing built-in template")?;
        fs::write(&template_path, serde_yaml::to_string(&preset)?)?;
    }

    let config_path = config_dir.join("config.yaml");
    if !config_path.exists() {
        info!("Creating config file: {}", config_path.display());
        let defaults = config::QuillpadConfig::default();
        fs::write(&config_path, serde_yaml::to_string(&defaults)?)?;
    }

    let defaults = config::QuillpadConfig::default();
    fs::create_dir_all(defaults.documents_dir())?;

    println!("Initialized. Set {} in your environment to get started.", config::API_KEY_ENV);
    Ok(())
}
