//! `resdoc`: JSON:API document command-line interface.
//!
//! - **`validate`**: parse a document the way a server (or, with
//!   `--response`, a client) would, and report every violation.
//! - **`new`**: build a single-object document and print what a server would
//!   send for it.
//!
//! Both read configuration from the `RESDOC_*` environment variables. Log
//! output goes to stderr and is controlled by `RUST_LOG`.

use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use resdoc::{Config, Document, Mode, ResourceObject, Sender, Verb};

/// resdoc: JSON:API document CLI
///
/// Validate and build JSON:API documents.
#[derive(Parser)]
#[command(name = "resdoc", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a JSON:API document.
    ///
    /// Exits 0 if the document is valid, 1 otherwise. Violations are printed
    /// to stderr with their HTTP status.
    ///
    /// Pass `-` as FILE to read from stdin.
    Validate {
        /// Path to a JSON file, or `-` for stdin.
        file: PathBuf,

        /// The request verb: create | read | update | delete (or an HTTP
        /// method name).
        #[arg(short = 'v', long, default_value = "create", value_name = "VERB")]
        verb: Verb,

        /// Validate as a server reply instead of a client request.
        #[arg(long)]
        response: bool,
    },

    /// Build a single-object document and print it as JSON.
    ///
    /// The document is validated as a reply to VERB; an invalid object prints
    /// the error document that would be sent instead and exits 1.
    ///
    /// Examples:
    ///   resdoc new -t user -i 42 -a '{"name": "Ann"}'
    ///   resdoc new -t user -i 7 --verb update --status 202
    New {
        /// Resource type.
        #[arg(short = 't', long = "type", value_name = "TYPE")]
        resource_type: String,

        /// Resource id.
        #[arg(short = 'i', long, default_value = "", value_name = "ID")]
        id: String,

        /// Attributes as a JSON object.
        #[arg(short = 'a', long, default_value = "{}", value_name = "JSON")]
        attributes: String,

        /// The verb the reply answers.
        #[arg(short = 'v', long, default_value = "create", value_name = "VERB")]
        verb: Verb,

        /// Explicit status for the object; defaults to the verb's.
        #[arg(short = 's', long, value_name = "CODE")]
        status: Option<u16>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resdoc=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Command::Validate {
            file,
            verb,
            response,
        } => {
            let input = open_input(&file);
            let parser = if response {
                resdoc::Parser::for_response(verb, Some(resdoc::CONTENT_TYPE), config)
            } else {
                resdoc::Parser::new(verb, Some(resdoc::CONTENT_TYPE), config)
            };

            match parser.document(input) {
                Ok(document) => {
                    tracing::debug!("validate: {} accepted as {}", file.display(), parser.verb());
                    println!("valid: {}", describe(&document));
                }
                Err(e) => {
                    tracing::debug!("validate: {} rejected with {}", file.display(), e.status());
                    for error in e.into_list() {
                        eprintln!("error: {} {error}", error.status);
                        if !error.internal_message().is_empty() {
                            eprintln!("  cause: {}", error.internal_message());
                        }
                        if let Some(pointer) = &error.source_pointer {
                            eprintln!("  at: {pointer}");
                        }
                    }
                    process::exit(1);
                }
            }
        }

        Command::New {
            resource_type,
            id,
            attributes,
            verb,
            status,
        } => {
            let attributes: serde_json::Value = serde_json::from_str(&attributes)
                .unwrap_or_else(|e| fatal(&format!("--attributes is not valid JSON: {e}")));
            let mut object = ResourceObject::new(resource_type, id, &attributes)
                .unwrap_or_else(|e| fatal(&e.to_string()));
            object.status = status.unwrap_or(0);

            let reply = Sender::new(config).send(&verb, object);
            tracing::debug!("new: {verb} reply has status {}", reply.status());
            let body: serde_json::Value = serde_json::from_slice(reply.body())
                .unwrap_or_else(|e| fatal(&format!("unreadable reply body: {e}")));
            let pretty = serde_json::to_string_pretty(&body)
                .unwrap_or_else(|e| fatal(&format!("unable to format reply: {e}")));

            if reply.status().is_success() {
                println!("{pretty}");
            } else {
                eprintln!("{pretty}");
                eprintln!("resdoc: object is invalid ({})", reply.status());
                process::exit(1);
            }
        }
    }
}

/// One-line summary of a valid document.
fn describe(document: &Document) -> String {
    match document.mode() {
        Mode::Single => format!("single-object document, status {}", document.status),
        Mode::Collection => format!(
            "collection of {} object(s), status {}",
            document.data.len(),
            document.status
        ),
        Mode::Errors => format!(
            "error document with {} error(s), status {}",
            document.errors.len(),
            document.status
        ),
    }
}

/// Open a file, or stdin when the path is `"-"`.
fn open_input(path: &PathBuf) -> Box<dyn Read> {
    if path.to_str() == Some("-") {
        return Box::new(io::stdin());
    }
    match File::open(path) {
        Ok(file) => Box::new(file),
        Err(e) => fatal(&format!("failed to read {}: {e}", path.display())),
    }
}

/// Print an error message to stderr and exit with code 2.
fn fatal(msg: &str) -> ! {
    eprintln!("resdoc: {msg}");
    process::exit(2);
}
