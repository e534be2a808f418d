//! # x12-cli
//!
//! Command-line driver for the X12 codec: decode a file and print the
//! document tree as JSON, check its envelope cross-references, or re-encode
//! it byte for byte.

use std::fs::File;
use std::io::{BufReader, Write};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use x12_codec::{decode_with, DecodeOptions, Document, Marshaler};
use x12_validation::EnvelopeValidator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CliExitCode {
    Success = 0,
    Violations = 1,
    Errors = 2,
}

impl CliExitCode {
    fn as_exit_code(self) -> ExitCode {
        ExitCode::from(self as u8)
    }
}

#[derive(Parser)]
#[command(name = "x12")]
#[command(about = "X12 EDI codec CLI")]
#[command(version)]
struct Cli {
    /// Accept spaces between the ISA segment id and the first element
    /// separator (some published samples pad the id)
    #[arg(long, global = true)]
    relaxed: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode an X12 file and print the document tree as JSON
    Parse {
        /// Input file path
        input: String,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Decode an X12 file and check its envelope control numbers and counts
    Validate {
        /// Input file path
        input: String,
    },

    /// Decode an X12 file and re-encode it
    Encode {
        /// Input file path
        input: String,

        /// Output file path (writes to stdout when omitted)
        output: Option<String>,

        /// Append a newline after each segment terminator
        #[arg(long)]
        newlines: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    match run() {
        Ok(code) => code.as_exit_code(),
        Err(error) => {
            eprintln!("Error: {error:#}");
            CliExitCode::Errors.as_exit_code()
        }
    }
}

fn run() -> anyhow::Result<CliExitCode> {
    let cli = Cli::parse();

    let options = DecodeOptions::new().relaxed_segment_id_whitespace(cli.relaxed);

    match cli.command {
        Commands::Parse { input, pretty } => parse(&input, pretty, &options),
        Commands::Validate { input } => validate(&input, &options),
        Commands::Encode {
            input,
            output,
            newlines,
        } => encode(&input, output.as_deref(), newlines, &options),
    }
}

fn decode_file(path: &str, options: &DecodeOptions) -> anyhow::Result<Document> {
    let file = File::open(path).with_context(|| format!("Failed to open input file '{path}'"))?;
    decode_with(BufReader::new(file), options)
        .with_context(|| format!("Failed to decode X12 input '{path}'"))
}

fn parse(input_path: &str, pretty: bool, options: &DecodeOptions) -> anyhow::Result<CliExitCode> {
    tracing::info!(input = %input_path, "Starting parse command");

    let document = decode_file(input_path, options)?;

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    if pretty {
        serde_json::to_writer_pretty(&mut handle, &document)
    } else {
        serde_json::to_writer(&mut handle, &document)
    }
    .context("Failed to serialize document as JSON")?;
    handle
        .write_all(b"\n")
        .context("Failed to finalize JSON output on stdout")?;

    Ok(CliExitCode::Success)
}

fn validate(input_path: &str, options: &DecodeOptions) -> anyhow::Result<CliExitCode> {
    tracing::info!(input = %input_path, "Starting validate command");

    let document = decode_file(input_path, options)?;
    let report = EnvelopeValidator::new().validate(&document);

    if report.is_valid() {
        eprintln!("{input_path}: envelope is valid");
        return Ok(CliExitCode::Success);
    }

    for violation in &report {
        println!("{violation}");
    }
    eprintln!("{input_path}: {} violation(s) found", report.count());
    Ok(CliExitCode::Violations)
}

fn encode(
    input_path: &str,
    output_path: Option<&str>,
    newlines: bool,
    options: &DecodeOptions,
) -> anyhow::Result<CliExitCode> {
    tracing::info!(
        input = %input_path,
        output = output_path.unwrap_or("stdout"),
        "Starting encode command"
    );

    let document = decode_file(input_path, options)?;
    let marshaller = Marshaler {
        new_lines: newlines,
        ..Marshaler::new()
    };

    match output_path {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to create output file '{path}'"))?;
            marshaller
                .marshal_to_writer(&document, &mut file)
                .with_context(|| format!("Failed to write encoded output to '{path}'"))?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            marshaller
                .marshal_to_writer(&document, &mut handle)
                .context("Failed to write encoded output to stdout")?;
            if !newlines {
                handle
                    .write_all(b"\n")
                    .context("Failed to finalize encoded output on stdout")?;
            }
        }
    }

    Ok(CliExitCode::Success)
}
