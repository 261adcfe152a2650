// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// spoolctl: inspect printers and jobs, submit documents, and control jobs
// on the host's print service. Every command prints JSON on stdout.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::{Value, json};

use spoolkit_bridge::MemorySpooler;
use spoolkit_core::error::Result;
use spoolkit_core::{JobOptions, JobScope, SpoolConfig, SpoolError};
use spoolkit_print::PrintService;

/// spoolctl - query and drive CUPS or the Windows print spooler
#[derive(Parser, Debug)]
#[command(name = "spoolctl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Use the built-in in-memory spooler instead of the host's service
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every printer with its active jobs
    List,

    /// Name of the default printer
    Default,

    /// Show one printer
    Show { printer: String },

    /// Driver options of a printer
    Options {
        printer: String,

        /// Print the full group tree instead of the flat keyword map
        #[arg(long)]
        tree: bool,
    },

    /// Paper size currently selected in the driver
    PaperSize { printer: String },

    /// Jobs of a printer
    Jobs {
        printer: String,

        /// Include completed, cancelled and aborted jobs
        #[arg(long)]
        all: bool,
    },

    /// Show one job
    Job { printer: String, id: i64 },

    /// Apply a job command (see `commands`)
    Command {
        printer: String,
        id: i64,
        command: String,
    },

    /// Stream a document into a new job
    Print {
        printer: String,

        /// Document to send, or `-` for stdin
        file: PathBuf,

        /// Format label (see `formats`)
        #[arg(long, default_value = "RAW")]
        format: String,

        /// Job name (defaults to the file name)
        #[arg(long)]
        name: Option<String>,

        /// Job option as KEY=VALUE; repeatable
        #[arg(short = 'o', long = "option", value_name = "KEY=VALUE", value_parser = parse_option)]
        options: Vec<(String, String)>,
    },

    /// Hand a file to the service in a single call
    PrintFile {
        printer: String,
        file: PathBuf,

        /// Job name (defaults to the file name)
        #[arg(long)]
        name: Option<String>,

        /// Job option as KEY=VALUE; repeatable
        #[arg(short = 'o', long = "option", value_name = "KEY=VALUE", value_parser = parse_option)]
        options: Vec<(String, String)>,
    },

    /// Format labels accepted by `print`
    Formats,

    /// Job command labels accepted by `command`
    Commands,
}

fn parse_option(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SpoolConfig::load(path)?,
        None => SpoolConfig::default(),
    }
    .with_env_overrides();

    let service = if cli.memory {
        config.validate()?;
        PrintService::new(Box::new(MemorySpooler::fixture()), config)
    } else {
        PrintService::native(config)?
    };
    tracing::debug!(platform = service.platform_name(), "backend selected");

    let output = execute(&service, cli.command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn execute(service: &PrintService, command: Commands) -> Result<Value> {
    let value = match command {
        Commands::List => serde_json::to_value(service.list_printers()?)?,
        Commands::Default => {
            // CUPS never reports a default; fall back to the flagged printer.
            let name = match service.default_printer_name()? {
                Some(name) => Some(name),
                None => service
                    .list_printers()?
                    .into_iter()
                    .find(|p| p.is_default)
                    .map(|p| p.name),
            };
            json!({ "default": name })
        }
        Commands::Show { printer } => serde_json::to_value(service.get_printer(&printer)?)?,
        Commands::Options { printer, tree } => {
            let options = service.driver_options(&printer)?;
            if tree {
                serde_json::to_value(options)?
            } else {
                serde_json::to_value(options.to_choice_map())?
            }
        }
        Commands::PaperSize { printer } => {
            json!({ "paperSize": service.selected_paper_size(&printer)? })
        }
        Commands::Jobs { printer, all } => {
            let scope = if all { JobScope::All } else { JobScope::Active };
            serde_json::to_value(service.get_jobs(&printer, scope)?)?
        }
        Commands::Job { printer, id } => serde_json::to_value(service.get_job(&printer, id)?)?,
        Commands::Command {
            printer,
            id,
            command,
        } => json!({ "applied": service.set_job_command(&printer, id, &command)? }),
        Commands::Print {
            printer,
            file,
            format,
            name,
            options,
        } => {
            let data = read_document(&file)?;
            let doc_name = name.unwrap_or_else(|| document_name(&file));
            let options: JobOptions = options.into_iter().collect();
            let id = service.submit_data(&data, &printer, &doc_name, &format, &options)?;
            json!({ "jobId": id })
        }
        Commands::PrintFile {
            printer,
            file,
            name,
            options,
        } => {
            let doc_name = name.unwrap_or_else(|| document_name(&file));
            let options: JobOptions = options.into_iter().collect();
            let id = service.submit_file(&file, &doc_name, &printer, &options)?;
            json!({ "jobId": id })
        }
        Commands::Formats => serde_json::to_value(service.supported_formats()?)?,
        Commands::Commands => serde_json::to_value(service.supported_job_commands())?,
    };
    Ok(value)
}

fn read_document(path: &Path) -> Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut data = Vec::new();
        std::io::stdin().read_to_end(&mut data)?;
        return Ok(data);
    }
    std::fs::read(path).map_err(SpoolError::from)
}

fn document_name(path: &Path) -> String {
    if path == Path::new("-") {
        return "stdin".to_string();
    }
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "stdin".to_string())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::CommandFactory;

    use super::*;

    fn memory_service() -> PrintService {
        PrintService::new(Box::new(MemorySpooler::fixture()), SpoolConfig::default())
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn options_parse_as_key_value() {
        assert_eq!(parse_option("copies=2"), Ok(("copies".into(), "2".into())));
        assert_eq!(
            parse_option("job-name=a=b"),
            Ok(("job-name".into(), "a=b".into()))
        );
        assert!(parse_option("copies").is_err());
        assert!(parse_option("=2").is_err());
    }

    #[test]
    fn subcommands_parse() {
        let cli = Cli::parse_from(["spoolctl", "--memory", "jobs", "Fixture-Printer", "--all"]);
        assert!(cli.memory);
        assert!(matches!(cli.command, Commands::Jobs { all: true, .. }));

        let cli = Cli::parse_from([
            "spoolctl", "print", "Office", "doc.pdf", "--format", "PDF", "-o", "copies=2",
        ]);
        match cli.command {
            Commands::Print { format, options, .. } => {
                assert_eq!(format, "PDF");
                assert_eq!(options, vec![("copies".to_string(), "2".to_string())]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn default_falls_back_to_flagged_printer() {
        let value = execute(&memory_service(), Commands::Default).unwrap();
        assert_eq!(value["default"], "Fixture-Printer");
    }

    #[test]
    fn print_then_list_jobs() {
        let service = memory_service();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello").unwrap();

        let printed = execute(
            &service,
            Commands::Print {
                printer: "Fixture-Printer".into(),
                file: file.path().to_path_buf(),
                format: "TEXT".into(),
                name: Some("greeting".into()),
                options: Vec::new(),
            },
        )
        .unwrap();
        assert!(printed["jobId"].as_u64().is_some_and(|id| id > 0));

        let jobs = execute(
            &service,
            Commands::Jobs {
                printer: "Fixture-Printer".into(),
                all: false,
            },
        )
        .unwrap();
        assert_eq!(jobs[0]["name"], "greeting");
    }

    #[test]
    fn flat_options_map() {
        let value = execute(
            &memory_service(),
            Commands::Options {
                printer: "Fixture-Label".into(),
                tree: false,
            },
        )
        .unwrap();
        assert_eq!(value["PageSize"]["w288h432"], true);
        assert_eq!(value["Darkness"]["10"], false);
    }

    #[test]
    fn document_name_from_path() {
        assert_eq!(document_name(Path::new("/tmp/report.pdf")), "report.pdf");
        assert_eq!(document_name(Path::new("-")), "stdin");
    }
}
