//! CLI argument parsing for castlink
//!
//! Defines the Command enum and parse_args() function for all CLI commands.

use anyhow::Result;
use castlink::{OutputFormat, PersonId};
use std::path::PathBuf;

pub fn print_usage() {
    eprintln!("castlink - shortest co-star chains between performers");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  castlink <command> [arguments]");
    eprintln!("  castlink --help");
    eprintln!("  castlink --version");
    eprintln!();
    eprintln!("  castlink search    --query <TEXT> [--output <FORMAT>]");
    eprintln!("  castlink ingest    [--db <FILE>] --person <ID> [--output <FORMAT>]");
    eprintln!("  castlink connect   [--db <FILE>] --from <ID> --to <ID> [--output <FORMAT>]");
    eprintln!("  castlink shared    [--db <FILE>] --a <ID> --b <ID> [--output <FORMAT>]");
    eprintln!("  castlink neighbors [--db <FILE>] --person <ID> [--output <FORMAT>]");
    eprintln!("  castlink status    [--db <FILE>] [--output <FORMAT>]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  search      Search the catalog for performers");
    eprintln!("  ingest      Store a person's filmography and co-stars");
    eprintln!("  connect     Find the shortest co-star chain between two people");
    eprintln!("  shared      Find the highest-rated film two people share");
    eprintln!("  neighbors   Show stored credits and co-stars of a person (no catalog calls)");
    eprintln!("  status      Show database statistics");
    eprintln!();
    eprintln!("Global arguments:");
    eprintln!("  --db <FILE>         SQLite database (default: $CASTLINK_DB or castlink.db)");
    eprintln!("  --output <FORMAT>   Output format: human (default), json or pretty");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  TMDB_API_KEY        Catalog bearer token (search, ingest, connect, shared)");
    eprintln!("  RUST_LOG            Log filter (default: castlink=info)");
}

#[derive(Debug, PartialEq)]
pub enum Command {
    Search {
        query: String,
        output_format: OutputFormat,
    },
    Ingest {
        db_path: Option<PathBuf>,
        person: PersonId,
        output_format: OutputFormat,
    },
    Connect {
        db_path: Option<PathBuf>,
        from: PersonId,
        to: PersonId,
        output_format: OutputFormat,
    },
    Shared {
        db_path: Option<PathBuf>,
        a: PersonId,
        b: PersonId,
        output_format: OutputFormat,
    },
    Neighbors {
        db_path: Option<PathBuf>,
        person: PersonId,
        output_format: OutputFormat,
    },
    Status {
        db_path: Option<PathBuf>,
        output_format: OutputFormat,
    },
    Help,
    Version,
}

/// Flags shared by every command, plus the command-specific ones
#[derive(Default)]
struct Flags {
    db_path: Option<PathBuf>,
    output_format: Option<OutputFormat>,
    values: Vec<(String, String)>,
}

impl Flags {
    fn output_format(&self) -> OutputFormat {
        self.output_format.unwrap_or(OutputFormat::Human)
    }

    fn required(&self, flag: &str) -> Result<&str> {
        self.values
            .iter()
            .find(|(name, _)| name == flag)
            .map(|(_, value)| value.as_str())
            .ok_or_else(|| anyhow::anyhow!("{} is required", flag))
    }

    fn person(&self, flag: &str) -> Result<PersonId> {
        let raw = self.required(flag)?;
        raw.parse::<i64>()
            .map(PersonId)
            .map_err(|_| anyhow::anyhow!("{} must be a numeric person id, got '{}'", flag, raw))
    }
}

/// Walk `args` after the command name, accepting only `allowed` value flags
fn parse_flags(args: &[String], allowed: &[&str]) -> Result<Flags> {
    let mut flags = Flags::default();

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        let known = flag == "--db" || flag == "--output" || allowed.contains(&flag);
        if !known {
            return Err(anyhow::anyhow!("Unknown argument: {}", flag));
        }
        let value = args
            .get(i + 1)
            .ok_or_else(|| anyhow::anyhow!("{} requires an argument", flag))?;

        match flag {
            "--db" => flags.db_path = Some(PathBuf::from(value)),
            "--output" => {
                flags.output_format = Some(
                    OutputFormat::from_str(value)
                        .ok_or_else(|| anyhow::anyhow!("Invalid output format: {}", value))?,
                );
            }
            _ => flags.values.push((flag.to_string(), value.clone())),
        }
        i += 2;
    }

    Ok(flags)
}

/// Parse the full argument vector (including the program name)
pub fn parse_args(args: &[String]) -> Result<Command> {
    let command = args
        .get(1)
        .ok_or_else(|| anyhow::anyhow!("Missing command"))?;
    let rest = &args[2..];

    match command.as_str() {
        "--help" | "-h" | "help" => Ok(Command::Help),
        "--version" | "-V" | "version" => Ok(Command::Version),
        "search" => {
            let flags = parse_flags(rest, &["--query"])?;
            Ok(Command::Search {
                query: flags.required("--query")?.to_string(),
                output_format: flags.output_format(),
            })
        }
        "ingest" => {
            let flags = parse_flags(rest, &["--person"])?;
            Ok(Command::Ingest {
                person: flags.person("--person")?,
                output_format: flags.output_format(),
                db_path: flags.db_path,
            })
        }
        "connect" => {
            let flags = parse_flags(rest, &["--from", "--to"])?;
            Ok(Command::Connect {
                from: flags.person("--from")?,
                to: flags.person("--to")?,
                output_format: flags.output_format(),
                db_path: flags.db_path,
            })
        }
        "shared" => {
            let flags = parse_flags(rest, &["--a", "--b"])?;
            Ok(Command::Shared {
                a: flags.person("--a")?,
                b: flags.person("--b")?,
                output_format: flags.output_format(),
                db_path: flags.db_path,
            })
        }
        "neighbors" => {
            let flags = parse_flags(rest, &["--person"])?;
            Ok(Command::Neighbors {
                person: flags.person("--person")?,
                output_format: flags.output_format(),
                db_path: flags.db_path,
            })
        }
        "status" => {
            let flags = parse_flags(rest, &[])?;
            Ok(Command::Status {
                output_format: flags.output_format(),
                db_path: flags.db_path,
            })
        }
        other => Err(anyhow::anyhow!("Unknown command: {}", other)),
    }
}

/// Output format requested anywhere on the command line, for error reporting
pub fn requested_output_format(args: &[String]) -> OutputFormat {
    args.iter()
        .position(|x| x == "--output")
        .and_then(|i| args.get(i + 1))
        .and_then(|fmt| OutputFormat::from_str(fmt))
        .unwrap_or(OutputFormat::Human)
}
