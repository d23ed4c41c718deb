use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use parts_coverage::flatten::{TemplateLayout, format_percentage};
use parts_coverage::pipeline::{self, ReportInputs};
use parts_coverage::{Result, ToolError};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose)?;
    match cli.command {
        Command::Report(args) => execute_report(args),
    }
}

fn init_logging(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| ToolError::Logging(error.to_string()))
}

fn execute_report(args: ReportArgs) -> Result<()> {
    let inputs = ReportInputs {
        result_log: args.result_log,
        template: args.template,
        test_log: args.test_log,
        reference: args.reference,
        output: args.output,
    };

    let report = pipeline::generate_report(&inputs, &TemplateLayout::default())?;

    if let Some(dir) = &args.export_dir {
        for path in pipeline::export_buckets(dir, &report)? {
            println!("exported {}", path.display());
        }
    }
    if let Some(path) = &args.summary {
        pipeline::write_summary(path, &report)?;
    }

    println!("wrote {}", inputs.output.display());
    if let Some(parts) = &report.parts {
        println!(
            "parts: {} unique, {} duplicate, {} without description, {} no-connect; coverage {}",
            parts.unique.len(),
            parts.duplicates.len(),
            parts.no_description.len(),
            parts.no_connect.len(),
            format_percentage(parts.coverage),
        );
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Build a parts coverage report from in-circuit tester exports."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG wins when set.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fill the report template from the tester exports.
    Report(ReportArgs),
}

#[derive(clap::Args)]
struct ReportArgs {
    /// Structured result log (.dcl).
    #[arg(long)]
    result_log: PathBuf,

    /// Report template workbook (.xlsx).
    #[arg(long)]
    template: PathBuf,

    /// Output workbook path.
    #[arg(long)]
    output: PathBuf,

    /// Equipment test log (.dat) used for the parts coverage sheet.
    #[arg(long)]
    test_log: Option<PathBuf>,

    /// Component reference table (.csv) with Reference and Description columns.
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Directory receiving the no-connect, duplicate and no-description tables.
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Write the full run result as JSON to this path.
    #[arg(long)]
    summary: Option<PathBuf>,
}
