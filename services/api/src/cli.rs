use crate::commands::{
    run_course_report, run_import_marks, run_program_report, CourseReportArgs, ImportMarksArgs,
    ProgramReportArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use obe_attainment::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "OBE Attainment",
    about = "Compute course and program outcome attainment from marks snapshots",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Compute CO and PO attainment for one course
    Course(CourseReportArgs),
    /// Roll course PO attainment up to program level
    Program(ProgramReportArgs),
    /// Append a marks-entry CSV sheet to a snapshot
    ImportMarks(ImportMarksArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Snapshot file to serve (overrides OBE_SNAPSHOT_PATH)
    #[arg(long)]
    pub(crate) snapshot: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Course(args) => run_course_report(args),
        Command::Program(args) => run_program_report(args),
        Command::ImportMarks(args) => run_import_marks(args),
    }
}
