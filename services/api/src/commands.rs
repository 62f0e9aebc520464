use crate::infra::{build_service, load_repository};
use chrono::Local;
use clap::{Args, ValueEnum};
use obe_attainment::attainment::{
    read_marks_csv_path, AttainmentServiceError, CourseId, ProgramAttainmentRequest, Snapshot,
};
use obe_attainment::error::AppError;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Json,
    Markdown,
}

#[derive(Args, Debug)]
pub(crate) struct CourseReportArgs {
    /// Snapshot file holding courses, marks and articulation matrices
    #[arg(long)]
    pub(crate) snapshot: PathBuf,
    /// Course identifier
    #[arg(long)]
    pub(crate) course: String,
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub(crate) format: OutputFormat,
}

#[derive(Args, Debug)]
pub(crate) struct ProgramReportArgs {
    /// Snapshot file holding courses, marks, matrices and survey results
    #[arg(long)]
    pub(crate) snapshot: PathBuf,
    /// Course identifiers to include; repeat the flag for each course
    #[arg(long = "course", required = true)]
    pub(crate) courses: Vec<String>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub(crate) format: OutputFormat,
}

#[derive(Args, Debug)]
pub(crate) struct ImportMarksArgs {
    /// Snapshot file to append the imported records to
    #[arg(long)]
    pub(crate) snapshot: PathBuf,
    /// Course the sheet belongs to
    #[arg(long)]
    pub(crate) course: String,
    /// Assessment name recorded on every imported row
    #[arg(long)]
    pub(crate) assessment: String,
    /// Marks-entry sheet: USN, Name, then one column per score key
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Assessment this sheet retakes, for improvement tests
    #[arg(long)]
    pub(crate) improvement_target: Option<String>,
}

pub(crate) fn run_course_report(args: CourseReportArgs) -> Result<(), AppError> {
    let service = build_service(load_repository(Some(args.snapshot.as_path()))?, false);
    let report = service.compute_course_attainment(&CourseId(args.course))?;
    println!("{}", render(&report, args.format, || report.to_markdown())?);
    Ok(())
}

pub(crate) fn run_program_report(args: ProgramReportArgs) -> Result<(), AppError> {
    let service = build_service(load_repository(Some(args.snapshot.as_path()))?, false);
    let request = ProgramAttainmentRequest {
        course_ids: args.courses.into_iter().map(CourseId).collect(),
        ..ProgramAttainmentRequest::default()
    };
    let program = service.compute_program_attainment(&request)?;
    println!("{}", render(&program, args.format, || program.to_markdown())?);
    Ok(())
}

pub(crate) fn run_import_marks(args: ImportMarksArgs) -> Result<(), AppError> {
    let ImportMarksArgs {
        snapshot: snapshot_path,
        course,
        assessment,
        csv,
        improvement_target,
    } = args;

    let mut snapshot = Snapshot::load(&snapshot_path)?;
    let course_id = CourseId(course);
    if snapshot.course(&course_id).is_none() {
        return Err(AttainmentServiceError::CourseNotFound(course_id).into());
    }

    let records = read_marks_csv_path(
        &csv,
        &course_id,
        &assessment,
        improvement_target.as_deref(),
    )?;
    let appended = snapshot.append_marks(records);
    snapshot.save(&snapshot_path)?;

    info!(%course_id, assessment = %assessment, appended, "marks imported");
    println!(
        "Imported {appended} mark records for {course_id} ({assessment}) into {}",
        snapshot_path.display()
    );
    Ok(())
}

fn render<T, F>(value: &T, format: OutputFormat, markdown: F) -> Result<String, AppError>
where
    T: Serialize,
    F: FnOnce() -> String,
{
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Markdown => Ok(format!(
            "_Generated {}_\n\n{}",
            Local::now().format("%Y-%m-%d %H:%M"),
            markdown()
        )),
    }
}
