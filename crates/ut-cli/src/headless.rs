use std::fs;
use std::path::Path;

use ut_api::{
    load_options_from_file, run_until_idle, setup_test_engine, ResultsReport,
    SetupTestEngineOptions,
};
use ut_core::RunSpeed;
use ut_runtime::{Engine, EngineOptions};

use crate::{
    init_tracing, map_cli_report_encode, map_cli_report_write, register_demo_scenarios,
    CliError, EngineArgs, FileBrowser, LogTarget, RunArgs,
};

pub(crate) const HOST_NAME: &str = "ut-cli";

pub(crate) fn build_options(args: &EngineArgs) -> Result<EngineOptions, CliError> {
    let mut options = match &args.config {
        Some(path) => load_options_from_file(Path::new(path))?,
        None => EngineOptions::default(),
    };
    if let Some(speed) = &args.speed {
        options.run_speed = speed.parse::<RunSpeed>()?;
    }
    Ok(options)
}

/// Starts an engine sized to `browser`, registers the demo scenarios and
/// queues the ones selected by `--group`.
pub(crate) fn prepare_engine(
    args: &EngineArgs,
    options: EngineOptions,
    browser: &FileBrowser,
) -> Result<Engine, CliError> {
    let mut engine = setup_test_engine(SetupTestEngineOptions::new(
        HOST_NAME,
        browser.viewport(),
        options,
    ))?;
    register_demo_scenarios(&mut engine)?;
    let queued = engine.enqueue(&args.group)?;
    if queued == 0 {
        return Err(CliError::new(
            "CLI_GROUP_EMPTY",
            format!("no scenario matches \"{}\"", args.group),
        ));
    }
    tracing::info!(group = %args.group, queued, "scenarios queued");
    Ok(engine)
}

pub(crate) fn run_headless(args: RunArgs) -> Result<i32, CliError> {
    let options = build_options(&args.engine)?;
    init_tracing(options.verbosity_on_error, LogTarget::Stderr)?;
    let mut browser = FileBrowser::load(&args.engine.dir)?;
    let mut engine = prepare_engine(&args.engine, options, &browser)?;

    let outcome = run_until_idle(&mut engine, &mut browser, 1, args.frames)?;
    let report = ResultsReport::from_engine(&engine);
    if let Some(path) = &args.report {
        write_report(Path::new(path), &report)?;
    }
    emit_results(&report, outcome.frames);
    Ok(exit_code(&report))
}

pub(crate) fn write_report(path: &Path, report: &ResultsReport) -> Result<(), CliError> {
    let json = report.to_json().map_err(map_cli_report_encode)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(map_cli_report_write)?;
    }
    fs::write(path, json).map_err(map_cli_report_write)
}

pub(crate) fn result_lines(report: &ResultsReport, frames: u64) -> Vec<String> {
    let summary = report.summary;
    let mut lines = vec![
        "RESULT:OK".to_string(),
        format!(
            "SUMMARY:tested={} passed={} failed={} skipped={}",
            summary.tested, summary.passed, summary.failed, summary.skipped
        ),
    ];
    lines.extend(
        report
            .scenarios
            .iter()
            .map(|scenario| format!("VERDICT:{}:{}", scenario.id, scenario.code)),
    );
    lines.push(format!("FRAMES:{}", frames));
    lines
}

pub(crate) fn emit_results(report: &ResultsReport, frames: u64) {
    for line in result_lines(report, frames) {
        println!("{}", line);
    }
}

pub(crate) fn exit_code(report: &ResultsReport) -> i32 {
    if report.all_passed() {
        0
    } else {
        1
    }
}
