use std::ffi::OsString;

use clap::Parser;

mod browser;
mod cli_args;
mod error_map;
mod headless;
mod logging;
mod scenarios;
mod tui;

pub(crate) use browser::{FileBrowser, BROWSER_WIDTH};
#[cfg(test)]
pub(crate) use browser::DOUBLE_CLICK_FRAMES;
pub(crate) use cli_args::{Cli, EngineArgs, Mode, RunArgs, TuiArgs, DEFAULT_MAX_FRAMES};
pub(crate) use error_map::{
    emit_error, map_cli_log_open, map_cli_report_encode, map_cli_report_write,
    map_cli_source_path, map_cli_source_scan, map_tui_io, CliError,
};
pub(crate) use headless::{
    build_options, emit_results, exit_code, prepare_engine, run_headless,
};
#[cfg(test)]
pub(crate) use headless::{result_lines, write_report};
pub(crate) use logging::{init_tracing, LogTarget};
pub(crate) use scenarios::register_demo_scenarios;
#[cfg(test)]
pub(crate) use scenarios::{BROWSER_GROUP, DEMO_GROUP};

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, CliError> {
    match cli.command {
        Mode::Run(args) => run_headless(args),
        Mode::Tui(args) => tui::run_tui(args),
    }
}
