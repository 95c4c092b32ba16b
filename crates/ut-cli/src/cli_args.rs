use clap::{Args, Parser, Subcommand};

pub(crate) const DEFAULT_MAX_FRAMES: u64 = 5_000;
pub(crate) const DEFAULT_LOG_FILE: &str = ".uitest/ut-cli.log";

#[derive(Debug, Parser)]
#[command(name = "ut-cli")]
#[command(about = "Scripted UI test engine demo host")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    /// Run the demo scenarios headlessly and print machine-readable results.
    Run(RunArgs),
    /// Run the demo scenarios against a live terminal file browser.
    Tui(TuiArgs),
}

#[derive(Debug, Clone, Args)]
pub(crate) struct EngineArgs {
    /// Directory whose files the demo browser lists.
    #[arg(long = "dir")]
    pub(crate) dir: String,
    /// TOML file with engine options.
    #[arg(long = "config")]
    pub(crate) config: Option<String>,
    /// Overrides the configured run speed (`fast` or `cinematic`).
    #[arg(long = "speed")]
    pub(crate) speed: Option<String>,
    /// Scenario filter: `all`, a group, or `group/name`.
    #[arg(long = "group", default_value = "all")]
    pub(crate) group: String,
}

#[derive(Debug, Args)]
pub(crate) struct RunArgs {
    #[command(flatten)]
    pub(crate) engine: EngineArgs,
    /// Frame budget before remaining scenarios are cancelled.
    #[arg(long = "frames", default_value_t = DEFAULT_MAX_FRAMES)]
    pub(crate) frames: u64,
    /// Also write the JSON results report to this path.
    #[arg(long = "report")]
    pub(crate) report: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct TuiArgs {
    #[command(flatten)]
    pub(crate) engine: EngineArgs,
    /// Frames rendered per second.
    #[arg(long = "fps", default_value_t = 30)]
    pub(crate) fps: u32,
    #[arg(long = "log-file", default_value = DEFAULT_LOG_FILE)]
    pub(crate) log_file: String,
}
