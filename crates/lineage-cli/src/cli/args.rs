use clap::{ArgAction, Parser, Subcommand};
use lineage_core::config::{DataCollection, ReasoningEffort, DEFAULT_THREADS};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "lineage",
    version,
    about = "Lineage relationship quizzes for benchmarking LLM reasoning"
)]
pub struct Cli {
    /// Debug-level logging (overridden by LINEAGE_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a quiz file
    Generate(GenerateArgs),
    /// Send quizzes to a model through OpenRouter
    Run(RunArgs),
    /// Score result files
    Metrics(MetricsArgs),
    /// Plot condensed scores against problem size
    Plot(PlotArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Number of people connected with lineage relationships in the quiz
    #[arg(short, long)]
    pub length: usize,

    /// Quiz prompt template; backslash escapes such as \n are decoded
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Shuffle the order of relation statements and answer options
    #[arg(short, long)]
    pub shuffle: bool,

    /// Quizzes per relation kind
    #[arg(short = 'n', long, default_value_t = 10)]
    pub number: usize,

    /// Random seed
    #[arg(short = 'r', long)]
    pub seed: Option<u64>,

    #[arg(short, long, default_value = "tests")]
    pub output_dir: PathBuf,

    /// Use the local clock for the file name instead of asking time servers
    #[arg(long)]
    pub local_time: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    /// OpenRouter model name
    #[arg(short, long, env = "LINEAGE_MODEL")]
    pub model: String,

    /// Comma-separated provider order
    #[arg(short, long, env = "LINEAGE_PROVIDER")]
    pub provider: Option<String>,

    /// Reasoning effort: low|medium|high
    #[arg(short, long)]
    pub effort: Option<ReasoningEffort>,

    #[arg(short, long, env = "LINEAGE_THREADS", default_value_t = DEFAULT_THREADS)]
    pub threads: usize,

    /// System prompt text or a .txt/.md file; without a value the built-in
    /// system prompt is used
    #[arg(short, long, value_name = "TEXT|FILE", num_args = 0..=1)]
    pub system_prompt: Option<Option<String>>,

    /// Site URL for rankings on openrouter.ai
    #[arg(long, env = "LINEAGE_REFERER")]
    pub referer: Option<String>,

    /// Site title for rankings on openrouter.ai
    #[arg(long, env = "LINEAGE_TITLE")]
    pub title: Option<String>,

    /// Allow fallbacks to other providers; any value other than "true"
    /// (case-insensitive) disables them
    #[arg(
        short = 'f',
        long,
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = parse_true
    )]
    pub fallbacks: bool,

    /// Data collection preference: allow|deny
    #[arg(long)]
    pub data_privacy: Option<DataCollection>,

    /// Only route to providers supporting every request parameter
    #[arg(long)]
    pub require_parameters: bool,

    /// Comma-separated quantization filter
    #[arg(long)]
    pub quantizations: Option<String>,

    /// Comma-separated providers to skip
    #[arg(long)]
    pub ignore: Option<String>,

    /// Comma-separated models to fall back to
    #[arg(long)]
    pub fallback_models: Option<String>,

    #[arg(long, env = "OPENROUTER_BASE_URL")]
    pub base_url: Option<String>,

    /// Quiz file to run; otherwise chosen from the newest files in --tests-dir
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Take the newest quiz file without asking
    #[arg(long)]
    pub latest: bool,

    #[arg(long, default_value = "tests")]
    pub tests_dir: PathBuf,

    #[arg(long, default_value = "results")]
    pub results_dir: PathBuf,
}

#[derive(clap::Args, Debug, Clone)]
pub struct MetricsArgs {
    /// CSV output instead of Markdown
    #[arg(short, long)]
    pub csv: bool,

    /// Accept alternative answer formats
    #[arg(short, long)]
    pub relaxed: bool,

    /// Per size, relation and model counts instead of the leaderboard
    #[arg(short, long)]
    pub detailed: bool,

    /// Results file, or `-` for stdin
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Take the newest results file without asking
    #[arg(long)]
    pub latest: bool,

    #[arg(long, default_value = "results")]
    pub results_dir: PathBuf,

    /// Also write the table to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct PlotArgs {
    /// Write the rendered SVG here
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Open the plot in the system viewer
    #[arg(long)]
    pub show: bool,

    /// Condensed metrics CSV; defaults to stdin
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}

fn parse_true(value: &str) -> Result<bool, String> {
    Ok(value.trim().eq_ignore_ascii_case("true"))
}
