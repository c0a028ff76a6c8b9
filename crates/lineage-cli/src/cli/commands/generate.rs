use super::exit_codes;
use crate::cli::args::GenerateArgs;
use lineage_core::errors::ConfigError;
use lineage_core::quiz::{decode_escapes, generate_quizzes, GeneratorConfig, DEFAULT_PROMPT};
use lineage_core::storage::write_quizzes_file;
use lineage_core::timestamp::{file_stamp, TimeService};

pub async fn run(args: GenerateArgs) -> anyhow::Result<i32> {
    let prompt = args
        .prompt
        .as_deref()
        .map(decode_escapes)
        .unwrap_or_else(|| DEFAULT_PROMPT.to_string());

    let cfg = GeneratorConfig {
        length: args.length,
        count: args.number,
        prompt,
        shuffle: args.shuffle,
        seed: args.seed,
    };
    let quizzes = generate_quizzes(&cfg).map_err(|e| ConfigError(e.to_string()))?;

    let now = if args.local_time {
        chrono::Utc::now()
    } else {
        TimeService::default().now().await
    };
    let path = args
        .output_dir
        .join(format!("{}_{}.csv", args.length, file_stamp(&now)));

    write_quizzes_file(&path, &quizzes)?;
    tracing::info!(
        event = "quizzes_written",
        count = quizzes.len(),
        path = %path.display()
    );
    eprintln!("Output saved to: {}", path.display());
    Ok(exit_codes::OK)
}
