use super::exit_codes;
use crate::cli::args::MetricsArgs;
use lineage_core::model::ResultRow;
use lineage_core::select::{choose_file, Explicit, FileSelector, Interactive, MostRecent};
use lineage_core::storage::{read_results, read_results_file};
use lineage_metrics::{condensed, detailed, score_rows, AnswerExtractor};
use std::io::IsTerminal;
use std::path::Path;

fn load_rows(args: &MetricsArgs) -> anyhow::Result<Vec<ResultRow>> {
    let piped = args.input.is_none() && !args.latest && !std::io::stdin().is_terminal();
    if piped || args.input.as_deref() == Some(Path::new("-")) {
        tracing::debug!(event = "results_from_stdin");
        return read_results(std::io::stdin().lock());
    }

    let selector: Box<dyn FileSelector> = match (&args.input, args.latest) {
        (Some(path), _) => Box::new(Explicit(path.clone())),
        (None, true) => Box::new(MostRecent),
        (None, false) => Box::new(Interactive {
            prompt: "Select a results file".into(),
        }),
    };
    let path = choose_file(selector.as_ref(), &args.results_dir, true)?;
    tracing::info!(event = "results_file", path = %path.display());
    read_results_file(&path)
}

pub async fn run(args: MetricsArgs) -> anyhow::Result<i32> {
    let rows = load_rows(&args)?;
    let extractor = AnswerExtractor::new(args.relaxed)?;
    let scored = score_rows(&rows, &extractor);

    let table = if args.detailed {
        detailed(&scored)
    } else {
        condensed(&scored).to_table()
    };
    let rendered = if args.csv {
        table.to_csv()?
    } else {
        table.to_markdown()
    };

    print!("{}", rendered);
    if let Some(path) = &args.output {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &rendered)?;
        eprintln!("wrote file: {}", path.display());
    }
    Ok(exit_codes::OK)
}
