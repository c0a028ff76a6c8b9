use super::exit_codes;
use crate::cli::args::PlotArgs;
use lineage_core::report::plot::{open_in_viewer, preview_path, read_condensed, render_svg};

pub async fn run(args: PlotArgs) -> anyhow::Result<i32> {
    let series = match &args.input {
        Some(path) => {
            let file = std::fs::File::open(path)
                .map_err(|e| anyhow::anyhow!("failed to open {}: {}", path.display(), e))?;
            read_condensed(file)?
        }
        None => read_condensed(std::io::stdin().lock())?,
    };
    if series.is_empty() {
        tracing::warn!("no models in input, plotting empty axes");
    }

    if let Some(path) = &args.output {
        render_svg(&series, path)?;
        eprintln!("wrote file: {}", path.display());
    }

    if args.show || args.output.is_none() {
        let preview = match &args.output {
            Some(path) => path.clone(),
            None => {
                let path = preview_path();
                render_svg(&series, &path)?;
                path
            }
        };
        open_in_viewer(&preview)?;
    }

    Ok(exit_codes::OK)
}
