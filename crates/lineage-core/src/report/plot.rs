//! Line chart of condensed scores against problem size.

use anyhow::{Context, Result};
use plotters::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};

pub const TITLE: &str = "Lineage benchmark scores for different problem sizes.";
const SIZE_PREFIX: &str = "lineage-";

/// Scores of one model, one point per problem size.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub model_name: String,
    pub points: Vec<(u32, f64)>,
}

/// Reads a condensed table (`Nr, model_name, lineage, lineage-<size>...`)
/// with its header row. Columns after the third name the problem sizes.
pub fn read_condensed<R: Read>(r: R) -> Result<Vec<Series>> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(r);
    let headers = rdr.headers()?.clone();
    let model_col = headers
        .iter()
        .position(|h| h == "model_name")
        .context("missing 'model_name' column")?;

    let mut sizes = Vec::new();
    for h in headers.iter().skip(3) {
        let size = h
            .strip_prefix(SIZE_PREFIX)
            .and_then(|s| s.parse::<u32>().ok())
            .with_context(|| format!("unexpected column '{}'", h))?;
        sizes.push(size);
    }
    if sizes.is_empty() {
        anyhow::bail!("no 'lineage-<size>' columns in input");
    }

    let mut series = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let mut points = Vec::with_capacity(sizes.len());
        for (i, size) in sizes.iter().enumerate() {
            let raw = rec.get(3 + i).unwrap_or("").trim();
            let score: f64 = raw
                .parse()
                .with_context(|| format!("invalid score '{}' for size {}", raw, size))?;
            points.push((*size, score));
        }
        series.push(Series {
            model_name: rec.get(model_col).unwrap_or("").to_string(),
            points,
        });
    }
    Ok(series)
}

/// Evenly spaced hues, one per line.
fn line_color(i: usize, n: usize) -> HSLColor {
    let hue = if n <= 1 {
        0.0
    } else {
        0.85 * i as f64 / (n - 1) as f64
    };
    HSLColor(hue, 0.85, 0.45)
}

fn x_range(series: &[Series]) -> (f64, f64) {
    let sizes = series.iter().flat_map(|s| s.points.iter().map(|p| p.0 as f64));
    let (lo, hi) = sizes.fold((f64::MAX, f64::MIN), |(lo, hi), x| (lo.min(x), hi.max(x)));
    if lo > hi || lo <= 0.0 {
        return (1.0, 2.0);
    }
    (lo / 1.2, hi * 1.2)
}

/// Renders `series` to an SVG file at `path`.
pub fn render_svg(series: &[Series], path: &Path) -> Result<()> {
    let (lo, hi) = x_range(series);
    let root = SVGBackend::new(path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(TITLE, ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d((lo..hi).log_scale().base(2.0), 0f64..1f64)?;

    chart
        .configure_mesh()
        .x_desc("Problem Size")
        .y_desc("Lineage Score")
        .x_label_formatter(&|x| format!("{}", x.round() as i64))
        .draw()?;

    let n = series.len();
    for (i, s) in series.iter().enumerate() {
        let color = line_color(i, n);
        let points: Vec<(f64, f64)> = s.points.iter().map(|(x, y)| (*x as f64, *y)).collect();
        chart
            .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))?
            .label(s.model_name.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        chart.draw_series(points.into_iter().map(|p| Circle::new(p, 4, color.filled())))?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.85))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    tracing::info!(event = "plot_written", path = %path.display(), models = n);
    Ok(())
}

/// Where the image goes when it is only meant to be looked at.
pub fn preview_path() -> PathBuf {
    std::env::temp_dir().join(format!("lineage-plot-{}.svg", std::process::id()))
}

/// Opens a rendered image in the system viewer.
pub fn open_in_viewer(path: &Path) -> Result<()> {
    let abs = path
        .canonicalize()
        .with_context(|| format!("failed to resolve {}", path.display()))?;
    webbrowser::open(&format!("file://{}", abs.display()))
        .with_context(|| format!("failed to open {}", abs.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONDENSED: &str = "\
Nr,model_name,lineage,lineage-8,lineage-16
1,a/x,0.75,1.0,0.5
2,b/y,0.25,0.5,0.0
";

    #[test]
    fn test_read_condensed() {
        let series = read_condensed(CONDENSED.as_bytes()).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].model_name, "a/x");
        assert_eq!(series[0].points, vec![(8, 1.0), (16, 0.5)]);
        assert_eq!(series[1].points, vec![(8, 0.5), (16, 0.0)]);
    }

    #[test]
    fn test_read_condensed_rejects_unknown_columns() {
        let bad = "Nr,model_name,lineage,score-8\n1,a,0.5,0.5\n";
        assert!(read_condensed(bad.as_bytes()).is_err());
        let none = "Nr,model_name,lineage\n1,a,0.5\n";
        assert!(read_condensed(none.as_bytes()).is_err());
    }

    #[test]
    fn test_render_svg_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plot.svg");
        let series = read_condensed(CONDENSED.as_bytes()).unwrap();
        render_svg(&series, &path).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("a/x"));
    }

    #[test]
    fn test_colors_are_distinct() {
        let a = line_color(0, 3);
        let b = line_color(2, 3);
        assert!(a.0 != b.0);
    }
}
