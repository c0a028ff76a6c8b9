use anyhow::Result;
use std::fmt::Write as _;

/// One table cell. Numeric cells are right-aligned in Markdown.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    fn is_numeric(&self) -> bool {
        !matches!(self, Cell::Text(_))
    }

    fn csv_text(&self) -> String {
        match self {
            Cell::Int(v) => v.to_string(),
            // Debug keeps a trailing `.0` on whole numbers (1.0, not 1).
            Cell::Float(v) => format!("{:?}", v),
            Cell::Text(s) => s.clone(),
        }
    }

    fn markdown_text(&self) -> String {
        match self {
            Cell::Int(v) => v.to_string(),
            Cell::Float(v) => format!("{:.3}", v),
            Cell::Text(s) => s.replace('|', "\\|"),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Int(v)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Float(v)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn to_csv(&self) -> Result<String> {
        let mut wtr = csv::WriterBuilder::new().from_writer(Vec::new());
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(Cell::csv_text))?;
        }
        let bytes = wtr.into_inner().map_err(|e| anyhow::anyhow!(e.to_string()))?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Pipe table. Each column is as wide as its widest value or its header
    /// plus two, whichever is larger.
    pub fn to_markdown(&self) -> String {
        let body: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| r.iter().map(Cell::markdown_text).collect())
            .collect();

        let numeric: Vec<bool> = (0..self.columns.len())
            .map(|i| !self.rows.is_empty() && self.rows.iter().all(|r| r[i].is_numeric()))
            .collect();

        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, h)| {
                body.iter()
                    .map(|r| r[i].chars().count())
                    .fold(h.chars().count() + 2, usize::max)
            })
            .collect();

        let mut out = String::new();
        let line = |cells: &[String]| {
            let mut s = String::from("|");
            for (i, c) in cells.iter().enumerate() {
                let w = widths[i];
                if numeric[i] {
                    let _ = write!(s, " {:>w$} |", c, w = w);
                } else {
                    let _ = write!(s, " {:<w$} |", c, w = w);
                }
            }
            s
        };

        out.push_str(&line(&self.columns));
        out.push('\n');
        out.push('|');
        for (i, w) in widths.iter().enumerate() {
            if numeric[i] {
                out.push_str(&"-".repeat(w + 1));
                out.push(':');
            } else {
                out.push(':');
                out.push_str(&"-".repeat(w + 1));
            }
            out.push('|');
        }
        for row in &body {
            out.push('\n');
            out.push_str(&line(row));
        }
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut t = Table::new(["Nr", "model_name", "lineage"]);
        t.push(vec![Cell::Int(1), "a/b".into(), Cell::Float(1.0)]);
        t.push(vec![Cell::Int(2), "long-model-name".into(), Cell::Float(1.0 / 3.0)]);
        t
    }

    #[test]
    fn test_markdown_layout() {
        let md = sample().to_markdown();
        let expected = "\
|   Nr | model_name      |   lineage |
|-----:|:----------------|----------:|
|    1 | a/b             |     1.000 |
|    2 | long-model-name |     0.333 |
";
        assert_eq!(md, expected);
    }

    #[test]
    fn test_csv_keeps_full_precision() {
        let csv = sample().to_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Nr,model_name,lineage");
        assert_eq!(lines[1], "1,a/b,1.0");
        assert_eq!(lines[2], "2,long-model-name,0.3333333333333333");
    }

    #[test]
    fn test_empty_table_renders_header_only() {
        let t = Table::new(["model_name"]);
        assert_eq!(t.to_markdown(), "| model_name   |\n|:-------------|\n");
        assert_eq!(t.to_csv().unwrap(), "model_name\n");
    }
}
