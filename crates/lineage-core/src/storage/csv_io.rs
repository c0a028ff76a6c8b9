//! Headerless CSV files exchanged between pipeline stages.
//!
//! Quiz files: `problem_size, relation_name, correct_answer, quiz_text`.
//! Result files: the nine [`RESULT_COLUMNS`](crate::model::RESULT_COLUMNS).

use crate::model::{Quiz, RelationKind, ResultRecord, ResultRow};
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

const QUIZ_FIELDS: usize = 4;
const RESULT_FIELDS: usize = 9;

fn reader<R: Read>(r: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(r)
}

fn writer<W: Write>(w: W) -> csv::Writer<W> {
    WriterBuilder::new().has_headers(false).from_writer(w)
}

pub fn write_quizzes<W: Write>(w: W, quizzes: &[Quiz]) -> Result<()> {
    let mut wtr = writer(w);
    for q in quizzes {
        wtr.write_record([
            q.problem_size.to_string().as_str(),
            q.relation_kind.as_str(),
            q.correct_answer.to_string().as_str(),
            q.quiz_text.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_quizzes_file(path: &Path, quizzes: &[Quiz]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    write_quizzes(file, quizzes)
}

fn parse_quiz(rec: &StringRecord) -> Result<Quiz> {
    let problem_size: u32 = rec[0].trim().parse().context("invalid problem_size")?;
    let relation_kind: RelationKind = rec[1].trim().parse()?;
    let correct_answer: u8 = rec[2].trim().parse().context("invalid correct_answer")?;
    if !(1..=5).contains(&correct_answer) {
        anyhow::bail!("correct_answer {} out of range 1..=5", correct_answer);
    }
    Ok(Quiz {
        problem_size,
        relation_kind,
        correct_answer,
        quiz_text: rec[3].to_string(),
    })
}

/// Reads a quiz file. Malformed rows are logged and skipped.
pub fn read_quizzes<R: Read>(r: R) -> Result<Vec<Quiz>> {
    let mut quizzes = Vec::new();
    for (line, rec) in reader(r).records().enumerate() {
        let rec = rec?;
        if rec.len() != QUIZ_FIELDS {
            tracing::warn!(
                event = "skip_row",
                line = line + 1,
                fields = rec.len(),
                "expected {} fields",
                QUIZ_FIELDS
            );
            continue;
        }
        match parse_quiz(&rec) {
            Ok(q) => quizzes.push(q),
            Err(e) => tracing::warn!(event = "skip_row", line = line + 1, error = %e),
        }
    }
    Ok(quizzes)
}

pub fn read_quizzes_file(path: &Path) -> Result<Vec<Quiz>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    read_quizzes(file)
}

pub fn write_results<W: Write>(w: W, rows: &[ResultRow]) -> Result<()> {
    let mut wtr = writer(w);
    for row in rows {
        match row {
            ResultRow::Answered(r) => wtr.write_record([
                r.problem_size.to_string().as_str(),
                r.relation_name.as_str(),
                r.correct_answer.to_string().as_str(),
                r.quiz_text.as_str(),
                r.model_name.as_str(),
                r.provider_name.as_str(),
                r.reasoning_effort.as_str(),
                r.system_prompt.as_str(),
                r.model_response.as_str(),
            ])?,
            ResultRow::Failed => wtr.write_record([""; RESULT_FIELDS])?,
        }
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_results_file(path: &Path, rows: &[ResultRow]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    write_results(file, rows)
}

fn parse_result(rec: &StringRecord) -> Result<ResultRecord> {
    let quiz = parse_quiz(&StringRecord::from(vec![&rec[0], &rec[1], &rec[2], &rec[3]]))?;
    Ok(ResultRecord {
        problem_size: quiz.problem_size,
        relation_name: quiz.relation_kind,
        correct_answer: quiz.correct_answer,
        quiz_text: quiz.quiz_text,
        model_name: rec[4].to_string(),
        provider_name: rec[5].to_string(),
        reasoning_effort: rec[6].to_string(),
        system_prompt: rec[7].to_string(),
        model_response: rec[8].to_string(),
    })
}

/// Reads a results file. All-empty rows become [`ResultRow::Failed`];
/// malformed rows are logged and skipped.
pub fn read_results<R: Read>(r: R) -> Result<Vec<ResultRow>> {
    let mut rows = Vec::new();
    for (line, rec) in reader(r).records().enumerate() {
        let rec = rec?;
        if rec.len() != RESULT_FIELDS {
            tracing::warn!(
                event = "skip_row",
                line = line + 1,
                fields = rec.len(),
                "expected {} fields",
                RESULT_FIELDS
            );
            continue;
        }
        if rec.iter().all(|f| f.is_empty()) {
            rows.push(ResultRow::Failed);
            continue;
        }
        match parse_result(&rec) {
            Ok(r) => rows.push(ResultRow::Answered(r)),
            Err(e) => tracing::warn!(event = "skip_row", line = line + 1, error = %e),
        }
    }
    Ok(rows)
}

pub fn read_results_file(path: &Path) -> Result<Vec<ResultRow>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    read_results(file)
}

/// Problem size encoded as the leading `N_` of a quiz file name
/// (`16_20250101_1200.csv` is 16). Returns -1 when the prefix is not numeric.
pub fn problem_size_from_filename(path: &Path) -> i64 {
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.split('_').next())
        .and_then(|p| p.parse::<i64>().ok())
        .unwrap_or_else(|| {
            tracing::warn!(
                event = "filename_size_unparsed",
                path = %path.display(),
                "could not derive problem size from file name"
            );
            -1
        })
}
