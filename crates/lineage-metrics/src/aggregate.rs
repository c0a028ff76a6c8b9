//! Per-group answer counts and the condensed per-model leaderboard.

use crate::extract::{AnswerExtractor, Outcome};
use lineage_core::model::{RelationKind, ResultRow};
use lineage_core::report::{Cell, Table};
use std::collections::{BTreeMap, BTreeSet};

/// One scored answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scored {
    pub problem_size: u32,
    pub relation: RelationKind,
    pub model_name: String,
    pub outcome: Outcome,
}

/// Scores every answered row. Failed rows carry no data and are skipped.
pub fn score_rows(rows: &[ResultRow], extractor: &AnswerExtractor) -> Vec<Scored> {
    let mut skipped = 0usize;
    let scored: Vec<Scored> = rows
        .iter()
        .filter_map(|row| {
            let Some(r) = row.record() else {
                skipped += 1;
                return None;
            };
            let answer = extractor.extract_answer(&r.model_response);
            Some(Scored {
                problem_size: r.problem_size,
                relation: r.relation_name,
                model_name: r.model_name.clone(),
                outcome: Outcome::classify(answer, r.correct_answer),
            })
        })
        .collect();
    if skipped > 0 {
        tracing::warn!(
            event = "failed_rows_skipped",
            count = skipped,
            "ignoring rows without a response"
        );
    }
    scored
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub correct: u64,
    pub incorrect: u64,
    pub missing: u64,
}

impl Counts {
    fn add(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Correct => self.correct += 1,
            Outcome::Incorrect => self.incorrect += 1,
            Outcome::Missing => self.missing += 1,
        }
    }

    fn total(&self) -> u64 {
        self.correct + self.incorrect + self.missing
    }
}

type GroupKey = (u32, &'static str, String);

fn group(scored: &[Scored]) -> BTreeMap<GroupKey, Counts> {
    let mut groups: BTreeMap<GroupKey, Counts> = BTreeMap::new();
    for s in scored {
        groups
            .entry((s.problem_size, s.relation.as_str(), s.model_name.clone()))
            .or_default()
            .add(s.outcome);
    }
    groups
}

/// Counts per `(problem_size, relation_name, model_name)`, sorted by that key.
pub fn detailed(scored: &[Scored]) -> Table {
    let mut table = Table::new([
        "problem_size",
        "relation_name",
        "model_name",
        "answer_correct",
        "answer_incorrect",
        "answer_missing",
    ]);
    for ((size, relation, model), c) in group(scored) {
        table.push(vec![
            Cell::Int(size as i64),
            relation.into(),
            model.into(),
            Cell::Int(c.correct as i64),
            Cell::Int(c.incorrect as i64),
            Cell::Int(c.missing as i64),
        ]);
    }
    table
}

#[derive(Debug, Clone, PartialEq)]
pub struct CondensedRow {
    pub rank: u32,
    pub model_name: String,
    /// Mean of `per_size`.
    pub lineage: f64,
    /// One score per entry of [`Condensed::sizes`]; 0 where the model has no data.
    pub per_size: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condensed {
    pub sizes: Vec<u32>,
    pub rows: Vec<CondensedRow>,
}

/// Builds the leaderboard.
///
/// The score of a model at one size is the mean, over the relation kinds
/// present, of the fraction of correct answers. Its overall score is the mean
/// over every size present in the input. Rows are ordered by descending score
/// then model name, and ranked so that ties share the lowest rank.
pub fn condensed(scored: &[Scored]) -> Condensed {
    // (size, model) -> per-relation accuracies
    let mut by_size_model: BTreeMap<(u32, String), Vec<f64>> = BTreeMap::new();
    for ((size, _relation, model), c) in group(scored) {
        let accuracy = c.correct as f64 / c.total() as f64;
        by_size_model.entry((size, model)).or_default().push(accuracy);
    }

    let sizes: Vec<u32> = by_size_model
        .keys()
        .map(|(s, _)| *s)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let models: BTreeSet<&String> = by_size_model.keys().map(|(_, m)| m).collect();

    let mut rows: Vec<CondensedRow> = models
        .into_iter()
        .map(|model| {
            let per_size: Vec<f64> = sizes
                .iter()
                .map(|size| {
                    by_size_model
                        .get(&(*size, model.clone()))
                        .map(|v| mean(v))
                        .unwrap_or(0.0)
                })
                .collect();
            CondensedRow {
                rank: 0,
                model_name: model.clone(),
                lineage: mean(&per_size),
                per_size,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.lineage
            .total_cmp(&a.lineage)
            .then_with(|| a.model_name.cmp(&b.model_name))
    });
    let scores: Vec<f64> = rows.iter().map(|r| r.lineage).collect();
    for row in &mut rows {
        row.rank = 1 + scores.iter().filter(|s| **s > row.lineage).count() as u32;
    }

    tracing::debug!(
        event = "condensed",
        models = rows.len(),
        sizes = ?sizes
    );
    Condensed { sizes, rows }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

impl Condensed {
    /// `Nr, model_name, lineage, lineage-<size>...`
    pub fn to_table(&self) -> Table {
        let mut columns = vec!["Nr".to_string(), "model_name".into(), "lineage".into()];
        columns.extend(self.sizes.iter().map(|s| format!("lineage-{}", s)));
        let mut table = Table::new(columns);
        for r in &self.rows {
            let mut cells = vec![
                Cell::Int(r.rank as i64),
                r.model_name.clone().into(),
                Cell::Float(r.lineage),
            ];
            cells.extend(r.per_size.iter().map(|v| Cell::Float(*v)));
            table.push(cells);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(size: u32, relation: RelationKind, model: &str, outcome: Outcome) -> Scored {
        Scored {
            problem_size: size,
            relation,
            model_name: model.into(),
            outcome,
        }
    }

    #[test]
    fn test_detailed_counts_sorted_by_key() {
        let scored = vec![
            s(16, RelationKind::Ancestor, "b", Outcome::Correct),
            s(8, RelationKind::Descendant, "a", Outcome::Missing),
            s(8, RelationKind::Ancestor, "a", Outcome::Correct),
            s(8, RelationKind::Ancestor, "a", Outcome::Incorrect),
        ];
        let t = detailed(&scored);
        assert_eq!(t.rows.len(), 3);
        assert_eq!(
            t.rows[0],
            vec![
                Cell::Int(8),
                "ANCESTOR".into(),
                "a".into(),
                Cell::Int(1),
                Cell::Int(1),
                Cell::Int(0)
            ]
        );
        assert_eq!(t.rows[1][1], Cell::Text("DESCENDANT".into()));
        assert_eq!(t.rows[1][5], Cell::Int(1));
        assert_eq!(t.rows[2][0], Cell::Int(16));
    }

    #[test]
    fn test_condensed_means_and_missing_sizes() {
        let scored = vec![
            // model a at size 8: ANCESTOR 1/2, DESCENDANT 1/1 -> 0.75
            s(8, RelationKind::Ancestor, "a", Outcome::Correct),
            s(8, RelationKind::Ancestor, "a", Outcome::Incorrect),
            s(8, RelationKind::Descendant, "a", Outcome::Correct),
            // model a at size 16: 0
            s(16, RelationKind::Ancestor, "a", Outcome::Missing),
            // model b only at size 16: 1.0
            s(16, RelationKind::CommonAncestor, "b", Outcome::Correct),
        ];
        let c = condensed(&scored);
        assert_eq!(c.sizes, vec![8, 16]);
        assert_eq!(c.rows[0].model_name, "b");
        assert_eq!(c.rows[0].per_size, vec![0.0, 1.0]);
        assert_eq!(c.rows[0].lineage, 0.5);
        assert_eq!(c.rows[1].model_name, "a");
        assert_eq!(c.rows[1].per_size, vec![0.75, 0.0]);
        assert_eq!(c.rows[1].lineage, 0.375);

        let t = c.to_table();
        assert_eq!(
            t.columns,
            vec!["Nr", "model_name", "lineage", "lineage-8", "lineage-16"]
        );
    }

    #[test]
    fn test_min_rank_for_ties() {
        let scored = vec![
            s(8, RelationKind::Ancestor, "c", Outcome::Correct),
            s(8, RelationKind::Ancestor, "a", Outcome::Correct),
            s(8, RelationKind::Ancestor, "b", Outcome::Incorrect),
            s(8, RelationKind::Ancestor, "d", Outcome::Correct),
        ];
        let c = condensed(&scored);
        let ranked: Vec<(u32, &str)> = c
            .rows
            .iter()
            .map(|r| (r.rank, r.model_name.as_str()))
            .collect();
        assert_eq!(ranked, vec![(1, "a"), (1, "c"), (1, "d"), (4, "b")]);
    }
}
