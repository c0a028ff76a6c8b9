//! Synthetic lineage quiz generation.
//!
//! A quiz is a chain of `length` distinct people joined by ancestor edges.
//! Each edge is stated in a randomly chosen grammatical direction so the
//! surface form does not leak the logical one, and the solver is asked for
//! the relationship between the first and last person of the chain.

use crate::model::{AnswerKind, Quiz, RelationKind};
use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

pub mod names;
pub mod template;

pub use template::{decode_escapes, DEFAULT_PROMPT, DEFAULT_SYSTEM_PROMPT};

pub const MIN_LENGTH: usize = 3;

const NONE_OF_THE_ABOVE: &str = "None of the above is correct.";

fn answer_text(kind: RelationKind, p1: &str, p2: &str) -> String {
    match kind {
        RelationKind::Ancestor => format!("{p1} is {p2}'s ancestor."),
        RelationKind::Descendant => format!("{p1} is {p2}'s descendant."),
        RelationKind::CommonAncestor => format!("{p1} and {p2} share a common ancestor."),
        RelationKind::CommonDescendant => format!("{p1} and {p2} share a common descendant."),
    }
}

/// Directed `(ancestor, descendant)` position pairs for a chain of `length`.
fn ancestor_edges<R: Rng + ?Sized>(
    rng: &mut R,
    length: usize,
    kind: RelationKind,
) -> Vec<(usize, usize)> {
    match kind {
        RelationKind::Ancestor => (0..length - 1).map(|i| (i, i + 1)).collect(),
        RelationKind::Descendant => (0..length - 1).map(|i| (i + 1, i)).collect(),
        RelationKind::CommonAncestor => {
            // Both halves descend from the pivot.
            let pivot = rng.gen_range(1..=length - 2);
            (0..length - 1)
                .map(|i| if i < pivot { (i + 1, i) } else { (i, i + 1) })
                .collect()
        }
        RelationKind::CommonDescendant => {
            // Both halves converge on the pivot.
            let pivot = rng.gen_range(1..=length - 2);
            (0..length - 1)
                .map(|i| if i < pivot { (i, i + 1) } else { (i + 1, i) })
                .collect()
        }
    }
}

/// Generates one quiz. Consumes randomness from `rng` only, so a seeded
/// generator yields identical quizzes across runs.
pub fn generate_quiz<R: Rng + ?Sized>(
    rng: &mut R,
    length: usize,
    kind: RelationKind,
    shuffle: bool,
    prompt: &str,
) -> Result<Quiz> {
    let pool = names::name_pool();
    if length < MIN_LENGTH {
        bail!("quiz length must be at least {}, got {}", MIN_LENGTH, length);
    }
    if length > pool.len() {
        bail!(
            "quiz length {} exceeds the {} available names",
            length,
            pool.len()
        );
    }

    let people: Vec<&str> = pool.choose_multiple(rng, length).copied().collect();

    let mut edges = ancestor_edges(rng, length, kind);
    if shuffle {
        edges.shuffle(rng);
    }

    let relations = edges
        .iter()
        .map(|&(a, d)| {
            if rng.gen_bool(0.5) {
                format!("* {} is {}'s ancestor.", people[a], people[d])
            } else {
                format!("* {} is {}'s descendant.", people[d], people[a])
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    let first = people[0];
    let last = people[length - 1];
    let question = format!("Determine the lineage relationship between {first} and {last}.");

    let mut options: Vec<AnswerKind> = RelationKind::ALL
        .into_iter()
        .map(AnswerKind::Relation)
        .collect();
    if shuffle {
        options.shuffle(rng);
    }
    options.push(AnswerKind::NoneOfTheAbove);

    let mut correct_answer = 0u8;
    let mut answers = Vec::with_capacity(options.len());
    for (i, option) in options.iter().enumerate() {
        let slot = (i + 1) as u8;
        let text = match option {
            AnswerKind::Relation(k) => answer_text(*k, first, last),
            AnswerKind::NoneOfTheAbove => NONE_OF_THE_ABOVE.to_string(),
        };
        answers.push(format!("{slot}. {text}"));
        if *option == AnswerKind::Relation(kind) {
            correct_answer = slot;
        }
    }
    debug_assert_ne!(correct_answer, 0);

    let quiz_text = template::render(prompt, &relations, &question, &answers.join("\n"));

    Ok(Quiz {
        problem_size: length as u32,
        relation_kind: kind,
        correct_answer,
        quiz_text,
    })
}

/// Batch generation settings.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub length: usize,
    /// Quizzes per relation kind.
    pub count: usize,
    pub prompt: String,
    pub shuffle: bool,
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            length: 8,
            count: 10,
            prompt: DEFAULT_PROMPT.to_string(),
            shuffle: false,
            seed: None,
        }
    }
}

/// Generates `count` quizzes for each relation kind, kinds in declaration order.
pub fn generate_quizzes(cfg: &GeneratorConfig) -> Result<Vec<Quiz>> {
    let mut rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut quizzes = Vec::with_capacity(cfg.count * RelationKind::ALL.len());
    for kind in RelationKind::ALL {
        for _ in 0..cfg.count {
            quizzes.push(generate_quiz(
                &mut rng,
                cfg.length,
                kind,
                cfg.shuffle,
                &cfg.prompt,
            )?);
        }
    }
    tracing::debug!(
        event = "quizzes_generated",
        length = cfg.length,
        total = quizzes.len(),
        shuffle = cfg.shuffle
    );
    Ok(quizzes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_rejects_short_chain() {
        let err = generate_quiz(&mut rng(), 2, RelationKind::Ancestor, false, DEFAULT_PROMPT)
            .unwrap_err();
        assert!(err.to_string().contains("at least 3"));
    }

    #[test]
    fn test_rejects_chain_longer_than_name_pool() {
        assert!(generate_quiz(&mut rng(), 201, RelationKind::Ancestor, false, DEFAULT_PROMPT).is_err());
        assert!(generate_quiz(&mut rng(), 200, RelationKind::Ancestor, false, DEFAULT_PROMPT).is_ok());
    }

    #[test]
    fn test_unshuffled_answer_slots_follow_kind_order() {
        for (i, kind) in RelationKind::ALL.into_iter().enumerate() {
            let q = generate_quiz(&mut rng(), 5, kind, false, DEFAULT_PROMPT).unwrap();
            assert_eq!(q.correct_answer as usize, i + 1);
        }
    }

    #[test]
    fn test_none_of_the_above_is_pinned_last() {
        let mut r = rng();
        for _ in 0..50 {
            let q = generate_quiz(&mut r, 6, RelationKind::CommonAncestor, true, DEFAULT_PROMPT)
                .unwrap();
            assert!(q.quiz_text.contains("5. None of the above is correct."));
            assert!((1..=4).contains(&q.correct_answer));
        }
    }

    #[test]
    fn test_batch_size_and_order() {
        let cfg = GeneratorConfig {
            length: 4,
            count: 3,
            seed: Some(1),
            ..Default::default()
        };
        let quizzes = generate_quizzes(&cfg).unwrap();
        assert_eq!(quizzes.len(), 12);
        assert!(quizzes[..3].iter().all(|q| q.relation_kind == RelationKind::Ancestor));
        assert!(quizzes[9..]
            .iter()
            .all(|q| q.relation_kind == RelationKind::CommonDescendant));
        assert!(quizzes.iter().all(|q| q.problem_size == 4));
    }
}
