use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four lineage relationships a quiz can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationKind {
    Ancestor,
    Descendant,
    CommonAncestor,
    CommonDescendant,
}

impl RelationKind {
    pub const ALL: [RelationKind; 4] = [
        RelationKind::Ancestor,
        RelationKind::Descendant,
        RelationKind::CommonAncestor,
        RelationKind::CommonDescendant,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Ancestor => "ANCESTOR",
            RelationKind::Descendant => "DESCENDANT",
            RelationKind::CommonAncestor => "COMMON_ANCESTOR",
            RelationKind::CommonDescendant => "COMMON_DESCENDANT",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RelationKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unsupported relation kind '{}'", s))
    }
}

/// What an answer option claims. Every relation kind has one option, plus the
/// catch-all that is never correct for a generated quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    Relation(RelationKind),
    NoneOfTheAbove,
}

/// A generated quiz item with its ground truth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    pub problem_size: u32,
    pub relation_kind: RelationKind,
    /// Answer slot in `1..=5`; never 0.
    pub correct_answer: u8,
    pub quiz_text: String,
}

/// One model answer to one quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub problem_size: u32,
    pub relation_name: RelationKind,
    pub correct_answer: u8,
    pub quiz_text: String,
    pub model_name: String,
    pub provider_name: String,
    pub reasoning_effort: String,
    pub system_prompt: String,
    pub model_response: String,
}

impl ResultRecord {
    pub fn from_completion(
        quiz: &Quiz,
        model_name: &str,
        provider_name: String,
        reasoning_effort: Option<&str>,
        system_prompt: Option<&str>,
        model_response: String,
    ) -> Self {
        Self {
            problem_size: quiz.problem_size,
            relation_name: quiz.relation_kind,
            correct_answer: quiz.correct_answer,
            quiz_text: quiz.quiz_text.clone(),
            model_name: model_name.to_string(),
            provider_name,
            reasoning_effort: reasoning_effort.unwrap_or_default().to_string(),
            system_prompt: system_prompt.unwrap_or_default().to_string(),
            model_response,
        }
    }
}

/// A results file row. Rows whose request failed permanently are kept as
/// `Failed` and serialized as nine empty fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultRow {
    Answered(ResultRecord),
    Failed,
}

impl ResultRow {
    pub fn record(&self) -> Option<&ResultRecord> {
        match self {
            ResultRow::Answered(r) => Some(r),
            ResultRow::Failed => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ResultRow::Failed)
    }
}

pub const RESULT_COLUMNS: [&str; 9] = [
    "problem_size",
    "relation_name",
    "correct_answer",
    "quiz_text",
    "model_name",
    "provider_name",
    "reasoning_effort",
    "system_prompt",
    "model_response",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_kind_parse() {
        for k in RelationKind::ALL {
            assert_eq!(k.as_str().parse::<RelationKind>().unwrap(), k);
        }
        assert!("OTHER".parse::<RelationKind>().is_err());
        assert!("ancestor".parse::<RelationKind>().is_err());
    }

    #[test]
    fn test_serde_names_match_display() {
        let json = serde_json::to_string(&RelationKind::CommonDescendant).unwrap();
        assert_eq!(json, "\"COMMON_DESCENDANT\"");
    }
}
