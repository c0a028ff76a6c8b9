use regex::Regex;

const PRIMARY: &str = r"<ANSWER>([0-9])</ANSWER>";

/// Tried in order when relaxed matching is on and the primary tag is absent.
const RELAXED: [&str; 5] = [
    r"boxed\{([0-9])\}",
    r"</ANSWER>([0-9])</ANSWER>",
    r"ANSWER: ?([0-9])",
    r"\*\*ANSWER\*\*:? ?([0-9])",
    r"\*\*ANSWER>\*\*([0-9])</ANSWER>",
];

fn compile(pattern: &str) -> anyhow::Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| anyhow::anyhow!("config error: invalid regex pattern '{}': {}", pattern, e))
}

/// Pulls the selected option number out of a model response.
pub struct AnswerExtractor {
    primary: Regex,
    relaxed: Vec<Regex>,
}

impl AnswerExtractor {
    pub fn new(relaxed: bool) -> anyhow::Result<Self> {
        let relaxed = if relaxed {
            RELAXED.iter().map(|p| compile(p)).collect::<anyhow::Result<_>>()?
        } else {
            Vec::new()
        };
        Ok(Self {
            primary: compile(PRIMARY)?,
            relaxed,
        })
    }

    /// First digit captured by the first matching pattern, or 0 when nothing
    /// matches.
    pub fn extract_answer(&self, response: &str) -> u8 {
        std::iter::once(&self.primary)
            .chain(self.relaxed.iter())
            .find_map(|re| re.captures(response))
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
    Missing,
}

impl Outcome {
    pub fn classify(extracted: u8, correct_answer: u8) -> Self {
        if extracted == 0 {
            Outcome::Missing
        } else if extracted == correct_answer {
            Outcome::Correct
        } else {
            Outcome::Incorrect
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_tag() {
        let x = AnswerExtractor::new(false).unwrap();
        assert_eq!(x.extract_answer("so the answer is <ANSWER>3</ANSWER>"), 3);
        assert_eq!(x.extract_answer("<ANSWER>2</ANSWER> ... <ANSWER>4</ANSWER>"), 2);
        assert_eq!(x.extract_answer("ANSWER: 2"), 0);
        assert_eq!(x.extract_answer("<ANSWER>12</ANSWER>"), 0);
        assert_eq!(x.extract_answer(""), 0);
    }

    #[test]
    fn test_relaxed_fallbacks() {
        let x = AnswerExtractor::new(true).unwrap();
        assert_eq!(x.extract_answer("**ANSWER**: 2"), 2);
        assert_eq!(x.extract_answer("\\boxed{4}"), 4);
        assert_eq!(x.extract_answer("</ANSWER>1</ANSWER>"), 1);
        assert_eq!(x.extract_answer("ANSWER:5"), 5);
        assert_eq!(x.extract_answer("**ANSWER>**3</ANSWER>"), 3);
        assert_eq!(x.extract_answer("no idea"), 0);
    }

    #[test]
    fn test_primary_beats_relaxed() {
        let x = AnswerExtractor::new(true).unwrap();
        assert_eq!(x.extract_answer("\\boxed{1} then <ANSWER>3</ANSWER>"), 3);
        // boxed is tried before the bare ANSWER: form
        assert_eq!(x.extract_answer("ANSWER: 2 and boxed{4}"), 4);
    }

    #[test]
    fn test_outcome() {
        assert_eq!(Outcome::classify(3, 3), Outcome::Correct);
        assert_eq!(Outcome::classify(2, 3), Outcome::Incorrect);
        assert_eq!(Outcome::classify(0, 3), Outcome::Missing);
    }
}
