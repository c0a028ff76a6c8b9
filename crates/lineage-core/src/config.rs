use crate::errors::ConfigError;
use crate::model::Quiz;
use crate::providers::llm::{ChatMessage, ChatRequest, ProviderPreferences};
use crate::quiz::DEFAULT_SYSTEM_PROMPT;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tokio::sync::Semaphore;

pub const DEFAULT_THREADS: usize = 8;
pub const TEMPERATURE: f32 = 0.01;
pub const SEED: u64 = 42;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasoningEffort {
    Low,
    Medium,
    High,
}

impl ReasoningEffort {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasoningEffort::Low => "low",
            ReasoningEffort::Medium => "medium",
            ReasoningEffort::High => "high",
        }
    }
}

impl fmt::Display for ReasoningEffort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReasoningEffort {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(ReasoningEffort::Low),
            "medium" => Ok(ReasoningEffort::Medium),
            "high" => Ok(ReasoningEffort::High),
            other => Err(ConfigError(format!(
                "invalid reasoning effort '{}' (expected low|medium|high)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataCollection {
    Allow,
    Deny,
}

impl DataCollection {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataCollection::Allow => "allow",
            DataCollection::Deny => "deny",
        }
    }
}

impl FromStr for DataCollection {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allow" => Ok(DataCollection::Allow),
            "deny" => Ok(DataCollection::Deny),
            other => Err(ConfigError(format!(
                "invalid data collection preference '{}' (expected allow|deny)",
                other
            ))),
        }
    }
}

/// Where the system prompt came from. Drives both the request and the name of
/// the results subdirectory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemPrompt {
    Default,
    File { stem: String, text: String },
    Literal(String),
}

impl SystemPrompt {
    /// Resolves a `--system-prompt` value. Existing `.txt`/`.md` files are read,
    /// anything else is used verbatim.
    pub fn resolve(arg: &str) -> Result<Self, ConfigError> {
        let path = Path::new(arg);
        let is_prompt_file = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "txt" || e == "md");
        if is_prompt_file && path.is_file() {
            let text = std::fs::read_to_string(path).map_err(|e| {
                ConfigError(format!(
                    "failed to read system prompt {}: {}",
                    path.display(),
                    e
                ))
            })?;
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("system_prompt")
                .to_string();
            return Ok(SystemPrompt::File { stem, text });
        }
        Ok(SystemPrompt::Literal(arg.to_string()))
    }

    pub fn text(&self) -> &str {
        match self {
            SystemPrompt::Default => DEFAULT_SYSTEM_PROMPT,
            SystemPrompt::File { text, .. } => text,
            SystemPrompt::Literal(text) => text,
        }
    }

    pub fn dir_name(&self) -> String {
        match self {
            SystemPrompt::Default => "default_system_prompt".to_string(),
            SystemPrompt::File { stem, .. } => sanitize(stem, 64),
            SystemPrompt::Literal(text) => sanitize(text, 40),
        }
    }
}

/// Keeps ASCII alphanumerics, `-` and `_`; everything else becomes `_`.
/// Runs of `_` are collapsed and the result is cut to `max_len` characters.
pub fn sanitize(s: &str, max_len: usize) -> String {
    let mut out = String::new();
    for c in s.trim().chars() {
        let c = if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            c
        } else {
            '_'
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
        if out.len() >= max_len {
            break;
        }
    }
    let out = out.trim_matches('_').to_string();
    if out.is_empty() {
        "prompt".to_string()
    } else {
        out
    }
}

/// Filesystem-safe model id: `openai/o3-mini:free` becomes `openai_o3-mini_free`.
pub fn model_slug(model: &str) -> String {
    model.replace(['/', ':'], "_")
}

pub fn results_dir_name(system_prompt: Option<&SystemPrompt>) -> String {
    system_prompt
        .map(|p| p.dir_name())
        .unwrap_or_else(|| "no_system_prompt".to_string())
}

/// Resolved settings for one dispatch run.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub model: String,
    pub providers: Vec<String>,
    pub reasoning_effort: Option<ReasoningEffort>,
    pub threads: usize,
    pub system_prompt: Option<SystemPrompt>,
    pub allow_fallbacks: bool,
    pub data_collection: Option<DataCollection>,
    pub require_parameters: bool,
    pub quantizations: Vec<String>,
    pub ignore: Vec<String>,
    pub fallback_models: Vec<String>,
}

impl DispatchConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            providers: Vec::new(),
            reasoning_effort: None,
            threads: DEFAULT_THREADS,
            system_prompt: None,
            allow_fallbacks: true,
            data_collection: None,
            require_parameters: false,
            quantizations: Vec::new(),
            ignore: Vec::new(),
            fallback_models: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError("model name must not be empty".into()));
        }
        if self.threads == 0 {
            return Err(ConfigError("threads must be at least 1".into()));
        }
        if self.threads > Semaphore::MAX_PERMITS {
            return Err(ConfigError(format!(
                "threads must be at most {}",
                Semaphore::MAX_PERMITS
            )));
        }
        Ok(())
    }

    pub fn system_prompt_text(&self) -> Option<&str> {
        self.system_prompt.as_ref().map(|p| p.text())
    }

    fn provider_preferences(&self) -> ProviderPreferences {
        fn non_empty(v: &[String]) -> Option<Vec<String>> {
            (!v.is_empty()).then(|| v.to_vec())
        }
        ProviderPreferences {
            order: non_empty(&self.providers),
            allow_fallbacks: Some(self.allow_fallbacks),
            data_collection: self.data_collection.map(|d| d.as_str().to_string()),
            require_parameters: self.require_parameters.then_some(true),
            quantizations: non_empty(&self.quantizations),
            ignore: non_empty(&self.ignore),
        }
    }

    pub fn build_request(&self, quiz: &Quiz) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = self.system_prompt_text() {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(quiz.quiz_text.clone()));

        let provider = self.provider_preferences();
        ChatRequest {
            model: self.model.clone(),
            temperature: TEMPERATURE,
            seed: SEED,
            messages,
            provider: (!provider.is_empty()).then_some(provider),
            reasoning_effort: self.reasoning_effort.map(|e| e.as_str().to_string()),
            models: self.fallback_models.clone(),
        }
    }
}

/// Splits a comma-separated flag value, dropping blanks.
pub fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RelationKind;

    fn quiz() -> Quiz {
        Quiz {
            problem_size: 8,
            relation_kind: RelationKind::Ancestor,
            correct_answer: 1,
            quiz_text: "quiz body".into(),
        }
    }

    #[test]
    fn test_request_without_system_prompt() {
        let cfg = DispatchConfig::new("deepseek/deepseek-r1");
        let req = cfg.build_request(&quiz());
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["model"], "deepseek/deepseek-r1");
        assert_eq!(json["seed"], 42);
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["provider"]["allow_fallbacks"], true);
        assert!(json["provider"].get("order").is_none());
        assert!(json.get("reasoning_effort").is_none());
        assert!(json.get("models").is_none());
    }

    #[test]
    fn test_request_with_all_options() {
        let mut cfg = DispatchConfig::new("openai/o3-mini");
        cfg.providers = vec!["OpenAI".into(), "Azure".into()];
        cfg.reasoning_effort = Some(ReasoningEffort::High);
        cfg.system_prompt = Some(SystemPrompt::Default);
        cfg.allow_fallbacks = false;
        cfg.data_collection = Some(DataCollection::Deny);
        cfg.require_parameters = true;
        cfg.quantizations = vec!["fp8".into()];
        cfg.ignore = vec!["Together".into()];
        cfg.fallback_models = vec!["openai/o1-mini".into()];

        let json = serde_json::to_value(cfg.build_request(&quiz())).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], DEFAULT_SYSTEM_PROMPT);
        assert_eq!(json["messages"][1]["content"], "quiz body");
        assert_eq!(json["provider"]["order"][1], "Azure");
        assert_eq!(json["provider"]["allow_fallbacks"], false);
        assert_eq!(json["provider"]["data_collection"], "deny");
        assert_eq!(json["provider"]["require_parameters"], true);
        assert_eq!(json["provider"]["quantizations"][0], "fp8");
        assert_eq!(json["provider"]["ignore"][0], "Together");
        assert_eq!(json["reasoning_effort"], "high");
        assert_eq!(json["models"][0], "openai/o1-mini");
    }

    #[test]
    fn test_effort_parsing() {
        assert_eq!("medium".parse::<ReasoningEffort>().unwrap(), ReasoningEffort::Medium);
        assert!("extreme".parse::<ReasoningEffort>().is_err());
    }

    #[test]
    fn test_validate() {
        let mut cfg = DispatchConfig::new("m");
        assert!(cfg.validate().is_ok());
        cfg.threads = 0;
        assert!(cfg.validate().is_err());
        cfg.threads = Semaphore::MAX_PERMITS;
        assert!(cfg.validate().is_ok());
        cfg.threads = usize::MAX;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("threads must be at most"));
    }

    #[test]
    fn test_system_prompt_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("careful.md");
        std::fs::write(&path, "Think carefully.").unwrap();

        let prompt = SystemPrompt::resolve(path.to_str().unwrap()).unwrap();
        assert_eq!(prompt.text(), "Think carefully.");
        assert_eq!(prompt.dir_name(), "careful");
    }

    #[test]
    fn test_system_prompt_literal_and_dir_names() {
        let prompt = SystemPrompt::resolve("Be brief & exact!").unwrap();
        assert_eq!(prompt.text(), "Be brief & exact!");
        assert_eq!(prompt.dir_name(), "Be_brief_exact");
        assert_eq!(results_dir_name(None), "no_system_prompt");
        assert_eq!(
            results_dir_name(Some(&SystemPrompt::Default)),
            "default_system_prompt"
        );
        // non-prompt extensions are literal text even when the file exists
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompt.json");
        std::fs::write(&path, "{}").unwrap();
        let arg = path.to_str().unwrap();
        assert_eq!(SystemPrompt::resolve(arg).unwrap(), SystemPrompt::Literal(arg.into()));
    }

    #[test]
    fn test_sanitize_and_slug() {
        assert_eq!(sanitize("  !!!  ", 10), "prompt");
        assert_eq!(sanitize("abcdefghijkl", 5), "abcde");
        assert_eq!(model_slug("openai/o3-mini:free"), "openai_o3-mini_free");
        assert_eq!(split_list(Some("a, b,,c ")), vec!["a", "b", "c"]);
        assert!(split_list(None).is_empty());
    }
}
