use super::exit_codes;
use crate::cli::args::RunArgs;
use lineage_core::config::{
    model_slug, results_dir_name, split_list, DispatchConfig, SystemPrompt,
};
use lineage_core::engine::retry::RetryPolicy;
use lineage_core::engine::runner::Runner;
use lineage_core::errors::ConfigError;
use lineage_core::providers::llm::openrouter::{ClientConfig, OpenRouterClient};
use lineage_core::select::{choose_file, Explicit, FileSelector, Interactive, MostRecent};
use lineage_core::storage::{problem_size_from_filename, read_quizzes_file, write_results_file};
use std::sync::Arc;

fn dispatch_config(args: &RunArgs) -> anyhow::Result<DispatchConfig> {
    let mut cfg = DispatchConfig::new(args.model.as_str());
    cfg.providers = split_list(args.provider.as_deref());
    cfg.reasoning_effort = args.effort;
    cfg.threads = args.threads;
    cfg.system_prompt = match &args.system_prompt {
        None => None,
        Some(None) => Some(SystemPrompt::Default),
        Some(Some(value)) => Some(SystemPrompt::resolve(value)?),
    };
    cfg.allow_fallbacks = args.fallbacks;
    cfg.data_collection = args.data_privacy;
    cfg.require_parameters = args.require_parameters;
    cfg.quantizations = split_list(args.quantizations.as_deref());
    cfg.ignore = split_list(args.ignore.as_deref());
    cfg.fallback_models = split_list(args.fallback_models.as_deref());
    cfg.validate()?;
    Ok(cfg)
}

pub async fn run(args: RunArgs) -> anyhow::Result<i32> {
    let mut client_cfg = ClientConfig::from_env()?;
    if let Some(url) = &args.base_url {
        client_cfg.base_url = url.clone();
    }
    client_cfg.referer = args.referer.clone();
    client_cfg.title = args.title.clone();

    let cfg = dispatch_config(&args)?;

    let selector: Box<dyn FileSelector> = match (&args.input, args.latest) {
        (Some(path), _) => Box::new(Explicit(path.clone())),
        (None, true) => Box::new(MostRecent),
        (None, false) => Box::new(Interactive {
            prompt: "Select a quiz file".into(),
        }),
    };
    let quiz_path = choose_file(selector.as_ref(), &args.tests_dir, false)?;
    let quizzes = read_quizzes_file(&quiz_path)?;
    if quizzes.is_empty() {
        return Err(ConfigError(format!("no quizzes in {}", quiz_path.display())).into());
    }

    let out = args
        .results_dir
        .join(results_dir_name(cfg.system_prompt.as_ref()))
        .join(format!(
            "{}_{}.csv",
            model_slug(&cfg.model),
            problem_size_from_filename(&quiz_path)
        ));

    tracing::info!(
        event = "run_start",
        quiz_file = %quiz_path.display(),
        output = %out.display(),
        quizzes = quizzes.len()
    );

    let runner = Runner::new(
        Arc::new(OpenRouterClient::new(client_cfg)),
        cfg,
        RetryPolicy::default(),
    );
    let rows = runner.run_all(quizzes).await?;
    write_results_file(&out, &rows)?;

    eprintln!("Output saved to: {}", out.display());
    Ok(exit_codes::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::{Cli, Command};
    use clap::Parser;

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["lineage", "run", "-m", "openai/o3-mini"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().cmd {
            Command::Run(args) => args,
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_dispatch_config_from_flags() {
        let args = run_args(&[
            "-p",
            "OpenAI, Azure",
            "-t",
            "3",
            "-s",
            "--data-privacy",
            "deny",
            "--ignore",
            "Together",
        ]);
        let cfg = dispatch_config(&args).unwrap();
        assert_eq!(cfg.providers, vec!["OpenAI", "Azure"]);
        assert_eq!(cfg.threads, 3);
        assert_eq!(cfg.system_prompt, Some(SystemPrompt::Default));
        assert_eq!(cfg.ignore, vec!["Together"]);
        assert_eq!(
            results_dir_name(cfg.system_prompt.as_ref()),
            "default_system_prompt"
        );
    }

    #[test]
    fn test_zero_threads_is_config_error() {
        let args = run_args(&["-t", "0"]);
        let err = dispatch_config(&args).unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }
}
