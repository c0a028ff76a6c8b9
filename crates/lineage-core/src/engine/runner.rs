use crate::config::DispatchConfig;
use crate::engine::retry::RetryPolicy;
use crate::errors::{ProviderError, RetryClass};
use crate::model::{Quiz, ResultRecord, ResultRow};
use crate::providers::llm::{Completion, LlmClient};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Sends quizzes to a model with bounded concurrency.
///
/// Every quiz is its own task; a permanent failure turns that row into
/// [`ResultRow::Failed`] and the rest of the batch keeps going.
#[derive(Clone)]
pub struct Runner {
    pub client: Arc<dyn LlmClient>,
    pub config: Arc<DispatchConfig>,
    pub policy: RetryPolicy,
}

impl Runner {
    pub fn new(client: Arc<dyn LlmClient>, config: DispatchConfig, policy: RetryPolicy) -> Self {
        Self {
            client,
            config: Arc::new(config),
            policy,
        }
    }

    /// Runs every quiz and returns rows in input order, regardless of the
    /// order in which requests complete.
    pub async fn run_all(&self, quizzes: Vec<Quiz>) -> anyhow::Result<Vec<ResultRow>> {
        let parallel = self.config.threads.clamp(1, Semaphore::MAX_PERMITS);
        let sem = Arc::new(Semaphore::new(parallel));
        let total = quizzes.len();
        let mut handles = Vec::with_capacity(total);

        tracing::info!(
            event = "dispatch_start",
            client = self.client.provider_name(),
            model = %self.config.model,
            quizzes = total,
            threads = parallel
        );

        for quiz in quizzes {
            let permit = sem.clone().acquire_owned().await?;
            let this = self.clone();
            let h = tokio::spawn(async move {
                let _permit = permit;
                this.run_one(&quiz).await
            });
            handles.push(h);
        }

        let mut rows = Vec::with_capacity(total);
        let mut failed = 0usize;
        for (i, h) in handles.into_iter().enumerate() {
            let row = match h.await {
                Ok(row) => row,
                Err(e) => {
                    tracing::error!(event = "task_join_error", index = i, error = %e);
                    ResultRow::Failed
                }
            };
            if row.is_failed() {
                failed += 1;
            }
            rows.push(row);
        }

        tracing::info!(
            event = "dispatch_done",
            model = %self.config.model,
            answered = total - failed,
            failed
        );
        Ok(rows)
    }

    /// Sends one quiz, retrying per the policy.
    pub async fn run_one(&self, quiz: &Quiz) -> ResultRow {
        tracing::debug!(
            event = "processing_quiz",
            problem_size = quiz.problem_size,
            relation = %quiz.relation_kind
        );
        match self.complete_with_retry(quiz).await {
            Ok(completion) => ResultRow::Answered(ResultRecord::from_completion(
                quiz,
                &self.config.model,
                completion.provider,
                self.config.reasoning_effort.map(|e| e.as_str()),
                self.config.system_prompt_text(),
                completion.text,
            )),
            Err(e) => {
                tracing::warn!(event = "quiz_failed", error = %e, "giving up on quiz");
                ResultRow::Failed
            }
        }
    }

    async fn complete_with_retry(&self, quiz: &Quiz) -> Result<Completion, ProviderError> {
        let req = self.config.build_request(quiz);
        let mut retries = 0u32;

        loop {
            if !self.policy.throttle.is_zero() {
                tokio::time::sleep(self.policy.throttle).await;
            }

            let err = match self.client.complete(&req).await {
                Ok(c) => return Ok(c),
                Err(e) => e,
            };

            match err.retry_class() {
                RetryClass::Permanent => return Err(err),
                RetryClass::GatewayWait => {
                    tracing::warn!(
                        event = "gateway_retry",
                        error = %err,
                        wait_ms = self.policy.gateway_wait.as_millis() as u64,
                        "waiting before retrying"
                    );
                    tokio::time::sleep(self.policy.gateway_wait).await;
                }
                RetryClass::Backoff => {
                    retries += 1;
                    if retries > self.policy.max_retries {
                        tracing::warn!(event = "retries_exhausted", retries = retries - 1);
                        return Err(err);
                    }
                    let delay = self.policy.backoff_delay(retries, &mut rand::thread_rng());
                    tracing::warn!(
                        event = "backoff_retry",
                        error = %err,
                        attempt = retries,
                        delay_ms = delay.as_millis() as u64,
                        "implementing exponential backoff"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
