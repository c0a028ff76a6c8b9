use super::{ChatRequest, Completion, LlmClient};
use crate::errors::ProviderError;
use async_trait::async_trait;
use std::sync::Mutex;

type Responder = dyn Fn(&ChatRequest, usize) -> Result<Completion, ProviderError> + Send + Sync;

/// Deterministic in-process client for tests and dry runs.
///
/// The responder receives the request and a zero-based call counter.
pub struct FakeClient {
    responder: Box<Responder>,
    calls: Mutex<usize>,
}

impl FakeClient {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&ChatRequest, usize) -> Result<Completion, ProviderError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(0),
        }
    }

    /// Always answers with the same text, reporting `provider`.
    pub fn constant(text: &str, provider: &str) -> Self {
        let text = text.to_string();
        let provider = provider.to_string();
        Self::new(move |_, _| {
            Ok(Completion {
                text: text.clone(),
                provider: provider.clone(),
            })
        })
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl LlmClient for FakeClient {
    async fn complete(&self, req: &ChatRequest) -> Result<Completion, ProviderError> {
        let n = {
            let mut calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
            let n = *calls;
            *calls += 1;
            n
        };
        (self.responder)(req, n)
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}
