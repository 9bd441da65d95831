//! Scripted LLM provider for tests and offline development.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use verity_core::{AppError, AppResult};

/// A completion call observed by [`MockLlmClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub system: Option<String>,
    pub prompt: String,
    pub temperature: Option<f32>,
}

#[derive(Debug)]
struct Route {
    needle: String,
    replies: VecDeque<String>,
    fail: bool,
}

/// Mock provider that answers from scripted replies.
///
/// Requests are routed by the first registered needle found in the
/// request's system or user prompt.
/// Each route pops its replies in order; the final reply repeats once the
/// queue is down to one entry. Unrouted requests get the fallback reply.
///
/// ```
/// use verity_llm::MockLlmClient;
///
/// let client = MockLlmClient::new("fallback")
///     .on("relevance", [r#"{"relevant": false}"#, r#"{"relevant": true}"#]);
/// assert_eq!(client.call_count(), 0);
/// ```
#[derive(Debug)]
pub struct MockLlmClient {
    fallback: String,
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockLlmClient {
    /// Create a mock whose unrouted requests return `fallback`.
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            fallback: fallback.into(),
            routes: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Script replies for requests whose prompt contains `needle`.
    pub fn on<I, S>(self, needle: impl Into<String>, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        lock(&self.routes).push(Route {
            needle: needle.into(),
            replies: replies.into_iter().map(Into::into).collect(),
            fail: false,
        });
        self
    }

    /// Fail every request whose prompt contains `needle` with a transport error.
    pub fn fail_on(self, needle: impl Into<String>) -> Self {
        lock(&self.routes).push(Route {
            needle: needle.into(),
            replies: VecDeque::new(),
            fail: true,
        });
        self
    }

    /// All calls observed so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Total number of calls observed.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Number of calls whose system or user prompt contained `needle`.
    pub fn calls_matching(&self, needle: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| routing_text(call.system.as_deref(), &call.prompt).contains(needle))
            .count()
    }

    fn next_reply(&self, text: &str) -> AppResult<String> {
        let mut routes = lock(&self.routes);
        let Some(route) = routes.iter_mut().find(|r| text.contains(&r.needle)) else {
            return Ok(self.fallback.clone());
        };

        if route.fail {
            return Err(AppError::Llm(format!(
                "Mock transport failure for '{}'",
                route.needle
            )));
        }

        let reply = if route.replies.len() > 1 {
            route.replies.pop_front()
        } else {
            route.replies.front().cloned()
        };

        Ok(reply.unwrap_or_else(|| self.fallback.clone()))
    }
}

#[async_trait::async_trait]
impl LlmClient for MockLlmClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        lock(&self.calls).push(RecordedCall {
            system: request.system.clone(),
            prompt: request.prompt.clone(),
            temperature: request.temperature,
        });

        let text = routing_text(request.system.as_deref(), &request.prompt);
        let content = self.next_reply(&text)?;

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::default(),
        })
    }
}

fn routing_text(system: Option<&str>, prompt: &str) -> String {
    match system {
        Some(system) => format!("{}\n{}", system, prompt),
        None => prompt.to_string(),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
