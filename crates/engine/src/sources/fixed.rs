//! In-memory search backend for tests and offline runs.

use super::SearchBackend;
use crate::types::SearchHit;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use verity_core::{AppError, AppResult};

/// Backend that replays scripted result pages.
///
/// Each call pops the next page; the last page repeats once the script is
/// down to one entry. Every query is recorded.
#[derive(Debug)]
pub struct StaticSearchBackend {
    name: String,
    pages: Mutex<VecDeque<Vec<SearchHit>>>,
    queries: Mutex<Vec<String>>,
    fail: bool,
    delay: Option<Duration>,
}

impl StaticSearchBackend {
    /// Backend returning `hits` on every call.
    pub fn new(name: impl Into<String>, hits: Vec<SearchHit>) -> Self {
        Self::sequence(name, vec![hits])
    }

    /// Backend returning nothing.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    /// Backend returning `pages` in order, repeating the last.
    pub fn sequence(name: impl Into<String>, pages: Vec<Vec<SearchHit>>) -> Self {
        Self {
            name: name.into(),
            pages: Mutex::new(pages.into()),
            queries: Mutex::new(Vec::new()),
            fail: false,
            delay: None,
        }
    }

    /// Backend whose every call fails with a transport error.
    pub fn failing(name: impl Into<String>) -> Self {
        Self {
            fail: true,
            ..Self::empty(name)
        }
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queries received so far, in order.
    pub fn queries(&self) -> Vec<String> {
        lock(&self.queries).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.queries).len()
    }
}

#[async_trait::async_trait]
impl SearchBackend for StaticSearchBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &str, limit: usize) -> AppResult<Vec<SearchHit>> {
        lock(&self.queries).push(query.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail {
            return Err(AppError::Search(format!("{} backend unavailable", self.name)));
        }

        let page = {
            let mut pages = lock(&self.pages);
            if pages.len() > 1 {
                pages.pop_front().unwrap_or_default()
            } else {
                pages.front().cloned().unwrap_or_default()
            }
        };

        Ok(page.into_iter().take(limit).collect())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sequence_repeats_last_page() {
        let backend = StaticSearchBackend::sequence(
            "internal",
            vec![vec![SearchHit::new("one")], vec![SearchHit::new("two")]],
        );

        let mut contents = Vec::new();
        for query in ["a", "b", "c"] {
            let hits = backend.search(query, 10).await.unwrap();
            contents.push(hits[0].content.clone());
        }

        assert_eq!(contents, vec!["one", "two", "two"]);
        assert_eq!(backend.queries(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_limit_applies() {
        let backend = StaticSearchBackend::new(
            "web",
            vec![SearchHit::new("1"), SearchHit::new("2"), SearchHit::new("3")],
        );
        assert_eq!(backend.search("q", 2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failing_backend() {
        let backend = StaticSearchBackend::failing("web");
        assert!(matches!(
            backend.search("q", 3).await,
            Err(AppError::Search(_))
        ));
        assert_eq!(backend.call_count(), 1);
    }
}
