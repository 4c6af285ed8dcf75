/*!
 * Mock provider implementations for testing.
 *
 * This module provides scripted translators and egress sources:
 * - `MockTranslator::working()` - Always succeeds, tagging every line
 * - `MockTranslator::fail_first(n)` - Fails `n` times, then succeeds
 * - `MockTranslator::failing()` - Always fails with an error
 * - `MockTranslator::collapsing()` - Merges all lines into one
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{EgressIdentity, EgressSource, Translator};
use crate::errors::ProviderError;

/// Behavior mode for the mock translator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Prefixes every line with `[target] `
    Working,
    /// Returns the text unchanged
    Echo,
    /// Fails the first `failures` requests, then works
    FailFirst { failures: usize },
    /// Fails every Nth request
    Intermittent { fail_every: usize },
    /// Always fails
    Failing,
    /// Joins all lines with a space, breaking line alignment
    Collapsing,
}

/// One request observed by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub text: String,
    pub source_language: String,
    pub target_language: String,
    pub egress: Option<EgressIdentity>,
}

/// Scripted translator for tests
#[derive(Debug, Clone)]
pub struct MockTranslator {
    behavior: MockBehavior,
    request_count: Arc<AtomicUsize>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockTranslator {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn echo() -> Self {
        Self::new(MockBehavior::Echo)
    }

    pub fn fail_first(failures: usize) -> Self {
        Self::new(MockBehavior::FailFirst { failures })
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn collapsing() -> Self {
        Self::new(MockBehavior::Collapsing)
    }

    /// Number of requests received, failed ones included
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Requests received so far
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    /// What `Working` turns `text` into
    pub fn tag_lines(text: &str, target_language: &str) -> String {
        text.split('\n')
            .map(|line| format!("[{}] {}", target_language, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
        egress: Option<&EgressIdentity>,
    ) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(MockCall {
            text: text.to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            egress: egress.cloned(),
        });

        let fail = || ProviderError::ConnectionError(format!("mock failure on request {}", count + 1));

        match self.behavior {
            MockBehavior::Working => Ok(Self::tag_lines(text, target_language)),
            MockBehavior::Echo => Ok(text.to_string()),
            MockBehavior::FailFirst { failures } => {
                if count < failures {
                    Err(fail())
                } else {
                    Ok(Self::tag_lines(text, target_language))
                }
            }
            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        status_code: 503,
                        message: "Service unavailable".to_string(),
                    })
                } else {
                    Ok(Self::tag_lines(text, target_language))
                }
            }
            MockBehavior::Failing => Err(fail()),
            MockBehavior::Collapsing => Ok(text.replace('\n', " ")),
        }
    }
}

/// Egress source yielding `http://proxy-N:8080`, counting from 1
#[derive(Debug, Clone, Default)]
pub struct MockEgress {
    issued: Arc<AtomicUsize>,
}

impl MockEgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identities handed out so far
    pub fn issued(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EgressSource for MockEgress {
    async fn next_identity(&self) -> Option<EgressIdentity> {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        Some(EgressIdentity::new(format!("http://proxy-{}:8080", n)))
    }
}
