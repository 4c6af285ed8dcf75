/*!
 * Translation client with pacing, retry and egress rotation.
 *
 * Wraps a [`Translator`] so that callers see a single blocking
 * `translate` call: requests are spaced by a random delay, failures are
 * retried with exponential backoff on a fresh egress identity, and a batch
 * of records travels as one newline-joined request.
 */

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use parking_lot::Mutex;
use rand::Rng;

use super::pipeline::events::{EventSink, PipelineEvent};
use crate::errors::TranslationError;
use crate::providers::{EgressIdentity, EgressSource, Translator};

/// Separator used when merging records into one request
pub const LINE_SEPARATOR: char = '\n';

/// Retry behavior after a failed request
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Give up after this many consecutive failures; `None` never gives up
    pub max_consecutive_failures: Option<u32>,
    /// Wait before the first retry, doubled for every further one
    pub backoff_base: Duration,
    /// Upper bound for a single backoff wait
    pub backoff_max: Duration,
    /// Consecutive failures after which the client reports itself stalled
    pub stall_after: u32,
}

impl RetryPolicy {
    /// Retry forever with no wait, rotating egress on every failure
    pub fn unbounded() -> Self {
        Self {
            max_consecutive_failures: None,
            backoff_base: Duration::ZERO,
            backoff_max: Duration::ZERO,
            stall_after: u32::MAX,
        }
    }

    /// Wait before retry number `attempt` (1-based)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff_base.saturating_mul(factor).min(self.backoff_max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_consecutive_failures: Some(20),
            backoff_base: Duration::from_secs(1),
            backoff_max: Duration::from_secs(60),
            stall_after: 5,
        }
    }
}

/// Source and target language of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePair {
    pub source: String,
    pub target: String,
}

impl LanguagePair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Settings for a [`TranslationClient`]
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Lower bound of the random delay before each request
    pub min_delay: Duration,
    /// Upper bound of the random delay before each request
    pub max_delay: Duration,
    /// Time after which rotation falls back to direct egress
    pub local_egress_interval: Duration,
    pub retry: RetryPolicy,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(10),
            local_egress_interval: Duration::from_secs(720),
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientOptions {
    /// No pacing and no backoff; for tests and local services
    pub fn without_delays(mut self) -> Self {
        self.min_delay = Duration::ZERO;
        self.max_delay = Duration::ZERO;
        self.retry.backoff_base = Duration::ZERO;
        self.retry.backoff_max = Duration::ZERO;
        self
    }
}

struct EgressState {
    current: Option<EgressIdentity>,
    last_local_switch: Instant,
    primed: bool,
}

/// Translation service wrapper owning pacing and egress state
pub struct TranslationClient {
    translator: Arc<dyn Translator>,
    egress_source: Arc<dyn EgressSource>,
    options: ClientOptions,
    egress: Mutex<EgressState>,
    events: EventSink,
}

impl TranslationClient {
    pub fn new(
        translator: Arc<dyn Translator>,
        egress_source: Arc<dyn EgressSource>,
        options: ClientOptions,
    ) -> Self {
        Self {
            translator,
            egress_source,
            options,
            egress: Mutex::new(EgressState {
                current: None,
                last_local_switch: Instant::now(),
                primed: false,
            }),
            events: EventSink::disabled(),
        }
    }

    /// Report retries and egress changes to `events`
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Identity the next request will use
    pub fn current_egress(&self) -> Option<EgressIdentity> {
        self.egress.lock().current.clone()
    }

    /// Translate one text, retrying according to the policy
    pub async fn translate(&self, text: &str, languages: &LanguagePair) -> Result<String, TranslationError> {
        self.prime_egress().await;
        self.pace().await;

        let retry = &self.options.retry;
        let mut failures = 0u32;

        loop {
            let egress = self.current_egress();
            let result = self
                .translator
                .translate(
                    text,
                    &languages.source,
                    &languages.target,
                    egress.as_ref(),
                )
                .await;

            let error = match result {
                Ok(translated) => {
                    if failures > 0 {
                        info!("Translation succeeded after {} failed attempt(s)", failures);
                    }
                    return Ok(translated);
                }
                Err(e) => e,
            };

            failures += 1;
            warn!("Translation attempt {} failed: {}", failures, error);

            if let Some(max) = retry.max_consecutive_failures {
                if failures >= max {
                    return Err(TranslationError::Stalled {
                        attempts: failures,
                        last_error: error.to_string(),
                    });
                }
            }

            if failures == retry.stall_after {
                warn!("Translation stalled: {} consecutive failures", failures);
                self.events.emit(PipelineEvent::Stalled {
                    consecutive_failures: failures,
                });
            }

            self.rotate_egress().await;

            let delay = retry.backoff_for(failures);
            self.events.emit(PipelineEvent::RetryScheduled {
                attempt: failures,
                delay,
                error: error.to_string(),
            });
            if !delay.is_zero() {
                debug!("Retrying in {:?}", delay);
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// Translate a single record's text; blank text is returned as is
    pub async fn translate_record(&self, text: &str, languages: &LanguagePair) -> Result<String, TranslationError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }
        self.translate(text, languages).await
    }

    /// Translate several lines in one request.
    ///
    /// Fails with [`TranslationError::LineCountMismatch`] when the response
    /// cannot be split back into exactly as many lines as were sent.
    pub async fn translate_lines(
        &self,
        lines: &[String],
        languages: &LanguagePair,
    ) -> Result<Vec<String>, TranslationError> {
        if lines.iter().all(|line| line.trim().is_empty()) {
            return Ok(lines.to_vec());
        }

        let merged = lines.join(&LINE_SEPARATOR.to_string());
        let translated = self.translate(&merged, languages).await?;
        split_response(&translated, lines.len())
    }

    async fn prime_egress(&self) {
        if self.egress.lock().primed {
            return;
        }
        let identity = self.egress_source.next_identity().await;
        {
            let mut state = self.egress.lock();
            state.current = identity;
            state.primed = true;
        }
    }

    async fn pace(&self) {
        let delay = random_delay(self.options.min_delay, self.options.max_delay);
        if !delay.is_zero() {
            debug!("Waiting {:?} before request", delay);
            tokio::time::sleep(delay).await;
        }
    }

    /// Switch to direct egress once the local interval has elapsed, otherwise
    /// fetch a new identity.
    async fn rotate_egress(&self) {
        let fall_back_to_local = {
            let mut state = self.egress.lock();
            if state.last_local_switch.elapsed() > self.options.local_egress_interval {
                state.current = None;
                state.last_local_switch = Instant::now();
                true
            } else {
                false
            }
        };

        if fall_back_to_local {
            info!("Falling back to direct egress");
            self.events.emit(PipelineEvent::EgressRotated { identity: None });
            return;
        }

        let next = self.egress_source.next_identity().await;
        match &next {
            Some(identity) => info!("Attempting to use a new egress identity: {}", identity),
            None => info!("No egress identity available, using direct egress"),
        }
        self.events.emit(PipelineEvent::EgressRotated {
            identity: next.as_ref().map(|i| i.to_string()),
        });
        self.egress.lock().current = next;
    }
}

fn random_delay(min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    let ms = rand::rng().random_range(min.as_millis() as u64..=max.as_millis() as u64);
    Duration::from_millis(ms)
}

/// Split a merged response into `expected` lines.
///
/// A trailing `\r` on each line is dropped and surplus empty lines at the end
/// are ignored.
pub fn split_response(translated: &str, expected: usize) -> Result<Vec<String>, TranslationError> {
    let mut lines: Vec<String> = translated
        .split(LINE_SEPARATOR)
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect();

    while lines.len() > expected && lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }

    if lines.len() != expected {
        return Err(TranslationError::LineCountMismatch {
            expected,
            actual: lines.len(),
        });
    }
    Ok(lines)
}
