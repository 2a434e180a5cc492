use anyhow::Result;
use std::time::Duration;

use blognerd_core::config::EmbeddingConfig;
use blognerd_core::traits::Embedder;
use blognerd_core::types::EmbedPurpose;

const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Constant,
    Exponential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total tries, including the first.
    pub attempts: usize,
    pub interval: Duration,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn from_config(cfg: &EmbeddingConfig) -> Self {
        Self {
            attempts: cfg.retry_attempts.max(1),
            interval: Duration::from_millis(cfg.retry_interval_ms),
            backoff: Backoff::Constant,
        }
    }

    pub fn none() -> Self {
        Self { attempts: 1, interval: Duration::ZERO, backoff: Backoff::Constant }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay(&self, retry: usize) -> Duration {
        match self.backoff {
            Backoff::Constant => self.interval,
            Backoff::Exponential => {
                let factor = 1u32 << retry.saturating_sub(1).min(16);
                self.interval.saturating_mul(factor).min(MAX_BACKOFF)
            }
        }
    }

    /// Run `op` until it succeeds or the attempts are used up; the last error is returned.
    pub fn run<T, F>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let mut attempt = 1;
        loop {
            match op() {
                Ok(v) => return Ok(v),
                Err(e) if attempt < self.attempts => {
                    let delay = self.delay(attempt);
                    tracing::warn!("{} failed: {}. Retrying in {}ms", what, e, delay.as_millis());
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Embedder decorator that retries failed batches.
pub struct Retrying<E> {
    inner: E,
    policy: RetryPolicy,
}

impl<E: Embedder> Retrying<E> {
    pub fn new(inner: E, policy: RetryPolicy) -> Self { Self { inner, policy } }
}

impl<E: Embedder> Embedder for Retrying<E> {
    fn dim(&self) -> usize { self.inner.dim() }

    fn max_len(&self) -> usize { self.inner.max_len() }

    fn embed_batch(&self, texts: &[String], purpose: EmbedPurpose) -> Result<Vec<Vec<f32>>> {
        self.policy.run("embedding", || self.inner.embed_batch(texts, purpose))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Flaky {
        failures: usize,
        calls: AtomicUsize,
    }

    impl Embedder for Flaky {
        fn dim(&self) -> usize { 2 }
        fn max_len(&self) -> usize { 8 }
        fn embed_batch(&self, texts: &[String], _purpose: EmbedPurpose) -> Result<Vec<Vec<f32>>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                anyhow::bail!("transient failure {n}");
            }
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    fn policy(attempts: usize) -> RetryPolicy {
        RetryPolicy { attempts, interval: Duration::ZERO, backoff: Backoff::Constant }
    }

    #[test]
    fn recovers_within_attempts() {
        let e = Retrying::new(Flaky { failures: 1, calls: AtomicUsize::new(0) }, policy(2));
        let out = e.embed_batch(&["x".into()], EmbedPurpose::Query).expect("second try succeeds");
        assert_eq!(out.len(), 1);
        assert_eq!(e.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn gives_up_after_last_attempt() {
        let e = Retrying::new(Flaky { failures: 5, calls: AtomicUsize::new(0) }, policy(2));
        let err = e.embed_batch(&["x".into()], EmbedPurpose::Query).unwrap_err();
        assert!(err.to_string().contains("transient failure 1"));
        assert_eq!(e.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn exponential_delay_is_capped() {
        let p = RetryPolicy {
            attempts: 10,
            interval: Duration::from_millis(500),
            backoff: Backoff::Exponential,
        };
        assert_eq!(p.delay(1), Duration::from_millis(500));
        assert_eq!(p.delay(3), Duration::from_millis(2_000));
        assert_eq!(p.delay(10), MAX_BACKOFF);
    }
}
