use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::domain::{FetchedImage, ImageDimensions, ImageError, ImageRequest, SEED_UPPER_BOUND};
use crate::infra::image::ImageProvider;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(500);

// Backoff sleeps in small slices so shutdown can interrupt a waiting slot.
const BACKOFF_SLICE: Duration = Duration::from_millis(10);

/// Constant backoff, no jitter. `max_retries` is on top of the initial
/// attempt, so the default budget is four attempts per slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRetryConfig {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for FetchRetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: DEFAULT_RETRY_BACKOFF,
        }
    }
}

/// Runs the per-slot attempt loop. Every attempt draws a fresh seed and is
/// an independent generation request, not a re-fetch of the failed URL.
#[derive(Clone)]
pub struct ImageFetchService {
    provider: Arc<dyn ImageProvider>,
    retry: FetchRetryConfig,
}

impl ImageFetchService {
    pub fn new(provider: Arc<dyn ImageProvider>) -> Self {
        Self::with_retry_config(provider, FetchRetryConfig::default())
    }

    pub fn with_retry_config(provider: Arc<dyn ImageProvider>, retry: FetchRetryConfig) -> Self {
        Self { provider, retry }
    }

    pub fn retry_config(&self) -> FetchRetryConfig {
        self.retry
    }

    pub fn fetch_slot(
        &self,
        slot_index: usize,
        prompt: &str,
        dimensions: ImageDimensions,
    ) -> Result<FetchedImage, ImageError> {
        self.fetch_slot_with_cancel(slot_index, prompt, dimensions, || false)
    }

    pub fn fetch_slot_with_cancel(
        &self,
        slot_index: usize,
        prompt: &str,
        dimensions: ImageDimensions,
        cancelled: impl Fn() -> bool,
    ) -> Result<FetchedImage, ImageError> {
        let mut attempt: u32 = 0;
        loop {
            if cancelled() {
                return Err(cancelled_error());
            }

            attempt += 1;
            let request = ImageRequest {
                prompt: prompt.to_string(),
                seed: draw_seed(),
                dimensions,
            };
            request.validate()?;

            match self.provider.fetch(&request) {
                Ok(image) => return Ok(image),
                Err(error) if error.is_retryable() && attempt <= self.retry.max_retries => {
                    eprintln!(
                        "pictor: retrying image {} ({}/{}) after load failure: {error}",
                        slot_index + 1,
                        attempt,
                        self.retry.max_retries
                    );
                    if self.sleep_through_backoff(&cancelled) {
                        return Err(cancelled_error());
                    }
                }
                Err(error) => return Err(error),
            }
        }
    }

    /// Returns true when the wait was interrupted by cancellation.
    fn sleep_through_backoff(&self, cancelled: &impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + self.retry.backoff;
        loop {
            if cancelled() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep(BACKOFF_SLICE.min(deadline - now));
        }
    }
}

fn draw_seed() -> u64 {
    rand::thread_rng().gen_range(0..SEED_UPPER_BOUND)
}

fn cancelled_error() -> ImageError {
    ImageError::internal("image fetch cancelled")
}
