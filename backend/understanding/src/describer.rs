//! Fan-out of description requests, one per image.
//!
//! Requests run concurrently up to `max_concurrent`; each result is tied back
//! to its `image_id` and a failing image never aborts the others.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use picscribe_core::defaults::{DEFAULT_MAX_CONCURRENT, DEFAULT_MAX_TOKENS};
use picscribe_core::{DescribeOutcome, ImageId, VisionProvider, VisionRequest};

pub struct Describer {
    provider: Arc<dyn VisionProvider>,
    model: String,
    max_tokens: u32,
    max_concurrent: usize,
}

impl Describer {
    pub fn new(provider: Arc<dyn VisionProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// `1` sends requests strictly one after another.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Describe every `(image_id, data URI)` pair with `prompt`.
    ///
    /// Outcomes come back in input order, one per target.
    pub async fn describe_rows(
        &self,
        targets: Vec<(ImageId, String)>,
        prompt: &str,
    ) -> Vec<DescribeOutcome> {
        if targets.is_empty() {
            return Vec::new();
        }
        let start = Instant::now();
        let total = targets.len();
        let ids: Vec<ImageId> = targets.iter().map(|(id, _)| id.clone()).collect();

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut join_set = JoinSet::new();

        for (index, (image_id, image_url)) in targets.into_iter().enumerate() {
            let provider = Arc::clone(&self.provider);
            let semaphore = Arc::clone(&semaphore);
            let request = VisionRequest {
                model: self.model.clone(),
                prompt: prompt.to_string(),
                image_url,
                max_tokens: self.max_tokens,
            };
            join_set.spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => match provider.describe(&request).await {
                        Ok(response) => {
                            info!(
                                image_id = %image_id,
                                provider = %response.provider,
                                latency_ms = response.latency_ms,
                                tokens = response.tokens_used,
                                "Image described"
                            );
                            DescribeOutcome::described(image_id, response.content)
                        }
                        Err(e) => {
                            warn!(image_id = %image_id, error = %e, "Image description failed");
                            DescribeOutcome::failed(image_id, e.to_string())
                        }
                    },
                    Err(e) => DescribeOutcome::failed(image_id, e.to_string()),
                };
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<DescribeOutcome>> = vec![None; total];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => warn!(error = %e, "Description task aborted"),
            }
        }

        let outcomes: Vec<DescribeOutcome> = slots
            .into_iter()
            .zip(ids)
            .map(|(slot, id)| {
                slot.unwrap_or_else(|| DescribeOutcome::failed(id, "description task aborted"))
            })
            .collect();

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        info!(
            total,
            failed,
            model = %self.model,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Description batch finished"
        );
        outcomes
    }
}
