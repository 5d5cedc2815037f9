//! Session-scoped generation state and the public `generate` operation.

use crate::backend::InteriorBackend;
use crate::image::ImagePayload;
use crate::models::{Config, ErrorState, GenerationRequest, GenerationResult};
use crate::objects::ObjectStore;
use crate::orchestrator::Orchestrator;
use crate::prompts::{build_prompt, clamp_variations, PromptOptions};
use crate::rate::{RateState, MAX_CALLS_PER_WINDOW};
use crate::{Error, Result};
use chrono::Utc;
use tracing::{error, info, warn};

/// Owns everything one user session mutates: rate state, the displayed
/// results (and the blobs behind them), and the last error/notice.
///
/// `generate` takes `&mut self`, so rate-state updates and their rollback
/// can never interleave between callers.
pub struct Studio {
    backend: Box<dyn InteriorBackend>,
    config: Config,
    rate: RateState,
    objects: ObjectStore,
    results: Vec<GenerationResult>,
    status: ErrorState,
}

impl Studio {
    pub fn new(backend: Box<dyn InteriorBackend>, config: Config) -> Self {
        Self {
            backend,
            config,
            rate: RateState::new(),
            objects: ObjectStore::new(),
            results: Vec::new(),
            status: ErrorState::default(),
        }
    }

    pub fn with_rate_state(mut self, rate: RateState) -> Self {
        self.rate = rate;
        self
    }

    pub fn results(&self) -> &[GenerationResult] {
        &self.results
    }

    pub fn has_results(&self) -> bool {
        !self.results.is_empty()
    }

    pub fn status(&self) -> &ErrorState {
        &self.status
    }

    pub fn rate_state(&self) -> &RateState {
        &self.rate
    }

    pub fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    pub fn can_submit(&self) -> bool {
        self.rate.can_submit(Utc::now())
    }

    /// Generate renders for a request, replacing the session's results.
    ///
    /// Individual variation failures are logged and skipped. When every
    /// variation fails the result is an empty list, unless
    /// `Config::strict_variations` is set, in which case the run fails with
    /// [`Error::AllVariationsFailed`]. Any error that does reach the caller
    /// has already rolled back the rate counter.
    pub async fn generate(&mut self, request: GenerationRequest) -> Result<Vec<GenerationResult>> {
        let now = Utc::now();
        if !self.rate.can_submit(now) {
            let err = Error::RateLimited {
                max_calls: MAX_CALLS_PER_WINDOW,
            };
            warn!("Generation refused by local rate limit");
            self.status.clear();
            self.status.message = Some(err.user_message());
            return Err(err);
        }

        self.status.clear();
        self.rate.record_call(now);

        match self.submit(&request).await {
            Ok(results) => {
                self.replace_results(results.clone());
                Ok(results)
            }
            Err(e) => {
                self.rate.rollback();
                let message = e.user_message();
                error!("Generation failed: {} ({})", message, e);
                self.status.message = Some(message);
                Err(e)
            }
        }
    }

    async fn submit(&mut self, request: &GenerationRequest) -> Result<Vec<GenerationResult>> {
        if request.image.trim().is_empty() {
            return Err(Error::InvalidRequest("room photo is empty".to_string()));
        }

        let options = PromptOptions {
            mode: request.mode.unwrap_or_default(),
            room_type_hint: request.room_type_hint.clone(),
            num_variations: request.num_variations,
        };
        let prompt = build_prompt(
            &request.furniture,
            request.image_width,
            request.image_height,
            &options,
        );
        let count = clamp_variations(request.num_variations);

        info!(
            "Submitting generation: endpoint {}, {} variation(s), prompt {} chars, image {} chars",
            self.config.image_make_url(),
            count,
            prompt.len(),
            request.image.len()
        );

        let orchestrator = Orchestrator::new(&*self.backend, &self.config);
        let mut fan_out = orchestrator
            .run(&request.image, &prompt, count, &mut self.objects)
            .await;

        for advisory in &fan_out.advisories {
            self.status.apply_advisory(advisory);
        }

        if fan_out.results.is_empty() {
            warn!(
                "All {} variation(s) failed; returning no results",
                fan_out.attempted
            );
            if self.config.strict_variations {
                let last = fan_out.failures.pop().unwrap_or(Error::EmptyResult);
                return Err(Error::AllVariationsFailed {
                    attempted: fan_out.attempted,
                    last: Box::new(last),
                });
            }
        }

        Ok(fan_out.results)
    }

    fn replace_results(&mut self, results: Vec<GenerationResult>) {
        for old in std::mem::replace(&mut self.results, results) {
            if ObjectStore::is_blob_url(&old.image) {
                self.objects.revoke(&old.image);
            }
        }
    }

    /// Drop displayed results, release their blobs and clear error state.
    pub fn clear_results(&mut self) {
        self.replace_results(Vec::new());
        self.status.clear();
    }

    pub fn reset_rate_limit(&mut self) {
        self.rate.reset();
    }

    /// Bytes behind a result image, whether it is a data URI or a blob URL.
    pub fn resolve_image(&self, image: &str) -> Result<ImagePayload> {
        if image.starts_with("data:") {
            return ImagePayload::from_data_uri(image);
        }

        self.objects
            .resolve(image)
            .map(|object| ImagePayload::new(object.content_type.clone(), object.data.clone()))
            .ok_or_else(|| Error::InvalidImage(format!("unknown image reference: {}", image)))
    }
}
