//! Per-variation fallback loop and the sequential variation fan-out.

use crate::backend::InteriorBackend;
use crate::models::{Advisory, Config, GenerationResult};
use crate::objects::ObjectStore;
use crate::prompts::variation_prompt;
use crate::response::NormalizedResponse;
use crate::strategy::{fallback_chain, Strategy};
use crate::{Error, Result};
use tracing::{info, warn};

/// Aggregate of a multi-variation run. Failed variations are kept for the
/// caller to inspect but never abort the run.
#[derive(Debug, Default)]
pub struct FanOut {
    pub attempted: u32,
    pub results: Vec<GenerationResult>,
    /// Advisories from successful variations, in variation order.
    pub advisories: Vec<Advisory>,
    pub failures: Vec<Error>,
}

pub struct Orchestrator<'a> {
    backend: &'a dyn InteriorBackend,
    strategies: Vec<Strategy>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(backend: &'a dyn InteriorBackend, config: &Config) -> Self {
        Self {
            backend,
            strategies: fallback_chain(config),
        }
    }

    /// Try each strategy in order for one prompt; first success wins.
    pub async fn run_variation(
        &self,
        image: &str,
        prompt: &str,
        objects: &mut ObjectStore,
    ) -> Result<NormalizedResponse> {
        let mut last_error = None;

        for strategy in &self.strategies {
            match strategy.attempt(self.backend, image, prompt, objects).await {
                Ok(normalized) => {
                    info!(
                        "Strategy '{}' produced {} result(s)",
                        strategy.name(),
                        normalized.results.len()
                    );
                    return Ok(normalized);
                }
                Err(e) => {
                    warn!(
                        "Strategy '{}' failed (status {:?}): {}",
                        strategy.name(),
                        e.status(),
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::InvalidRequest("no submission strategy configured".to_string())
        }))
    }

    /// Run `count` variations one after another. The backend limits
    /// concurrent requests, so this never runs them in parallel.
    pub async fn run(
        &self,
        image: &str,
        base_prompt: &str,
        count: u32,
        objects: &mut ObjectStore,
    ) -> FanOut {
        let mut fan_out = FanOut {
            attempted: count,
            ..FanOut::default()
        };

        for index in 1..=count {
            let prompt = variation_prompt(base_prompt, index);
            match self.run_variation(image, &prompt, objects).await {
                Ok(normalized) => {
                    fan_out.results.extend(normalized.results);
                    fan_out.advisories.extend(normalized.advisory);
                }
                Err(e) => {
                    warn!("Variation {}/{} failed, continuing: {}", index, count, e);
                    fan_out.failures.push(e);
                }
            }
        }

        fan_out
    }
}
