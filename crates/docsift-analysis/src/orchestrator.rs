//! Rate limit → cache → model → cache write-through.

use docsift_core::models::{AnalysisRequest, AnalysisResult, ContentKind};
use docsift_core::AppError;
use docsift_infra::{KvError, RateLimitDecision, RateLimiter};
use tokio::time::Instant;

use crate::cache::ResultCache;
use crate::client::AnalysisClient;
use crate::fingerprint::fingerprint;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Daily analysis quota of {} exhausted", .0.limit)]
    QuotaExceeded(RateLimitDecision),

    #[error("Quota store unavailable")]
    RateLimitUnavailable(#[source] KvError),
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::QuotaExceeded(decision) => AppError::QuotaExceeded {
                limit: decision.limit,
                reset_at: decision.reset_at,
            },
            AnalysisError::RateLimitUnavailable(e) => {
                AppError::ServiceUnavailable(format!("Quota store unavailable: {}", e))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    pub quota: RateLimitDecision,
    pub cache_hit: bool,
    pub fingerprint: String,
}

#[derive(Clone)]
pub struct AnalysisOrchestrator {
    limiter: RateLimiter,
    cache: ResultCache,
    client: AnalysisClient,
}

impl AnalysisOrchestrator {
    pub fn new(limiter: RateLimiter, cache: ResultCache, client: AnalysisClient) -> Self {
        Self {
            limiter,
            cache,
            client,
        }
    }

    pub fn daily_limit(&self) -> u32 {
        self.limiter.daily_limit()
    }

    /// Analyze `request` on behalf of `identity`.
    ///
    /// Only quota rejection and an unreachable quota store are errors; every
    /// model-side failure is returned as a fallback result.
    #[tracing::instrument(
        skip(self, request),
        fields(
            display_name = %request.display_name,
            content_type = %request.content_type,
            bytes = request.content.len()
        )
    )]
    pub async fn analyze(
        &self,
        identity: &str,
        request: &AnalysisRequest,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        let started = Instant::now();
        let fp = fingerprint(&request.content);

        let quota = self
            .limiter
            .check_and_increment(identity)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Rate limit check failed");
                AnalysisError::RateLimitUnavailable(e)
            })?;
        if !quota.allowed {
            return Err(AnalysisError::QuotaExceeded(quota));
        }

        if let Some(result) = self.cache.get(&fp).await {
            tracing::info!(
                fingerprint = %fp,
                cache_hit = true,
                duration_ms = started.elapsed().as_millis() as u64,
                "Analysis served from cache"
            );
            return Ok(AnalysisOutcome {
                result,
                quota,
                cache_hit: true,
                fingerprint: fp,
            });
        }

        let kind = ContentKind::detect(&request.content_type, &request.content);
        let result = self.client.analyze(request, kind).await;

        if !result.is_fallback {
            self.cache.put(&fp, &result).await;
        }

        tracing::info!(
            fingerprint = %fp,
            cache_hit = false,
            kind = %kind,
            is_fallback = result.is_fallback,
            duration_ms = started.elapsed().as_millis() as u64,
            "Analysis completed"
        );

        Ok(AnalysisOutcome {
            result,
            quota,
            cache_hit: false,
            fingerprint: fp,
        })
    }
}
