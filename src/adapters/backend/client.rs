//! HTTP client for the dashboard backend.
//!
//! Thin typed wrapper over the consumed REST surface. Every method maps
//! transport and status failures into [`DomainError`]; callers treat a
//! failed poll as stale-but-available and keep their previous snapshot.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    ActivityItem, BackendConfig, DetectionSnapshot, ExecutionResult, LiveStatsSnapshot,
    StoreReadiness,
};
use crate::domain::ports::BackendApi;

use super::models::{
    ActivityItemDto, DetectionStatusDto, ExecutionResultDto, LiveStatsDto, StoreReadinessDto,
};

/// Prefix that routes an approval to the foundational-action endpoint.
const FOUNDATIONAL_PREFIX: &str = "foundational_";

/// Typed HTTP client for the dashboard backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
    api_token: Option<String>,
}

impl BackendClient {
    /// Build a client from configuration.
    pub fn new(config: &BackendConfig) -> DomainResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| DomainError::ConfigError(format!("http client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> DomainResult<T> {
        let response = self
            .authorize(self.http.get(self.url(path)))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::BackendStatus {
                endpoint: path.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.json::<T>().await?;
        Ok(body)
    }

    async fn post_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> DomainResult<T> {
        let response = self
            .authorize(self.http.post(self.url(path)))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::BackendStatus {
                endpoint: path.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.json::<T>().await?;
        Ok(body)
    }
}

#[async_trait]
impl BackendApi for BackendClient {
    async fn detection_status(&self) -> DomainResult<DetectionSnapshot> {
        let dto: DetectionStatusDto = self.get_json("detection-status").await?;
        Ok(dto.into())
    }

    async fn live_stats(&self) -> DomainResult<LiveStatsSnapshot> {
        let dto: LiveStatsDto = self.get_json("live-stats").await?;
        Ok(dto.into())
    }

    async fn activity_feed(&self, limit: usize) -> DomainResult<Vec<ActivityItem>> {
        let dtos: Vec<ActivityItemDto> =
            self.get_json(&format!("activity-feed?limit={limit}")).await?;
        Ok(dtos.into_iter().map(Into::into).collect())
    }

    async fn execution_activities(&self) -> DomainResult<Vec<ActivityItem>> {
        let dtos: Vec<ActivityItemDto> = self.get_json("execution-activities").await?;
        Ok(dtos.into_iter().map(Into::into).collect())
    }

    async fn store_readiness(&self) -> DomainResult<StoreReadiness> {
        let dto: StoreReadinessDto = self.get_json("store-readiness").await?;
        Ok(dto.into())
    }

    async fn trigger_detect(&self) -> DomainResult<()> {
        // Fire-and-forget: the body, if any, is ignored.
        let response = self.authorize(self.http.post(self.url("detect"))).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::BackendStatus {
                endpoint: "detect".to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    async fn approve_action(&self, action_id: &str) -> DomainResult<ExecutionResult> {
        let path = if action_id.starts_with(FOUNDATIONAL_PREFIX) {
            format!("foundational-actions/{action_id}/approve")
        } else {
            format!("actions/{action_id}/approve")
        };
        debug!(action_id, path = %path, "approving action");

        let dto: ExecutionResultDto =
            self.post_json(&path)
                .await
                .map_err(|err| match err {
                    DomainError::BackendStatus { status, .. } => DomainError::ApprovalRejected {
                        action_id: action_id.to_string(),
                        reason: format!("backend returned status {status}"),
                    },
                    other => other,
                })?;
        Ok(dto.into())
    }
}
