// Ingestion and latest-status query on top of StatusRepo.

use std::sync::Arc;

use crate::error::ApiError;
use crate::models::{IngestReceipt, LatestStatus, StatusForm};
use crate::status_repo::StatusRepo;

#[derive(Clone)]
pub struct StatusService {
    repo: Arc<StatusRepo>,
}

impl StatusService {
    pub fn new(repo: Arc<StatusRepo>) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &StatusRepo {
        &self.repo
    }

    /// Validate, normalize and store one snapshot, then trim history.
    ///
    /// A failed write is a [`ApiError::Persistence`]; a failed retention sweep
    /// is only logged, since the snapshot is already committed.
    pub async fn ingest(&self, form: &StatusForm) -> Result<IngestReceipt, ApiError> {
        if !form.has_required_fields() {
            return Err(ApiError::InvalidInput);
        }
        let report = form.normalize();
        let now = chrono::Utc::now().timestamp();

        let client_id = self
            .repo
            .record_snapshot(&report, now)
            .await
            .map_err(ApiError::Persistence)?;

        if let Err(e) = self.repo.enforce_retention().await {
            tracing::warn!(error = ?e, client_id, "retention sweep failed");
        }

        Ok(IngestReceipt {
            client_id,
            name: report.name,
            location: report.location,
        })
    }

    pub async fn query_latest(&self) -> Result<Vec<LatestStatus>, ApiError> {
        self.repo
            .latest_per_client()
            .await
            .map_err(ApiError::Persistence)
    }
}
