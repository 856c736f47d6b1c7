use std::time::Instant;

use uuid::Uuid;

use crate::error::{CatalogError, Result};
use crate::store::EntityStore;

use super::Catalog;

impl<S: EntityStore> Catalog<S> {
    /// Run `f` and record one request-log event for it.
    pub(super) fn observe<T>(
        &self,
        operation: &str,
        mineral: Option<String>,
        f: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        let request_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        let result = f();
        match &result {
            Ok(_) => Self::log_request_status(&request_id, operation, "ok", started, mineral),
            Err(err) => Self::log_request_error(&request_id, operation, started, mineral, err),
        }
        result
    }

    fn log_request_status(
        request_id: &str,
        operation: &str,
        status: &str,
        started: Instant,
        mineral: Option<String>,
    ) {
        tracing::info!(
            request_id,
            operation,
            status,
            latency_ms = elapsed_ms(started),
            mineral = mineral.as_deref(),
            "catalog request"
        );
    }

    fn log_request_error(
        request_id: &str,
        operation: &str,
        started: Instant,
        mineral: Option<String>,
        err: &CatalogError,
    ) {
        tracing::warn!(
            request_id,
            operation,
            status = "error",
            latency_ms = elapsed_ms(started),
            mineral = mineral.as_deref(),
            error_code = err.code(),
            error_message = %err,
            "catalog request failed"
        );
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
