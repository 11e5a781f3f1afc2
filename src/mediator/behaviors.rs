use async_trait::async_trait;
use futures::future::join_all;
use std::any::type_name;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use super::{Next, PipelineBehavior, Request};
use crate::errors::ApiError;
use crate::validation::{ValidationErrors, ValidatorRegistry};

/// Runs every validator registered for `R` before the rest of the pipeline.
///
/// Validators run concurrently and all of their errors are collected. Any
/// error short-circuits the request with [`ApiError::ValidationFailed`]; the
/// inner stages never run.
pub struct ValidationBehavior<R> {
    validators: Arc<ValidatorRegistry>,
    _request: PhantomData<fn(&R)>,
}

impl<R: Request> ValidationBehavior<R> {
    #[must_use]
    pub fn new(validators: Arc<ValidatorRegistry>) -> Self {
        Self {
            validators,
            _request: PhantomData,
        }
    }
}

#[async_trait]
impl<R: Request> PipelineBehavior<R> for ValidationBehavior<R> {
    async fn handle(
        &self,
        request: &R,
        next: Next<'_, R>,
        cancel: &CancellationToken,
    ) -> Result<R::Response, ApiError> {
        let validators = self.validators.validators_for::<R>();
        if validators.is_empty() {
            return next.run().await;
        }

        let results = join_all(validators.iter().map(|validator| validator.validate(request, cancel))).await;
        let mut errors = ValidationErrors::new();
        for result in results {
            errors.extend(result);
        }

        if !errors.is_empty() {
            tracing::debug!(
                request.type = type_name::<R>(),
                failures = errors.len(),
                "Request rejected by validation"
            );
            return Err(ApiError::validation_failed(errors));
        }

        next.run().await
    }
}

/// Logs receipt, outcome and duration of every request of type `R`.
pub struct LoggingBehavior<R> {
    _request: PhantomData<fn(&R)>,
}

impl<R: Request> LoggingBehavior<R> {
    #[must_use]
    pub fn new() -> Self {
        Self { _request: PhantomData }
    }
}

impl<R: Request> Default for LoggingBehavior<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Request> PipelineBehavior<R> for LoggingBehavior<R> {
    async fn handle(
        &self,
        _request: &R,
        next: Next<'_, R>,
        _cancel: &CancellationToken,
    ) -> Result<R::Response, ApiError> {
        let request_type = type_name::<R>();
        let start = Instant::now();

        tracing::debug!(request.type = request_type, "Request received");

        let result = next.run().await;
        let duration_ms = start.elapsed().as_millis();

        match &result {
            Ok(_) => {
                tracing::info!(
                    request.type = request_type,
                    duration.ms = duration_ms,
                    "Request completed successfully"
                );
            }
            Err(e) if e.status_code().is_server_error() => {
                tracing::error!(
                    request.type = request_type,
                    duration.ms = duration_ms,
                    error = %e,
                    "Request failed"
                );
            }
            Err(e) => {
                tracing::warn!(
                    request.type = request_type,
                    duration.ms = duration_ms,
                    error = %e,
                    "Request rejected"
                );
            }
        }

        result
    }
}
