//! # Request Pipeline
//!
//! In-process dispatch of requests to their single handler, wrapped in an
//! ordered chain of [`PipelineBehavior`]s, plus fan-out of notifications to
//! every registered [`NotificationHandler`].
//!
//! Handlers and behaviors are registered on a [`MediatorBuilder`] at startup
//! and looked up by the request's `TypeId` on each dispatch. Behaviors run in
//! registration order, the first registered being the outermost; each one
//! decides whether and when the rest of the chain runs by calling
//! [`Next::run`].
//!
//! ```rust,ignore
//! let mediator = Mediator::builder()
//!     .behavior::<TasksQuery, _>(LoggingBehavior::new())
//!     .with_validators(validators)
//!     .with_validation::<TasksQuery>()
//!     .handler::<TasksQuery, _>(TasksQueryHandler::new(config, users, repository))
//!     .build();
//!
//! let page = mediator.send(TasksQuery { filter }, &CancellationToken::new()).await?;
//! ```

pub mod behaviors;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, join_all};
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::errors::ApiError;
use crate::validation::ValidatorRegistry;

pub use behaviors::{LoggingBehavior, ValidationBehavior};

/// A message dispatched to exactly one handler.
pub trait Request: Send + Sync + 'static {
    type Response: Send + 'static;
}

/// Terminal stage of the pipeline for requests of type `R`.
#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync {
    async fn handle(&self, request: &R, cancel: &CancellationToken) -> Result<R::Response, ApiError>;
}

/// The remainder of the pipeline, handed to each behavior.
pub struct Next<'a, R: Request> {
    inner: Box<dyn FnOnce() -> BoxFuture<'a, Result<R::Response, ApiError>> + Send + 'a>,
}

impl<'a, R: Request> Next<'a, R> {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<R::Response, ApiError>> + Send + 'a,
    {
        Self {
            inner: Box::new(move || f().boxed()),
        }
    }

    /// Run the inner stages and return their result.
    pub async fn run(self) -> Result<R::Response, ApiError> {
        (self.inner)().await
    }
}

impl<R: Request> fmt::Debug for Next<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next").field("request", &type_name::<R>()).finish()
    }
}

/// A stage wrapped around the handler for requests of type `R`.
#[async_trait]
pub trait PipelineBehavior<R: Request>: Send + Sync {
    async fn handle(
        &self,
        request: &R,
        next: Next<'_, R>,
        cancel: &CancellationToken,
    ) -> Result<R::Response, ApiError>;
}

/// A message published to any number of handlers.
pub trait Notification: Send + Sync + 'static {}

#[async_trait]
pub trait NotificationHandler<N: Notification>: Send + Sync {
    async fn handle(&self, notification: &N, cancel: &CancellationToken) -> Result<(), ApiError>;
}

type HandlerSlot<R> = Arc<dyn RequestHandler<R>>;
type BehaviorList<R> = Vec<Arc<dyn PipelineBehavior<R>>>;
type NotificationList<N> = Vec<Arc<dyn NotificationHandler<N>>>;

/// Dispatches requests and notifications to the handlers registered on the
/// [`MediatorBuilder`] that built it. Immutable and cheap to share behind an
/// `Arc`.
pub struct Mediator {
    handlers: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    behaviors: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    notification_handlers: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Mediator {
    #[must_use]
    pub fn builder() -> MediatorBuilder {
        MediatorBuilder::default()
    }

    /// Dispatch `request` through its behaviors to its handler.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HandlerNotFound`] before any behavior runs when no
    /// handler is registered for `R`; otherwise whatever the behaviors or the
    /// handler return, unchanged.
    pub async fn send<R: Request>(&self, request: R, cancel: &CancellationToken) -> Result<R::Response, ApiError> {
        let request_type = type_name::<R>();
        let Some(handler) = self.handler::<R>() else {
            tracing::error!(request.type = request_type, "No handler registered for request");
            return Err(ApiError::handler_not_found(request_type));
        };
        let behaviors = self.behaviors::<R>();
        tracing::debug!(
            request.type = request_type,
            behaviors = behaviors.len(),
            "Dispatching request"
        );

        let request = &request;
        let mut next = Next::new(move || async move { handler.handle(request, cancel).await });
        for behavior in behaviors.iter().rev() {
            let inner = next;
            next = Next::new(move || async move { behavior.handle(request, inner, cancel).await });
        }
        next.run().await
    }

    /// Run every handler registered for `N` concurrently and wait for all of
    /// them.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing handler in registration order.
    /// Failures of later handlers are logged and dropped.
    pub async fn publish<N: Notification>(&self, notification: N, cancel: &CancellationToken) -> Result<(), ApiError> {
        let notification_type = type_name::<N>();
        let handlers = self.notification_handlers::<N>();
        if handlers.is_empty() {
            tracing::debug!(notification.type = notification_type, "No handlers registered for notification");
            return Ok(());
        }

        let results = join_all(handlers.iter().map(|handler| handler.handle(&notification, cancel))).await;

        let mut first_error = None;
        for error in results.into_iter().filter_map(Result::err) {
            if first_error.is_none() {
                first_error = Some(error);
            } else {
                tracing::warn!(
                    notification.type = notification_type,
                    error = %error,
                    "Additional notification handler failed"
                );
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    #[must_use]
    pub fn has_handler<R: Request>(&self) -> bool {
        self.handlers.contains_key(&TypeId::of::<R>())
    }

    fn handler<R: Request>(&self) -> Option<HandlerSlot<R>> {
        self.handlers
            .get(&TypeId::of::<R>())
            .and_then(|slot| slot.downcast_ref::<HandlerSlot<R>>())
            .cloned()
    }

    fn behaviors<R: Request>(&self) -> &[Arc<dyn PipelineBehavior<R>>] {
        self.behaviors
            .get(&TypeId::of::<R>())
            .and_then(|list| list.downcast_ref::<BehaviorList<R>>())
            .map_or(&[][..], Vec::as_slice)
    }

    fn notification_handlers<N: Notification>(&self) -> &[Arc<dyn NotificationHandler<N>>] {
        self.notification_handlers
            .get(&TypeId::of::<N>())
            .and_then(|list| list.downcast_ref::<NotificationList<N>>())
            .map_or(&[][..], Vec::as_slice)
    }
}

impl fmt::Debug for Mediator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mediator")
            .field("handlers", &self.handlers.len())
            .field("behaviors", &self.behaviors.len())
            .field("notification_handlers", &self.notification_handlers.len())
            .finish()
    }
}

/// A stage of a pipeline under construction.
enum Stage<R: Request> {
    Ready(Arc<dyn PipelineBehavior<R>>),
    /// Becomes a [`ValidationBehavior`] over the registry in effect at
    /// [`MediatorBuilder::build`].
    Validation,
}

/// The stages registered for one request type, erased so that the builder
/// can finish every pipeline without knowing its request type.
trait PendingPipeline: Send + Sync {
    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn finish(self: Box<Self>, validators: &Arc<ValidatorRegistry>) -> Box<dyn Any + Send + Sync>;
}

struct Stages<R: Request>(Vec<Stage<R>>);

impl<R: Request> PendingPipeline for Stages<R> {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn finish(self: Box<Self>, validators: &Arc<ValidatorRegistry>) -> Box<dyn Any + Send + Sync> {
        let behaviors: BehaviorList<R> = self
            .0
            .into_iter()
            .map(|stage| -> Arc<dyn PipelineBehavior<R>> {
                match stage {
                    Stage::Ready(behavior) => behavior,
                    Stage::Validation => Arc::new(ValidationBehavior::<R>::new(Arc::clone(validators))),
                }
            })
            .collect();
        Box::new(behaviors)
    }
}

/// Composition root for a [`Mediator`].
#[derive(Default)]
pub struct MediatorBuilder {
    handlers: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    pipelines: HashMap<TypeId, Box<dyn PendingPipeline>>,
    notification_handlers: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    validators: ValidatorRegistry,
}

impl MediatorBuilder {
    /// Register the handler for `R`. A second registration replaces the first.
    #[must_use]
    pub fn handler<R, H>(mut self, handler: H) -> Self
    where
        R: Request,
        H: RequestHandler<R> + 'static,
    {
        let slot: HandlerSlot<R> = Arc::new(handler);
        if self.handlers.insert(TypeId::of::<R>(), Box::new(slot)).is_some() {
            tracing::warn!(request.type = type_name::<R>(), "Replacing previously registered handler");
        }
        self
    }

    /// Append a behavior to the pipeline of `R`.
    #[must_use]
    pub fn behavior<R, B>(self, behavior: B) -> Self
    where
        R: Request,
        B: PipelineBehavior<R> + 'static,
    {
        self.stage::<R>(Stage::Ready(Arc::new(behavior)))
    }

    #[must_use]
    pub fn notification_handler<N, H>(mut self, handler: H) -> Self
    where
        N: Notification,
        H: NotificationHandler<N> + 'static,
    {
        let entry = self
            .notification_handlers
            .entry(TypeId::of::<N>())
            .or_insert_with(|| Box::new(NotificationList::<N>::new()));
        if let Some(list) = entry.downcast_mut::<NotificationList<N>>() {
            list.push(Arc::new(handler));
        }
        self
    }

    /// Validators consulted by every behavior added with
    /// [`with_validation`](Self::with_validation), whichever order the two
    /// are called in. A second call replaces the first registry.
    #[must_use]
    pub fn with_validators(mut self, validators: ValidatorRegistry) -> Self {
        if !self.validators.is_empty() {
            tracing::warn!("Replacing previously registered validators");
        }
        self.validators = validators;
        self
    }

    /// Append a [`ValidationBehavior`] to the pipeline of `R`.
    #[must_use]
    pub fn with_validation<R: Request>(self) -> Self {
        self.stage::<R>(Stage::Validation)
    }

    fn stage<R: Request>(mut self, stage: Stage<R>) -> Self {
        let entry = self
            .pipelines
            .entry(TypeId::of::<R>())
            .or_insert_with(|| Box::new(Stages::<R>(Vec::new())));
        if let Some(stages) = entry.as_any_mut().downcast_mut::<Stages<R>>() {
            stages.0.push(stage);
        }
        self
    }

    #[must_use]
    pub fn build(self) -> Mediator {
        tracing::debug!(
            handlers = self.handlers.len(),
            pipelines = self.pipelines.len(),
            notifications = self.notification_handlers.len(),
            "Mediator built"
        );
        let validators = Arc::new(self.validators);
        Mediator {
            handlers: self.handlers,
            behaviors: self
                .pipelines
                .into_iter()
                .map(|(request_type, pipeline)| (request_type, pipeline.finish(&validators)))
                .collect(),
            notification_handlers: self.notification_handlers,
        }
    }
}

impl fmt::Debug for MediatorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediatorBuilder")
            .field("handlers", &self.handlers.len())
            .field("pipelines", &self.pipelines.len())
            .field("validators", &self.validators)
            .finish_non_exhaustive()
    }
}
