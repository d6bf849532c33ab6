//! Policy contracts and closure adapters
//!
//! Every policy is an async trait. Synchronous closures are lifted into ready
//! futures by the `*_fn` adapters, so a predicate that answers immediately and
//! one that awaits I/O run through exactly the same stage code.

use crate::context::{ProtoRequest, ProtoResponse, StageOutcome};
use crate::errors::{ActionError, ValidationFailure};
use crate::reply::ActionResult;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

/// One link of an action pipeline.
#[async_trait]
pub trait Stage: Send + Sync {
    async fn handle(
        &self,
        req: &mut dyn ProtoRequest,
        rsp: &mut dyn ProtoResponse,
    ) -> Result<StageOutcome, ActionError>;
}

/// Decides whether the caller may run the action.
#[async_trait]
pub trait AccessControl: Send + Sync {
    async fn check(&self, req: &dyn ProtoRequest) -> Result<bool, ActionError>;
}

/// Schema validation engine seam.
#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self, req: &dyn ProtoRequest) -> Result<(), ValidationFailure>;
}

/// Gets a chance to turn a pipeline failure into a response.
///
/// Returning `Err` (usually the same error) escalates to the next scope;
/// `Ok(Reply::Empty)` swallows the error without writing anything.
#[async_trait]
pub trait ErrorHandler: Send + Sync {
    async fn on_error(
        &self,
        err: ActionError,
        req: &mut dyn ProtoRequest,
        rsp: &mut dyn ProtoResponse,
    ) -> ActionResult;
}

/// Business handler. `state` is the controller state the action was compiled against.
#[async_trait]
pub trait ActionHandler<S>: Send + Sync {
    async fn call(
        &self,
        state: &S,
        req: &mut dyn ProtoRequest,
        rsp: &mut dyn ProtoResponse,
    ) -> ActionResult;
}

/// The four optional policies shared by controllers (global scope) and actions.
#[derive(Clone, Default)]
pub struct PolicySet {
    pub validator: Option<Arc<dyn Validator>>,
    pub access_control: Option<Arc<dyn AccessControl>>,
    pub middlewares: Vec<Arc<dyn Stage>>,
    pub on_error: Option<Arc<dyn ErrorHandler>>,
}

impl PolicySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn access_control(mut self, access_control: Arc<dyn AccessControl>) -> Self {
        self.access_control = Some(access_control);
        self
    }

    pub fn middleware(mut self, stage: Arc<dyn Stage>) -> Self {
        self.middlewares.push(stage);
        self
    }

    pub fn on_error(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.on_error = Some(handler);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.validator.is_none()
            && self.access_control.is_none()
            && self.middlewares.is_empty()
            && self.on_error.is_none()
    }
}

impl fmt::Debug for PolicySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicySet")
            .field("validator", &self.validator.is_some())
            .field("access_control", &self.access_control.is_some())
            .field("middlewares", &self.middlewares.len())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

struct FnStage<F>(F);

#[async_trait]
impl<F> Stage for FnStage<F>
where
    F: for<'a> Fn(
            &'a mut dyn ProtoRequest,
            &'a mut dyn ProtoResponse,
        ) -> BoxFuture<'a, Result<StageOutcome, ActionError>>
        + Send
        + Sync,
{
    async fn handle(
        &self,
        req: &mut dyn ProtoRequest,
        rsp: &mut dyn ProtoResponse,
    ) -> Result<StageOutcome, ActionError> {
        (self.0)(req, rsp).await
    }
}

pub fn stage_fn<F>(f: F) -> Arc<dyn Stage>
where
    F: for<'a> Fn(
            &'a mut dyn ProtoRequest,
            &'a mut dyn ProtoResponse,
        ) -> BoxFuture<'a, Result<StageOutcome, ActionError>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(FnStage(f))
}

struct SyncAccess<F>(F);

#[async_trait]
impl<F> AccessControl for SyncAccess<F>
where
    F: Fn(&dyn ProtoRequest) -> bool + Send + Sync,
{
    async fn check(&self, req: &dyn ProtoRequest) -> Result<bool, ActionError> {
        Ok((self.0)(req))
    }
}

/// Access predicate that answers synchronously.
pub fn access_fn<F>(f: F) -> Arc<dyn AccessControl>
where
    F: Fn(&dyn ProtoRequest) -> bool + Send + Sync + 'static,
{
    Arc::new(SyncAccess(f))
}

struct AsyncAccess<F>(F);

#[async_trait]
impl<F> AccessControl for AsyncAccess<F>
where
    F: for<'a> Fn(&'a dyn ProtoRequest) -> BoxFuture<'a, Result<bool, ActionError>> + Send + Sync,
{
    async fn check(&self, req: &dyn ProtoRequest) -> Result<bool, ActionError> {
        (self.0)(req).await
    }
}

/// Access predicate backed by a future; an `Err` is propagated as-is.
pub fn access_async_fn<F>(f: F) -> Arc<dyn AccessControl>
where
    F: for<'a> Fn(&'a dyn ProtoRequest) -> BoxFuture<'a, Result<bool, ActionError>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(AsyncAccess(f))
}

struct FnValidator<F>(F);

#[async_trait]
impl<F> Validator for FnValidator<F>
where
    F: Fn(&dyn ProtoRequest) -> Result<(), ValidationFailure> + Send + Sync,
{
    async fn validate(&self, req: &dyn ProtoRequest) -> Result<(), ValidationFailure> {
        (self.0)(req)
    }
}

pub fn validator_fn<F>(f: F) -> Arc<dyn Validator>
where
    F: Fn(&dyn ProtoRequest) -> Result<(), ValidationFailure> + Send + Sync + 'static,
{
    Arc::new(FnValidator(f))
}

struct FnErrorHandler<F>(F);

#[async_trait]
impl<F> ErrorHandler for FnErrorHandler<F>
where
    F: for<'a> Fn(
            ActionError,
            &'a mut dyn ProtoRequest,
            &'a mut dyn ProtoResponse,
        ) -> BoxFuture<'a, ActionResult>
        + Send
        + Sync,
{
    async fn on_error(
        &self,
        err: ActionError,
        req: &mut dyn ProtoRequest,
        rsp: &mut dyn ProtoResponse,
    ) -> ActionResult {
        (self.0)(err, req, rsp).await
    }
}

pub fn error_fn<F>(f: F) -> Arc<dyn ErrorHandler>
where
    F: for<'a> Fn(
            ActionError,
            &'a mut dyn ProtoRequest,
            &'a mut dyn ProtoResponse,
        ) -> BoxFuture<'a, ActionResult>
        + Send
        + Sync
        + 'static,
{
    Arc::new(FnErrorHandler(f))
}

struct FnHandler<F>(F);

#[async_trait]
impl<S, F> ActionHandler<S> for FnHandler<F>
where
    S: Send + Sync + 'static,
    F: for<'a> Fn(
            &'a S,
            &'a mut dyn ProtoRequest,
            &'a mut dyn ProtoResponse,
        ) -> BoxFuture<'a, ActionResult>
        + Send
        + Sync,
{
    async fn call(
        &self,
        state: &S,
        req: &mut dyn ProtoRequest,
        rsp: &mut dyn ProtoResponse,
    ) -> ActionResult {
        (self.0)(state, req, rsp).await
    }
}

pub fn handler_fn<S, F>(f: F) -> Arc<dyn ActionHandler<S>>
where
    S: Send + Sync + 'static,
    F: for<'a> Fn(
            &'a S,
            &'a mut dyn ProtoRequest,
            &'a mut dyn ProtoResponse,
        ) -> BoxFuture<'a, ActionResult>
        + Send
        + Sync
        + 'static,
{
    Arc::new(FnHandler(f))
}
