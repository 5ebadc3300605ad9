//! Endpoint registration and resolution.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use hyper::Method;

use crate::context::RequestContext;
use crate::error::{ApiError, RouterError};
use crate::matcher::{PathPattern, UrlMatch};
use crate::response::HttpResponse;

/// Boxed future a handler resolves to.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<HttpResponse, ApiError>> + Send>>;

/// A registered request handler.
pub type Handler = Arc<dyn Fn(RequestContext) -> HandlerFuture + Send + Sync>;

/// A registered (method, path template, handler) triple. Created at setup
/// time, immutable for the process lifetime.
pub struct Endpoint {
    pub method: Method,
    pub path: String,
    pattern: PathPattern,
    pub(crate) handler: Handler,
}

/// Ordered endpoint registry.
///
/// Resolution scans a method's endpoints in registration order and takes the
/// first pattern match, so when two templates could both accept a URL the
/// earlier registration wins. Register literal routes before overlapping
/// parameterized ones.
#[derive(Default)]
pub struct Router {
    endpoints: Vec<Endpoint>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            endpoints: Vec::new(),
        }
    }

    /// Register a handler for `(method, path)`. Fails when that exact pair
    /// (template string equality, not matcher equivalence) is already
    /// registered, or when the template does not compile.
    pub fn register<F, Fut>(&mut self, method: Method, path: &str, handler: F) -> Result<(), RouterError>
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse, ApiError>> + Send + 'static,
    {
        if self
            .endpoints
            .iter()
            .any(|endpoint| endpoint.method == method && endpoint.path == path)
        {
            return Err(RouterError::DuplicateEndpoint {
                method,
                path: path.to_string(),
            });
        }
        let pattern = PathPattern::compile(path)?;
        self.endpoints.push(Endpoint {
            method,
            path: path.to_string(),
            pattern,
            handler: Arc::new(move |ctx| -> HandlerFuture { Box::pin(handler(ctx)) }),
        });
        Ok(())
    }

    pub fn get<F, Fut>(&mut self, path: &str, handler: F) -> Result<(), RouterError>
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse, ApiError>> + Send + 'static,
    {
        self.register(Method::GET, path, handler)
    }

    pub fn post<F, Fut>(&mut self, path: &str, handler: F) -> Result<(), RouterError>
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse, ApiError>> + Send + 'static,
    {
        self.register(Method::POST, path, handler)
    }

    pub fn put<F, Fut>(&mut self, path: &str, handler: F) -> Result<(), RouterError>
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse, ApiError>> + Send + 'static,
    {
        self.register(Method::PUT, path, handler)
    }

    pub fn patch<F, Fut>(&mut self, path: &str, handler: F) -> Result<(), RouterError>
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse, ApiError>> + Send + 'static,
    {
        self.register(Method::PATCH, path, handler)
    }

    pub fn delete<F, Fut>(&mut self, path: &str, handler: F) -> Result<(), RouterError>
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse, ApiError>> + Send + 'static,
    {
        self.register(Method::DELETE, path, handler)
    }

    /// First endpoint of `method` whose pattern accepts `url`, in
    /// registration order, along with the extracted captures. No side effects
    /// on a miss; the caller decides how to respond.
    pub fn resolve(&self, method: &Method, url: &str) -> Option<(&Endpoint, UrlMatch)> {
        self.endpoints
            .iter()
            .filter(|endpoint| endpoint.method == *method)
            .find_map(|endpoint| endpoint.pattern.matches(url).map(|matched| (endpoint, matched)))
    }
}
