//! HTTP server: accept loop, request dispatch, error translation.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::header::{HeaderName, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{HeaderMap, Method, Request, Response};
use hyper_util::rt::TokioIo;
use serde_json::Value;
use tokio::net::TcpListener;

use crate::context::{parse_body, RequestContext};
use crate::error::ApiError;
use crate::response::HttpResponse;
use crate::router::Router;

/// Methods whose request body is buffered and parsed as JSON.
const BODY_METHODS: [Method; 3] = [Method::POST, Method::PUT, Method::PATCH];

/// Serves a [`Router`] over HTTP/1. Each connection runs on its own task;
/// handler failures are translated to error responses and never take down
/// the listener.
pub struct HttpServer {
    router: Arc<Router>,
    default_headers: HeaderMap,
}

impl HttpServer {
    pub fn new(router: Router) -> Self {
        Self {
            router: Arc::new(router),
            default_headers: HeaderMap::new(),
        }
    }

    /// Add an instance-level default response header. Defaults fill in around
    /// the handler's own headers, so a handler that sets the same name wins.
    pub fn with_default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.default_headers.insert(name, value);
        self
    }

    /// Bind `0.0.0.0:port` and serve until the process exits.
    pub async fn start(self, port: u16) -> Result<(), std::io::Error> {
        let listener = TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port))).await?;
        tracing::info!(address = %listener.local_addr()?, "listening");
        self.serve(listener).await
    }

    /// Serve connections from an existing listener. Accept errors are logged
    /// and do not stop the loop.
    pub async fn serve(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let server = Arc::new(self);
        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    tracing::warn!(error = %err, "accept failed");
                    continue;
                }
            };
            let server = Arc::clone(&server);
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |request| {
                    let server = Arc::clone(&server);
                    async move { Ok::<_, Infallible>(server.dispatch(request).await) }
                });
                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    tracing::debug!(peer = %peer, error = %err, "connection closed with error");
                }
            });
        }
    }

    /// Run one request through the pipeline: resolve, build the context,
    /// invoke the handler, translate errors, apply default headers. Writes
    /// exactly one response per request.
    pub async fn dispatch<B: Body>(&self, request: Request<B>) -> Response<Full<Bytes>> {
        let mut response = self
            .run(request)
            .await
            .unwrap_or_else(ApiError::into_response);
        response.apply_default_headers(&self.default_headers);
        response.into_hyper()
    }

    async fn run<B: Body>(&self, request: Request<B>) -> Result<HttpResponse, ApiError> {
        let method = request.method().clone();
        let raw_url = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| request.uri().path().to_string());

        let (endpoint, matched) = self
            .router
            .resolve(&method, &raw_url)
            .ok_or(ApiError::NotFound)?;
        tracing::debug!(method = %method, url = %raw_url, route = %endpoint.path, "dispatch");

        let body = if BODY_METHODS.contains(&method) {
            // The whole body is buffered; a failed read (client gone
            // mid-request) leaves it empty.
            let bytes = request
                .into_body()
                .collect()
                .await
                .map(|collected| collected.to_bytes())
                .unwrap_or_default();
            parse_body(&bytes)
        } else {
            Value::Null
        };

        let ctx = RequestContext::new(method, raw_url, matched, body);
        (endpoint.handler)(ctx).await
    }
}
