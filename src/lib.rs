//! Chassis: minimal HTTP application layer.
//!
//! A path-parameter router plus a file-backed document store: the reusable
//! core beneath small, near-identical CRUD services. The embedding
//! application registers routes on a [`Router`], serves them with an
//! [`HttpServer`], and keeps its records in a [`DocumentStore`].

pub mod context;
pub mod error;
pub mod matcher;
pub mod response;
pub mod router;
pub mod server;
pub mod store;

pub use context::RequestContext;
pub use error::{ApiError, PatternError, RouterError, StoreError};
pub use matcher::{PathPattern, UrlMatch};
pub use response::HttpResponse;
pub use router::{Endpoint, Handler, Router};
pub use server::HttpServer;
pub use store::{Document, DocumentStore};

pub use hyper::header;
pub use hyper::{Method, StatusCode};
