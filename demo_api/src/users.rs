//! Users CRUD routes.

use std::collections::HashMap;
use std::sync::Arc;

use chassis::{
    ApiError, DocumentStore, HttpResponse, RequestContext, Router, RouterError, StatusCode,
};

use crate::fields::{has_text, present_fields};

const COLLECTION: &str = "users";
const USER_FIELDS: &[&str] = &["name", "email"];

pub fn register(router: &mut Router, store: Arc<DocumentStore>) -> Result<(), RouterError> {
    let st = Arc::clone(&store);
    router.get("/users", move |ctx| {
        let st = Arc::clone(&st);
        async move { list(st, ctx).await }
    })?;
    let st = Arc::clone(&store);
    router.post("/users", move |ctx| {
        let st = Arc::clone(&st);
        async move { create(st, ctx).await }
    })?;
    let st = Arc::clone(&store);
    router.put("/users/:id", move |ctx| {
        let st = Arc::clone(&st);
        async move { update(st, ctx).await }
    })?;
    router.delete("/users/:id", move |ctx| {
        let st = Arc::clone(&store);
        async move { remove(st, ctx).await }
    })?;
    Ok(())
}

/// GET /users — list users, optionally narrowed by `?search=` over name and
/// email.
async fn list(store: Arc<DocumentStore>, ctx: RequestContext) -> Result<HttpResponse, ApiError> {
    let mut filter = HashMap::new();
    if let Some(search) = ctx.query_value("search") {
        filter.insert("name".to_string(), search.to_string());
        filter.insert("email".to_string(), search.to_string());
    }
    let users = store.select(COLLECTION, &filter).await;
    HttpResponse::ok(&users)
}

/// POST /users — create a user; name and email are required.
async fn create(store: Arc<DocumentStore>, ctx: RequestContext) -> Result<HttpResponse, ApiError> {
    let fields = present_fields(&ctx, USER_FIELDS);
    if !has_text(&fields, "name") || !has_text(&fields, "email") {
        return Err(ApiError::app(
            StatusCode::BAD_REQUEST,
            "Name and email are required",
        ));
    }
    let user = store.insert(COLLECTION, fields).await?;
    HttpResponse::created(&user)
}

/// PUT /users/:id — partial update of name and/or email.
async fn update(store: Arc<DocumentStore>, ctx: RequestContext) -> Result<HttpResponse, ApiError> {
    let id = ctx.param("id")?;
    let fields = present_fields(&ctx, USER_FIELDS);
    if fields.is_empty() {
        return Err(ApiError::app(
            StatusCode::BAD_REQUEST,
            "Name or email is required",
        ));
    }
    match store.update(COLLECTION, id, fields).await? {
        Some(user) => HttpResponse::ok(&user),
        None => Err(ApiError::app(StatusCode::NOT_FOUND, "User not found")),
    }
}

/// DELETE /users/:id
async fn remove(store: Arc<DocumentStore>, ctx: RequestContext) -> Result<HttpResponse, ApiError> {
    let id = ctx.param("id")?;
    if store.delete(COLLECTION, id).await? {
        Ok(HttpResponse::no_content())
    } else {
        Err(ApiError::app(StatusCode::NOT_FOUND, "User not found"))
    }
}
