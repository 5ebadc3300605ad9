//! Tasks CRUD routes.

use std::collections::HashMap;
use std::sync::Arc;

use chassis::{
    ApiError, Document, DocumentStore, HttpResponse, RequestContext, Router, RouterError,
    StatusCode,
};
use serde_json::Value;

use crate::fields::{has_text, present_fields};

const COLLECTION: &str = "tasks";
const TASK_FIELDS: &[&str] = &["title", "description"];

pub fn register(router: &mut Router, store: Arc<DocumentStore>) -> Result<(), RouterError> {
    let st = Arc::clone(&store);
    router.get("/tasks", move |ctx| {
        let st = Arc::clone(&st);
        async move { list(st, ctx).await }
    })?;
    let st = Arc::clone(&store);
    router.post("/tasks", move |ctx| {
        let st = Arc::clone(&st);
        async move { create(st, ctx).await }
    })?;
    let st = Arc::clone(&store);
    router.put("/tasks/:id", move |ctx| {
        let st = Arc::clone(&st);
        async move { update(st, ctx).await }
    })?;
    let st = Arc::clone(&store);
    router.delete("/tasks/:id", move |ctx| {
        let st = Arc::clone(&st);
        async move { remove(st, ctx).await }
    })?;
    router.patch("/tasks/:id/complete", move |ctx| {
        let st = Arc::clone(&store);
        async move { toggle_complete(st, ctx).await }
    })?;
    Ok(())
}

/// GET /tasks — list tasks; `?search=` matches title or description.
async fn list(store: Arc<DocumentStore>, ctx: RequestContext) -> Result<HttpResponse, ApiError> {
    let mut filter = HashMap::new();
    if let Some(search) = ctx.query_value("search") {
        filter.insert("title".to_string(), search.to_string());
        filter.insert("description".to_string(), search.to_string());
    }
    let tasks = store.select(COLLECTION, &filter).await;
    HttpResponse::ok(&tasks)
}

/// POST /tasks — create a task; title and description are required.
async fn create(store: Arc<DocumentStore>, ctx: RequestContext) -> Result<HttpResponse, ApiError> {
    let mut fields = present_fields(&ctx, TASK_FIELDS);
    if !has_text(&fields, "title") || !has_text(&fields, "description") {
        return Err(ApiError::app(
            StatusCode::BAD_REQUEST,
            "Title and description are required",
        ));
    }
    fields.insert("completed_at".to_string(), Value::Null);
    let task = store.insert(COLLECTION, fields).await?;
    HttpResponse::created(&task)
}

/// PUT /tasks/:id — partial update of title and/or description.
async fn update(store: Arc<DocumentStore>, ctx: RequestContext) -> Result<HttpResponse, ApiError> {
    let id = ctx.param("id")?;
    let fields = present_fields(&ctx, TASK_FIELDS);
    if fields.is_empty() {
        return Err(ApiError::app(
            StatusCode::BAD_REQUEST,
            "Title or description is required",
        ));
    }
    match store.update(COLLECTION, id, fields).await? {
        Some(task) => HttpResponse::ok(&task),
        None => Err(ApiError::app(StatusCode::NOT_FOUND, "Task not found")),
    }
}

/// DELETE /tasks/:id
async fn remove(store: Arc<DocumentStore>, ctx: RequestContext) -> Result<HttpResponse, ApiError> {
    let id = ctx.param("id")?;
    if store.delete(COLLECTION, id).await? {
        Ok(HttpResponse::no_content())
    } else {
        Err(ApiError::app(StatusCode::NOT_FOUND, "Task not found"))
    }
}

/// PATCH /tasks/:id/complete — toggle `completed_at` between null and now.
async fn toggle_complete(
    store: Arc<DocumentStore>,
    ctx: RequestContext,
) -> Result<HttpResponse, ApiError> {
    let id = ctx.param("id")?;
    let filter = HashMap::from([("id".to_string(), id.to_string())]);
    let current = store
        .select(COLLECTION, &filter)
        .await
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::app(StatusCode::NOT_FOUND, "Task not found"))?;

    let completed_at = match current.get("completed_at") {
        Some(Value::Null) | None => Value::String(chrono::Utc::now().to_rfc3339()),
        Some(_) => Value::Null,
    };
    let mut fields = Document::new();
    fields.insert("completed_at".to_string(), completed_at);
    match store.update(COLLECTION, id, fields).await? {
        Some(task) => HttpResponse::ok(&task),
        None => Err(ApiError::app(StatusCode::NOT_FOUND, "Task not found")),
    }
}
