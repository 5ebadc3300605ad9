//! Body field extraction shared by the CRUD route modules.

use chassis::{Document, RequestContext};
use serde_json::Value;

/// Collect the allowed keys that are present in the JSON body. Keys the
/// client omitted stay absent, so store merges leave them untouched.
pub fn present_fields(ctx: &RequestContext, allowed: &[&str]) -> Document {
    let mut fields = Document::new();
    if let Some(body) = ctx.body.as_object() {
        for key in allowed {
            if let Some(value) = body.get(*key) {
                fields.insert((*key).to_string(), value.clone());
            }
        }
    }
    fields
}

/// True when `key` holds a non-empty string, the shape required fields must
/// have.
pub fn has_text(fields: &Document, key: &str) -> bool {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(|text| !text.is_empty())
        .unwrap_or(false)
}
