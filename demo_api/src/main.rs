//! Demo CRUD service: users and tasks wired onto the chassis core.
//!
//! Run from repo root: `cargo run -p demo-api`

mod fields;
mod tasks;
mod users;

use std::sync::Arc;

use chassis::header::{HeaderValue, CONTENT_TYPE};
use chassis::{DocumentStore, HttpServer, Router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("chassis=info,demo_api=info")),
        )
        .init();

    let db_path = std::env::var("DB_PATH").unwrap_or_else(|_| "db.json".into());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|port| port.parse().ok())
        .unwrap_or(3333);

    let store = Arc::new(DocumentStore::open(db_path.as_str()).await?);
    tracing::info!(db_path = %db_path, "store opened");

    let mut router = Router::new();
    users::register(&mut router, Arc::clone(&store))?;
    tasks::register(&mut router, Arc::clone(&store))?;

    let server = HttpServer::new(router)
        .with_default_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    server.start(port).await?;
    Ok(())
}
