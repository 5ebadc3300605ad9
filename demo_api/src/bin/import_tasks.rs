//! Imports tasks from a CSV file by POSTing each row to the running API.
//!
//! Usage: `cargo run -p demo-api --bin import_tasks [path/to/tasks.csv]`

use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "tasks.csv".into());
    let contents = match tokio::fs::read_to_string(&path).await {
        Ok(contents) => contents,
        Err(_) => {
            eprintln!("error: {path} not found");
            std::process::exit(1);
        }
    };

    let base_url = std::env::var("API_URL").unwrap_or_else(|_| "http://localhost:3333".into());
    let client = reqwest::Client::new();

    // First line is the header row.
    for line in contents.lines().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let (title, description) = match line.split_once(',') {
            Some(parts) => parts,
            None => (line, ""),
        };
        client
            .post(format!("{base_url}/tasks"))
            .json(&json!({ "title": title.trim(), "description": description.trim() }))
            .send()
            .await?
            .error_for_status()?;
        println!("imported: {}", title.trim());
    }
    Ok(())
}
