//! `docintake status`: query a running server's health route.

use anyhow::Result;
use serde_json::Value;

use crate::terminal_output::{note_warn, paint_status};

pub async fn run(port: u16) -> Result<bool> {
    let url = format!("http://localhost:{port}/api/health");
    let client = reqwest::Client::new();
    match client.get(&url).send().await {
        Ok(resp) => {
            let body: Value = resp.json().await?;
            let status = body["status"].as_str().unwrap_or("unknown");
            println!("docintake: {}", paint_status(status));
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(status == "ok")
        }
        Err(e) => {
            note_warn(&format!("Server not reachable at {url}: {e}"));
            Ok(false)
        }
    }
}
