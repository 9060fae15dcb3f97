use std::time::Duration;

use serde_json::Value;

use crate::cli::utils::{endpoint, output_error, output_success};
use crate::cli::OutputFormat;

pub async fn handle(base_url: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    let response = client
        .get(endpoint(base_url, "/health"))
        .timeout(Duration::from_secs(5))
        .send()
        .await?;

    let status = response.status();
    let body: Value = response.json().await?;

    if status.is_success() {
        match output_format {
            OutputFormat::Json => output_success(&output_format, "Server is healthy", Some(body)),
            OutputFormat::Text => {
                output_success(&output_format, &format!("{} is healthy", base_url), None)?;
                println!("{}", serde_json::to_string_pretty(&body["data"])?);
                Ok(())
            }
        }
    } else {
        output_error(&output_format, &format!("Health check returned {}", status), Some(body))?;
        Err(anyhow::anyhow!("{} is unhealthy", base_url))
    }
}
