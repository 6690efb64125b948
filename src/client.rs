//! One-shot client for the quote server.
//!
//! The server's body is never decoded here; it is printed and recorded as is.

use crate::core::config::ClientConfig;
use crate::core::deadline::Deadline;
use crate::core::error::ClientError;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Line written to stdout and to the output file for a server body.
pub fn format_line(body: &str) -> String {
    format!("Dólar: {body}")
}

/// Sends one GET to `url` and returns the raw body, all within `timeout`.
pub async fn request_quote(url: &str, timeout: Duration) -> Result<String, ClientError> {
    let client = reqwest::Client::builder()
        .user_agent("cotacao/0.1")
        .build()
        .map_err(|e| ClientError::Transport(e.to_string()))?;

    debug!("Requesting quote from {}", url);
    let (status, body) = Deadline::new("client", timeout)
        .run(async {
            let response = client.get(url).send().await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        })
        .await
        .map_err(ClientError::Timeout)?
        .map_err(|e| ClientError::Transport(format!("{e} for URL: {url}")))?;

    if !status.is_success() {
        warn!(%status, "Quote server answered with an error status");
    }
    Ok(body)
}

/// Appends `Dólar: <body>` plus a newline to `path`, creating it if needed.
pub fn append_line<P: AsRef<Path>>(path: P, body: &str) -> Result<(), ClientError> {
    let path = path.as_ref();
    let output_error = |source: std::io::Error| ClientError::OutputWrite {
        path: path.display().to_string(),
        source,
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(output_error)?;
    writeln!(file, "{}", format_line(body)).map_err(output_error)?;
    Ok(())
}

/// Fetches a quote from the configured server, prints it and appends it to
/// the output file. Nothing is written unless the request succeeded.
pub async fn run(config: &ClientConfig) -> Result<String, ClientError> {
    let body = request_quote(&config.server_url, config.timeout()).await?;

    println!("{}", format_line(&body));
    append_line(&config.output_path, &body)?;
    info!(path = %config.output_path, "Quote recorded");

    Ok(body)
}
