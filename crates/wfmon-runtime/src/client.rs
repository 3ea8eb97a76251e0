//! HTTP client for the query subcommands.

use std::time::Duration;

use reqwest::Method;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) async fn api_call(
    base_url: &str,
    method: Method,
    path: &str,
) -> anyhow::Result<serde_json::Value> {
    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(REQUEST_TIMEOUT)
        .build()?;
    let url = format!("{}{path}", base_url.trim_end_matches('/'));

    let resp = client
        .request(method, &url)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("cannot reach gateway at {base_url}: {e}"))?;

    let status = resp.status();
    let body: serde_json::Value = resp.json().await?;
    if !status.is_success() {
        let message = body["error"].as_str().unwrap_or("unknown error");
        anyhow::bail!("gateway answered {status}: {message}");
    }
    Ok(body)
}

fn events_path(limit: Option<usize>) -> String {
    match limit {
        Some(n) => format!("/api/events?limit={n}"),
        None => "/api/events".to_string(),
    }
}

/// `wfmon events`
pub async fn cmd_events(base_url: &str, limit: Option<usize>) -> anyhow::Result<()> {
    let events = api_call(base_url, Method::GET, &events_path(limit)).await?;
    println!("{}", serde_json::to_string_pretty(&events)?);
    Ok(())
}

/// `wfmon state`
pub async fn cmd_state(base_url: &str) -> anyhow::Result<()> {
    let state = api_call(base_url, Method::GET, "/api/state").await?;
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

/// `wfmon clear`
pub async fn cmd_clear(base_url: &str) -> anyhow::Result<()> {
    let resp = api_call(base_url, Method::DELETE, "/api/events").await?;
    println!("{}", resp["message"].as_str().unwrap_or("ok"));
    Ok(())
}
