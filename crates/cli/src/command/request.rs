// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Raw resource requests: `placeview get|post|put|patch|delete`.

use placeview_client::{ApiClient, ApiRequest, ApiResponse};

use super::{report, BodyArgs, QueryArgs};

/// Build a request from `path`, repeated `key=value` pairs, and an optional body.
pub fn build(
    method: &str,
    path: &str,
    query: &[String],
    data: Option<&str>,
) -> anyhow::Result<ApiRequest> {
    let method: placeview_client::Method = method.parse()?;
    let mut request = ApiRequest::new(method, path);
    for pair in query {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("invalid query parameter (expected key=value): {pair}"))?;
        request = request.query(key, value);
    }
    if let Some(data) = data {
        let body: serde_json::Value = serde_json::from_str(data)
            .map_err(|e| anyhow::anyhow!("--data is not valid JSON: {e}"))?;
        request = request.json(&body)?;
    }
    Ok(request)
}

pub fn without_body(method: &str, args: &QueryArgs) -> anyhow::Result<ApiRequest> {
    build(method, &args.path, &args.query, None)
}

pub fn with_body(method: &str, args: &BodyArgs) -> anyhow::Result<ApiRequest> {
    build(method, &args.path, &args.query, args.data.as_deref())
}

pub async fn run(client: &ApiClient, request: anyhow::Result<ApiRequest>) -> i32 {
    let request = match request {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e:#}");
            return 1;
        }
    };
    match client.send(request).await {
        Ok(resp) => {
            let out = render(&resp);
            if !out.is_empty() {
                println!("{out}");
            }
            0
        }
        Err(e) => report(&e),
    }
}

/// Pretty-print JSON bodies; pass anything else through as text.
pub fn render(resp: &ApiResponse) -> String {
    match serde_json::from_slice::<serde_json::Value>(&resp.body) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| resp.text()),
        Err(_) => resp.text(),
    }
}
