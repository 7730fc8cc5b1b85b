// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use placeview_client::ClientConfig;

use crate::command::Command;

/// Command-line client for the placeview API.
#[derive(Debug, Parser)]
#[command(name = "placeview", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub client: ClientConfig,

    /// Log format (json or text).
    #[arg(long, env = "PLACEVIEW_LOG_FORMAT", default_value = "text", global = true)]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "PLACEVIEW_LOG_LEVEL", default_value = "warn", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Validate the configuration after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        match self.log_format.as_str() {
            "json" | "text" => {}
            other => anyhow::bail!("invalid log format: {other} (expected json or text)"),
        }
        if !self.client.api_url.starts_with("http://") && !self.client.api_url.starts_with("https://")
        {
            anyhow::bail!("--api-url must be an http(s) URL: {}", self.client.api_url);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
