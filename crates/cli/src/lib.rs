// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod command;
pub mod config;
pub mod navigator;

use std::sync::Arc;

use placeview_client::credential::storage::FileStorage;
use placeview_client::ApiClient;
use tracing::debug;

use crate::config::Cli;
use crate::navigator::TerminalNavigator;

/// Build a client over the on-disk session and run the selected subcommand.
///
/// Returns the process exit code.
pub async fn run(cli: Cli) -> anyhow::Result<i32> {
    let path = cli.client.credentials_path();
    debug!(path = %path.display(), "loading stored session");
    let storage = Arc::new(FileStorage::open(&path));
    let navigator = Arc::new(TerminalNavigator::new());
    let client = ApiClient::new(cli.client, storage, navigator)?;
    Ok(command::run(&client, &cli.command).await)
}
