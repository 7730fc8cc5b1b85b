// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `placeview` subcommands.

pub mod request;
pub mod session;

use placeview_client::{ApiClient, DispatchError};

/// Exit code when the user has to log in (again).
pub const EXIT_LOGIN_REQUIRED: i32 = 2;

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Log in and store the session.
    Login(LoginArgs),
    /// Forget the stored session.
    Logout,
    /// Show the logged-in user.
    Whoami,
    /// GET a resource.
    Get(QueryArgs),
    /// POST a JSON body to a resource.
    Post(BodyArgs),
    /// PUT a JSON body to a resource.
    Put(BodyArgs),
    /// PATCH a resource with a JSON body.
    Patch(BodyArgs),
    /// DELETE a resource.
    Delete(QueryArgs),
}

#[derive(Debug, clap::Args)]
pub struct LoginArgs {
    #[arg(long)]
    pub username: String,
    #[arg(long, env = "PLACEVIEW_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Debug, clap::Args)]
pub struct QueryArgs {
    /// Resource path, e.g. `/api/places`.
    pub path: String,
    /// Query parameter as `key=value` (repeatable).
    #[arg(long = "query", short = 'q')]
    pub query: Vec<String>,
}

#[derive(Debug, clap::Args)]
pub struct BodyArgs {
    /// Resource path, e.g. `/api/places/3/reviews`.
    pub path: String,
    /// JSON request body.
    #[arg(long, short = 'd')]
    pub data: Option<String>,
    /// Query parameter as `key=value` (repeatable).
    #[arg(long = "query", short = 'q')]
    pub query: Vec<String>,
}

/// Run one subcommand. Returns a process exit code.
pub async fn run(client: &ApiClient, command: &Command) -> i32 {
    match command {
        Command::Login(args) => session::login(client, args).await,
        Command::Logout => session::logout(client),
        Command::Whoami => session::whoami(client),
        Command::Get(args) => request::run(client, request::without_body("GET", args)).await,
        Command::Delete(args) => request::run(client, request::without_body("DELETE", args)).await,
        Command::Post(args) => request::run(client, request::with_body("POST", args)).await,
        Command::Put(args) => request::run(client, request::with_body("PUT", args)).await,
        Command::Patch(args) => request::run(client, request::with_body("PATCH", args)).await,
    }
}

/// Map a failed call onto an exit code, reporting it on stderr.
pub fn report(err: &DispatchError) -> i32 {
    eprintln!("error [{}]: {err}", err.as_str());
    if err.requires_login() {
        EXIT_LOGIN_REQUIRED
    } else {
        1
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
