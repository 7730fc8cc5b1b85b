// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `placeview login`, `logout`, and `whoami`.

use placeview_client::ApiClient;

use super::{report, LoginArgs, EXIT_LOGIN_REQUIRED};

pub async fn login(client: &ApiClient, args: &LoginArgs) -> i32 {
    match client.login(&args.username, &args.password).await {
        Ok(Some(user)) => {
            println!("Logged in as {}.", user.username);
            0
        }
        Ok(None) => {
            println!("Logged in as {}.", args.username);
            0
        }
        Err(e) => report(&e),
    }
}

pub fn logout(client: &ApiClient) -> i32 {
    client.logout();
    println!("Logged out.");
    0
}

pub fn whoami(client: &ApiClient) -> i32 {
    if !client.is_authenticated() {
        eprintln!("not logged in");
        return EXIT_LOGIN_REQUIRED;
    }
    match client.current_user() {
        Some(user) => match serde_json::to_string_pretty(&user) {
            Ok(json) => println!("{json}"),
            Err(_) => println!("{}", user.username),
        },
        None => println!("Logged in (no user profile stored)."),
    }
    0
}
