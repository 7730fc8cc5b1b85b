// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicBool, Ordering};

use placeview_client::session::Navigator;

/// Terminal stand-in for the login page: tells the user to log in again.
#[derive(Debug, Default)]
pub struct TerminalNavigator {
    redirected: AtomicBool,
}

impl TerminalNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a login redirect was requested during this run.
    pub fn redirected(&self) -> bool {
        self.redirected.load(Ordering::SeqCst)
    }
}

impl Navigator for TerminalNavigator {
    fn redirect_to_login(&self) {
        if !self.redirected.swap(true, Ordering::SeqCst) {
            eprintln!("session expired; run `placeview login` to sign in again");
        }
    }
}

#[cfg(test)]
#[path = "navigator_tests.rs"]
mod tests;
