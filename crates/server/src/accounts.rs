// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

/// A username/password pair accepted by `POST /login`.
#[derive(Debug, Clone)]
pub struct Account {
    pub username: String,
    pub password: String,
}

/// Fixed in-memory list of accounts.
#[derive(Debug, Clone)]
pub struct AccountDirectory {
    accounts: Vec<Account>,
}

impl AccountDirectory {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }

    /// Return the matching username when both fields match exactly.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<&str> {
        if username.is_empty() || password.is_empty() {
            return None;
        }
        self.accounts
            .iter()
            .find(|a| {
                // Evaluate both comparisons so timing does not reveal which field matched.
                let user_ok = constant_time_eq(&a.username, username);
                let pass_ok = constant_time_eq(&a.password, password);
                user_ok & pass_ok
            })
            .map(|a| a.username.as_str())
    }
}

impl Default for AccountDirectory {
    fn default() -> Self {
        Self::new(vec![Account { username: "user".to_owned(), password: "password".to_owned() }])
    }
}

/// Constant-time string comparison to prevent timing side-channel attacks.
pub(crate) fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut acc = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        acc |= x ^ y;
    }
    acc == 0
}
