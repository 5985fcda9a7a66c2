//! Registration input checks run before any request is made
//!
//! The rules follow what the account server enforces so that obvious mistakes
//! are reported without a round trip. The server stays authoritative.

use std::sync::LazyLock;

use regex::Regex;

const MAX_USERNAME_CHARS: usize = 150;
const MAX_EMAIL_LEN: usize = 254;
const MIN_PASSWORD_CHARS: usize = 8;

static USERNAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("username pattern is valid"));

static EMAIL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[A-Za-z]{2,}$").expect("email pattern is valid")
});

fn username_problem(username: &str) -> Option<&'static str> {
    if username.is_empty() {
        Some("username is required")
    } else if username.chars().count() > MAX_USERNAME_CHARS {
        Some("username is longer than 150 characters")
    } else if !USERNAME_CHARS.is_match(username) {
        Some("username may only use letters, digits and @ . + - _")
    } else {
        None
    }
}

fn email_problem(email: &str) -> Option<&'static str> {
    if email.is_empty() {
        Some("email is required")
    } else if email.len() > MAX_EMAIL_LEN {
        Some("email is longer than 254 characters")
    } else if !EMAIL_SHAPE.is_match(email) {
        Some("email is not a valid address")
    } else {
        None
    }
}

fn password_problem(password: &str) -> Option<&'static str> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        Some("password needs at least 8 characters")
    } else if password.chars().all(|c| c.is_ascii_digit()) {
        Some("password cannot be only digits")
    } else {
        None
    }
}

/// Check a registration form; every failing field is reported
pub fn validate_registration(username: &str, email: &str, password: &str) -> Result<(), String> {
    let problems: Vec<&str> = [
        username_problem(username),
        email_problem(email),
        password_problem(password),
    ]
    .into_iter()
    .flatten()
    .collect();

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems.join("; "))
    }
}
