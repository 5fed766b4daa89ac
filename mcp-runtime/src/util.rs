use std::time::Duration;

pub const BEARER_PREFIX: &str = "Bearer ";

pub fn client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(timeout).build()
}

/// `Authorization` header value for a configured token. Tokens that already
/// carry the scheme are sent unchanged.
pub fn authorization_value(token: &str) -> String {
    let token = token.trim();
    if token
        .get(..BEARER_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(BEARER_PREFIX))
    {
        token.to_string()
    } else {
        format!("{BEARER_PREFIX}{token}")
    }
}

/// Request bodies are logged whole; responses are cut to keep log lines sane.
pub fn truncate_for_log(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        return body.to_string();
    }
    let mut cut: String = body.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}
