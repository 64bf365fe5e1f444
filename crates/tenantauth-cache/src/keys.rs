//! Counter names.
//!
//! Backends may add their own prefix on top (see `counters.key_prefix`).

/// Failed logins from one client IP against one email.
pub fn login_failures(client_ip: &str, email: &str) -> String {
    format!("login_fail:{client_ip}:{email}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_failure_key() {
        assert_eq!(
            login_failures("203.0.113.7", "alice@example.com"),
            "login_fail:203.0.113.7:alice@example.com"
        );
    }
}
