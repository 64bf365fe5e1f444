//! Rule matching with exact, wildcard, and trailing-`*` prefix patterns.

use tenantauth_entity::policy::PolicyRule;

/// Matches a domain or resource pattern against a concrete value.
///
/// `*` matches anything; a pattern ending in `*` matches values that start
/// with the part before it; anything else must be equal.
pub fn pattern_matches(pattern: &str, value: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    match pattern.strip_suffix('*') {
        Some(prefix) => value.starts_with(prefix),
        None => pattern == value,
    }
}

/// Whether `rule` grants `action` on `resource` in `domain` to `subject`.
pub fn rule_matches(
    rule: &PolicyRule,
    subject: &str,
    domain: &str,
    resource: &str,
    action: &str,
) -> bool {
    rule.subject == subject
        && pattern_matches(&rule.domain, domain)
        && pattern_matches(&rule.resource, resource)
        && (rule.action == "*" || rule.action == action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns() {
        assert!(pattern_matches("*", "anything"));
        assert!(pattern_matches("tenant:*", "tenant:42"));
        assert!(!pattern_matches("tenant:*", "org:42"));
        assert!(pattern_matches("/v1/admin/*", "/v1/admin/users"));
        assert!(!pattern_matches("/v1/admin/*", "/v1/adminx"));
        assert!(pattern_matches("/v1/me", "/v1/me"));
        assert!(!pattern_matches("/v1/me", "/v1/me/"));
    }

    #[test]
    fn test_rule_match() {
        let rule = PolicyRule::new("tenant_owner", "tenant:*", "/v1/admin/*", "*");
        assert!(rule_matches(&rule, "tenant_owner", "tenant:1", "/v1/admin/x", "DELETE"));
        assert!(!rule_matches(&rule, "member", "tenant:1", "/v1/admin/x", "GET"));

        let read_only = PolicyRule::new("member", "tenant:1", "/v1/docs", "GET");
        assert!(rule_matches(&read_only, "member", "tenant:1", "/v1/docs", "GET"));
        assert!(!rule_matches(&read_only, "member", "tenant:1", "/v1/docs", "POST"));
        assert!(!rule_matches(&read_only, "member", "tenant:2", "/v1/docs", "GET"));
    }
}
