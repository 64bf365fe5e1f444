//! Default policy rules.

use tenantauth_entity::policy::PolicyRule;

use super::role::PolicySubject;

/// Domain pattern covering every tenant.
pub const ANY_TENANT: &str = "tenant:*";

/// Admin route prefixes granted to tenant owners and admins.
pub const ADMIN_RESOURCES: [&str; 2] = ["/v1/admin/*", "/api/v1/admin/*"];

/// Rules every deployment starts with. Members get none.
pub fn default_rules() -> Vec<PolicyRule> {
    [PolicySubject::TenantOwner, PolicySubject::TenantAdmin]
        .into_iter()
        .flat_map(|subject| {
            ADMIN_RESOURCES
                .into_iter()
                .map(move |resource| PolicyRule::new(subject.as_str(), ANY_TENANT, resource, "*"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules() {
        let rules = default_rules();
        assert_eq!(rules.len(), 4);
        assert!(rules.iter().all(|r| r.subject != "member"));
        assert!(rules.contains(&PolicyRule::new(
            "tenant_admin",
            "tenant:*",
            "/api/v1/admin/*",
            "*"
        )));
    }
}
