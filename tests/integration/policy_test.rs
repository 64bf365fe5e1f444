//! Integration tests for policy seeding and tenant authorization over
//! Postgres.

mod helpers;

use uuid::Uuid;

use tenantauth_auth::rbac::seed::default_rules;
use tenantauth_auth::rbac::{Decision, PolicySubject, domain_for_tenant};
use tenantauth_database::repositories::TenantRepository;
use tenantauth_entity::policy::PolicyRule;
use tenantauth_entity::tenant::TenantRole;

#[tokio::test]
async fn test_seed_is_idempotent_under_concurrency() {
    let Some(db) = helpers::TestDb::connect().await else {
        return;
    };
    let engine = db.engine();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let policies = engine.policies.clone();
        handles.push(tokio::spawn(async move { policies.seed_defaults().await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert!(!engine.policies.seed_defaults().await.unwrap());

    let rules = engine.policies.list_rules().await.unwrap();
    for rule in default_rules() {
        assert_eq!(rules.iter().filter(|r| **r == rule).count(), 1, "{rule}");
    }
}

#[tokio::test]
async fn test_member_denied_where_owner_allowed() {
    let Some(db) = helpers::TestDb::connect().await else {
        return;
    };
    let engine = db.engine();
    engine.policies.seed_defaults().await.unwrap();

    let owner = db.create_user().await;
    let member = db.create_user().await;
    let stranger = db.create_user().await;
    let tenants = TenantRepository::new(db.pool.clone());
    let (tenant, _) = tenants.create_with_owner("Policy Co", owner).await.unwrap();
    tenants
        .add_member(tenant.id, member, TenantRole::Member)
        .await
        .unwrap();

    let check = |user: Uuid| {
        let policies = engine.policies.clone();
        async move {
            policies
                .authorize_tenant_action(tenant.id, user, "/api/v1/admin/members", "POST")
                .await
        }
    };
    assert_eq!(check(owner).await, Decision::Allow);
    assert_eq!(check(member).await, Decision::Deny);
    assert_eq!(check(stranger).await, Decision::Deny);
}

#[tokio::test]
async fn test_rule_management() {
    let Some(db) = helpers::TestDb::connect().await else {
        return;
    };
    let engine = db.engine();

    let owner = db.create_user().await;
    let member = db.create_user().await;
    let tenants = TenantRepository::new(db.pool.clone());
    let (tenant, _) = tenants.create_with_owner("Docs Co", owner).await.unwrap();
    tenants
        .add_member(tenant.id, member, TenantRole::Member)
        .await
        .unwrap();

    let rule = PolicyRule::new(
        PolicySubject::Member.as_str(),
        domain_for_tenant(tenant.id),
        "/v1/docs/*",
        "GET",
    );
    assert!(engine.policies.add_rule(&rule).await.unwrap());
    assert!(!engine.policies.add_rule(&rule).await.unwrap());

    let decision = engine
        .policies
        .authorize_tenant_action(tenant.id, member, "/v1/docs/handbook", "GET")
        .await;
    assert_eq!(decision, Decision::Allow);

    let other_tenant = engine
        .policies
        .enforce(PolicySubject::Member, &domain_for_tenant(Uuid::new_v4()), "/v1/docs/x", "GET")
        .await
        .unwrap();
    assert_eq!(other_tenant, Decision::Deny);

    assert!(engine.policies.remove_rule(&rule).await.unwrap());
    assert!(!engine.policies.remove_rule(&rule).await.unwrap());
    let decision = engine
        .policies
        .authorize_tenant_action(tenant.id, member, "/v1/docs/handbook", "GET")
        .await;
    assert_eq!(decision, Decision::Deny);
}
