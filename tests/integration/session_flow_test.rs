//! Integration tests for the session flows over Postgres.

mod helpers;

use tenantauth_auth::session::RequestContext;
use tenantauth_auth::session::dto::{
    AddMemberRequest, BootstrapRequest, LoginRequest, RefreshRequest, RegisterRequest,
    SwitchTenantRequest, UpdateMemberRoleRequest,
};
use tenantauth_database::repositories::TenantRepository;
use uuid::Uuid;
use tenantauth_core::{ErrorKind, Outward};

use helpers::{PASSWORD, TestDb, unique_email};

fn ctx() -> RequestContext {
    RequestContext::new(Some("198.51.100.20".into()), Some("integration".into()))
}

fn login(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
        tenant_id: None,
    }
}

#[tokio::test]
async fn test_register_login_refresh_logout_all() {
    let Some(db) = TestDb::connect().await else {
        return;
    };
    let engine = db.engine();
    let email = unique_email("flow");

    let registered = engine
        .sessions
        .register(RegisterRequest {
            email: email.clone(),
            password: PASSWORD.into(),
        })
        .await
        .unwrap();

    let dup = engine
        .sessions
        .register(RegisterRequest {
            email: email.to_uppercase(),
            password: PASSWORD.into(),
        })
        .await
        .unwrap_err();
    assert_eq!(dup.kind, ErrorKind::Conflict);

    let first = engine.sessions.login(login(&email, PASSWORD), &ctx()).await.unwrap();
    assert_eq!(first.user.id, registered.user.id);

    let rotated = engine
        .sessions
        .refresh(
            RefreshRequest {
                refresh_token: first.tokens.refresh_token.clone(),
            },
            &ctx(),
        )
        .await
        .unwrap();

    let replay = engine
        .sessions
        .refresh(
            RefreshRequest {
                refresh_token: first.tokens.refresh_token,
            },
            &ctx(),
        )
        .await
        .unwrap_err();
    assert_eq!(replay.kind, ErrorKind::SessionRevoked);
    assert_eq!(replay.outward(), Outward::Unauthorized);

    engine.sessions.login(login(&email, PASSWORD), &ctx()).await.unwrap();

    let auth = engine
        .sessions
        .authenticate(&rotated.tokens.access_token)
        .unwrap();
    let all = engine.sessions.logout_all(&auth).await.unwrap();
    assert_eq!(all.revoked_count, 2);
}

#[tokio::test]
async fn test_sixth_login_is_rate_limited() {
    let Some(db) = TestDb::connect().await else {
        return;
    };
    let engine = db.engine();
    let email = unique_email("throttle");
    engine
        .sessions
        .register(RegisterRequest {
            email: email.clone(),
            password: PASSWORD.into(),
        })
        .await
        .unwrap();

    for _ in 0..5 {
        let err = engine
            .sessions
            .login(login(&email, "wrong-password"), &ctx())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidCredential);
    }

    let err = engine
        .sessions
        .login(login(&email, PASSWORD), &ctx())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::RateLimited);
    assert_eq!(err.outward(), Outward::Unauthorized);
}

#[tokio::test]
async fn test_bootstrap_then_member_switch() {
    let Some(db) = TestDb::connect().await else {
        return;
    };
    let engine = db.engine();
    engine.policies.seed_defaults().await.unwrap();

    let owner_email = unique_email("owner");
    let boot = engine
        .sessions
        .bootstrap(
            BootstrapRequest {
                tenant_name: "Integration Inc".into(),
                owner_email: owner_email.clone(),
                owner_password: PASSWORD.into(),
            },
            &ctx(),
        )
        .await
        .unwrap();

    let owner = engine
        .sessions
        .authenticate(&boot.tokens.access_token)
        .unwrap();
    assert_eq!(owner.tenant_id, Some(boot.tenant.id));
    engine
        .sessions
        .authorize(&owner, boot.tenant.id, "/v1/admin/settings", "PUT")
        .await
        .unwrap();

    let mut bound = login(&owner_email, PASSWORD);
    bound.tenant_id = Some(boot.tenant.id);
    let resp = engine.sessions.login(bound, &ctx()).await.unwrap();
    assert_eq!(resp.tenant_id, Some(boot.tenant.id));

    let outsider_email = unique_email("outsider");
    let outsider = engine
        .sessions
        .register(RegisterRequest {
            email: outsider_email.clone(),
            password: PASSWORD.into(),
        })
        .await
        .unwrap();
    let outsider_auth = engine
        .sessions
        .authenticate(
            &engine
                .sessions
                .login(login(&outsider_email, PASSWORD), &ctx())
                .await
                .unwrap()
                .tokens
                .access_token,
        )
        .unwrap();
    assert_eq!(outsider_auth.user_id, outsider.user.id);

    let err = engine
        .sessions
        .switch_tenant(
            &outsider_auth,
            SwitchTenantRequest {
                tenant_id: boot.tenant.id,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PolicyDenied);

    let mut bound = login(&outsider_email, PASSWORD);
    bound.tenant_id = Some(boot.tenant.id);
    let err = engine.sessions.login(bound, &ctx()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidCredential);
}

#[tokio::test]
async fn test_bootstrap_and_member_management() {
    let Some(db) = TestDb::connect().await else {
        return;
    };
    let engine = db.engine();
    engine.policies.seed_defaults().await.unwrap();
    let sessions = &engine.sessions;

    let owner_email = unique_email("team-owner");
    let boot = sessions
        .bootstrap(
            BootstrapRequest {
                tenant_name: "Members Inc".into(),
                owner_email: owner_email.clone(),
                owner_password: PASSWORD.into(),
            },
            &ctx(),
        )
        .await
        .unwrap();
    let tenant_id = boot.tenant.id;
    let role = TenantRepository::new(db.pool.clone())
        .find_role(tenant_id, boot.owner_user.id)
        .await
        .unwrap();
    assert_eq!(role.as_deref(), Some("owner"));
    let owner = sessions.authenticate(&boot.tokens.access_token).unwrap();

    let mate = sessions
        .register(RegisterRequest {
            email: unique_email("team-mate"),
            password: PASSWORD.into(),
        })
        .await
        .unwrap()
        .user
        .id;

    let err = sessions
        .add_member(&owner, tenant_id, AddMemberRequest {
            user_id: Uuid::new_v4(),
            role: "member".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.reason(), Some("user_not_found"));

    sessions
        .add_member(&owner, tenant_id, AddMemberRequest {
            user_id: mate,
            role: "member".into(),
        })
        .await
        .unwrap();
    let err = sessions
        .add_member(&owner, tenant_id, AddMemberRequest {
            user_id: mate,
            role: "admin".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(err.reason(), Some("member_exists"));

    let listed = sessions.list_members(&owner, tenant_id).await.unwrap();
    let ids: Vec<Uuid> = listed.members.iter().map(|m| m.user_id).collect();
    assert_eq!(ids, vec![boot.owner_user.id, mate]);
    assert_eq!(listed.members[0].email, owner_email);

    let changed = sessions
        .update_member_role(&owner, tenant_id, mate, UpdateMemberRoleRequest {
            role: "Admin".into(),
        })
        .await
        .unwrap();
    assert_eq!(changed.role, "admin");

    sessions.remove_member(&owner, tenant_id, mate).await.unwrap();
    let err = sessions.remove_member(&owner, tenant_id, mate).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let mine = sessions.my_roles(&owner, tenant_id).await.unwrap();
    assert_eq!(mine.roles, vec!["owner".to_string()]);
}
