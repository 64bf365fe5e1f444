//! Integration tests for refresh session rotation over Postgres.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use tenantauth_auth::session::token::{generate_refresh_token, hash_refresh_token};
use tenantauth_auth::session::{PgRefreshSessionStore, RefreshLedger, RequestContext};
use tenantauth_core::ErrorKind;
use tenantauth_database::repositories::RefreshSessionRepository;
use tenantauth_entity::refresh_session::{NewRefreshSession, SessionState, Successor};

const TTL: Duration = Duration::from_secs(3600);

fn ledger(db: &helpers::TestDb) -> RefreshLedger {
    RefreshLedger::new(Arc::new(PgRefreshSessionStore::new(db.pool.clone())), 32)
}

fn ctx() -> RequestContext {
    RequestContext::new(Some("192.0.2.10".into()), Some("integration".into()))
}

#[tokio::test]
async fn test_rotation_chain_with_replay() {
    let Some(db) = helpers::TestDb::connect().await else {
        return;
    };
    let ledger = ledger(&db);
    let user = db.create_user().await;

    let t1 = ledger.create(user, TTL, &ctx()).await.unwrap();
    let t2 = ledger.rotate(&t1.token, TTL).await.unwrap();
    assert_eq!(t2.user_id, user);

    let replay = ledger.rotate(&t1.token, TTL).await.unwrap_err();
    assert_eq!(replay.kind, ErrorKind::SessionRevoked);

    let t3 = ledger.rotate(&t2.token, TTL).await.unwrap();

    let chain = ledger.chain(&t1.token).await.unwrap();
    let ids: Vec<Uuid> = chain.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![t1.session_id, t2.session_id, t3.session_id]);
    assert_eq!(chain[0].state(), SessionState::Rotated);
    assert_eq!(chain[1].state(), SessionState::Rotated);
    assert!(chain[2].state().is_active());
    assert_eq!(chain[2].client_ip.as_deref(), Some("192.0.2.10"));
    assert_eq!(chain[2].user_agent.as_deref(), Some("integration"));
}

#[tokio::test]
async fn test_failed_rotation_leaves_old_token_valid() {
    let Some(db) = helpers::TestDb::connect().await else {
        return;
    };
    let ledger = ledger(&db);
    let repo = RefreshSessionRepository::new(db.pool.clone());
    let user = db.create_user().await;

    let t1 = ledger.create(user, TTL, &ctx()).await.unwrap();
    let taken = ledger.create(user, TTL, &ctx()).await.unwrap();

    // The successor digest collides with an existing row, so the insert
    // inside the locked transaction fails after the row lock is taken.
    let err = repo
        .rotate(
            &hash_refresh_token(&t1.token),
            &Successor {
                id: Uuid::new_v4(),
                token_hash: hash_refresh_token(&taken.token),
                expires_at: Utc::now() + chrono::Duration::hours(1),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let row = ledger.find(&t1.token).await.unwrap().unwrap();
    assert!(row.state().is_active());
    assert!(row.replaced_by.is_none());

    assert!(ledger.rotate(&t1.token, TTL).await.is_ok());
}

#[tokio::test]
async fn test_abandoned_rotation_commits_nothing() {
    let Some(db) = helpers::TestDb::connect().await else {
        return;
    };
    let ledger = ledger(&db);
    let user = db.create_user().await;
    let t1 = ledger.create(user, TTL, &ctx()).await.unwrap();

    // Hold the row lock so the rotation stalls inside its transaction.
    let mut blocker = db.pool.begin().await.unwrap();
    sqlx::query("SELECT id FROM refresh_sessions WHERE token_hash = $1 FOR UPDATE")
        .bind(hash_refresh_token(&t1.token))
        .fetch_one(&mut *blocker)
        .await
        .unwrap();

    let stalled =
        tokio::time::timeout(Duration::from_millis(200), ledger.rotate(&t1.token, TTL)).await;
    assert!(stalled.is_err());
    blocker.rollback().await.unwrap();

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM refresh_sessions WHERE user_id = $1")
        .bind(user)
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(rows, 1);
    let row = ledger.find(&t1.token).await.unwrap().unwrap();
    assert!(row.state().is_active());
    assert!(row.replaced_by.is_none());

    let retried = tokio::time::timeout(Duration::from_secs(10), ledger.rotate(&t1.token, TTL))
        .await
        .unwrap();
    assert!(retried.is_ok());
}

#[tokio::test]
async fn test_concurrent_rotation_has_one_winner() {
    let Some(db) = helpers::TestDb::connect().await else {
        return;
    };
    let ledger = ledger(&db);
    let user = db.create_user().await;
    let t1 = ledger.create(user, TTL, &ctx()).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..5 {
        let ledger = ledger.clone();
        let raw = t1.token.clone();
        handles.push(tokio::spawn(async move { ledger.rotate(&raw, TTL).await }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(e) => assert_eq!(e.kind, ErrorKind::SessionRevoked),
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn test_unknown_and_expired_tokens() {
    let Some(db) = helpers::TestDb::connect().await else {
        return;
    };
    let ledger = ledger(&db);
    let repo = RefreshSessionRepository::new(db.pool.clone());
    let user = db.create_user().await;

    let unknown = generate_refresh_token(32);
    assert_eq!(
        ledger.rotate(&unknown, TTL).await.unwrap_err().kind,
        ErrorKind::SessionNotFound
    );

    let raw = generate_refresh_token(32);
    repo.create(&NewRefreshSession {
        id: Uuid::new_v4(),
        user_id: user,
        token_hash: hash_refresh_token(&raw),
        user_agent: None,
        client_ip: None,
        expires_at: Utc::now() - chrono::Duration::minutes(1),
    })
    .await
    .unwrap();
    assert_eq!(
        ledger.rotate(&raw, TTL).await.unwrap_err().kind,
        ErrorKind::SessionExpired
    );
}

#[tokio::test]
async fn test_revoke_all_only_affects_one_user() {
    let Some(db) = helpers::TestDb::connect().await else {
        return;
    };
    let ledger = ledger(&db);
    let alice = db.create_user().await;
    let bob = db.create_user().await;

    let a1 = ledger.create(alice, TTL, &ctx()).await.unwrap();
    let a2 = ledger.create(alice, TTL, &ctx()).await.unwrap();
    let b1 = ledger.create(bob, TTL, &ctx()).await.unwrap();
    ledger.revoke(&a2.token).await.unwrap();
    ledger.revoke(&a2.token).await.unwrap();

    assert_eq!(ledger.revoke_all(alice).await.unwrap(), 1);
    assert_eq!(
        ledger.rotate(&a1.token, TTL).await.unwrap_err().kind,
        ErrorKind::SessionRevoked
    );

    let bob_row = ledger.find(&b1.token).await.unwrap().unwrap();
    assert!(bob_row.state().is_active());
}
