use std::sync::Arc;

use chrono::{Duration, Utc};

use portcullis::{Error, NewUser, Portcullis, Session, SessionError, SessionId};
use portcullis_core::repositories::{SessionRepository, SessionRepositoryProvider};
use portcullis_storage_memory::MemoryRepositoryProvider;

async fn setup() -> (Portcullis<MemoryRepositoryProvider>, Arc<MemoryRepositoryProvider>) {
    let repositories = Arc::new(MemoryRepositoryProvider::new());
    let portcullis = Portcullis::new(repositories.clone());
    (portcullis, repositories)
}

async fn login_alice(portcullis: &Portcullis<MemoryRepositoryProvider>) -> Session {
    let new_user = NewUser::builder()
        .username("alice".to_string())
        .email("alice@example.com".to_string())
        .build()
        .unwrap();
    portcullis.create_user(new_user, "correct horse battery").await.unwrap();
    let (_, session) = portcullis
        .login("alice", "correct horse battery", None, None, None)
        .await
        .unwrap();
    session
}

/// Rewrite a stored session through a closure, to age timestamps without
/// sleeping in tests.
async fn amend_session<F>(repositories: &MemoryRepositoryProvider, id: &SessionId, amend: F)
where
    F: FnOnce(&mut Session),
{
    let mut session = repositories.session().get(id).await.unwrap().unwrap();
    amend(&mut session);
    repositories.session().update(session).await.unwrap();
}

#[tokio::test]
async fn test_anonymous_session() {
    let (portcullis, _) = setup().await;

    let session = portcullis.create_session().await.unwrap();
    assert!(session.user_id.is_none());
    assert!(!portcullis.is_authenticated(&session.id).await.unwrap());

    // Anonymous sessions are still live sessions.
    let touched = portcullis.touch_session(&session.id).await.unwrap();
    assert!(touched.is_some());
}

#[tokio::test]
async fn test_csrf_token_lifecycle() {
    let (portcullis, _) = setup().await;
    let session = portcullis.create_session().await.unwrap();

    let token = portcullis.issue_csrf_token(&session.id).await.unwrap();
    assert!(portcullis.validate_csrf_token(&session.id, &token).await.unwrap());

    // A tampered token fails even when only one character differs.
    let mut tampered = token.clone().into_bytes();
    tampered[0] = if tampered[0] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(tampered).unwrap();
    assert!(!portcullis.validate_csrf_token(&session.id, &tampered).await.unwrap());

    // Reissuing replaces the old token.
    let second = portcullis.issue_csrf_token(&session.id).await.unwrap();
    assert_ne!(token, second);
    assert!(!portcullis.validate_csrf_token(&session.id, &token).await.unwrap());
    assert!(portcullis.validate_csrf_token(&session.id, &second).await.unwrap());
}

#[tokio::test]
async fn test_csrf_token_expires() {
    let (portcullis, repositories) = setup().await;
    let session = portcullis.create_session().await.unwrap();
    let token = portcullis.issue_csrf_token(&session.id).await.unwrap();

    // Default TTL is 30 minutes.
    amend_session(&repositories, &session.id, |session| {
        let csrf = session.csrf.as_mut().unwrap();
        csrf.issued_at -= Duration::minutes(31);
    })
    .await;

    assert!(!portcullis.validate_csrf_token(&session.id, &token).await.unwrap());
}

#[tokio::test]
async fn test_csrf_without_session() {
    let (portcullis, _) = setup().await;
    let missing = SessionId::new("sess_does-not-exist");

    // Validation against a dead session fails closed.
    assert!(!portcullis.validate_csrf_token(&missing, "anything").await.unwrap());

    // Issuance needs a live session to bind the token to.
    let err = portcullis.issue_csrf_token(&missing).await.unwrap_err();
    assert!(matches!(err, Error::Session(SessionError::NotFound)));
}

#[tokio::test]
async fn test_idle_timeout_destroys_session() {
    let (portcullis, repositories) = setup().await;
    let session = login_alice(&portcullis).await;

    // Just inside the 15 minute timeout the session survives.
    amend_session(&repositories, &session.id, |session| {
        session.last_activity_at = Utc::now() - Duration::minutes(14);
    })
    .await;
    assert!(portcullis.touch_session(&session.id).await.unwrap().is_some());

    // Past it the session is destroyed on the next read.
    amend_session(&repositories, &session.id, |session| {
        session.last_activity_at = Utc::now() - Duration::minutes(16);
    })
    .await;
    assert!(portcullis.touch_session(&session.id).await.unwrap().is_none());
    let stored = repositories.session().get(&session.id).await.unwrap();
    assert!(stored.is_none());
}

#[tokio::test]
async fn test_session_rotation() {
    let (portcullis, repositories) = setup().await;
    let session = login_alice(&portcullis).await;
    let csrf = portcullis.issue_csrf_token(&session.id).await.unwrap();

    // Default rotation interval is 5 minutes.
    amend_session(&repositories, &session.id, |session| {
        session.last_rotated_at = Utc::now() - Duration::minutes(6);
    })
    .await;

    let rotated = portcullis.touch_session(&session.id).await.unwrap().unwrap();
    assert_ne!(rotated.id, session.id);

    // The old identifier is dead, the session state carried over.
    let stale = repositories.session().get(&session.id).await.unwrap();
    assert!(stale.is_none());
    assert!(portcullis.is_authenticated(&rotated.id).await.unwrap());
    assert!(portcullis.validate_csrf_token(&rotated.id, &csrf).await.unwrap());
}

#[tokio::test]
async fn test_is_authenticated_leaves_callers_id_valid() {
    let (portcullis, repositories) = setup().await;
    let session = login_alice(&portcullis).await;

    amend_session(&repositories, &session.id, |session| {
        session.last_rotated_at = Utc::now() - Duration::minutes(6);
    })
    .await;

    // A rotation is overdue, but the boolean check must not perform it:
    // the caller would never learn the new id and be silently logged out.
    assert!(portcullis.is_authenticated(&session.id).await.unwrap());
    let touched = portcullis.touch_session(&session.id).await.unwrap();
    assert!(touched.is_some());
}

#[tokio::test]
async fn test_activity_keeps_session_alive() {
    let (portcullis, repositories) = setup().await;
    let session = login_alice(&portcullis).await;

    // Each touch resets the idle clock.
    for _ in 0..3 {
        amend_session(&repositories, &session.id, |session| {
            session.last_activity_at = Utc::now() - Duration::minutes(10);
        })
        .await;
        let touched = portcullis.touch_session(&session.id).await.unwrap().unwrap();
        assert!(Utc::now() - touched.last_activity_at < Duration::minutes(1));
    }
}

#[tokio::test]
async fn test_logout() {
    let (portcullis, _) = setup().await;
    let session = login_alice(&portcullis).await;
    assert!(portcullis.is_authenticated(&session.id).await.unwrap());

    portcullis.logout(&session.id).await.unwrap();
    assert!(!portcullis.is_authenticated(&session.id).await.unwrap());

    // Logging out twice is not an error.
    portcullis.logout(&session.id).await.unwrap();
}
