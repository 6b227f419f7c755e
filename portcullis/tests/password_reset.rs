use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use portcullis::{
    AuthError, Error, HttpCaptchaVerifier, NewUser, Portcullis, ResetMailer, SecurityConfig,
    ValidationError,
};
use portcullis_core::crypto::hash_token;
use portcullis_core::repositories::{
    ResetToken, ResetTokenRepository, ResetTokenRepositoryProvider,
};
use portcullis_storage_memory::MemoryRepositoryProvider;

/// Mailer that records outbound messages instead of sending them.
#[derive(Default)]
struct CaptureMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl CaptureMailer {
    fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    fn last_token(&self) -> String {
        self.sent.lock().unwrap().last().unwrap().1.clone()
    }
}

#[async_trait]
impl ResetMailer for CaptureMailer {
    async fn send_password_reset(&self, to: &str, reset_token: &str) -> Result<(), Error> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), reset_token.to_string()));
        Ok(())
    }
}

async fn setup() -> (
    Portcullis<MemoryRepositoryProvider, HttpCaptchaVerifier, CaptureMailer>,
    Arc<MemoryRepositoryProvider>,
    Arc<CaptureMailer>,
) {
    let repositories = Arc::new(MemoryRepositoryProvider::new());
    let mailer = Arc::new(CaptureMailer::default());
    let portcullis = Portcullis::with_collaborators(
        repositories.clone(),
        SecurityConfig::default(),
        Arc::new(HttpCaptchaVerifier::new(Default::default())),
        mailer.clone(),
    )
    .unwrap();
    (portcullis, repositories, mailer)
}

async fn create_alice<M: ResetMailer>(
    portcullis: &Portcullis<MemoryRepositoryProvider, HttpCaptchaVerifier, M>,
) -> portcullis::User {
    let new_user = NewUser::builder()
        .username("alice".to_string())
        .email("alice@example.com".to_string())
        .build()
        .unwrap();
    portcullis.create_user(new_user, "correct horse battery").await.unwrap()
}

#[tokio::test]
async fn test_reset_flow_end_to_end() {
    let (portcullis, _, mailer) = setup().await;
    let user = create_alice(&portcullis).await;

    portcullis.request_password_reset("alice@example.com").await.unwrap();
    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "alice@example.com");

    let token = mailer.last_token();
    assert!(portcullis.verify_reset_token(&token).await.unwrap());

    let reset_for = portcullis
        .reset_password(&token, "brand new password")
        .await
        .unwrap();
    assert_eq!(reset_for, user.id);

    // The new password works, the old one no longer does.
    portcullis
        .login("alice", "brand new password", None, None, None)
        .await
        .unwrap();
    let err = portcullis
        .login("alice", "correct horse battery", None, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Auth(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn test_reset_token_is_single_use() {
    let (portcullis, _, mailer) = setup().await;
    create_alice(&portcullis).await;

    portcullis.request_password_reset("alice@example.com").await.unwrap();
    let token = mailer.last_token();

    portcullis.reset_password(&token, "brand new password").await.unwrap();

    assert!(!portcullis.verify_reset_token(&token).await.unwrap());
    let err = portcullis
        .reset_password(&token, "yet another password")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Auth(AuthError::InvalidOrExpiredResetToken)
    ));

    // The first redemption stuck.
    portcullis
        .login("alice", "brand new password", None, None, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unknown_email_is_not_an_oracle() {
    let (portcullis, _, mailer) = setup().await;
    create_alice(&portcullis).await;

    // Same Ok(()) shape as for a known address, and nothing sent.
    portcullis.request_password_reset("stranger@example.com").await.unwrap();
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_known_and_unknown_email_take_comparable_time() {
    let (portcullis, _, _) = setup().await;
    create_alice(&portcullis).await;

    // Warm both paths once so setup cost is excluded.
    portcullis.request_password_reset("alice@example.com").await.unwrap();
    portcullis.request_password_reset("stranger@example.com").await.unwrap();

    let rounds = 64;
    let start = std::time::Instant::now();
    for _ in 0..rounds {
        portcullis.request_password_reset("alice@example.com").await.unwrap();
    }
    let known = start.elapsed();

    let start = std::time::Instant::now();
    for _ in 0..rounds {
        portcullis.request_password_reset("stranger@example.com").await.unwrap();
    }
    let unknown = start.elapsed();

    // Token generation and hashing run on both branches, so neither
    // should dwarf the other. The bound is deliberately loose; it only
    // has to catch an early return that skips the work entirely.
    assert!(known < unknown * 25, "known {known:?} vs unknown {unknown:?}");
    assert!(unknown < known * 25, "unknown {unknown:?} vs known {known:?}");
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let (portcullis, repositories, _) = setup().await;
    let user = create_alice(&portcullis).await;

    let token = "an-expired-token-value";
    repositories
        .reset_token()
        .create(ResetToken {
            token_hash: hash_token(token),
            user_id: user.id,
            expires_at: Utc::now() - Duration::minutes(1),
            created_at: Utc::now() - Duration::hours(2),
        })
        .await
        .unwrap();

    assert!(!portcullis.verify_reset_token(token).await.unwrap());
    let err = portcullis
        .reset_password(token, "brand new password")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Auth(AuthError::InvalidOrExpiredResetToken)
    ));
}

#[tokio::test]
async fn test_weak_replacement_password_leaves_token_live() {
    let (portcullis, _, mailer) = setup().await;
    create_alice(&portcullis).await;

    portcullis.request_password_reset("alice@example.com").await.unwrap();
    let token = mailer.last_token();

    let err = portcullis.reset_password(&token, "short").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::WeakPassword)
    ));

    // The failed attempt did not consume the token.
    assert!(portcullis.verify_reset_token(&token).await.unwrap());
    portcullis.reset_password(&token, "brand new password").await.unwrap();
}

#[tokio::test]
async fn test_concurrent_redemptions_exactly_one_succeeds() {
    let (portcullis, _, mailer) = setup().await;
    create_alice(&portcullis).await;

    portcullis.request_password_reset("alice@example.com").await.unwrap();
    let token = mailer.last_token();

    let portcullis = Arc::new(portcullis);
    let mut handles = Vec::new();
    for i in 0..8 {
        let portcullis = portcullis.clone();
        let token = token.clone();
        handles.push(tokio::spawn(async move {
            portcullis
                .reset_password(&token, &format!("contender password {i}"))
                .await
                .is_ok()
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap() {
            successes += 1;
        }
    }
    assert_eq!(successes, 1);
}

#[tokio::test]
async fn test_cleanup_expired_tokens() {
    let (portcullis, repositories, mailer) = setup().await;
    let user = create_alice(&portcullis).await;

    repositories
        .reset_token()
        .create(ResetToken {
            token_hash: hash_token("stale-token"),
            user_id: user.id,
            expires_at: Utc::now() - Duration::minutes(1),
            created_at: Utc::now() - Duration::hours(2),
        })
        .await
        .unwrap();
    portcullis.request_password_reset("alice@example.com").await.unwrap();
    let live = mailer.last_token();

    let removed = portcullis.cleanup_expired_reset_tokens().await.unwrap();
    assert_eq!(removed, 1);
    assert!(portcullis.verify_reset_token(&live).await.unwrap());
}
