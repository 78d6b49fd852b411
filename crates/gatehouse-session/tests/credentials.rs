//! End-to-end credential lifecycles against a shared in-memory store.

use std::sync::Arc;
use std::time::Duration;

use gatehouse_protocol::{ApiKeyId, ApiKeyRecord, Role, UserId};
use gatehouse_session::{
    ALPHABET, ApiKeyConfig, Authenticator, Credential, CredentialError, CredentialService,
    SessionConfig, SessionManager,
};
use gatehouse_store::{Batch, CredentialStore, MemoryStore, StoreError};

/// A store whose reads and writes take a while, so concurrent callers
/// interleave between their store calls.
struct Sluggish(MemoryStore);

const LAG: Duration = Duration::from_millis(20);

impl CredentialStore for Sluggish {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        tokio::time::sleep(LAG).await;
        self.0.get(key).await
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        self.0.set_if_absent(key, value, ttl).await
    }

    async fn execute(&self, batch: Batch) -> Result<(), StoreError> {
        tokio::time::sleep(LAG).await;
        self.0.execute(batch).await
    }
}

fn service(store: &Arc<MemoryStore>) -> CredentialService<Arc<MemoryStore>> {
    CredentialService::new(
        Arc::clone(store),
        SessionConfig::default(),
        ApiKeyConfig::default(),
    )
}

#[tokio::test]
async fn test_login_relogin_logout_lifecycle() {
    let store = Arc::new(MemoryStore::new());
    let svc = service(&store);
    let user = UserId(11);

    let first = svc.sessions().new_session(user, Role::Viewer).await.unwrap();
    assert!(first.bytes().all(|b| ALPHABET.contains(&b)));

    // Role changed between logins: the new session carries the new snapshot.
    let second = svc.sessions().new_session(user, Role::Admin).await.unwrap();
    let id = svc
        .authenticate(&Credential::SessionToken(second.clone()))
        .await
        .unwrap();
    assert_eq!(id.role, Role::Admin);

    assert!(matches!(
        svc.authenticate(&Credential::SessionToken(first)).await,
        Err(CredentialError::NotFound)
    ));

    svc.sessions().remove_session(user).await.unwrap();
    assert!(matches!(
        svc.authenticate(&Credential::SessionToken(second)).await,
        Err(CredentialError::NotFound)
    ));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_sessions_and_api_keys_are_independent() {
    let store = Arc::new(MemoryStore::new());
    let svc = service(&store);
    let user = UserId(3);

    let session = svc.sessions().new_session(user, Role::TeamsManager).await.unwrap();
    let key = svc
        .api_keys()
        .new_api_key(
            ApiKeyRecord {
                id: ApiKeyId(1),
                user_id: user,
                role: Role::TeamsManager,
            },
            0,
        )
        .await
        .unwrap();

    // Logging out leaves API keys alone.
    svc.sessions().remove_session(user).await.unwrap();
    assert!(svc.authenticate(&Credential::ApiKey(key.clone())).await.is_ok());

    // Revoking a key leaves a fresh session alone.
    let session2 = svc.sessions().new_session(user, Role::TeamsManager).await.unwrap();
    svc.api_keys().remove_api_key(ApiKeyId(1)).await.unwrap();
    assert!(svc.authenticate(&Credential::SessionToken(session2)).await.is_ok());
    assert!(svc.authenticate(&Credential::SessionToken(session)).await.is_err());
    assert!(svc.authenticate(&Credential::ApiKey(key)).await.is_err());
}

#[tokio::test]
async fn test_concurrent_revokes_of_same_key_all_succeed() {
    let store = Arc::new(MemoryStore::new());
    let svc = Arc::new(service(&store));
    let record = ApiKeyRecord {
        id: ApiKeyId(77),
        user_id: UserId(1),
        role: Role::Viewer,
    };
    svc.api_keys().new_api_key(record, 24).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let svc = Arc::clone(&svc);
        handles.push(tokio::spawn(async move {
            svc.api_keys().remove_api_key(ApiKeyId(77)).await
        }));
    }
    for handle in handles {
        handle.await.expect("task should not panic").unwrap();
    }

    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_many_users_each_keep_exactly_one_session() {
    let store = Arc::new(MemoryStore::new());
    let svc = service(&store);

    for round in 0..3 {
        for user in 1..=10 {
            svc.sessions()
                .new_session(UserId(user), Role::Viewer)
                .await
                .unwrap_or_else(|e| panic!("round {round}, user {user}: {e}"));
        }
    }

    // One forward + one reverse key per user.
    assert_eq!(store.len().await, 20);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_logins_leave_one_session_and_logout_clears_it() {
    let store = Arc::new(Sluggish(MemoryStore::new()));
    let sessions = SessionManager::new(Arc::clone(&store), SessionConfig::default());
    let user = UserId(1);

    let (a, b) = tokio::join!(
        sessions.new_session(user, Role::Viewer),
        sessions.new_session(user, Role::Viewer),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    let live = [
        sessions.validate(&a).await.is_ok(),
        sessions.validate(&b).await.is_ok(),
    ];
    assert_eq!(live.iter().filter(|ok| **ok).count(), 1);
    assert_eq!(store.0.len().await, 2);

    sessions.remove_session(user).await.unwrap();
    for token in [&a, &b] {
        assert!(matches!(
            sessions.validate(token).await,
            Err(CredentialError::NotFound)
        ));
    }
    assert!(store.0.is_empty().await);
}
