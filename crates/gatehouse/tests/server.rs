//! Tests for the server builder.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::Router;
use gatehouse::prelude::*;
use tower::ServiceExt;

struct Nobody;

impl MembershipSource for Nobody {
    async fn team_member_exists(&self, _: TeamId, _: UserId) -> Result<bool, MembershipError> {
        Ok(false)
    }
}

impl UserDirectory for Nobody {
    async fn verify_login(&self, _: &str, _: &str) -> Result<Option<UserAccount>, DirectoryError> {
        Ok(None)
    }

    async fn user_role(&self, _: UserId) -> Result<Option<Role>, DirectoryError> {
        Ok(None)
    }

    async fn create_api_key(&self, _: UserId, _: u32) -> Result<ApiKeyId, DirectoryError> {
        Err(DirectoryError("read-only directory".into()))
    }

    async fn delete_api_key(&self, _: UserId, _: ApiKeyId) -> Result<bool, DirectoryError> {
        Ok(false)
    }
}

#[tokio::test]
async fn test_builder_merges_extra_routes() {
    let server = GatehouseServer::builder()
        .bind("127.0.0.1:0")
        .merge(Router::new().route("/health", get(|| async { "ok" })))
        .build(Arc::new(MemoryStore::new()), Nobody);

    assert_eq!(server.state().config().bind, "127.0.0.1:0");

    let app = server.router();
    let health = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    let whoami = app
        .oneshot(Request::get("/whoami").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(whoami.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_builder_uses_given_config() {
    let mut config = GatehouseConfig::default();
    config.cookie.name = "gh".into();

    let server = GatehouseServer::builder()
        .config(config)
        .build(Arc::new(MemoryStore::new()), Nobody);

    assert_eq!(server.state().config().cookie.name, "gh");
}

#[cfg(feature = "redis")]
#[tokio::test]
async fn test_build_with_redis_invalid_url_is_store_error() {
    let mut config = GatehouseConfig::default();
    config.store.url = "not a url".into();

    let result = GatehouseServer::builder()
        .config(config)
        .build_with_redis(Nobody)
        .await;

    assert!(matches!(result, Err(GatehouseError::Store(_))));
}
