//! HTTP handlers for the credential endpoints.
//!
//! | Route | Gate | Effect |
//! |---|---|---|
//! | `POST /login` | rate limit | new session, `Set-Cookie` |
//! | `POST /logout` | session cookie | remove own session, clear cookie |
//! | `POST /users/{id}/logout` | Admin | remove someone else's session |
//! | `POST /users/{id}/apikeys` | self or Admin | issue an API key |
//! | `DELETE /users/{id}/apikeys/{key_id}` | self or Admin | revoke an API key |
//! | `GET /whoami` | any identity | echo the resolved identity |

use axum::Json;
use axum::extract::{Path, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use gatehouse_authz::may_manage;
use gatehouse_protocol::{ApiKeyId, ApiKeyRecord, CredentialKind, Identity, Role, UserId};
use gatehouse_store::CredentialStore;
use serde::{Deserialize, Serialize};

use crate::cookie::{clear_cookie, session_cookie};
use crate::directory::UserDirectory;
use crate::middleware::Caller;
use crate::{ApiError, GatehouseState};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: UserId,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct NewApiKeyRequest {
    /// 0 means the key never expires.
    #[serde(default)]
    pub ttl_hours: u32,
}

/// Returned once at issuance; the token is never shown again.
#[derive(Debug, Serialize, Deserialize)]
pub struct NewApiKeyResponse {
    pub id: ApiKeyId,
    pub token: String,
    pub ttl_hours: u32,
}

pub async fn login<S, D>(
    State(state): State<GatehouseState<S, D>>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, ApiError>
where
    S: CredentialStore + Clone,
    D: UserDirectory,
{
    let Some(account) = state
        .directory()
        .verify_login(&body.username, &body.password)
        .await?
    else {
        tracing::debug!("login rejected");
        return Err(ApiError::Unauthorized);
    };

    let token = state
        .sessions()
        .new_session(account.user_id, account.role)
        .await?;

    let config = state.config();
    let cookie = session_cookie(&config.cookie, &token, config.session.ttl_secs)
        .ok_or(ApiError::Internal)?;

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    let body = LoginResponse {
        user_id: account.user_id,
        role: account.role,
    };
    Ok((StatusCode::OK, headers, Json(body)).into_response())
}

/// Ends the caller's own session. Only a session cookie can log out; an
/// API key is not a session and gets 401.
pub async fn logout<S, D>(
    State(state): State<GatehouseState<S, D>>,
    Caller(identity): Caller,
) -> Result<Response, ApiError>
where
    S: CredentialStore + Clone,
    D: UserDirectory,
{
    if identity.via != CredentialKind::Session {
        tracing::debug!(user_id = %identity.user_id, "logout without a session");
        return Err(ApiError::Unauthorized);
    }

    state.sessions().remove_session(identity.user_id).await?;

    let mut headers = HeaderMap::new();
    if let Some(cookie) = clear_cookie(&state.config().cookie) {
        headers.insert(SET_COOKIE, cookie);
    }
    Ok((StatusCode::NO_CONTENT, headers).into_response())
}

/// Ends another user's session. The target may not outrank the caller.
pub async fn force_logout<S, D>(
    State(state): State<GatehouseState<S, D>>,
    Caller(identity): Caller,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError>
where
    S: CredentialStore + Clone,
    D: UserDirectory,
{
    let target = UserId(id);
    let target_role = state
        .directory()
        .user_role(target)
        .await?
        .ok_or(ApiError::NotFound)?;
    may_manage(&identity, target_role)?;

    state.sessions().remove_session(target).await?;

    tracing::info!(actor = %identity.user_id, %target, "forced logout");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_api_key<S, D>(
    State(state): State<GatehouseState<S, D>>,
    Caller(identity): Caller,
    Path(id): Path<u64>,
    Json(body): Json<NewApiKeyRequest>,
) -> Result<(StatusCode, Json<NewApiKeyResponse>), ApiError>
where
    S: CredentialStore + Clone,
    D: UserDirectory,
{
    let owner = UserId(id);
    let owner_role = state
        .directory()
        .user_role(owner)
        .await?
        .ok_or(ApiError::NotFound)?;
    if owner != identity.user_id {
        may_manage(&identity, owner_role)?;
    }

    let key_id = state
        .directory()
        .create_api_key(owner, body.ttl_hours)
        .await?;
    let record = ApiKeyRecord {
        id: key_id,
        user_id: owner,
        role: owner_role,
    };

    let token = match state.api_keys().new_api_key(record, body.ttl_hours).await {
        Ok(token) => token,
        Err(e) => {
            // Drop the orphaned row so the directory does not list a key
            // that never worked.
            if let Err(cleanup) = state.directory().delete_api_key(owner, key_id).await {
                tracing::warn!(%key_id, error = %cleanup, "failed to drop api key row");
            }
            return Err(e.into());
        }
    };

    let response = NewApiKeyResponse {
        id: key_id,
        token,
        ttl_hours: body.ttl_hours,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Revokes a key. Idempotent; a key that belongs to someone else is left
/// alone and answered like a missing one.
pub async fn delete_api_key<S, D>(
    State(state): State<GatehouseState<S, D>>,
    Caller(identity): Caller,
    Path((id, key_id)): Path<(u64, u64)>,
) -> Result<StatusCode, ApiError>
where
    S: CredentialStore + Clone,
    D: UserDirectory,
{
    let owner = UserId(id);
    let key_id = ApiKeyId(key_id);

    if owner != identity.user_id {
        let owner_role = state
            .directory()
            .user_role(owner)
            .await?
            .ok_or(ApiError::NotFound)?;
        may_manage(&identity, owner_role)?;
    }

    match state.api_keys().lookup(key_id).await? {
        Some(record) if record.user_id == owner => {
            state.api_keys().remove_api_key(key_id).await?;
        }
        Some(_) => {
            tracing::debug!(%key_id, %owner, "api key belongs to another user");
            return Ok(StatusCode::NO_CONTENT);
        }
        None => {}
    }
    state.directory().delete_api_key(owner, key_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn whoami(Caller(identity): Caller) -> Json<Identity> {
    Json(identity)
}
