//! Axum middleware: authorization gates and rate limiting.
//!
//! Gates are applied with [`Router::route_layer`], so they only run for
//! requests that matched a route and can see its path parameters. Each
//! gate:
//!
//! 1. resolves a credential: the session cookie, or the bearer API key if
//!    there is no cookie or it names no live session → 401 if neither
//!    resolves
//! 2. evaluates its [`Gate`] against the identity and the path's `{id}` /
//!    `{team_id}` → 403 if denied
//! 3. stores the [`Identity`] in the request extensions, where handlers
//!    read it through the [`Caller`] extractor
//!
//! Any internal failure along the way (store, corrupted record, membership
//! lookup) is a 500, never an allow.

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::rejection::RawPathParamsRejection;
use axum::extract::{ConnectInfo, FromRequestParts, RawPathParams, Request, State};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use axum::middleware::{Next, from_fn_with_state};
use axum::Router;
use axum::response::Response;
use gatehouse_authz::{Gate, Target};
use gatehouse_limit::LimitDecision;
use gatehouse_protocol::{Identity, Role, TeamId, UserId};
use gatehouse_session::{Authenticator, CredentialError};
use gatehouse_store::CredentialStore;

use crate::cookie::credentials_from_headers;
use crate::directory::UserDirectory;
use crate::{ApiError, GatehouseState};

/// Wraps every route of `router` in `gate`.
pub fn guard<S, D>(
    router: Router<GatehouseState<S, D>>,
    state: &GatehouseState<S, D>,
    gate: Gate,
) -> Router<GatehouseState<S, D>>
where
    S: CredentialStore + Clone,
    D: UserDirectory,
{
    router.route_layer(from_fn_with_state((state.clone(), gate), enforce::<S, D>))
}

/// Requires a role of at least `min`.
pub fn protect<S, D>(
    router: Router<GatehouseState<S, D>>,
    state: &GatehouseState<S, D>,
    min: Role,
) -> Router<GatehouseState<S, D>>
where
    S: CredentialStore + Clone,
    D: UserDirectory,
{
    guard(router, state, Gate::protect(min))
}

/// Requires a role of at least `min`, or that the caller is the `{id}`
/// user of the path.
pub fn protect_self_or_role<S, D>(
    router: Router<GatehouseState<S, D>>,
    state: &GatehouseState<S, D>,
    min: Role,
) -> Router<GatehouseState<S, D>>
where
    S: CredentialStore + Clone,
    D: UserDirectory,
{
    guard(router, state, Gate::self_or_role(min))
}

/// Requires membership of the `{team_id}` team of the path, for roles
/// between `min` and `free_pass`.
pub fn team_guard<S, D>(
    router: Router<GatehouseState<S, D>>,
    state: &GatehouseState<S, D>,
    min: Role,
    free_pass: Role,
) -> Router<GatehouseState<S, D>>
where
    S: CredentialStore + Clone,
    D: UserDirectory,
{
    guard(router, state, Gate::team(min, free_pass))
}

/// Admits one request per `window` per client to the routes of `router`.
/// `route` names the bucket in the store.
pub fn rate_limit<S, D>(
    router: Router<GatehouseState<S, D>>,
    state: &GatehouseState<S, D>,
    route: &'static str,
    window: Duration,
) -> Router<GatehouseState<S, D>>
where
    S: CredentialStore + Clone,
    D: UserDirectory,
{
    router.route_layer(from_fn_with_state(
        (state.clone(), route, window),
        throttle::<S, D>,
    ))
}

async fn enforce<S, D>(
    State((state, gate)): State<(GatehouseState<S, D>, Gate)>,
    params: Result<RawPathParams, RawPathParamsRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    S: CredentialStore + Clone,
    D: UserDirectory,
{
    let identity = authenticate(&state, request.headers()).await?;
    let target = target_from(params.ok().as_ref())?;

    gate.authorize(&identity, &target, state.directory()).await?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

async fn authenticate<S, D>(
    state: &GatehouseState<S, D>,
    headers: &HeaderMap,
) -> Result<Identity, ApiError>
where
    S: CredentialStore,
{
    let cookie_name = &state.config().cookie.name;
    let credentials = credentials_from_headers(headers, cookie_name);
    if credentials.is_empty() {
        tracing::debug!("no credential presented");
        return Err(ApiError::Unauthorized);
    }

    // A stale cookie falls through to the bearer key; store and decode
    // failures stop here.
    for credential in &credentials {
        match state.credentials().authenticate(credential).await {
            Ok(identity) => return Ok(identity),
            Err(CredentialError::NotFound) => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(ApiError::Unauthorized)
}

/// Reads `{id}` and `{team_id}` from the matched path. A present but
/// non-numeric value is a 400.
fn target_from(params: Option<&RawPathParams>) -> Result<Target, ApiError> {
    let mut target = Target::default();
    let Some(params) = params else {
        return Ok(target);
    };
    for (name, value) in params {
        match name {
            "id" => target.user_id = Some(UserId(parse_id(value)?)),
            "team_id" => target.team_id = Some(TeamId(parse_id(value)?)),
            _ => {}
        }
    }
    Ok(target)
}

fn parse_id(raw: &str) -> Result<u64, ApiError> {
    raw.parse().map_err(|_| ApiError::BadRequest)
}

async fn throttle<S, D>(
    State((state, route, window)): State<(GatehouseState<S, D>, &'static str, Duration)>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    S: CredentialStore + Clone,
    D: UserDirectory,
{
    let client = client_address(&request, state.config().limits.trust_forwarded_for);
    match state.limiter().limit(&client, route, window).await? {
        LimitDecision::Allowed => Ok(next.run(request).await),
        LimitDecision::Rejected => Err(ApiError::TooManyRequests),
    }
}

/// The address a rate-limit bucket is keyed by: the first
/// `X-Forwarded-For` hop when trusted, else the TCP peer's IP.
fn client_address(request: &Request, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|hop| !hop.is_empty());
        if let Some(hop) = forwarded {
            return hop.to_string();
        }
    }

    match request.extensions().get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(peer)) => peer.ip().to_string(),
        // Served without connect info: all such clients share a bucket.
        None => "unknown".to_string(),
    }
}

/// The identity a gate attached to the request.
///
/// Only available on gated routes; elsewhere extraction fails with 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub Identity);

impl<St: Send + Sync> FromRequestParts<St> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .copied()
            .map(Caller)
            .ok_or(ApiError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn request(forwarded: Option<&str>, peer: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/login");
        if let Some(value) = forwarded {
            builder = builder.header("x-forwarded-for", value);
        }
        let mut request = builder.body(Body::empty()).unwrap();
        if let Some(addr) = peer {
            request
                .extensions_mut()
                .insert(ConnectInfo(addr.parse::<SocketAddr>().unwrap()));
        }
        request
    }

    #[test]
    fn test_client_address_uses_peer_ip_without_port() {
        let req = request(None, Some("10.1.2.3:55555"));
        assert_eq!(client_address(&req, false), "10.1.2.3");
    }

    #[test]
    fn test_client_address_ignores_forwarded_unless_trusted() {
        let req = request(Some("1.2.3.4, 10.0.0.1"), Some("10.0.0.1:80"));
        assert_eq!(client_address(&req, false), "10.0.0.1");
        assert_eq!(client_address(&req, true), "1.2.3.4");
    }

    #[test]
    fn test_client_address_without_connect_info() {
        assert_eq!(client_address(&request(None, None), true), "unknown");
    }

    #[test]
    fn test_target_from_none_is_empty() {
        assert_eq!(target_from(None).unwrap(), Target::default());
    }
}
