//! `GatehouseServer` builder and serve loop.
//!
//! This is the entry point for running Gatehouse. It ties together all the
//! layers: store → session → authz/limit → HTTP.

use std::net::SocketAddr;

use axum::Router;
use axum::routing::{delete, get, post};
use gatehouse_protocol::Role;
use gatehouse_store::CredentialStore;
use tokio::net::TcpListener;

use crate::directory::UserDirectory;
use crate::handlers::{create_api_key, delete_api_key, force_logout, login, logout, whoami};
use crate::middleware::{protect, protect_self_or_role, rate_limit};
use crate::{GatehouseConfig, GatehouseError, GatehouseState};

/// The credential routes, with their gates, bound to `state`.
///
/// Merge your own routes into the result, wrapping them in the gates from
/// [`middleware`](crate::middleware) first.
pub fn routes<S, D>(state: GatehouseState<S, D>) -> Router
where
    S: CredentialStore + Clone,
    D: UserDirectory,
{
    let login_window = state.config().limits.login_window();

    let public = Router::new().route("/login", post(login::<S, D>));
    let public = rate_limit(public, &state, "/login", login_window);

    let signed_in = Router::new()
        .route("/logout", post(logout::<S, D>))
        .route("/whoami", get(whoami));
    let signed_in = protect(signed_in, &state, Role::Viewer);

    let admin = Router::new().route("/users/{id}/logout", post(force_logout::<S, D>));
    let admin = protect(admin, &state, Role::Admin);

    let keys = Router::new()
        .route("/users/{id}/apikeys", post(create_api_key::<S, D>))
        .route("/users/{id}/apikeys/{key_id}", delete(delete_api_key::<S, D>));
    let keys = protect_self_or_role(keys, &state, Role::Admin);

    Router::new()
        .merge(public)
        .merge(signed_in)
        .merge(admin)
        .merge(keys)
        .with_state(state)
}

/// Builder for configuring and starting a Gatehouse server.
///
/// # Example
///
/// ```rust,ignore
/// use gatehouse::prelude::*;
///
/// let server = GatehouseServer::builder()
///     .config(GatehouseConfig::load("gatehouse.json")?)
///     .build(Arc::new(MemoryStore::new()), my_directory);
/// server.run().await
/// ```
pub struct GatehouseServerBuilder {
    config: GatehouseConfig,
    extra: Router,
}

impl GatehouseServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: GatehouseConfig::default(),
            extra: Router::new(),
        }
    }

    pub fn config(mut self, config: GatehouseConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the bind address from the config.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind = addr.to_string();
        self
    }

    /// Extra application routes served next to the credential routes.
    pub fn merge(mut self, router: Router) -> Self {
        self.extra = self.extra.merge(router);
        self
    }

    /// Builds the server over `store` and `directory`.
    pub fn build<S, D>(self, store: S, directory: D) -> GatehouseServer<S, D>
    where
        S: CredentialStore + Clone,
        D: UserDirectory,
    {
        let state = GatehouseState::new(store, directory, self.config);
        GatehouseServer {
            extra: self.extra,
            state,
        }
    }

    /// Connects to the Redis store named in the config, then builds.
    #[cfg(feature = "redis")]
    pub async fn build_with_redis<D>(
        self,
        directory: D,
    ) -> Result<GatehouseServer<gatehouse_store::RedisStore, D>, GatehouseError>
    where
        D: UserDirectory,
    {
        let store = gatehouse_store::RedisStore::connect(self.config.store.clone()).await?;
        Ok(self.build(store, directory))
    }
}

impl Default for GatehouseServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A configured Gatehouse server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct GatehouseServer<S, D> {
    extra: Router,
    state: GatehouseState<S, D>,
}

impl GatehouseServer<(), ()> {
    /// Creates a new builder.
    pub fn builder() -> GatehouseServerBuilder {
        GatehouseServerBuilder::new()
    }
}

impl<S, D> GatehouseServer<S, D>
where
    S: CredentialStore + Clone,
    D: UserDirectory,
{
    pub fn state(&self) -> &GatehouseState<S, D> {
        &self.state
    }

    /// Adds application routes after the state exists, e.g. routes gated
    /// with [`team_guard`](crate::middleware::team_guard).
    pub fn merge(mut self, router: Router) -> Self {
        self.extra = self.extra.merge(router);
        self
    }

    /// The full router: credential routes plus any merged routes.
    pub fn router(&self) -> Router {
        routes(self.state.clone()).merge(self.extra.clone())
    }

    /// Binds the configured address and serves until the process ends.
    ///
    /// The router is served with connect info, so the rate limiter sees
    /// each client's peer address.
    pub async fn run(self) -> Result<(), GatehouseError> {
        let listener = TcpListener::bind(&self.state.config().bind).await?;
        let addr = listener.local_addr()?;
        tracing::info!(%addr, "Gatehouse server running");

        let app = self.router();
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
        Ok(())
    }
}
