//! # Gatehouse
//!
//! Session, API-key and role-based access control for axum services.
//!
//! Gatehouse issues and validates login sessions and API keys, and puts
//! authorization gates in front of routes: minimum role, self-or-role, and
//! team membership. Credentials live in a key-value store (Redis, or in
//! memory for tests); users, roles and teams stay in your own database,
//! reached through the [`UserDirectory`] trait.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gatehouse::prelude::*;
//!
//! // Implement UserDirectory for your database, then:
//! // let server = GatehouseServer::builder()
//! //     .config(GatehouseConfig::load("gatehouse.json")?)
//! //     .build_with_redis(my_directory)
//! //     .await?;
//! // server.run().await
//! ```
//!
//! ## Crate layout
//!
//! - `gatehouse-protocol` — ids, roles, records, codecs
//! - `gatehouse-store` — the key-value store abstraction
//! - `gatehouse-session` — token generator, session and API-key managers
//! - `gatehouse-authz` — gate decisions
//! - `gatehouse-limit` — rate limiter
//! - this crate — axum middleware, handlers, config, server

pub mod config;
pub mod cookie;
pub mod directory;
mod error;
pub mod handlers;
pub mod middleware;
mod server;
mod state;
pub mod telemetry;

pub use config::{ConfigError, CookieConfig, GatehouseConfig, LimitsConfig};
pub use directory::{DirectoryError, UserAccount, UserDirectory};
pub use error::{ApiError, GatehouseError};
pub use middleware::Caller;
pub use server::{GatehouseServer, GatehouseServerBuilder, routes};
pub use state::GatehouseState;

/// Everything an application needs to wire Gatehouse in.
pub mod prelude {
    pub use crate::middleware::{guard, protect, protect_self_or_role, rate_limit, team_guard};
    pub use crate::telemetry::init_tracing;
    pub use crate::{
        ApiError, Caller, DirectoryError, GatehouseConfig, GatehouseError, GatehouseServer,
        GatehouseState, UserAccount, UserDirectory, routes,
    };
    pub use gatehouse_authz::{Gate, MembershipError, MembershipSource};
    pub use gatehouse_protocol::{ApiKeyId, Identity, Role, TeamId, UserId};
    pub use gatehouse_session::IssuedKey;
    pub use gatehouse_store::{CredentialStore, MemoryStore, StoreConfig};
    #[cfg(feature = "redis")]
    pub use gatehouse_store::RedisStore;
}
