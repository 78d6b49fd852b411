//! Development server: Gatehouse over an in-memory directory.
//!
//! ```text
//! GATEHOUSE_CONFIG=gatehouse.json   optional JSON config file
//! GATEHOUSE_REDIS=1                 use the Redis store from the config
//!                                   instead of the in-memory one
//! RUST_LOG=debug                    log filter
//! ```
//!
//! Seeded users log in with their name as password: `viewer`, `manager`,
//! `admin`, `master`. `GET /teams/{team_id}/dashboard` is team-guarded;
//! `viewer` is a member of team 1.

mod directory;

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::routing::get;
use gatehouse::prelude::*;
use serde_json::{Value, json};

use crate::directory::DevDirectory;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = match std::env::var("GATEHOUSE_CONFIG") {
        Ok(path) => GatehouseConfig::load(path)?,
        Err(_) => dev_config(),
    };
    let directory = DevDirectory::seeded().map_err(|e| e.to_string())?;
    let builder = GatehouseServer::builder().config(config);

    if std::env::var_os("GATEHOUSE_REDIS").is_some() {
        serve(builder.build_with_redis(directory).await?).await?;
    } else {
        serve(builder.build(Arc::new(MemoryStore::new()), directory)).await?;
    }
    Ok(())
}

/// Defaults suitable for plain-HTTP localhost.
fn dev_config() -> GatehouseConfig {
    let mut config = GatehouseConfig::default();
    config.cookie.secure = false;
    config
}

async fn serve<S>(server: GatehouseServer<S, DevDirectory>) -> Result<(), GatehouseError>
where
    S: CredentialStore + Clone,
{
    let state = server.state().clone();

    let teams = Router::new().route("/teams/{team_id}/dashboard", get(dashboard));
    let teams = team_guard(teams, &state, Role::Viewer, Role::Master).with_state(state.clone());
    let server = server.merge(teams);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = sweep_expired_keys(&state).await {
                tracing::warn!(error = %e, "api key sweep failed");
            }
        }
    });

    server.run().await
}

async fn sweep_expired_keys<S>(
    state: &GatehouseState<S, DevDirectory>,
) -> Result<(), GatehouseError>
where
    S: CredentialStore + Clone,
{
    let issued = state.directory().issued_keys()?;
    let revoked = state
        .api_keys()
        .revoke_expired(&issued, SystemTime::now())
        .await?;
    state.directory().forget_keys(&revoked)?;
    Ok(())
}

async fn dashboard(Caller(identity): Caller, Path(team_id): Path<u64>) -> Json<Value> {
    Json(json!({
        "team_id": team_id,
        "viewer": identity,
    }))
}
