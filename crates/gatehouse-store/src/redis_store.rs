//! Redis implementation of [`CredentialStore`] using `redis`.
//!
//! Holds a [`ConnectionManager`], which multiplexes one connection and
//! reconnects on failure. Cloning the manager is cheap; each call takes its
//! own clone so no lock is held across requests.
//!
//! A batch runs as one Lua script ([`BATCH_SCRIPT`]). Redis executes a
//! script without interleaving other clients' commands, which also covers
//! [`Command::DelReferenced`]: its pointer is read and followed inside the
//! same unit as the writes after it. Keys are passed as script arguments,
//! so this assumes a single Redis instance, not a cluster.

use std::time::Duration;

use redis::Script;
use redis::aio::ConnectionManager;

use crate::{Batch, Command, CredentialStore, StoreConfig, StoreError, with_deadline};

/// Interprets a flattened batch from `ARGV`:
/// `set key value px` (px 0 = no expiry), `del key`, `delref pointer prefix`.
const BATCH_SCRIPT: &str = r#"
local i = 1
while i <= #ARGV do
  local op = ARGV[i]
  if op == 'set' then
    local px = tonumber(ARGV[i + 3])
    if px > 0 then
      redis.call('SET', ARGV[i + 1], ARGV[i + 2], 'PX', px)
    else
      redis.call('SET', ARGV[i + 1], ARGV[i + 2])
    end
    i = i + 4
  elseif op == 'del' then
    redis.call('DEL', ARGV[i + 1])
    i = i + 2
  elseif op == 'delref' then
    local target = redis.call('GET', ARGV[i + 1])
    if target then
      redis.call('DEL', ARGV[i + 2] .. target)
    end
    i = i + 3
  else
    return redis.error_reply('unknown batch op ' .. op)
  end
end
return 1
"#;

/// A [`CredentialStore`] backed by a single Redis instance.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    config: StoreConfig,
}

impl RedisStore {
    /// Connects to `config.url`, bounded by `config.timeout_ms`.
    ///
    /// # Errors
    /// - [`StoreError::Unavailable`] if the URL is invalid or the server
    ///   cannot be reached.
    /// - [`StoreError::Timeout`] if connecting takes too long.
    pub async fn connect(config: StoreConfig) -> Result<Self, StoreError> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| StoreError::Unavailable(format!("invalid store url: {e}")))?;

        let conn = tokio::time::timeout(config.timeout(), client.get_connection_manager())
            .await
            .map_err(|_| StoreError::Timeout {
                op: "CONNECT",
                after: config.timeout(),
            })??;

        tracing::info!(url = %redact(&config.url), "connected to credential store");
        Ok(Self { conn, config })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}

impl CredentialStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        with_deadline(&self.config, "GET", true, || {
            let mut conn = self.conn.clone();
            let mut cmd = redis::cmd("GET");
            cmd.arg(key);
            async move {
                let value: Option<String> = cmd.query_async(&mut conn).await?;
                Ok(value)
            }
        })
        .await
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        // SET NX replies "OK" when it wrote the key and nil otherwise.
        with_deadline(&self.config, "SET NX", false, || {
            let mut conn = self.conn.clone();
            let mut cmd = redis::cmd("SET");
            cmd.arg(key).arg(value).arg("NX").arg("PX").arg(ttl_millis(ttl));
            async move {
                let reply: Option<String> = cmd.query_async(&mut conn).await?;
                Ok(reply.is_some())
            }
        })
        .await
    }

    async fn execute(&self, batch: Batch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }

        let args = script_args(&batch);
        let script = Script::new(BATCH_SCRIPT);

        // A re-run converges: each DelReferenced sees either the pointer the
        // batch itself wrote or none.
        with_deadline(&self.config, "EVAL", true, || {
            let mut conn = self.conn.clone();
            let mut invocation = script.prepare_invoke();
            for arg in &args {
                invocation.arg(arg);
            }
            async move {
                let _: i64 = invocation.invoke_async(&mut conn).await?;
                Ok(())
            }
        })
        .await
    }
}

/// Flattens `batch` into the argument list [`BATCH_SCRIPT`] reads.
fn script_args(batch: &Batch) -> Vec<String> {
    let mut args = Vec::with_capacity(batch.len() * 4);
    for command in batch.commands() {
        match command {
            Command::Set { key, value, ttl } => {
                let px = ttl.map_or(0, ttl_millis);
                args.extend(["set".into(), key.clone(), value.clone(), px.to_string()]);
            }
            Command::Del { key } => {
                args.extend(["del".into(), key.clone()]);
            }
            Command::DelReferenced { pointer, prefix } => {
                args.extend(["delref".into(), pointer.clone(), prefix.clone()]);
            }
        }
    }
    args
}

/// Redis rejects `PX 0`, so sub-millisecond TTLs round up to 1 ms.
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

/// Strips credentials from a connection URL before logging it.
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}
