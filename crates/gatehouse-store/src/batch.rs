//! Atomic command batches.

use std::time::Duration;

/// A single write inside a [`Batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Write `key = value`. `ttl: None` means the value never expires.
    Set {
        key: String,
        value: String,
        ttl: Option<Duration>,
    },
    /// Delete `key`. Deleting an absent key is not an error.
    Del { key: String },
    /// Delete `prefix` + the current value of `pointer`, reading `pointer`
    /// inside the same atomic unit. Does nothing if `pointer` is absent.
    DelReferenced { pointer: String, prefix: String },
}

/// An ordered list of writes applied as one unit.
///
/// Commands run in insertion order, so a `del` followed by a `set` of the
/// same key leaves the key set.
///
/// A [`del_referenced`](Batch::del_referenced) reads its pointer at the
/// moment the batch is applied, so the value it sees cannot change before
/// the later writes land.
///
/// ```rust
/// use std::time::Duration;
/// use gatehouse_store::Batch;
///
/// let ttl = Some(Duration::from_secs(60));
/// let batch = Batch::new()
///     .del_referenced("user-session:42", "session:")
///     .set("session:new", "42=3", ttl)
///     .set("user-session:42", "new", ttl);
/// assert_eq!(batch.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    commands: Vec<Command>,
}

impl Batch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a write.
    pub fn set(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        ttl: Option<Duration>,
    ) -> Self {
        self.commands.push(Command::Set {
            key: key.into(),
            value: value.into(),
            ttl,
        });
        self
    }

    /// Appends a delete.
    pub fn del(mut self, key: impl Into<String>) -> Self {
        self.commands.push(Command::Del { key: key.into() });
        self
    }

    /// Appends a delete of `prefix` + whatever `pointer` holds when the
    /// batch runs.
    pub fn del_referenced(
        mut self,
        pointer: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        self.commands.push(Command::DelReferenced {
            pointer: pointer.into(),
            prefix: prefix.into(),
        });
        self
    }

    /// The queued commands, in order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl IntoIterator for Batch {
    type Item = Command;
    type IntoIter = std::vec::IntoIter<Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_preserves_insertion_order() {
        let batch = Batch::new()
            .del("a")
            .set("b", "1", None)
            .del("c")
            .del_referenced("d", "p:");

        let keys: Vec<&str> = batch
            .commands()
            .iter()
            .map(|c| match c {
                Command::Set { key, .. } | Command::Del { key } => key.as_str(),
                Command::DelReferenced { pointer, .. } => pointer.as_str(),
            })
            .collect();
        assert_eq!(keys, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_batch_new_is_empty() {
        let batch = Batch::new();
        assert!(batch.is_empty());
        assert_eq!(batch.len(), 0);
    }
}
