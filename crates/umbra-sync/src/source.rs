//! event source abstraction
//!
//! the host chain's event index is an external collaborator; scanners only
//! need ordered, paginated access by `(block, index)` cursor plus a point
//! query into the on-chain nullifier registry

use serde::{Deserialize, Serialize};
use thiserror::Error;

use umbra_pool::{PoolEvent, PoolId};
use umbra_core::Nullifier;

/// deterministic position of an event in chain history
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Cursor {
    pub block: u64,
    pub index: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SourceError {
    /// network or index hiccup; safe to retry
    #[error("transient index failure: {0}")]
    Transient(String),

    /// the index rejected the query outright
    #[error("permanent index failure: {0}")]
    Permanent(String),
}

impl SourceError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SourceError::Transient(_))
    }
}

/// paginated, canonically ordered access to a pool's event history
#[allow(async_fn_in_trait)]
pub trait EventSource {
    /// events touching `pool` strictly after `after`, in `(block, index)`
    /// order, at most `limit` of them
    async fn page(
        &self,
        pool: &PoolId,
        after: Option<Cursor>,
        limit: usize,
    ) -> Result<Vec<(Cursor, PoolEvent)>, SourceError>;

    /// whether the on-chain registry already holds this nullifier
    async fn nullifier_spent(
        &self,
        pool: &PoolId,
        nullifier: &Nullifier,
    ) -> Result<bool, SourceError>;
}

/// in-process event index; the host stand-in for tests and local pipelines
#[derive(Clone, Debug, Default)]
pub struct MemoryEventIndex {
    events: Vec<(Cursor, PoolEvent)>,
    next_block: u64,
}

impl MemoryEventIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// append an event, assigning it the next cursor
    pub fn publish(&mut self, event: PoolEvent) -> Cursor {
        let cursor = Cursor {
            block: self.next_block,
            index: 0,
        };
        self.next_block += 1;
        self.events.push((cursor, event));
        cursor
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSource for MemoryEventIndex {
    async fn page(
        &self,
        pool: &PoolId,
        after: Option<Cursor>,
        limit: usize,
    ) -> Result<Vec<(Cursor, PoolEvent)>, SourceError> {
        Ok(self
            .events
            .iter()
            .filter(|(cursor, event)| {
                after.map_or(true, |a| *cursor > a) && event.touches(pool)
            })
            .take(limit)
            .cloned()
            .collect())
    }

    async fn nullifier_spent(
        &self,
        pool: &PoolId,
        nullifier: &Nullifier,
    ) -> Result<bool, SourceError> {
        let spent = self.events.iter().any(|(_, event)| match event {
            PoolEvent::Unshield(e) => e.pool == *pool && e.nullifier == *nullifier,
            PoolEvent::Transfer(e) => {
                e.pool == *pool && e.input_nullifiers.contains(nullifier)
            }
            PoolEvent::Swap(e) => {
                e.pool_in == *pool && e.input_nullifiers.contains(nullifier)
            }
            PoolEvent::Shield(_) => false,
        });
        Ok(spent)
    }
}
