//! In-process store modelling the two consistency regimes.
//!
//! Lookups and ancestor-scoped queries read the latest committed version of
//! every entity. Queries without an ancestor only see versions older than the
//! configured visibility delay, which stands in for index replication lag.
//! Writes to one entity group are serialized by the state lock.

use crate::error::{StoreError, StoreOp, StoreResult};
use crate::key::Key;
use crate::query::Query;
use crate::store::Datastore;
use crate::Properties;
use async_trait::async_trait;
use rand::Rng;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Documented sustained write rate for one entity group.
pub const DEFAULT_GROUP_WRITES_PER_SECOND: usize = 1;

/// Upper bound for scattered ids, keeping them exact in JSON doubles.
const MAX_SCATTERED_ID: i64 = 1 << 52;

/// How the store picks ids for incomplete keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdPolicy {
    /// 1, 2, 3, ... across the whole store.
    Sequential,
    /// Random positive ids, avoiding hot key ranges.
    #[default]
    Scattered,
}

/// Configuration for [`MemoryDatastore`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// How long a write stays invisible to queries without an ancestor.
    pub eventual_delay: Duration,

    /// Id allocation policy.
    pub id_policy: IdPolicy,

    /// Writes per second per entity group before contention is logged.
    pub group_writes_per_second: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            eventual_delay: Duration::ZERO,
            id_policy: IdPolicy::default(),
            group_writes_per_second: DEFAULT_GROUP_WRITES_PER_SECOND,
        }
    }
}

impl StoreConfig {
    /// Create a config with immediate visibility everywhere.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the visibility delay for queries without an ancestor.
    pub fn with_eventual_delay(mut self, delay: Duration) -> Self {
        self.eventual_delay = delay;
        self
    }

    /// Set the id allocation policy.
    pub fn with_id_policy(mut self, policy: IdPolicy) -> Self {
        self.id_policy = policy;
        self
    }

    /// Set the per-group write rate used for contention warnings.
    pub fn with_group_writes_per_second(mut self, writes: usize) -> Self {
        self.group_writes_per_second = writes;
        self
    }
}

#[derive(Debug, Clone)]
struct Version {
    properties: Properties,
    committed_at: Instant,
    seq: u64,
}

#[derive(Debug, Default)]
struct State {
    entities: HashMap<Key, Vec<Version>>,
    next_id: i64,
    seq: u64,
    group_writes: HashMap<Key, VecDeque<Instant>>,
}

impl State {
    fn allocate_id(&mut self, template: &Key, policy: IdPolicy) -> Key {
        loop {
            let id = match policy {
                IdPolicy::Sequential => {
                    self.next_id += 1;
                    self.next_id
                }
                IdPolicy::Scattered => rand::thread_rng().gen_range(1..=MAX_SCATTERED_ID),
            };
            let candidate = template.completed(id);
            if !self.entities.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    /// Record a write against the key's group; returns the writes in the last second.
    fn record_group_write(&mut self, key: &Key, now: Instant) -> usize {
        let window = self.group_writes.entry(key.root().clone()).or_default();
        window.push_back(now);
        while window
            .front()
            .is_some_and(|t| now.duration_since(*t) >= Duration::from_secs(1))
        {
            window.pop_front();
        }
        window.len()
    }
}

/// Armed failure for one operation.
#[derive(Debug, Clone, Copy)]
struct Armed {
    skip: usize,
    fail: usize,
}

/// Armed failures per operation.
#[derive(Debug, Default)]
struct Failpoints {
    armed: Mutex<HashMap<StoreOp, Armed>>,
}

impl Failpoints {
    fn arm(&self, op: StoreOp, skip: usize, fail: usize) {
        let mut armed = self.armed.lock().unwrap_or_else(|e| e.into_inner());
        armed.insert(op, Armed { skip, fail });
    }

    fn check(&self, op: StoreOp) -> StoreResult<()> {
        let mut armed = self.armed.lock().unwrap_or_else(|e| e.into_inner());
        let Some(state) = armed.get_mut(&op) else {
            return Ok(());
        };
        if state.skip > 0 {
            state.skip -= 1;
            return Ok(());
        }
        if state.fail == 0 {
            armed.remove(&op);
            return Ok(());
        }
        state.fail -= 1;
        Err(StoreError::Transient {
            op,
            reason: "injected failure".to_string(),
        })
    }
}

/// In-memory [`Datastore`].
#[derive(Debug, Default)]
pub struct MemoryDatastore {
    config: StoreConfig,
    state: RwLock<State>,
    failpoints: Failpoints,
}

impl MemoryDatastore {
    /// Create an empty store with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with the given configuration.
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// The store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Fail the next `count` calls of `op` with [`StoreError::Transient`].
    pub fn fail_next(&self, op: StoreOp, count: usize) {
        self.failpoints.arm(op, 0, count);
    }

    /// Let `skip` calls of `op` succeed, then fail the following `count`.
    pub fn fail_after(&self, op: StoreOp, skip: usize, count: usize) {
        self.failpoints.arm(op, skip, count);
    }

    /// Number of stored entities of a kind, regardless of visibility.
    pub async fn count(&self, kind: &str) -> usize {
        let state = self.state.read().await;
        state.entities.keys().filter(|k| k.kind() == kind).count()
    }

    fn latest(versions: &[Version]) -> Option<&Version> {
        versions.last()
    }

    fn visible<'a>(&self, versions: &'a [Version], now: Instant) -> Option<&'a Version> {
        versions
            .iter()
            .rev()
            .find(|v| v.committed_at + self.config.eventual_delay <= now)
    }

    /// Drop versions superseded by one that is already visible everywhere.
    fn prune(&self, versions: &mut Vec<Version>, now: Instant) {
        let delay = self.config.eventual_delay;
        if let Some(pos) = versions
            .iter()
            .rposition(|v| v.committed_at + delay <= now)
        {
            versions.drain(..pos);
        }
    }
}

#[async_trait]
impl Datastore for MemoryDatastore {
    async fn put(&self, key: &Key, properties: Properties) -> StoreResult<Key> {
        self.failpoints.check(StoreOp::Put)?;
        if !key.has_complete_ancestry() {
            return Err(StoreError::IncompleteParent { key: key.clone() });
        }

        let mut state = self.state.write().await;
        let resolved = if key.is_complete() {
            key.clone()
        } else {
            state.allocate_id(key, self.config.id_policy)
        };

        let now = Instant::now();
        state.seq += 1;
        let seq = state.seq;
        let versions = state.entities.entry(resolved.clone()).or_default();
        versions.push(Version {
            properties,
            committed_at: now,
            seq,
        });
        self.prune(versions, now);

        let recent = state.record_group_write(&resolved, now);
        if recent > self.config.group_writes_per_second {
            tracing::warn!(
                group = %resolved.root(),
                writes_last_second = recent,
                limit = self.config.group_writes_per_second,
                "entity group write rate above sustained limit"
            );
        }

        tracing::debug!(key = %resolved, seq, "put");
        Ok(resolved)
    }

    async fn get(&self, key: &Key) -> StoreResult<Properties> {
        self.failpoints.check(StoreOp::Get)?;
        if !key.is_complete() {
            return Err(StoreError::IncompleteKey { key: key.clone() });
        }

        let state = self.state.read().await;
        let found = state
            .entities
            .get(key)
            .and_then(|versions| Self::latest(versions))
            .map(|v| v.properties.clone());
        tracing::debug!(key = %key, found = found.is_some(), "get");
        found.ok_or_else(|| StoreError::NoSuchEntity { key: key.clone() })
    }

    async fn get_all(&self, query: &Query) -> StoreResult<Vec<(Key, Properties)>> {
        self.failpoints.check(StoreOp::GetAll)?;
        if let Some(ancestor) = query.ancestor_key() {
            if !ancestor.is_complete() || !ancestor.has_complete_ancestry() {
                return Err(StoreError::IncompleteKey {
                    key: ancestor.clone(),
                });
            }
        }

        let strong = query.is_ancestor_scoped();
        let now = Instant::now();
        let state = self.state.read().await;

        let mut matched: Vec<(&Key, &Version)> = state
            .entities
            .iter()
            .filter_map(|(key, versions)| {
                let version = if strong {
                    Self::latest(versions)
                } else {
                    self.visible(versions, now)
                }?;
                query
                    .matches(key, &version.properties)
                    .then_some((key, version))
            })
            .collect();

        // Ties follow commit order in the direction of the requested ordering.
        let descending = query
            .ordering()
            .is_some_and(|o| o.direction == crate::query::Direction::Descending);
        matched.sort_by(|(_, a), (_, b)| {
            query.compare(&a.properties, &b.properties).then_with(|| {
                if descending {
                    b.seq.cmp(&a.seq)
                } else {
                    a.seq.cmp(&b.seq)
                }
            })
        });

        if let Some(limit) = query.result_limit() {
            matched.truncate(limit);
        }

        tracing::debug!(
            kind = query.kind(),
            strong,
            results = matched.len(),
            "get_all"
        );

        Ok(matched
            .into_iter()
            .map(|(key, version)| (key.clone(), version.properties.clone()))
            .collect())
    }
}
