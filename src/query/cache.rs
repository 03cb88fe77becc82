use std::collections::HashMap;
use std::hash::Hash;

use tokio::sync::watch;

use super::result::QueryResult;
use crate::error::ApiError;

/// Outcome broadcast to every caller waiting on one fetch.
pub type Outcome<V> = Option<Result<V, ApiError>>;

/// State of one cache entry.
#[derive(Debug)]
pub enum EntryState<V> {
    Fresh(V),
    /// Served for display but refetched on next access.
    Stale(V),
    Pending {
        fetch_id: u64,
        epoch: u64,
        previous: Option<V>,
        rx: watch::Receiver<Outcome<V>>,
    },
    Failed {
        error: ApiError,
        previous: Option<V>,
    },
}

/// What a caller should do after asking the cache for a key.
pub enum Begin<V> {
    /// Fresh data, no network needed.
    Hit(V),
    /// A fetch is already running; wait on it.
    Join {
        fetch_id: u64,
        rx: watch::Receiver<Outcome<V>>,
    },
    /// Caller owns a new fetch and must report through `tx`.
    Fetch {
        fetch_id: u64,
        tx: watch::Sender<Outcome<V>>,
        rx: watch::Receiver<Outcome<V>>,
    },
}

/// Content-addressed store for one query family.
///
/// All methods are synchronous; the owner keeps them behind a lock that is
/// never held across an await, which makes each transition atomic with
/// respect to suspended fetches.
///
/// With a capacity set, inserting past it evicts the least recently used
/// stale or failed entries. Fresh and pending entries are never evicted, so
/// the cap is soft.
#[derive(Debug)]
pub struct QueryCache<K, V> {
    entries: HashMap<K, EntryState<V>>,
    touched: HashMap<K, u64>,
    clock: u64,
    capacity: Option<usize>,
    next_fetch_id: u64,
    epoch: u64,
}

impl<K, V> Default for QueryCache<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            touched: HashMap::new(),
            clock: 0,
            capacity: None,
            next_fetch_id: 0,
            epoch: 0,
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> QueryCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache that evicts inactive entries once it holds more than `capacity`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn state(&self, key: &K) -> Option<&EntryState<V>> {
        self.entries.get(key)
    }

    /// True while a fetch for `key` is outstanding.
    pub fn is_pending(&self, key: &K) -> bool {
        matches!(self.entries.get(key), Some(EntryState::Pending { .. }))
    }

    /// Look up `key`, registering a pending fetch when nothing usable is cached.
    pub fn begin(&mut self, key: &K) -> Begin<V> {
        self.touch(key);
        let previous = match self.entries.get(key) {
            Some(EntryState::Fresh(data)) => return Begin::Hit(data.clone()),
            Some(EntryState::Pending { fetch_id, rx, .. }) => {
                return Begin::Join {
                    fetch_id: *fetch_id,
                    rx: rx.clone(),
                }
            }
            Some(EntryState::Stale(data)) => Some(data.clone()),
            Some(EntryState::Failed { previous, .. }) => previous.clone(),
            None => None,
        };

        let fetch_id = self.next_fetch_id;
        self.next_fetch_id += 1;
        let (tx, rx) = watch::channel(None);
        self.entries.insert(
            key.clone(),
            EntryState::Pending {
                fetch_id,
                epoch: self.epoch,
                previous,
                rx: rx.clone(),
            },
        );
        self.evict();
        Begin::Fetch { fetch_id, tx, rx }
    }

    /// Record the result of fetch `fetch_id`.
    ///
    /// Ignored when the entry no longer belongs to that fetch (for example
    /// it was seeded meanwhile). Data fetched across an invalidation is
    /// stored stale.
    pub fn complete(&mut self, key: &K, fetch_id: u64, result: Result<V, ApiError>) {
        let Some(entry) = self.entries.get_mut(key) else {
            return;
        };
        let (epoch, previous) = match entry {
            EntryState::Pending {
                fetch_id: id,
                epoch,
                previous,
                ..
            } if *id == fetch_id => (*epoch, previous.take()),
            _ => return,
        };

        *entry = match result {
            Ok(data) if epoch == self.epoch => EntryState::Fresh(data),
            Ok(data) => EntryState::Stale(data),
            Err(error) => EntryState::Failed { error, previous },
        };
    }

    /// Insert `data` as fresh, bypassing any fetch.
    pub fn seed(&mut self, key: K, data: V) {
        self.touch(&key);
        self.entries.insert(key, EntryState::Fresh(data));
        self.evict();
    }

    /// Mark every entry stale. Returns how many fresh entries were affected.
    pub fn invalidate_all(&mut self) -> usize {
        self.epoch += 1;
        let mut count = 0;
        for entry in self.entries.values_mut() {
            if let EntryState::Fresh(data) = entry {
                *entry = EntryState::Stale(data.clone());
                count += 1;
            }
        }
        count
    }

    /// Mark one entry stale so the next access refetches it.
    pub fn invalidate(&mut self, key: &K) {
        if let Some(entry) = self.entries.get_mut(key) {
            match entry {
                EntryState::Fresh(data) => *entry = EntryState::Stale(data.clone()),
                EntryState::Pending { epoch, .. } => *epoch = epoch.wrapping_sub(1),
                _ => {}
            }
        }
    }

    /// Every fresh entry, for dehydration.
    pub fn fresh_entries(&self) -> Vec<(K, V)> {
        self.entries
            .iter()
            .filter_map(|(k, e)| match e {
                EntryState::Fresh(data) => Some((k.clone(), data.clone())),
                _ => None,
            })
            .collect()
    }

    /// Synchronous view of `key` for rendering.
    pub fn peek(&self, key: &K) -> QueryResult<V> {
        match self.entries.get(key) {
            None => QueryResult::loading(None, false),
            Some(EntryState::Fresh(data)) => QueryResult::success(data.clone(), false, false),
            Some(EntryState::Stale(data)) => QueryResult::success(data.clone(), true, false),
            Some(EntryState::Pending { previous, .. }) => match previous {
                Some(data) => QueryResult::success(data.clone(), true, true),
                None => QueryResult::loading(None, true),
            },
            Some(EntryState::Failed { error, previous }) => {
                QueryResult::error(error.clone(), previous.clone())
            }
        }
    }

    /// Drop a pending entry whose fetch vanished without reporting.
    pub fn abandon(&mut self, key: &K, fetch_id: u64) {
        self.complete(
            key,
            fetch_id,
            Err(ApiError::network("Request ended without a result")),
        );
    }

    fn touch(&mut self, key: &K) {
        self.clock += 1;
        self.touched.insert(key.clone(), self.clock);
    }

    fn evict(&mut self) {
        let Some(capacity) = self.capacity else {
            return;
        };
        let excess = self.entries.len().saturating_sub(capacity);
        if excess == 0 {
            return;
        }

        let mut inactive: Vec<(u64, K)> = self
            .entries
            .iter()
            .filter(|(_, e)| matches!(e, EntryState::Stale(_) | EntryState::Failed { .. }))
            .map(|(k, _)| (self.touched.get(k).copied().unwrap_or(0), k.clone()))
            .collect();
        inactive.sort_by_key(|(at, _)| *at);

        for (_, key) in inactive.into_iter().take(excess) {
            self.entries.remove(&key);
            self.touched.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryStatus;

    fn fetch_id_of(begin: &Begin<u32>) -> u64 {
        match begin {
            Begin::Fetch { fetch_id, .. } | Begin::Join { fetch_id, .. } => *fetch_id,
            Begin::Hit(_) => panic!("expected a fetch"),
        }
    }

    #[test]
    fn test_miss_then_join_then_hit() {
        let mut cache: QueryCache<&str, u32> = QueryCache::new();

        let first = cache.begin(&"k");
        assert!(matches!(first, Begin::Fetch { .. }));
        let second = cache.begin(&"k");
        assert!(matches!(second, Begin::Join { .. }));
        assert_eq!(fetch_id_of(&first), fetch_id_of(&second));
        assert_eq!(cache.peek(&"k").status, QueryStatus::Loading);

        cache.complete(&"k", fetch_id_of(&first), Ok(7));
        assert!(matches!(cache.begin(&"k"), Begin::Hit(7)));
    }

    #[test]
    fn test_seed_is_fresh() {
        let mut cache: QueryCache<&str, u32> = QueryCache::new();
        cache.seed("k", 3);
        assert!(matches!(cache.begin(&"k"), Begin::Hit(3)));
        let result = cache.peek(&"k");
        assert_eq!(result.status, QueryStatus::Success);
        assert_eq!(result.data, Some(3));
        assert!(!result.is_stale);
    }

    #[test]
    fn test_invalidate_marks_stale_and_refetches() {
        let mut cache: QueryCache<&str, u32> = QueryCache::new();
        cache.seed("a", 1);
        cache.seed("b", 2);
        assert_eq!(cache.invalidate_all(), 2);

        let peeked = cache.peek(&"a");
        assert!(peeked.is_stale);
        assert_eq!(peeked.data, Some(1));

        let begin = cache.begin(&"a");
        assert!(matches!(begin, Begin::Fetch { .. }));
        // stale data stays visible while refetching
        let during = cache.peek(&"a");
        assert!(during.is_fetching);
        assert_eq!(during.data, Some(1));

        cache.complete(&"a", fetch_id_of(&begin), Ok(10));
        assert!(matches!(cache.begin(&"a"), Begin::Hit(10)));
    }

    #[test]
    fn test_fetch_spanning_invalidation_lands_stale() {
        let mut cache: QueryCache<&str, u32> = QueryCache::new();
        let begin = cache.begin(&"k");
        cache.invalidate_all();
        cache.complete(&"k", fetch_id_of(&begin), Ok(5));
        assert!(cache.peek(&"k").is_stale);
        assert!(matches!(cache.begin(&"k"), Begin::Fetch { .. }));
    }

    #[test]
    fn test_failure_keeps_previous_data() {
        let mut cache: QueryCache<&str, u32> = QueryCache::new();
        cache.seed("k", 1);
        cache.invalidate(&"k");
        let begin = cache.begin(&"k");
        cache.complete(&"k", fetch_id_of(&begin), Err(ApiError::network("down")));

        let result = cache.peek(&"k");
        assert_eq!(result.status, QueryStatus::Error);
        assert_eq!(result.data, Some(1));
        assert_eq!(result.error, Some(ApiError::network("down")));
        // no automatic retry; the next access starts a new fetch
        assert!(matches!(cache.begin(&"k"), Begin::Fetch { .. }));
    }

    #[test]
    fn test_late_completion_does_not_override_seed() {
        let mut cache: QueryCache<&str, u32> = QueryCache::new();
        let begin = cache.begin(&"k");
        cache.seed("k", 9);
        cache.complete(&"k", fetch_id_of(&begin), Ok(1));
        assert!(matches!(cache.begin(&"k"), Begin::Hit(9)));
    }

    #[test]
    fn test_fresh_entries_skip_stale_and_pending() {
        let mut cache: QueryCache<&str, u32> = QueryCache::new();
        cache.seed("fresh", 1);
        cache.seed("stale", 2);
        cache.invalidate(&"stale");
        let _pending = cache.begin(&"pending");
        assert_eq!(cache.fresh_entries(), vec![("fresh", 1)]);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_capacity_evicts_least_recent_inactive() {
        let mut cache: QueryCache<&str, u32> = QueryCache::with_capacity(2);
        cache.seed("a", 1);
        cache.seed("b", 2);
        cache.seed("c", 3);
        // everything is fresh, so nothing can go yet
        assert_eq!(cache.len(), 3);

        cache.invalidate_all();
        let _ = cache.begin(&"d");
        assert_eq!(cache.len(), 2);
        assert!(cache.state(&"a").is_none());
        assert!(cache.state(&"b").is_none());
        assert!(cache.state(&"c").is_some());
        assert!(cache.is_pending(&"d"));
    }

    #[test]
    fn test_capacity_spares_recently_used() {
        let mut cache: QueryCache<&str, u32> = QueryCache::with_capacity(2);
        cache.seed("a", 1);
        cache.seed("b", 2);
        cache.invalidate_all();

        let begin = cache.begin(&"a");
        cache.complete(&"a", fetch_id_of(&begin), Err(ApiError::network("down")));
        let _ = cache.begin(&"c");

        assert!(cache.state(&"b").is_none());
        assert!(matches!(cache.state(&"a"), Some(EntryState::Failed { .. })));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_unbounded_by_default() {
        let mut cache: QueryCache<&str, u32> = QueryCache::new();
        for (i, key) in ["a", "b", "c", "d"].into_iter().enumerate() {
            cache.seed(key, i as u32);
        }
        cache.invalidate_all();
        let _ = cache.begin(&"e");
        assert_eq!(cache.len(), 5);
    }
}
