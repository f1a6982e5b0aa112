use std::collections::HashMap;
use std::hash::Hash;

use chrono::NaiveDate;

use crate::models::{AttendanceRecord, Announcement, Child, Message, Milestone, Observation};

use super::Resource;

/// Lifecycle of one cached query key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Idle,
    Loading,
    Success,
    Error,
}

/// What the caller should do after asking for a key to be fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchDecision {
    /// Issue the request; the token must accompany the outcome so stale
    /// results can be discarded
    Begin(u64),
    /// Someone else already has this key in flight - attach to it
    AlreadyLoading,
    /// Cached result is current, nothing to do
    Fresh,
}

#[derive(Debug)]
struct Entry<T> {
    state: QueryState,
    data: Option<T>,
    error: Option<String>,
    /// Generation token of the in-flight fetch, if any
    pending: Option<u64>,
    stale: bool,
}

impl<T> Entry<T> {
    fn idle() -> Self {
        Self {
            state: QueryState::Idle,
            data: None,
            error: None,
            pending: None,
            stale: false,
        }
    }
}

/// A keyed family of cached queries sharing one result type.
///
/// State machine per key: `Idle -> Loading -> Success | Error`. Explicit
/// invalidation marks a resolved key stale; the previous data stays
/// visible until the replacement lands. Two fetch requests for the same
/// key share one execution - the second `begin_fetch` before resolution
/// reports `AlreadyLoading` and no request is issued.
#[derive(Debug)]
pub struct Query<K, T> {
    entries: HashMap<K, Entry<T>>,
    next_generation: u64,
}

impl<K: Eq + Hash + Clone, T> Query<K, T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_generation: 0,
        }
    }

    /// Ask for `key` to be fetched. Only a `Begin` return should lead to
    /// an actual request.
    pub fn begin_fetch(&mut self, key: K) -> FetchDecision {
        let entry = self.entries.entry(key).or_insert_with(Entry::idle);
        match entry.state {
            QueryState::Loading => FetchDecision::AlreadyLoading,
            QueryState::Success | QueryState::Error if !entry.stale => FetchDecision::Fresh,
            _ => {
                self.next_generation += 1;
                entry.state = QueryState::Loading;
                entry.stale = false;
                entry.pending = Some(self.next_generation);
                FetchDecision::Begin(self.next_generation)
            }
        }
    }

    /// Apply a completed fetch. Returns false (and changes nothing) when
    /// the outcome no longer matches the entry's in-flight generation -
    /// the key was cleared or re-issued while the request was in the air,
    /// so the result must be discarded rather than applied.
    pub fn resolve(&mut self, key: &K, generation: u64, result: Result<T, String>) -> bool {
        let Some(entry) = self.entries.get_mut(key) else {
            return false;
        };
        if entry.pending != Some(generation) {
            return false;
        }
        entry.pending = None;
        match result {
            Ok(data) => {
                entry.state = QueryState::Success;
                entry.data = Some(data);
                entry.error = None;
            }
            Err(message) => {
                // Previous data, if any, stays visible
                entry.state = QueryState::Error;
                entry.error = Some(message);
            }
        }
        true
    }

    /// Mark every key in the family stale. In-flight fetches are
    /// abandoned: their generation is dropped so their results will be
    /// discarded on arrival.
    pub fn invalidate_all(&mut self) {
        for entry in self.entries.values_mut() {
            entry.stale = true;
            entry.pending = None;
            if entry.state == QueryState::Loading {
                entry.state = if entry.data.is_some() {
                    QueryState::Success
                } else {
                    QueryState::Idle
                };
            }
        }
    }

    /// Drop everything (logout). Late outcomes find no entry and are
    /// discarded.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn state(&self, key: &K) -> QueryState {
        self.entries
            .get(key)
            .map(|e| e.state)
            .unwrap_or(QueryState::Idle)
    }

    /// Cached data for the key, including stale data during revalidation
    pub fn get(&self, key: &K) -> Option<&T> {
        self.entries.get(key).and_then(|e| e.data.as_ref())
    }

    pub fn error(&self, key: &K) -> Option<&str> {
        self.entries.get(key).and_then(|e| e.error.as_deref())
    }

    /// True while a fetch is in flight and no previous data exists - the
    /// state in which a view must render a loading indicator rather than
    /// an empty-state message.
    pub fn is_initial_loading(&self, key: &K) -> bool {
        self.entries
            .get(key)
            .map(|e| e.state == QueryState::Loading && e.data.is_none())
            .unwrap_or(false)
    }

    pub fn is_loading(&self, key: &K) -> bool {
        self.state(key) == QueryState::Loading
    }
}

impl<K: Eq + Hash + Clone, I> Query<K, Vec<I>> {
    /// Collection view of a key. Unresolved keys yield an empty slice, so
    /// filters and counts never operate on an undefined collection.
    pub fn items(&self, key: &K) -> &[I] {
        self.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl<K: Eq + Hash + Clone, T> Default for Query<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

/// All query families, one per resource/selector pair from the API
/// surface. Collection families are keyed by their selecting parameter;
/// unparameterized collections use the unit key.
#[derive(Debug, Default)]
pub struct QueryCache {
    pub children: Query<(), Vec<Child>>,
    pub child: Query<String, Child>,
    pub attendance_by_date: Query<NaiveDate, Vec<AttendanceRecord>>,
    pub attendance_by_month: Query<(i32, u32), Vec<AttendanceRecord>>,
    pub attendance_by_child: Query<String, Vec<AttendanceRecord>>,
    pub observations: Query<(), Vec<Observation>>,
    pub observations_by_child: Query<String, Vec<Observation>>,
    pub milestones_by_child: Query<String, Vec<Milestone>>,
    pub messages: Query<(), Vec<Message>>,
    pub messages_by_user: Query<String, Vec<Message>>,
    pub announcements: Query<(), Vec<Announcement>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The declared mutation -> query dependency mapping. A successful
    /// mutation on a resource stales exactly the families that resource
    /// owns; nothing else is touched. Milestones have no mutation path,
    /// so nothing ever invalidates them.
    pub fn invalidate(&mut self, resource: Resource) {
        match resource {
            Resource::Children => {
                self.children.invalidate_all();
                self.child.invalidate_all();
            }
            Resource::Attendance => {
                self.attendance_by_date.invalidate_all();
                self.attendance_by_month.invalidate_all();
                self.attendance_by_child.invalidate_all();
            }
            Resource::Observations => {
                self.observations.invalidate_all();
                self.observations_by_child.invalidate_all();
            }
            Resource::Messages => {
                self.messages.invalidate_all();
                self.messages_by_user.invalidate_all();
            }
            Resource::Announcements => {
                self.announcements.invalidate_all();
            }
        }
    }

    /// Drop every cached result (logout)
    pub fn clear(&mut self) {
        self.children.clear();
        self.child.clear();
        self.attendance_by_date.clear();
        self.attendance_by_month.clear();
        self.attendance_by_child.clear();
        self.observations.clear();
        self.observations_by_child.clear();
        self.milestones_by_child.clear();
        self.messages.clear();
        self.messages_by_user.clear();
        self.announcements.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_fetches_share_one_execution() {
        let mut q: Query<(), Vec<i32>> = Query::new();

        // First observer issues the request
        let first = q.begin_fetch(());
        assert!(matches!(first, FetchDecision::Begin(_)));

        // Second observer of the same key attaches to it
        assert_eq!(q.begin_fetch(()), FetchDecision::AlreadyLoading);

        // After resolution, a third observer is served from cache
        let FetchDecision::Begin(generation) = first else {
            unreachable!()
        };
        assert!(q.resolve(&(), generation, Ok(vec![1, 2])));
        assert_eq!(q.begin_fetch(()), FetchDecision::Fresh);
        assert_eq!(q.items(&()), &[1, 2]);
    }

    #[test]
    fn test_invalidation_keeps_previous_data_visible() {
        let mut q: Query<(), Vec<i32>> = Query::new();
        let FetchDecision::Begin(generation) = q.begin_fetch(()) else {
            unreachable!()
        };
        q.resolve(&(), generation, Ok(vec![7]));

        q.invalidate_all();
        let decision = q.begin_fetch(());
        assert!(matches!(decision, FetchDecision::Begin(_)));
        assert_eq!(q.state(&()), QueryState::Loading);
        // Stale data remains until the refetch lands
        assert_eq!(q.items(&()), &[7]);
        assert!(!q.is_initial_loading(&()));

        let FetchDecision::Begin(generation) = decision else {
            unreachable!()
        };
        q.resolve(&(), generation, Ok(vec![7, 8]));
        assert_eq!(q.items(&()), &[7, 8]);
    }

    #[test]
    fn test_never_fetched_collection_is_empty_not_error() {
        let q: Query<String, Vec<i32>> = Query::new();
        assert_eq!(q.items(&"unseen".to_string()), &[] as &[i32]);
        assert_eq!(q.state(&"unseen".to_string()), QueryState::Idle);
        assert!(q.error(&"unseen".to_string()).is_none());
    }

    #[test]
    fn test_initial_loading_is_distinct_from_empty() {
        let mut q: Query<(), Vec<i32>> = Query::new();
        q.begin_fetch(());
        // In flight with nothing cached: loading indicator, not empty state
        assert!(q.is_initial_loading(&()));
        assert_eq!(q.items(&()), &[] as &[i32]);
    }

    #[test]
    fn test_error_retains_previous_data() {
        let mut q: Query<(), Vec<i32>> = Query::new();
        let FetchDecision::Begin(generation) = q.begin_fetch(()) else {
            unreachable!()
        };
        q.resolve(&(), generation, Ok(vec![5]));
        q.invalidate_all();

        let FetchDecision::Begin(generation) = q.begin_fetch(()) else {
            unreachable!()
        };
        q.resolve(&(), generation, Err("boom".to_string()));

        assert_eq!(q.state(&()), QueryState::Error);
        assert_eq!(q.error(&()), Some("boom"));
        assert_eq!(q.items(&()), &[5]);
    }

    #[test]
    fn test_stale_generation_outcome_discarded() {
        let mut q: Query<(), Vec<i32>> = Query::new();
        let FetchDecision::Begin(old_generation) = q.begin_fetch(()) else {
            unreachable!()
        };

        // Cache cleared (logout) while the request is in the air
        q.clear();
        assert!(!q.resolve(&(), old_generation, Ok(vec![9])));
        assert_eq!(q.state(&()), QueryState::Idle);
        assert_eq!(q.items(&()), &[] as &[i32]);
    }

    #[test]
    fn test_invalidation_abandons_in_flight_fetch() {
        let mut q: Query<(), Vec<i32>> = Query::new();
        let FetchDecision::Begin(old_generation) = q.begin_fetch(()) else {
            unreachable!()
        };

        // Mutation lands while the pre-mutation fetch is still in flight
        q.invalidate_all();
        let FetchDecision::Begin(new_generation) = q.begin_fetch(()) else {
            panic!("stale key should refetch")
        };

        // The pre-mutation result arrives late and is discarded
        assert!(!q.resolve(&(), old_generation, Ok(vec![1])));
        assert!(q.resolve(&(), new_generation, Ok(vec![2])));
        assert_eq!(q.items(&()), &[2]);
    }

    #[test]
    fn test_cache_invalidation_scoped_to_resource() {
        let mut cache = QueryCache::new();
        let FetchDecision::Begin(child_generation) = cache.children.begin_fetch(()) else {
            unreachable!()
        };
        cache.children.resolve(&(), child_generation, Ok(vec![]));
        let FetchDecision::Begin(msg_generation) = cache.messages.begin_fetch(()) else {
            unreachable!()
        };
        cache.messages.resolve(&(), msg_generation, Ok(vec![]));

        cache.invalidate(Resource::Children);

        // Children must refetch, messages are untouched
        assert!(matches!(cache.children.begin_fetch(()), FetchDecision::Begin(_)));
        assert_eq!(cache.messages.begin_fetch(()), FetchDecision::Fresh);
    }
}
