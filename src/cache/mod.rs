//! In-memory query cache and mutation plumbing.
//!
//! Every screen reads through `QueryCache`, a set of keyed `Query`
//! families (one per resource/selector pair). A query is fetched once per
//! key and then served from memory until a mutation explicitly marks it
//! stale; concurrent observers of one key share a single in-flight
//! request. `MutationRunner` executes a single write at a time and, on
//! success only, invalidates the query families its resource owns.
//!
//! The cache is the only shared mutable state in the process. It is
//! mutated exclusively on the main loop thread, either by a resolved
//! fetch outcome or by a mutation's invalidation.

pub mod mutation;
pub mod query;

pub use mutation::{Mutation, MutationRunner, Resource};
pub use query::{FetchDecision, QueryCache};
