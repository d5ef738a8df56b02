use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use crate::expression::Token;
use crate::statement::{Statement, TypeCast};

/// Content-addressed key: the BLAKE3 digest of the cached input text.
pub type ContentKey = blake3::Hash;

/// Hash arbitrary text into a [`ContentKey`].
#[must_use]
pub fn content_key(text: &str) -> ContentKey {
    blake3::hash(text.as_bytes())
}

/// A concurrent memoization table with hit/miss accounting.
///
/// Backed by a sharded [`DashMap`]: lookups on different shards never contend
/// and inserts only lock the shard they land in. Only successful computations
/// are stored; a failed computation is retried on the next call.
#[derive(Debug)]
pub struct ContentCache<K, V>
where
    K: Eq + Hash,
{
    entries: DashMap<K, V>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> Default for ContentCache<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }
}

impl<K, V> ContentCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    ///
    /// # Errors
    ///
    /// Propagates the error of `compute`; nothing is stored in that case.
    pub fn get_or_try_insert<E>(
        &self,
        key: K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(hit) = self.entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!("cache hit");
            return Ok(hit.value().clone());
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = compute()?;
        self.entries.insert(key, value.clone());
        Ok(value)
    }

    /// Infallible variant of [`get_or_try_insert`](Self::get_or_try_insert).
    pub fn get_or_insert_with(&self, key: K, compute: impl FnOnce() -> V) -> V {
        match self.get_or_try_insert::<std::convert::Infallible>(key, || Ok(compute())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&self) {
        self.entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

/// The memoization tables shared by the expression engine.
///
/// A process-wide instance is available through [`Caches::global()`]; tests and
/// hosts that want isolated runs create their own and hand it to
/// [`ValidatorBuilder::caches()`](crate::ValidatorBuilder::caches).
#[derive(Debug, Default)]
pub struct Caches {
    /// Parsed rule statements keyed by (statement text, cast signature).
    pub statements: ContentCache<(ContentKey, Vec<TypeCast>), Statement>,
    /// Cleaned expression text keyed by the raw text.
    pub cleaned: ContentCache<ContentKey, Arc<str>>,
    /// Tokenized expressions keyed by the cleaned text.
    pub tokens: ContentCache<ContentKey, Arc<[Token]>>,
    /// Bitwise reductions keyed by the whitespace-free expression.
    pub bitwise: ContentCache<String, bool>,
}

static GLOBAL: OnceLock<Arc<Caches>> = OnceLock::new();

impl Caches {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide caches, initialized on first use.
    #[must_use]
    pub fn global() -> Arc<Caches> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Caches::new())))
    }

    pub fn clear(&self) {
        self.statements.clear();
        self.cleaned.clear();
        self.tokens.clear();
        self.bitwise.clear();
    }
}
