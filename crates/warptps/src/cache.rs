use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use warptps_tps::{Fingerprint, LandmarkPair, LandmarkSet};

use crate::error::WarpTpsError;
use crate::transform::WarpModel;

/// Default number of models kept by [`ModelCache`].
pub const DEFAULT_CACHE_CAPACITY: usize = 8;

#[derive(Debug)]
struct Entry {
    pairs: Vec<LandmarkPair>,
    regularization: f64,
    model: Arc<WarpModel>,
}

impl Entry {
    fn matches(&self, landmarks: &LandmarkSet, regularization: f64) -> bool {
        self.regularization.to_bits() == regularization.to_bits() && self.pairs == landmarks.pairs()
    }
}

/// Fitted models keyed by landmark configuration and regularization.
///
/// Fitting is the expensive step when the same landmarks are warped at many
/// blend factors. The cache holds at most `capacity` models and evicts the
/// least recently used one. Entries are only reused when the landmarks and
/// regularization match exactly, not just their fingerprint.
///
/// # Example
///
/// ```
/// use warptps::ModelCache;
/// use warptps_tps::LandmarkSet;
///
/// let mut landmarks = LandmarkSet::new();
/// landmarks.add([0.0, 0.0], [1.0, 0.0]);
/// landmarks.add([50.0, 0.0], [50.0, 2.0]);
/// landmarks.add([0.0, 50.0], [0.0, 50.0]);
///
/// let mut cache = ModelCache::new(4);
/// let a = cache.get_or_fit(&landmarks, 0.0)?;
/// let b = cache.get_or_fit(&landmarks, 0.0)?;
/// assert!(std::sync::Arc::ptr_eq(&a, &b));
///
/// landmarks.add([50.0, 50.0], [52.0, 49.0]);
/// assert!(!cache.contains(&landmarks, 0.0));
/// # Ok::<(), warptps::WarpTpsError>(())
/// ```
#[derive(Debug)]
pub struct ModelCache {
    capacity: usize,
    entries: HashMap<Fingerprint, Entry>,
    // least recently used first
    order: VecDeque<Fingerprint>,
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl ModelCache {
    /// Create a cache holding at most `capacity` models (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    /// Maximum number of models kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of cached models.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a model for exactly these landmarks and regularization is cached.
    pub fn contains(&self, landmarks: &LandmarkSet, regularization: f64) -> bool {
        self.entries
            .get(&landmarks.fingerprint(regularization))
            .is_some_and(|e| e.matches(landmarks, regularization))
    }

    /// Return the cached model or fit and cache a new one.
    ///
    /// # Errors
    ///
    /// Fitting errors are returned unchanged and nothing is cached.
    pub fn get_or_fit(
        &mut self,
        landmarks: &LandmarkSet,
        regularization: f64,
    ) -> Result<Arc<WarpModel>, WarpTpsError> {
        let key = landmarks.fingerprint(regularization);

        if let Some(entry) = self.entries.get(&key) {
            if entry.matches(landmarks, regularization) {
                let model = Arc::clone(&entry.model);
                self.touch(key);
                log::debug!("model cache hit for {key:?}");
                return Ok(model);
            }
        }

        let model = Arc::new(WarpModel::fit(landmarks, regularization)?);
        self.insert(
            key,
            Entry {
                pairs: landmarks.pairs().to_vec(),
                regularization,
                model: Arc::clone(&model),
            },
        );
        Ok(model)
    }

    /// Drop the model for these landmarks and regularization, if cached.
    pub fn invalidate(&mut self, landmarks: &LandmarkSet, regularization: f64) -> bool {
        let key = landmarks.fingerprint(regularization);
        if !self.contains(landmarks, regularization) {
            return false;
        }
        self.entries.remove(&key);
        self.order.retain(|k| *k != key);
        true
    }

    /// Drop every cached model.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn touch(&mut self, key: Fingerprint) {
        self.order.retain(|k| *k != key);
        self.order.push_back(key);
    }

    fn insert(&mut self, key: Fingerprint, entry: Entry) {
        if self.entries.insert(key, entry).is_none() {
            while self.entries.len() > self.capacity {
                let Some(oldest) = self.order.pop_front() else {
                    break;
                };
                self.entries.remove(&oldest);
                log::debug!("evicted {oldest:?} from model cache");
            }
        }
        self.touch(key);
    }
}
