use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::point::Point2d;

/// Sources closer than this (in pixels) to an existing source are flagged.
pub const COINCIDENT_DISTANCE: f64 = 1e-3;

/// A correspondence between a source location and where it should land.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPair {
    /// Location in the source geometry.
    pub source: Point2d,
    /// Location in the destination geometry.
    pub destination: Point2d,
}

impl LandmarkPair {
    /// Create a new pair.
    pub fn new(source: impl Into<Point2d>, destination: impl Into<Point2d>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// The same pair with source and destination exchanged.
    pub fn swapped(&self) -> Self {
        Self {
            source: self.destination,
            destination: self.source,
        }
    }
}

/// Key identifying a landmark configuration together with a regularization value.
///
/// The value comes from the standard library's default hasher. It is stable
/// for the lifetime of a process but may change between builds or toolchain
/// versions, so it must not be persisted or sent to another process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub u64);

/// Ordered collection of landmark correspondences.
///
/// Adding a pair never fails. Pairs whose source nearly coincides with an
/// earlier source are accepted, logged and reported by
/// [`LandmarkSet::conditioning_risks`]; the solver decides whether the
/// resulting system is still usable.
///
/// # Example
///
/// ```
/// use warptps_tps::LandmarkSet;
///
/// let mut landmarks = LandmarkSet::new();
/// landmarks.add([100.0, 100.0], [110.0, 110.0]);
/// landmarks.add([200.0, 100.0], [210.0, 120.0]);
/// assert_eq!(landmarks.count(), 2);
///
/// landmarks.clear();
/// assert!(landmarks.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<LandmarkPair>", into = "Vec<LandmarkPair>")]
pub struct LandmarkSet {
    pairs: Vec<LandmarkPair>,
    conditioning_risks: Vec<usize>,
}

impl LandmarkSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from existing pairs, preserving their order.
    pub fn from_pairs(pairs: impl IntoIterator<Item = LandmarkPair>) -> Self {
        let mut set = Self::new();
        set.extend(pairs);
        set
    }

    /// Build a set from parallel slices of source and destination points.
    ///
    /// Extra points in the longer slice are ignored.
    pub fn from_points(sources: &[Point2d], destinations: &[Point2d]) -> Self {
        Self::from_pairs(
            sources
                .iter()
                .zip(destinations.iter())
                .map(|(&s, &d)| LandmarkPair::new(s, d)),
        )
    }

    /// Append a correspondence.
    pub fn add(&mut self, source: impl Into<Point2d>, destination: impl Into<Point2d>) {
        self.push(LandmarkPair::new(source, destination));
    }

    /// Append an already built pair.
    pub fn push(&mut self, pair: LandmarkPair) {
        let threshold = COINCIDENT_DISTANCE * COINCIDENT_DISTANCE;
        if let Some(other) = self
            .pairs
            .iter()
            .position(|p| p.source.distance_squared(pair.source) < threshold)
        {
            log::warn!(
                "landmark {} source ({}, {}) nearly coincides with landmark {}",
                self.pairs.len(),
                pair.source.x,
                pair.source.y,
                other
            );
            self.conditioning_risks.push(self.pairs.len());
        }
        self.pairs.push(pair);
    }

    /// Remove every pair.
    pub fn clear(&mut self) {
        self.pairs.clear();
        self.conditioning_risks.clear();
    }

    /// Number of pairs.
    pub fn count(&self) -> usize {
        self.pairs.len()
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the set holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Get the pair at `index`.
    pub fn get(&self, index: usize) -> Option<&LandmarkPair> {
        self.pairs.get(index)
    }

    /// Iterate over the pairs in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, LandmarkPair> {
        self.pairs.iter()
    }

    /// The pairs as a slice.
    pub fn pairs(&self) -> &[LandmarkPair] {
        &self.pairs
    }

    /// Indices of pairs whose source nearly coincides with an earlier one.
    pub fn conditioning_risks(&self) -> &[usize] {
        &self.conditioning_risks
    }

    /// The source points in insertion order.
    pub fn source_points(&self) -> Vec<Point2d> {
        self.pairs.iter().map(|p| p.source).collect()
    }

    /// The destination points in insertion order.
    pub fn destination_points(&self) -> Vec<Point2d> {
        self.pairs.iter().map(|p| p.destination).collect()
    }

    /// A copy with source and destination roles exchanged in every pair.
    pub fn swapped(&self) -> Self {
        Self::from_pairs(self.pairs.iter().map(LandmarkPair::swapped))
    }

    /// Hash of the ordered coordinates and the regularization value.
    ///
    /// Coordinates are hashed by bit pattern, so `0.0` and `-0.0` differ.
    /// Equal content gives equal keys within one process only; see
    /// [`Fingerprint`].
    pub fn fingerprint(&self, regularization: f64) -> Fingerprint {
        let mut hasher = DefaultHasher::new();
        self.pairs.len().hash(&mut hasher);
        for pair in &self.pairs {
            for v in [
                pair.source.x,
                pair.source.y,
                pair.destination.x,
                pair.destination.y,
            ] {
                v.to_bits().hash(&mut hasher);
            }
        }
        regularization.to_bits().hash(&mut hasher);
        Fingerprint(hasher.finish())
    }
}

impl Extend<LandmarkPair> for LandmarkSet {
    fn extend<I: IntoIterator<Item = LandmarkPair>>(&mut self, iter: I) {
        for pair in iter {
            self.push(pair);
        }
    }
}

impl From<Vec<LandmarkPair>> for LandmarkSet {
    fn from(pairs: Vec<LandmarkPair>) -> Self {
        Self::from_pairs(pairs)
    }
}

impl From<LandmarkSet> for Vec<LandmarkPair> {
    fn from(set: LandmarkSet) -> Self {
        set.pairs
    }
}

impl<'a> IntoIterator for &'a LandmarkSet {
    type Item = &'a LandmarkPair;
    type IntoIter = std::slice::Iter<'a, LandmarkPair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}
