#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Bounded palette history, one FIFO per place.
//!
//! Every accepted color sample ends up here. Each place keeps at most
//! `capacity` [`HistoryEntry`] records; appending to a full buffer evicts the
//! oldest entry first. Buffers are created lazily: a place that has never
//! been sampled reads as an empty slice rather than a placeholder entry.

use std::collections::{BTreeMap, VecDeque};

use color_world_models::{HistoryEntry, PlaceId, SampledColor};

/// Default number of entries kept per place.
pub const COLOR_COUNT_LIMIT: usize = 250;

/// Per-place bounded palette buffers.
#[derive(Debug, Clone)]
pub struct PlaceHistory {
    capacity: usize,
    buffers: BTreeMap<PlaceId, VecDeque<HistoryEntry>>,
}

impl Default for PlaceHistory {
    fn default() -> Self {
        Self::new(COLOR_COUNT_LIMIT)
    }
}

impl PlaceHistory {
    /// Creates an empty history holding at most `capacity` entries per
    /// place.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "PlaceHistory capacity must be non-zero");
        Self {
            capacity,
            buffers: BTreeMap::new(),
        }
    }

    /// Per-place capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends `entry` to `place`, evicting the oldest entry first when the
    /// buffer is already full.
    ///
    /// Returns the evicted entry, if any.
    pub fn append(&mut self, place: PlaceId, entry: HistoryEntry) -> Option<HistoryEntry> {
        let capacity = self.capacity;
        let buffer = self
            .buffers
            .entry(place)
            .or_insert_with(|| VecDeque::with_capacity(capacity));

        let evicted = if buffer.len() >= capacity {
            buffer.pop_front()
        } else {
            None
        };
        buffer.push_back(entry);

        debug_assert!(buffer.len() <= capacity, "history for {place} over capacity");
        if let Some(old) = &evicted {
            log::trace!("Evicted {:?} from {place}", old.color);
        }

        evicted
    }

    /// Removes and returns the oldest entry of `place`.
    pub fn evict_oldest(&mut self, place: PlaceId) -> Option<HistoryEntry> {
        self.buffers.get_mut(&place).and_then(VecDeque::pop_front)
    }

    /// All entries of `place`, oldest first. Empty for unknown places.
    pub fn entries(&self, place: PlaceId) -> std::collections::vec_deque::Iter<'_, HistoryEntry> {
        static EMPTY: VecDeque<HistoryEntry> = VecDeque::new();
        self.buffers.get(&place).unwrap_or(&EMPTY).iter()
    }

    /// Entry `index` (0 = oldest) of `place`.
    #[must_use]
    pub fn get(&self, place: PlaceId, index: usize) -> Option<&HistoryEntry> {
        self.buffers.get(&place).and_then(|b| b.get(index))
    }

    /// Most recent entry of `place`.
    #[must_use]
    pub fn latest(&self, place: PlaceId) -> Option<&HistoryEntry> {
        self.buffers.get(&place).and_then(VecDeque::back)
    }

    /// Most recent color of `place`.
    #[must_use]
    pub fn latest_color(&self, place: PlaceId) -> Option<SampledColor> {
        self.latest(place).map(|e| e.color)
    }

    /// Number of entries for `place`.
    #[must_use]
    pub fn len(&self, place: PlaceId) -> usize {
        self.buffers.get(&place).map_or(0, VecDeque::len)
    }

    /// `true` if `place` has no entries.
    #[must_use]
    pub fn is_empty(&self, place: PlaceId) -> bool {
        self.len(place) == 0
    }

    /// Places that have at least one entry.
    pub fn places(&self) -> impl Iterator<Item = PlaceId> + '_ {
        self.buffers
            .iter()
            .filter(|(_, b)| !b.is_empty())
            .map(|(place, _)| *place)
    }

    /// Mean color of `place`'s entries, if any.
    #[must_use]
    pub fn average_color(&self, place: PlaceId) -> Option<SampledColor> {
        let buffer = self.buffers.get(&place).filter(|b| !b.is_empty())?;
        let n = buffer.len() as u64;
        let (r, g, b) = buffer.iter().fold((0u64, 0u64, 0u64), |(r, g, b), e| {
            (
                r + u64::from(e.color.r),
                g + u64::from(e.color.g),
                b + u64::from(e.color.b),
            )
        });

        #[allow(clippy::cast_possible_truncation)]
        Some(SampledColor::new(
            (r / n) as u8,
            (g / n) as u8,
            (b / n) as u8,
        ))
    }
}

/// Base rate of the playback cursor in entries per second.
pub const PLAYBACK_BASE_RATE: f64 = 5.2;

/// Index of the entry under the playback cursor after `elapsed_secs` at the
/// given speed adjustment, wrapping over `len` entries.
///
/// Returns `None` for an empty buffer.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn playback_frame(elapsed_secs: f64, speed: f64, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let ticks = (elapsed_secs * (PLAYBACK_BASE_RATE + speed)).max(0.0) as usize;
    Some(ticks % len)
}
