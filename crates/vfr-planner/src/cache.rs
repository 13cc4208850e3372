//! TTL cache for terrain elevations keyed by rounded coordinates.

use dashmap::DashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};
use vfr_core::GeoPoint;

pub trait CacheEntry {
    fn fetched_at(&self) -> Instant;
}

/// Drop expired entries, then the oldest ones until at most `max_entries` remain.
pub fn prune_cache<K, V>(cache: &DashMap<K, V>, max_entries: usize, max_age: Duration)
where
    K: Clone + Eq + Hash,
    V: CacheEntry,
{
    let now = Instant::now();
    let mut entries: Vec<(K, Instant)> = cache
        .iter()
        .map(|entry| (entry.key().clone(), entry.value().fetched_at()))
        .collect();

    entries.retain(|(key, fetched_at)| {
        if now.duration_since(*fetched_at) > max_age {
            cache.remove(key);
            false
        } else {
            true
        }
    });

    if cache.len() <= max_entries {
        return;
    }

    entries.sort_by_key(|(_, fetched_at)| *fetched_at);
    for (key, _) in entries {
        if cache.len() <= max_entries {
            break;
        }
        cache.remove(&key);
    }
}

/// Coordinates rounded to 1e-4 degrees (about 11 m).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordKey {
    lat_e4: i64,
    lon_e4: i64,
}

impl CoordKey {
    pub fn new(point: GeoPoint) -> Self {
        Self {
            lat_e4: (point.lat * 1e4).round() as i64,
            lon_e4: (point.lon * 1e4).round() as i64,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ElevationEntry {
    fetched_at: Instant,
    elevation_m: f64,
}

impl CacheEntry for ElevationEntry {
    fn fetched_at(&self) -> Instant {
        self.fetched_at
    }
}

#[derive(Debug)]
pub struct ElevationCache {
    entries: DashMap<CoordKey, ElevationEntry>,
    ttl: Duration,
    max_entries: usize,
}

impl ElevationCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Fresh cached elevation in meters.
    pub fn get(&self, point: GeoPoint) -> Option<f64> {
        let entry = self.entries.get(&CoordKey::new(point))?;
        (entry.fetched_at.elapsed() <= self.ttl).then_some(entry.elevation_m)
    }

    pub fn insert(&self, point: GeoPoint, elevation_m: f64) {
        self.entries.insert(
            CoordKey::new(point),
            ElevationEntry {
                fetched_at: Instant::now(),
                elevation_m,
            },
        );
        if self.entries.len() > self.max_entries {
            prune_cache(&self.entries, self.max_entries, self.ttl);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
