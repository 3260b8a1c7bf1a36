//! Order-independent fingerprint of a set of polygons.
//!
//! Traced output is deterministic, but a change to the walk order would
//! reshuffle polygons without changing what was traced. The fingerprint
//! therefore hashes a canonical ordering: polygons (and holes within each
//! polygon) are sorted by colour, vertex count and first vertex before
//! their vertices are fed to the hasher. Two rings that pinch at a
//! four-way node can share all three, so ties fall back to comparing the
//! rings point by point.

use std::cmp::Ordering;
use std::hash::Hasher;

use mapvec_pipeline::{Point, Polygon};
use siphasher::sip::SipHasher13;

/// Fixed hashing keys so fingerprints are comparable across runs and
/// machines.
const KEY_0: u64 = 0x6d61_7076_6563_0001;
const KEY_1: u64 = 0x6d61_7076_6563_0002;

/// Sort key: colour, vertex count, first x, first y.
fn sort_key(polygon: &Polygon) -> (u32, usize, i32, i32) {
    let first = polygon.first().unwrap_or(Point::new(0, 0));
    (polygon.color.0, polygon.vertex_count(), first.x, first.y)
}

/// Borrow `polygons` in the order used by [`fingerprint`] and
/// [`dump`](crate::dump::dump).
#[must_use]
pub fn canonical_order(polygons: &[Polygon]) -> Vec<&Polygon> {
    let mut sorted: Vec<&Polygon> = polygons.iter().collect();
    sorted.sort_by(|a, b| compare(a, b));
    sorted
}

fn compare(a: &Polygon, b: &Polygon) -> Ordering {
    sort_key(a)
        .cmp(&sort_key(b))
        .then_with(|| a.ring.cmp(&b.ring))
}

/// Hash every vertex of every polygon, holes included, in canonical
/// order.
///
/// Two results with the same polygons in a different order produce the
/// same fingerprint; any change to a single vertex, colour or nesting
/// changes it.
#[must_use]
pub fn fingerprint(polygons: &[Polygon]) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(KEY_0, KEY_1);
    write_len(&mut hasher, polygons.len());
    for polygon in canonical_order(polygons) {
        hash_polygon(&mut hasher, polygon);
    }
    hasher.finish()
}

fn hash_polygon(hasher: &mut SipHasher13, polygon: &Polygon) {
    hasher.write(&polygon.color.0.to_le_bytes());
    write_len(hasher, polygon.ring.len());
    for p in &polygon.ring {
        hasher.write(&p.x.to_le_bytes());
        hasher.write(&p.y.to_le_bytes());
    }
    write_len(hasher, polygon.holes.len());
    for hole in canonical_order(&polygon.holes) {
        hash_polygon(hasher, hole);
    }
}

/// Lengths are hashed as little-endian `u64` so the result does not
/// depend on the platform's pointer width.
fn write_len(hasher: &mut SipHasher13, len: usize) {
    let len = u64::try_from(len).unwrap_or(u64::MAX);
    hasher.write(&len.to_le_bytes());
}
