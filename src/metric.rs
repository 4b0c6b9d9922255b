//! Distance metrics for nearest-neighbor queries.
//!
//! A metric must be axis-decomposable: besides the key-to-key distance it
//! supplies, per axis, a lower bound for the distance to anything beyond the
//! splitting hyperplane through a node. Neighbor enumeration is only correct
//! when that bound never exceeds the true distance to any key on the far
//! side; this is a precondition, not a checked property.

use num_traits::{Float, Signed};

/// A distance function over keys, decomposable along axes.
pub trait Metric<K: ?Sized> {
    /// Distances must be totally ordered for all values the metric actually
    /// produces; incomparable pairs (such as float NaN) break enumeration
    /// order.
    type Distance: Copy + PartialOrd;

    /// Distance from `origin` to `key`.
    fn distance_to_key(&self, dimensions: usize, origin: &K, key: &K) -> Self::Distance;

    /// Lower bound for the distance from `origin` to any key on the far
    /// side of the hyperplane through `key` orthogonal to `axis`.
    fn distance_to_plane(&self, dimensions: usize, axis: usize, origin: &K, key: &K)
        -> Self::Distance;
}

/// Squared Euclidean distance. Avoids the square root, so it also works for
/// integer scalars; the enumeration order is the same as [`Euclidean`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SquareEuclidean;

impl<K, S> Metric<K> for SquareEuclidean
where
    K: std::ops::Index<usize, Output = S>,
    S: Signed + PartialOrd + Copy,
{
    type Distance = S;

    #[inline]
    fn distance_to_key(&self, dimensions: usize, origin: &K, key: &K) -> S {
        let mut acc = S::zero();
        for axis in 0..dimensions {
            let d = origin[axis] - key[axis];
            acc = acc + d * d;
        }
        acc
    }

    #[inline]
    fn distance_to_plane(&self, _dimensions: usize, axis: usize, origin: &K, key: &K) -> S {
        let d = origin[axis] - key[axis];
        d * d
    }
}

/// Euclidean distance for float scalars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Euclidean;

impl<K, S> Metric<K> for Euclidean
where
    K: std::ops::Index<usize, Output = S>,
    S: Float,
{
    type Distance = S;

    #[inline]
    fn distance_to_key(&self, dimensions: usize, origin: &K, key: &K) -> S {
        let mut acc = S::zero();
        for axis in 0..dimensions {
            let d = origin[axis] - key[axis];
            acc = acc + d * d;
        }
        acc.sqrt()
    }

    #[inline]
    fn distance_to_plane(&self, _dimensions: usize, axis: usize, origin: &K, key: &K) -> S {
        (origin[axis] - key[axis]).abs()
    }
}

/// Taxicab distance: the sum of absolute per-axis differences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Manhattan;

impl<K, S> Metric<K> for Manhattan
where
    K: std::ops::Index<usize, Output = S>,
    S: Signed + PartialOrd + Copy,
{
    type Distance = S;

    #[inline]
    fn distance_to_key(&self, dimensions: usize, origin: &K, key: &K) -> S {
        let mut acc = S::zero();
        for axis in 0..dimensions {
            acc = acc + (origin[axis] - key[axis]).abs();
        }
        acc
    }

    #[inline]
    fn distance_to_plane(&self, _dimensions: usize, axis: usize, origin: &K, key: &K) -> S {
        (origin[axis] - key[axis]).abs()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn square_euclidean_on_integers() {
        let d = SquareEuclidean.distance_to_key(2, &[0, 0], &[3, 4]);
        assert_eq!(d, 25);
        assert_eq!(SquareEuclidean.distance_to_plane(2, 1, &[0, 0], &[3, 4]), 16);
    }

    #[test]
    fn euclidean_on_floats() {
        let d = Euclidean.distance_to_key(2, &[0.0, 0.0], &[3.0, 4.0]);
        assert!((d - 5.0).abs() < 1e-12);
        let p = Euclidean.distance_to_plane(2, 0, &[0.0, 0.0], &[3.0, 4.0]);
        assert!((p - 3.0).abs() < 1e-12);
    }

    #[test]
    fn manhattan_sums_axis_distances() {
        assert_eq!(Manhattan.distance_to_key(2, &[1, 1], &[-2, 5]), 7);
    }
}
