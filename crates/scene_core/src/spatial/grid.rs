//! Integer grid coordinates for octree cells
//!
//! Cells are keyed by integer index rather than a hash of the float centre, so
//! two distinct cells on one level never collide and repeated growth cannot
//! drift the keys.
//!
//! A cell at scale `s` with index `i` covers `[o_s + i * w_s, o_s + (i + 1) * w_s)`
//! on each axis, where `w_s = w_0 * 2^s` and `o_s = w_0 * (1 - (-2)^s) / 3`.
//! Every coarse boundary is also a fine boundary, so cells nest exactly, but
//! the offset alternates sides from one scale to the next. With a plain
//! `o_s = 0` the plane through the origin would split every scale and the tree
//! could never grow a root spanning both sides of it.
//!
//! Parent, child and octant relations are pure integer maths, so the octree's
//! structure never depends on float rounding. Floats only decide which cell a
//! point starts in and where a cell's centre is.

use crate::foundation::math::{DVec3, Vec3};

/// Integer position of a cell within one level of the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridCoord {
    /// Cell index along X
    pub x: i64,
    /// Cell index along Y
    pub y: i64,
    /// Cell index along Z
    pub z: i64,
}

impl GridCoord {
    /// Create a coordinate from raw indices
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    fn map(self, f: impl Fn(i64) -> i64) -> Self {
        Self::new(f(self.x), f(self.y), f(self.z))
    }
}

/// Nested cell layout shared by every level of an octree
///
/// Scales are unbounded: any finite `f32` position is covered by some cell at
/// every scale from [`min_scale_for`](Self::min_scale_for) upward, and cell
/// indices the octree stores stay within [`INDEX_LIMIT`](Self::INDEX_LIMIT).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    min_width: f64,
}

impl Grid {
    /// Largest absolute cell index on any axis at a point's placement scale
    pub const INDEX_LIMIT: i64 = 1 << 40;

    /// Grid whose finest cells are `min_width` wide
    pub fn new(min_width: f32) -> Self {
        Self {
            min_width: f64::from(min_width),
        }
    }

    /// Tight cell width at `scale`
    pub fn width(&self, scale: u32) -> f64 {
        self.min_width * f64::from(scale).exp2()
    }

    /// `(-1)^s`
    const fn parity(scale: u32) -> i64 {
        if scale % 2 == 0 { 1 } else { -1 }
    }

    /// `w_0 * (1 - (-2)^s) / 3`
    #[allow(clippy::cast_precision_loss)]
    fn origin(&self, scale: u32) -> f64 {
        let units = if scale < 62 {
            let pow = 1_i64 << scale;
            ((1 - Self::parity(scale) * pow) / 3) as f64
        } else {
            // Rounded from here on, by far less than a cell width
            let pow = f64::from(scale).exp2();
            let signed = if scale % 2 == 0 { pow } else { -pow };
            (1.0 - signed) / 3.0
        };
        self.min_width * units
    }

    /// Finest scale at which every component of `point` has a cell index
    /// within [`INDEX_LIMIT`](Self::INDEX_LIMIT)
    #[allow(clippy::cast_precision_loss)]
    pub fn min_scale_for(&self, point: Vec3) -> u32 {
        let reach = f64::from(point.amax());
        // |o_s| never exceeds two thirds of a cell, so two indices of headroom suffice
        let limit = (Self::INDEX_LIMIT - 2) as f64;
        let mut scale = 0;
        while reach / self.width(scale) > limit {
            scale += 1;
        }
        scale
    }

    /// Cell at `scale` containing `point`
    ///
    /// Indices saturate at the `i64` range; at or above
    /// [`min_scale_for`](Self::min_scale_for) they are exact.
    #[allow(clippy::cast_possible_truncation)]
    pub fn cell_containing(&self, point: Vec3, scale: u32) -> GridCoord {
        let origin = self.origin(scale);
        let width = self.width(scale);
        let index = |v: f32| ((f64::from(v) - origin) / width).floor() as i64;
        GridCoord::new(index(point.x), index(point.y), index(point.z))
    }

    /// Centre of cell `coord` at `scale`
    #[allow(clippy::cast_precision_loss)]
    pub fn cell_centre(&self, coord: GridCoord, scale: u32) -> DVec3 {
        let origin = self.origin(scale);
        let width = self.width(scale);
        let at = |i: i64| origin + (i as f64 + 0.5) * width;
        DVec3::new(at(coord.x), at(coord.y), at(coord.z))
    }

    /// Enclosing cell at `scale + 1`
    pub fn parent(&self, coord: GridCoord, scale: u32) -> GridCoord {
        let sigma = Self::parity(scale);
        // (i - sigma) div 2, split so neither step overflows at the i64 extremes
        coord.map(|i| i.div_euclid(2) + (i.rem_euclid(2) - sigma).div_euclid(2))
    }

    /// Enclosing cell at scale `to` of cell `coord` at scale `from`
    pub fn ancestor(&self, coord: GridCoord, from: u32, to: u32) -> GridCoord {
        (from..to).fold(coord, |coord, scale| self.parent(coord, scale))
    }

    /// Which of its parent's eight children `coord` is
    ///
    /// Bit 0 is +X, bit 1 is +Y, bit 2 is +Z, matching [`child`](Self::child).
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn octant(&self, coord: GridCoord, scale: u32) -> usize {
        let sigma = Self::parity(scale);
        let bit = |i: i64| (i.rem_euclid(2) - sigma).rem_euclid(2) as usize;
        (bit(coord.z) << 2) | (bit(coord.y) << 1) | bit(coord.x)
    }

    /// Child `octant` of the cell `coord` at `scale`; the child lives at `scale - 1`
    #[allow(clippy::cast_possible_wrap)]
    pub fn child(&self, coord: GridCoord, scale: u32, octant: usize) -> GridCoord {
        debug_assert!(scale > 0, "scale 0 cells have no children");
        let sigma = Self::parity(scale - 1);
        let at = |i: i64, bit: usize| i.saturating_mul(2).saturating_add(sigma + (bit & 1) as i64);
        GridCoord::new(
            at(coord.x, octant),
            at(coord.y, octant >> 1),
            at(coord.z, octant >> 2),
        )
    }
}
