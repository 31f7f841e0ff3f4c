use crate::error::AtlasError;

/// A dense 3-D volume, laid out x-major: index = (x * ny + y) * nz + z.
#[derive(Debug, Clone, PartialEq)]
pub struct Vol<T> {
    pub dims: [usize; 3],
    pub arr: Vec<T>,
}

impl<T: Copy + Default> Vol<T> {
    pub fn new(dims: [usize; 3]) -> Self {
        let arr = vec![T::default(); dims[0] * dims[1] * dims[2]];
        Self { dims, arr }
    }
}

impl<T> Vol<T> {
    #[inline(always)]
    pub fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        (x * self.dims[1] + y) * self.dims[2] + z
    }

    pub fn same_shape<U>(&self, other: &Vol<U>) -> bool {
        self.dims == other.dims
    }

    /// Fatal configuration check: auxiliary volumes must match the annotation shape.
    pub fn check_same_shape<U>(&self, other: &Vol<U>, what: &'static str) -> Result<(), AtlasError> {
        if self.same_shape(other) {
            Ok(())
        } else {
            Err(AtlasError::ShapeMismatch {
                what,
                expected: self.dims,
                got: other.dims,
            })
        }
    }

    /// Visit every voxel coordinate in x, y, z order.
    pub fn for_each_coord(&self, mut f: impl FnMut([usize; 3], &T)) {
        let mut i = 0usize;
        for x in 0..self.dims[0] {
            for y in 0..self.dims[1] {
                for z in 0..self.dims[2] {
                    f([x, y, z], &self.arr[i]);
                    i += 1;
                }
            }
        }
    }
}

impl<T> std::ops::Index<[usize; 3]> for Vol<T> {
    type Output = T;

    #[inline(always)]
    fn index(&self, i: [usize; 3]) -> &T {
        &self.arr[(i[0] * self.dims[1] + i[1]) * self.dims[2] + i[2]]
    }
}

impl<T> std::ops::IndexMut<[usize; 3]> for Vol<T> {
    #[inline(always)]
    fn index_mut(&mut self, i: [usize; 3]) -> &mut T {
        &mut self.arr[(i[0] * self.dims[1] + i[1]) * self.dims[2] + i[2]]
    }
}

/// A 0/255 boolean mask over a volume.
pub type MaskVol = Vol<u8>;

// Viewing geometry
// -----------------------------------------------------------------------------

/// Viewing axis through the volume. AIBS convention: x coronal, y axial, z sagittal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Coronal,
    Axial,
    Sagittal,
}

impl Axis {
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::Coronal => 0,
            Axis::Axial => 1,
            Axis::Sagittal => 2,
        }
    }

    /// The (row, col) volume axes of the viewing plane: the two remaining
    /// axes in ascending order, for every viewing axis.
    #[inline]
    pub fn plane_axes(self) -> (usize, usize) {
        match self {
            Axis::Coronal => (1, 2),
            Axis::Axial => (0, 2),
            Axis::Sagittal => (0, 1),
        }
    }
}

/// An axis-aligned bounding box over voxels. Upper bounds are exclusive.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Roi3 {
    pub lo: [usize; 3],
    pub hi: [usize; 3],
}

impl Roi3 {
    /// Extent along one axis.
    pub fn extent(&self, axis: usize) -> usize {
        self.hi[axis] - self.lo[axis]
    }

    /// Grow by per-axis pads, clamped to the given volume dims.
    pub fn padded(&self, pads: [usize; 3], dims: [usize; 3]) -> Roi3 {
        let mut out = *self;
        for a in 0..3 {
            out.lo[a] = self.lo[a].saturating_sub(pads[a]);
            out.hi[a] = (self.hi[a] + pads[a]).min(dims[a]);
        }
        out
    }

    pub fn contains(&self, v: [usize; 3]) -> bool {
        (0..3).all(|a| self.lo[a] <= v[a] && v[a] < self.hi[a])
    }
}

/// Maps 2-D plane pixels to 3-D voxels for one viewing axis, one bounding
/// window, and one slice position. Keeps the per-axis branching in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewProjection {
    pub axis: Axis,
    pub bounds: Roi3,
    pub slice_pos: usize,
}

impl ViewProjection {
    pub fn plane_w(&self) -> usize {
        self.bounds.extent(self.axis.plane_axes().1)
    }

    pub fn plane_h(&self) -> usize {
        self.bounds.extent(self.axis.plane_axes().0)
    }

    /// Voxel under an in-plane pixel. Callers must keep `x`/`y` in plane range.
    #[inline]
    pub fn voxel_at_plane(&self, x: usize, y: usize) -> [usize; 3] {
        debug_assert!(x < self.plane_w() && y < self.plane_h(), "pixel outside plane");
        let (row_axis, col_axis) = self.axis.plane_axes();
        let mut v = [0usize; 3];
        v[self.axis.index()] = self.slice_pos;
        v[row_axis] = self.bounds.lo[row_axis] + y;
        v[col_axis] = self.bounds.lo[col_axis] + x;
        v
    }

    /// Voxel under a pixel, or `None` when the pixel falls outside the plane.
    /// Brush strokes routinely cross the view edge, so this is not an error.
    #[inline]
    pub fn voxel_at(&self, x: i32, y: i32) -> Option<[usize; 3]> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.plane_w() || y >= self.plane_h() {
            return None;
        }
        Some(self.voxel_at_plane(x, y))
    }

    /// Valid slice positions along the viewing axis, as (lo, exclusive hi).
    pub fn slice_range(&self) -> (usize, usize) {
        let a = self.axis.index();
        (self.bounds.lo[a], self.bounds.hi[a])
    }

    pub fn clamped_slice(&self, pos: i64) -> usize {
        let (lo, hi) = self.slice_range();
        assert!(hi > lo, "view bounds must be non-empty along the slice axis");
        pos.clamp(lo as i64, hi as i64 - 1) as usize
    }
}

// Tests
// -----------------------------------------------------------------------------
