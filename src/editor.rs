use std::collections::HashMap;

use crate::category::{Category, CategoryIds};
use crate::error::AtlasError;
use crate::im::{Im, RgbIm};
use crate::raster::{flood_group, line_pixels};
use crate::vol::{Axis, Roi3, ViewProjection, Vol};

/// Margins around the paintable bounding box, per axis. The viewing axis gets
/// a margin of 1 instead so slice scrolling stays near the region.
const VIEW_MARGINS: [usize; 3] = [80, 80, 120];

/// Interactive editor over a reduced-category working copy of a labeled
/// volume. All edits stay in memory until [`AnnotationEditor::commit`], which
/// is the only writer of the full-resolution annotation.
pub struct AnnotationEditor {
    /// Full-resolution annotation; mutated only by `commit`.
    annotation: Vol<u32>,
    /// Pre-session full-resolution state, the restore source at commit.
    orig: Vol<u32>,
    nissl: Vol<f32>,
    ids: CategoryIds,
    /// Reduced-category volume under edit.
    working: Vol<Category>,
    /// Reduced-category volume at the last commit point.
    backup: Vol<Category>,
    /// Snapshot of `working` at the start of the current stroke.
    previous_stroke: Vol<Category>,
    view: ViewProjection,
    /// Rendered slice: grayscale base plus category tints.
    slice_rgb: RgbIm,
    /// Grayscale base without tints, kept for incremental pixel updates.
    base_rgb: RgbIm,
}

impl AnnotationEditor {
    /// Start an edit session.
    ///
    /// `backup` is the full-resolution annotation as of the last accepted
    /// commit (possibly from an earlier session); without one, the input
    /// annotation doubles as the baseline.
    pub fn new(
        annotation: Vol<u32>,
        nissl: Vol<f32>,
        ids: CategoryIds,
        axis: Axis,
        backup: Option<&Vol<u32>>,
    ) -> Result<Self, AtlasError> {
        annotation.check_same_shape(&nissl, "nissl")?;
        if let Some(b) = backup {
            annotation.check_same_shape(b, "backup")?;
        }

        let cat_by_id = ids.category_by_id();
        let mut working = project_categories(&annotation, &cat_by_id);
        let backup_cat = match backup {
            Some(b) => project_categories(b, &cat_by_id),
            None => working.clone(),
        };
        let orig = match backup {
            Some(b) => b.clone(),
            None => annotation.clone(),
        };

        // Outside voxels that differ from the committed baseline were erased
        // in an earlier session; keep them visually distinct.
        for (w, b) in working.arr.iter_mut().zip(&backup_cat.arr) {
            if *w == Category::Outside && *b != Category::Outside {
                *w = Category::Corrected;
            }
        }

        let view = frame_view(&working, axis)?;

        let previous_stroke = working.clone();
        let mut editor = Self {
            annotation,
            orig,
            nissl,
            ids,
            working,
            backup: backup_cat,
            previous_stroke,
            view,
            slice_rgb: RgbIm::new(0, 0),
            base_rgb: RgbIm::new(0, 0),
        };
        editor.generate_slice();
        Ok(editor)
    }

    // Accessors
    // -------------------------------------------------------------------------

    pub fn view(&self) -> &ViewProjection {
        &self.view
    }

    pub fn slice_pos(&self) -> usize {
        self.view.slice_pos
    }

    pub fn slice_image(&self) -> &RgbIm {
        &self.slice_rgb
    }

    pub fn working(&self) -> &Vol<Category> {
        &self.working
    }

    pub fn backup(&self) -> &Vol<Category> {
        &self.backup
    }

    pub fn annotation(&self) -> &Vol<u32> {
        &self.annotation
    }

    /// Release the merged annotation after committing.
    pub fn into_annotation(self) -> Vol<u32> {
        self.annotation
    }

    #[cfg(feature = "im-io")]
    pub fn save_slice_png<P: AsRef<std::path::Path>>(&self, path: P) -> image::ImageResult<()> {
        self.slice_rgb.save_png(path)
    }

    // Rendering
    // -------------------------------------------------------------------------

    fn generate_slice(&mut self) {
        let w = self.view.plane_w();
        let h = self.view.plane_h();

        let mut max_nissl = 0.0f32;
        for y in 0..h {
            for x in 0..w {
                let v = self.view.voxel_at_plane(x, y);
                max_nissl = max_nissl.max(self.nissl[v]);
            }
        }

        let mut base = RgbIm::new(w, h);
        for y in 0..h {
            for x in 0..w {
                let v = self.view.voxel_at_plane(x, y);
                let g = if max_nissl > 0.0 {
                    (255.0 * self.nissl[v] / max_nissl) as u8
                } else {
                    0
                };
                base.set_px(x, y, [g, g, g]);
            }
        }

        let mut rgb = base.clone();
        for y in 0..h {
            for x in 0..w {
                let cat = self.working[self.view.voxel_at_plane(x, y)];
                if let Some(tint) = cat.tint() {
                    rgb.set_px(x, y, add_clamp(base.px(x, y), tint));
                }
            }
        }

        self.base_rgb = base;
        self.slice_rgb = rgb;
    }

    // Editing
    // -------------------------------------------------------------------------

    /// Paint a stroke segment between two plane points.
    pub fn paint(&mut self, p0: (i32, i32), p1: (i32, i32), cat: Category) {
        let pixels = line_pixels(p0, p1);
        self.apply_pixels(&pixels, cat);
    }

    /// Flood-fill the connected same-category group under `seed`.
    pub fn fill(&mut self, seed: (i32, i32), cat: Category) {
        let w = self.view.plane_w();
        let h = self.view.plane_h();
        if seed.0 < 0 || seed.1 < 0 || seed.0 as usize >= w || seed.1 as usize >= h {
            return;
        }

        let mut slice = Im::<Category, 1>::new(w, h);
        for y in 0..h {
            for x in 0..w {
                *slice.at_mut(x, y, 0) = self.working[self.view.voxel_at_plane(x, y)];
            }
        }
        let group = flood_group(&slice, (seed.0 as usize, seed.1 as usize));
        self.apply_pixels(&group, cat);
    }

    /// Shared update path for paint and fill. Skips out-of-plane pixels,
    /// protected voxels, and voxels already at the target; snapshots the
    /// working volume once per call, on the first voxel that actually changes.
    fn apply_pixels(&mut self, pixels: &[(i32, i32)], cat: Category) {
        debug_assert!(
            !matches!(cat, Category::Protected | Category::Unassigned),
            "protected/unassigned are not paintable targets"
        );
        let mut snapshot_taken = false;
        for &(x, y) in pixels {
            let Some(v) = self.view.voxel_at(x, y) else {
                continue;
            };
            let cur = self.working[v];
            if cur == Category::Protected || cur == cat {
                continue;
            }
            if !snapshot_taken {
                self.previous_stroke = self.working.clone();
                snapshot_taken = true;
            }

            // An outside-paint is only a true reset when it matches the
            // committed baseline; otherwise the voxel stays marked corrected.
            // Decided per voxel.
            let effective = if cat == Category::Outside && self.backup[v] != Category::Outside {
                Category::Corrected
            } else {
                cat
            };
            self.working[v] = effective;

            let (px, py) = (x as usize, y as usize);
            let base = self.base_rgb.px(px, py);
            let shown = match effective.tint() {
                Some(tint) => add_clamp(base, tint),
                None => base,
            };
            self.slice_rgb.set_px(px, py, shown);
        }
    }

    /// Reset the given plane pixels to their backup category. Protected
    /// voxels are untouched. Not part of the stroke undo history.
    pub fn revert_pixels(&mut self, pixels: &[(i32, i32)]) {
        for &(x, y) in pixels {
            let Some(v) = self.view.voxel_at(x, y) else {
                continue;
            };
            if self.working[v] == Category::Protected {
                continue;
            }
            let restored = self.backup[v];
            self.working[v] = restored;

            let (px, py) = (x as usize, y as usize);
            let base = self.base_rgb.px(px, py);
            let shown = match restored.tint() {
                Some(tint) => add_clamp(base, tint),
                None => base,
            };
            self.slice_rgb.set_px(px, py, shown);
        }
    }

    /// Whole-stroke, single-level undo: restore the working volume to its
    /// state before the current stroke.
    pub fn revert_stroke(&mut self) {
        self.working = self.previous_stroke.clone();
        self.generate_slice();
    }

    /// Move the view to a new slice, clamped into the view bounds.
    pub fn change_slice(&mut self, pos: i64) {
        self.view.slice_pos = self.view.clamped_slice(pos);
        self.generate_slice();
    }

    /// Fold the working volume into the full-resolution annotation.
    ///
    /// Voxels whose category differs from the commit baseline get the
    /// category's commit id; voxels equal to the baseline are restored from
    /// the pre-session original, dropping never-reconfirmed earlier edits.
    /// Then the baseline advances to the working state.
    pub fn commit(&mut self) {
        let mut edited = 0usize;
        let mut restored = 0usize;
        for i in 0..self.working.arr.len() {
            if self.working.arr[i] != self.backup.arr[i] {
                self.annotation.arr[i] = self.ids.commit_id(self.working.arr[i]);
                edited += 1;
            } else if self.annotation.arr[i] != self.orig.arr[i] {
                self.annotation.arr[i] = self.orig.arr[i];
                restored += 1;
            }
        }
        self.backup = self.working.clone();
        self.orig = self.annotation.clone();
        tracing::info!(edited, restored, "committed working volume into annotation");
    }
}

fn project_categories(vol: &Vol<u32>, cat_by_id: &HashMap<u32, Category>) -> Vol<Category> {
    let mut out = Vol::<Category>::new(vol.dims);
    for (dst, &id) in out.arr.iter_mut().zip(&vol.arr) {
        *dst = if id == 0 {
            Category::Outside
        } else {
            cat_by_id.get(&id).copied().unwrap_or(Category::Unassigned)
        };
    }
    out
}

/// Bounding box (with margins) and mean slice position over the paintable
/// molecular/granular voxels.
fn frame_view(working: &Vol<Category>, axis: Axis) -> Result<ViewProjection, AtlasError> {
    let mut lo = [usize::MAX; 3];
    let mut hi = [0usize; 3];
    let mut axis_sum = 0usize;
    let mut count = 0usize;

    working.for_each_coord(|coord, &cat| {
        if cat == Category::Molecular || cat == Category::Granular {
            for a in 0..3 {
                lo[a] = lo[a].min(coord[a]);
                hi[a] = hi[a].max(coord[a] + 1);
            }
            axis_sum += coord[axis.index()];
            count += 1;
        }
    });

    if count == 0 {
        return Err(AtlasError::NoPaintableVoxels);
    }

    let mut pads = VIEW_MARGINS;
    pads[axis.index()] = 1;
    let bounds = Roi3 { lo, hi }.padded(pads, working.dims);
    let slice_pos = axis_sum / count;
    debug_assert!(bounds.lo[axis.index()] <= slice_pos && slice_pos < bounds.hi[axis.index()]);

    Ok(ViewProjection { axis, bounds, slice_pos })
}

#[inline]
fn add_clamp(base: [u8; 3], tint: [u8; 3]) -> [u8; 3] {
    [
        base[0].saturating_add(tint[0]),
        base[1].saturating_add(tint[1]),
        base[2].saturating_add(tint[2]),
    ]
}

// Tests
// -----------------------------------------------------------------------------
