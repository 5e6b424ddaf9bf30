//! Full-search block matching with half-pel refinement.
//!
//! Candidates are scanned centre-out (vertical outer, horizontal inner;
//! `0, -1, +1, -2, +2, ...` on each axis) and a candidate replaces the best
//! so far only when its SAD is strictly lower. Any vector whose referenced
//! block would leave the coded picture is never evaluated.

use crate::macroblock::{MB_SIZE, MacroblockPixels, TILE_SIZE};
use crate::packet::FrameType;
use crate::reference::{Plane, ReferenceStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchRange {
    #[default]
    Narrow,
    Medium,
    Wide,
}

impl SearchRange {
    /// Integer luma search radius. The widest range plus half-pel
    /// refinement stays inside the `[-16, 15]` half-pel span of `f_code` 1.
    pub fn radius(self) -> i32 {
        match self {
            SearchRange::Narrow => 2,
            SearchRange::Medium => 4,
            SearchRange::Wide => 7,
        }
    }

    pub fn chroma_radius(self) -> i32 {
        self.radius() / 2
    }
}

/// Motion vector in half-pel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotionVector {
    pub x: i32,
    pub y: i32,
}

impl MotionVector {
    pub const ZERO: MotionVector = MotionVector { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// 4:2:0 chroma vector: the luma vector halved towards zero, still in
    /// half-pel units of the chroma grid.
    pub fn chroma(self) -> Self {
        Self {
            x: self.x / 2,
            y: self.y / 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MotionEstimate {
    pub vector: MotionVector,
    pub sad: u32,
    pub inter: bool,
    pub predicted: MacroblockPixels,
}

impl MotionEstimate {
    fn intra(sad: u32) -> Self {
        Self {
            vector: MotionVector::ZERO,
            sad,
            inter: false,
            predicted: MacroblockPixels::flat(128, 128, 128),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MotionEstimator {
    range: SearchRange,
}

fn centre_out(radius: i32) -> impl Iterator<Item = i32> {
    std::iter::once(0).chain((1..=radius).flat_map(|m| [-m, m]))
}

/// Whether a block of `size` samples at `origin`, displaced by the half-pel
/// component `mv`, reads only samples inside `0..extent`.
fn fits(origin: i32, mv: i32, size: i32, extent: i32) -> bool {
    let start = origin + (mv >> 1);
    start >= 0 && start + size - 1 + (mv & 1) <= extent - 1
}

/// Bilinear half-pel prediction of a `size` x `size` block; averages round
/// half up.
fn predict_block(plane: &Plane, x0: i32, y0: i32, mv: MotionVector, size: usize, out: &mut [u8]) {
    let (ix, iy) = ((x0 + (mv.x >> 1)) as usize, (y0 + (mv.y >> 1)) as usize);
    let (hx, hy) = (mv.x & 1 != 0, mv.y & 1 != 0);
    for row in 0..size {
        for col in 0..size {
            let (x, y) = (ix + col, iy + row);
            let a = plane.at(x, y) as u32;
            let value = match (hx, hy) {
                (false, false) => a,
                (true, false) => (a + plane.at(x + 1, y) as u32 + 1) >> 1,
                (false, true) => (a + plane.at(x, y + 1) as u32 + 1) >> 1,
                (true, true) => {
                    let sum = a
                        + plane.at(x + 1, y) as u32
                        + plane.at(x, y + 1) as u32
                        + plane.at(x + 1, y + 1) as u32;
                    (sum + 2) >> 2
                }
            };
            out[row * size + col] = value as u8;
        }
    }
}

fn sad(a: &[u8], b: &[u8]) -> u32 {
    a.iter().zip(b.iter()).map(|(&x, &y)| x.abs_diff(y) as u32).sum()
}

/// Builds the motion-compensated prediction of macroblock (`mb_x`, `mb_y`).
/// `mv` must keep the referenced luma block inside the coded picture.
pub fn predict(reference: &ReferenceStore, mb_x: u32, mb_y: u32, mv: MotionVector) -> MacroblockPixels {
    let mut out = MacroblockPixels::flat(0, 0, 0);
    let (bx, by) = (mb_x as i32 * MB_SIZE as i32, mb_y as i32 * MB_SIZE as i32);
    predict_block(reference.luma(), bx, by, mv, MB_SIZE, &mut out.luma);
    let (cx, cy) = (mb_x as i32 * TILE_SIZE as i32, mb_y as i32 * TILE_SIZE as i32);
    let cmv = mv.chroma();
    predict_block(reference.cb(), cx, cy, cmv, TILE_SIZE, &mut out.cb);
    predict_block(reference.cr(), cx, cy, cmv, TILE_SIZE, &mut out.cr);
    out
}

impl MotionEstimator {
    pub fn new(range: SearchRange) -> Self {
        Self { range }
    }

    pub fn estimate(
        &self,
        frame_type: FrameType,
        current: &MacroblockPixels,
        mb_x: u32,
        mb_y: u32,
        reference: &ReferenceStore,
    ) -> MotionEstimate {
        if frame_type == FrameType::Intra {
            return MotionEstimate::intra(sad(&current.luma, &[128; 256]));
        }

        let luma = reference.luma();
        let (w, h) = (reference.width() as i32, reference.height() as i32);
        let (bx, by) = (mb_x as i32 * MB_SIZE as i32, mb_y as i32 * MB_SIZE as i32);
        let size = MB_SIZE as i32;
        let radius = self.range.radius();

        let mut best = (0i32, 0i32);
        let mut best_sad = u32::MAX;
        for dy in centre_out(radius) {
            if !fits(by, 2 * dy, size, h) {
                continue;
            }
            for dx in centre_out(radius) {
                if !fits(bx, 2 * dx, size, w) {
                    continue;
                }
                let (ox, oy) = ((bx + dx) as usize, (by + dy) as usize);
                let mut total = 0u32;
                for row in 0..MB_SIZE {
                    for col in 0..MB_SIZE {
                        total += current.luma[row * MB_SIZE + col].abs_diff(luma.at(ox + col, oy + row)) as u32;
                    }
                    if total >= best_sad {
                        break;
                    }
                }
                if total < best_sad {
                    best_sad = total;
                    best = (dx, dy);
                }
            }
        }

        let mut vector = MotionVector::new(2 * best.0, 2 * best.1);
        let mut block = [0u8; 256];
        for hy in centre_out(1) {
            for hx in centre_out(1) {
                if hx == 0 && hy == 0 {
                    continue;
                }
                let candidate = MotionVector::new(2 * best.0 + hx, 2 * best.1 + hy);
                if !fits(by, candidate.y, size, h) || !fits(bx, candidate.x, size, w) {
                    continue;
                }
                predict_block(luma, bx, by, candidate, MB_SIZE, &mut block);
                let candidate_sad = sad(&current.luma, &block);
                if candidate_sad < best_sad {
                    best_sad = candidate_sad;
                    vector = candidate;
                }
            }
        }

        let flat_sad = sad(&current.luma, &[current.luma_mean(); 256]);
        if flat_sad < best_sad {
            return MotionEstimate::intra(flat_sad);
        }

        MotionEstimate {
            vector,
            sad: best_sad,
            inter: true,
            predicted: predict(reference, mb_x, mb_y, vector),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::y4m::FramePixels;

    fn texture(x: u32, y: u32) -> u8 {
        let h = x.wrapping_mul(73_856_093) ^ y.wrapping_mul(19_349_663);
        let h = h ^ (h >> 13);
        (h.wrapping_mul(0x5bd1_e995) >> 24) as u8
    }

    fn textured_store(width: u32, height: u32) -> ReferenceStore {
        let mut frame = FramePixels::solid(width, height, 0, 0, 0);
        for y in 0..height {
            for x in 0..width {
                frame.y[(y * width + x) as usize] = texture(x, y);
            }
        }
        for (i, p) in frame.u.iter_mut().enumerate() {
            *p = (i * 5 % 256) as u8;
        }
        let mut store = ReferenceStore::new(width, height);
        store.reset(width, height);
        store.load(&frame);
        store
    }

    fn block_at(store: &ReferenceStore, x0: usize, y0: usize) -> MacroblockPixels {
        let mut mb = MacroblockPixels::flat(0, 0, 0);
        for row in 0..16 {
            for col in 0..16 {
                mb.luma[row * 16 + col] = store.luma().at(x0 + col, y0 + row);
            }
        }
        mb
    }

    #[test]
    fn centre_out_order() {
        assert_eq!(centre_out(2).collect::<Vec<_>>(), vec![0, -1, 1, -2, 2]);
    }

    #[test]
    fn fits_checks_half_pel_reach() {
        assert!(fits(0, 0, 16, 64));
        assert!(!fits(0, -1, 16, 64));
        assert!(fits(48, 0, 16, 64));
        assert!(!fits(48, 1, 16, 64));
        assert!(fits(16, -32, 16, 64));
    }

    #[test]
    fn finds_known_integer_shift() {
        let store = textured_store(64, 64);
        let current = block_at(&store, 16 + 3, 16 - 2);
        let estimator = MotionEstimator::new(SearchRange::Medium);
        let est = estimator.estimate(FrameType::Predicted, &current, 1, 1, &store);
        assert!(est.inter);
        assert_eq!(est.vector, MotionVector::new(6, -4));
        assert_eq!(est.sad, 0);
        assert_eq!(est.predicted.luma, current.luma);
    }

    #[test]
    fn shift_outside_range_is_not_found() {
        let store = textured_store(64, 64);
        let current = block_at(&store, 16 + 3, 16);
        let estimator = MotionEstimator::new(SearchRange::Narrow);
        let est = estimator.estimate(FrameType::Predicted, &current, 1, 1, &store);
        assert_ne!(est.sad, 0);
    }

    #[test]
    fn edge_blocks_stay_inside_picture() {
        let store = textured_store(64, 64);
        let estimator = MotionEstimator::new(SearchRange::Wide);
        // current block wants to look up and left of the corner
        let mut current = block_at(&store, 0, 0);
        current.luma.rotate_right(17);
        let est = estimator.estimate(FrameType::Predicted, &current, 0, 0, &store);
        if est.inter {
            assert!(est.vector.x >= 0 && est.vector.y >= 0);
        }
        let est = estimator.estimate(FrameType::Predicted, &current, 3, 3, &store);
        if est.inter {
            assert!(est.vector.x <= 0 && est.vector.y <= 0);
        }
    }

    #[test]
    fn flat_block_prefers_intra_over_bad_match() {
        let store = textured_store(64, 64);
        let current = MacroblockPixels::flat(77, 128, 128);
        let estimator = MotionEstimator::new(SearchRange::Narrow);
        let est = estimator.estimate(FrameType::Predicted, &current, 1, 1, &store);
        assert!(!est.inter);
        assert_eq!(est.sad, 0);
        assert_eq!(est.vector, MotionVector::ZERO);
    }

    #[test]
    fn ties_keep_the_centre() {
        let mut store = ReferenceStore::new(64, 64);
        store.reset(64, 64);
        store.load(&FramePixels::solid(64, 64, 90, 128, 128));
        let mut current = MacroblockPixels::flat(90, 128, 128);
        current.luma[0] = 91;
        let est = MotionEstimator::new(SearchRange::Wide).estimate(FrameType::Predicted, &current, 1, 1, &store);
        assert!(est.inter);
        assert_eq!(est.vector, MotionVector::ZERO);
        assert_eq!(est.sad, 1);
    }

    #[test]
    fn intra_pictures_skip_search() {
        let store = textured_store(64, 64);
        let current = block_at(&store, 16, 16);
        let est = MotionEstimator::new(SearchRange::Wide).estimate(FrameType::Intra, &current, 1, 1, &store);
        assert!(!est.inter);
        assert_eq!(est.predicted, MacroblockPixels::flat(128, 128, 128));
    }

    #[test]
    fn half_pel_prediction_averages_neighbours() {
        let mut frame = FramePixels::solid(64, 64, 0, 100, 100);
        for y in 0..64 {
            for x in 0..64 {
                frame.y[y * 64 + x] = if x % 2 == 0 { 10 } else { 21 };
            }
        }
        let mut store = ReferenceStore::new(64, 64);
        store.reset(64, 64);
        store.load(&frame);
        let pred = predict(&store, 1, 1, MotionVector::new(1, 0));
        assert!(pred.luma.iter().all(|&p| p == 16));
        let pred = predict(&store, 1, 1, MotionVector::new(1, 1));
        assert!(pred.luma.iter().all(|&p| p == 16));
        let pred = predict(&store, 1, 1, MotionVector::new(0, 1));
        assert_eq!(pred.luma[0], 10);
        assert_eq!(pred.luma[1], 21);
        assert!(pred.cb.iter().all(|&p| p == 100));
    }

    #[test]
    fn chroma_vector_truncates_towards_zero() {
        assert_eq!(MotionVector::new(3, -3).chroma(), MotionVector::new(1, -1));
        assert_eq!(MotionVector::new(-14, 15).chroma(), MotionVector::new(-7, 7));
    }

    #[test]
    fn chroma_radius_is_half() {
        assert_eq!(SearchRange::Wide.chroma_radius(), 3);
        assert_eq!(SearchRange::Narrow.chroma_radius(), 1);
    }
}
