//! Reconstructed picture used as the prediction source for P pictures.
//!
//! Planes are allocated once for the configured maximum size; only the
//! active window set by [`ReferenceStore::reset`] is meaningful. The store is
//! overwritten in place while the next picture is coded, so committed
//! macroblocks go through a delay line one slice plus one macroblock deep:
//! by the time a block lands in the planes, no later macroblock of the same
//! picture can reach it with its search window.

use std::collections::VecDeque;

use crate::macroblock::{MB_SIZE, MacroblockPixels, TILE_SIZE};
use crate::y4m::FramePixels;

#[derive(Debug, Clone)]
pub struct Plane {
    data: Vec<u8>,
    stride: usize,
    width: usize,
    height: usize,
}

impl Plane {
    fn new(stride: usize, rows: usize) -> Self {
        Self {
            data: vec![0; stride * rows],
            stride,
            width: stride,
            height: rows,
        }
    }

    #[inline]
    pub fn at(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.stride + x]
    }

    fn write_block(&mut self, x0: usize, y0: usize, size: usize, samples: &[u8]) {
        for row in 0..size {
            let dst = (y0 + row) * self.stride + x0;
            self.data[dst..dst + size].copy_from_slice(&samples[row * size..(row + 1) * size]);
        }
    }

    fn copy_active(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width * self.height);
        for row in 0..self.height {
            let start = row * self.stride;
            out.extend_from_slice(&self.data[start..start + self.width]);
        }
        out
    }
}

#[derive(Debug)]
struct PendingBlock {
    mb_x: usize,
    mb_y: usize,
    pixels: MacroblockPixels,
}

#[derive(Debug)]
pub struct ReferenceStore {
    luma: Plane,
    cb: Plane,
    cr: Plane,
    max_width: usize,
    max_height: usize,
    pending: VecDeque<PendingBlock>,
    delay: usize,
}

impl ReferenceStore {
    pub fn new(max_width: u32, max_height: u32) -> Self {
        let (w, h) = (max_width as usize, max_height as usize);
        let mut store = Self {
            luma: Plane::new(w, h),
            cb: Plane::new(w / 2, h / 2),
            cr: Plane::new(w / 2, h / 2),
            max_width: w,
            max_height: h,
            pending: VecDeque::new(),
            delay: 0,
        };
        store.reset(max_width, max_height);
        store
    }

    /// Selects the active window for a new sequence and drops queued blocks.
    /// Plane contents are left as they are. `width` and `height` are coded
    /// sizes, multiples of 16 no larger than the allocation.
    pub fn reset(&mut self, width: u32, height: u32) {
        let (w, h) = (width as usize, height as usize);
        debug_assert!(w % MB_SIZE == 0 && h % MB_SIZE == 0);
        debug_assert!(w <= self.max_width && h <= self.max_height);
        self.luma.width = w;
        self.luma.height = h;
        self.cb.width = w / 2;
        self.cb.height = h / 2;
        self.cr.width = w / 2;
        self.cr.height = h / 2;
        self.pending.clear();
        self.delay = w / MB_SIZE + 1;
    }

    pub fn width(&self) -> usize {
        self.luma.width
    }

    pub fn height(&self) -> usize {
        self.luma.height
    }

    pub fn luma(&self) -> &Plane {
        &self.luma
    }

    pub fn cb(&self) -> &Plane {
        &self.cb
    }

    pub fn cr(&self) -> &Plane {
        &self.cr
    }

    /// Queues a reconstructed macroblock. The oldest queued block is written
    /// once the queue grows past one slice plus one macroblock.
    pub fn submit(&mut self, mb_x: u32, mb_y: u32, pixels: MacroblockPixels) {
        self.pending.push_back(PendingBlock {
            mb_x: mb_x as usize,
            mb_y: mb_y as usize,
            pixels,
        });
        while self.pending.len() > self.delay {
            if let Some(block) = self.pending.pop_front() {
                self.commit(&block);
            }
        }
    }

    /// Writes every queued block. Called at the end of each picture.
    pub fn flush(&mut self) {
        while let Some(block) = self.pending.pop_front() {
            self.commit(&block);
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn commit(&mut self, block: &PendingBlock) {
        let (x, y) = (block.mb_x * MB_SIZE, block.mb_y * MB_SIZE);
        self.luma.write_block(x, y, MB_SIZE, &block.pixels.luma);
        let (cx, cy) = (block.mb_x * TILE_SIZE, block.mb_y * TILE_SIZE);
        self.cb.write_block(cx, cy, TILE_SIZE, &block.pixels.cb);
        self.cr.write_block(cx, cy, TILE_SIZE, &block.pixels.cr);
    }

    /// Replaces the active window with `frame`, which must match it in size.
    pub fn load(&mut self, frame: &FramePixels) {
        self.pending.clear();
        let mb_cols = self.width() / MB_SIZE;
        let mb_rows = self.height() / MB_SIZE;
        for mb_y in 0..mb_rows {
            for mb_x in 0..mb_cols {
                let pixels = MacroblockPixels::extract(frame, mb_x as u32, mb_y as u32);
                self.commit(&PendingBlock { mb_x, mb_y, pixels });
            }
        }
    }

    /// Copy of the active window as a 4:2:0 frame.
    pub fn snapshot(&self) -> FramePixels {
        FramePixels {
            y: self.luma.copy_active(),
            u: self.cb.copy_active(),
            v: self.cr.copy_active(),
            width: self.luma.width as u32,
            height: self.luma.height as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_covers_active_window() {
        let mut store = ReferenceStore::new(128, 64);
        store.reset(64, 32);
        let frame = store.snapshot();
        assert_eq!((frame.width, frame.height), (64, 32));
        assert_eq!(frame.y.len(), 64 * 32);
        assert_eq!(frame.u.len(), 32 * 16);
    }

    #[test]
    fn commit_waits_one_slice_plus_one() {
        let mut store = ReferenceStore::new(64, 64);
        store.reset(64, 64);
        // four macroblocks per row: delay of five
        for i in 0..5u32 {
            store.submit(i % 4, i / 4, MacroblockPixels::flat(200, 50, 60));
        }
        assert_eq!(store.pending(), 5);
        assert_eq!(store.luma().at(0, 0), 0);

        store.submit(1, 1, MacroblockPixels::flat(200, 50, 60));
        assert_eq!(store.pending(), 5);
        assert_eq!(store.luma().at(0, 0), 200);
        assert_eq!(store.luma().at(15, 15), 200);
        assert_eq!(store.luma().at(16, 0), 0);
        assert_eq!(store.cb().at(7, 7), 50);
        assert_eq!(store.cr().at(0, 0), 60);
    }

    #[test]
    fn flush_commits_everything() {
        let mut store = ReferenceStore::new(64, 64);
        store.reset(32, 32);
        for i in 0..4u32 {
            store.submit(i % 2, i / 2, MacroblockPixels::flat(i as u8 + 1, 9, 9));
        }
        store.flush();
        assert_eq!(store.pending(), 0);
        let frame = store.snapshot();
        assert_eq!(frame.y[0], 1);
        assert_eq!(frame.y[16], 2);
        assert_eq!(frame.y[16 * 32], 3);
        assert_eq!(frame.y[31 * 32 + 31], 4);
    }

    #[test]
    fn reset_drops_pending_blocks() {
        let mut store = ReferenceStore::new(64, 64);
        store.submit(0, 0, MacroblockPixels::flat(1, 1, 1));
        store.reset(64, 64);
        store.flush();
        assert_eq!(store.luma().at(0, 0), 0);
    }

    #[test]
    fn load_then_snapshot_is_identity() {
        let mut frame = FramePixels::solid(32, 32, 0, 0, 0);
        for (i, p) in frame.y.iter_mut().enumerate() {
            *p = (i * 7 % 256) as u8;
        }
        let mut store = ReferenceStore::new(64, 64);
        store.reset(32, 32);
        store.load(&frame);
        assert_eq!(store.snapshot(), frame);
    }
}
