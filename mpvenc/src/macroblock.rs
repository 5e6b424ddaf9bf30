use crate::y4m::FramePixels;

pub const MB_SIZE: usize = 16;
pub const TILE_SIZE: usize = 8;
pub const TILES_PER_MB: usize = 6;

/// Plane a tile belongs to. Tiles 0..4 are the luma quadrants in raster
/// order, tile 4 is Cb and tile 5 is Cr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Luma,
    Cb,
    Cr,
}

impl Component {
    pub fn of_tile(tile: usize) -> Self {
        match tile {
            0..=3 => Component::Luma,
            4 => Component::Cb,
            _ => Component::Cr,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Component::Luma => 0,
            Component::Cb => 1,
            Component::Cr => 2,
        }
    }
}

/// Samples of one macroblock: 16x16 luma and the co-sited 8x8 chroma blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacroblockPixels {
    pub luma: [u8; 256],
    pub cb: [u8; 64],
    pub cr: [u8; 64],
}

impl MacroblockPixels {
    pub fn flat(y: u8, u: u8, v: u8) -> Self {
        Self {
            luma: [y; 256],
            cb: [u; 64],
            cr: [v; 64],
        }
    }

    /// Cuts macroblock (`mb_x`, `mb_y`) out of `frame`. Positions beyond the
    /// right or bottom edge repeat the last column or row. An empty plane
    /// reads as mid-gray.
    pub fn extract(frame: &FramePixels, mb_x: u32, mb_y: u32) -> Self {
        let mut mb = Self::flat(0, 0, 0);
        copy_clamped(
            &frame.y,
            frame.width as usize,
            frame.height as usize,
            mb_x as usize * MB_SIZE,
            mb_y as usize * MB_SIZE,
            MB_SIZE,
            &mut mb.luma,
        );
        let (cw, ch) = (frame.chroma_width() as usize, frame.chroma_height() as usize);
        let (cx, cy) = (mb_x as usize * TILE_SIZE, mb_y as usize * TILE_SIZE);
        copy_clamped(&frame.u, cw, ch, cx, cy, TILE_SIZE, &mut mb.cb);
        copy_clamped(&frame.v, cw, ch, cx, cy, TILE_SIZE, &mut mb.cr);
        mb
    }

    pub fn tile(&self, index: usize) -> [u8; 64] {
        match Component::of_tile(index) {
            Component::Luma => {
                let mut out = [0u8; 64];
                let (x0, y0) = ((index & 1) * TILE_SIZE, (index >> 1) * TILE_SIZE);
                for row in 0..TILE_SIZE {
                    let src = (y0 + row) * MB_SIZE + x0;
                    out[row * TILE_SIZE..(row + 1) * TILE_SIZE]
                        .copy_from_slice(&self.luma[src..src + TILE_SIZE]);
                }
                out
            }
            Component::Cb => self.cb,
            Component::Cr => self.cr,
        }
    }

    pub fn set_tile(&mut self, index: usize, samples: &[u8; 64]) {
        match Component::of_tile(index) {
            Component::Luma => {
                let (x0, y0) = ((index & 1) * TILE_SIZE, (index >> 1) * TILE_SIZE);
                for row in 0..TILE_SIZE {
                    let dst = (y0 + row) * MB_SIZE + x0;
                    self.luma[dst..dst + TILE_SIZE]
                        .copy_from_slice(&samples[row * TILE_SIZE..(row + 1) * TILE_SIZE]);
                }
            }
            Component::Cb => self.cb = *samples,
            Component::Cr => self.cr = *samples,
        }
    }

    /// Luma mean, rounded half up.
    pub fn luma_mean(&self) -> u8 {
        let sum: u32 = self.luma.iter().map(|&p| p as u32).sum();
        ((sum + 128) >> 8) as u8
    }
}

fn copy_clamped(
    plane: &[u8],
    width: usize,
    height: usize,
    x0: usize,
    y0: usize,
    size: usize,
    out: &mut [u8],
) {
    if width == 0 || height == 0 {
        out.fill(128);
        return;
    }
    for row in 0..size {
        let y = (y0 + row).min(height - 1);
        for col in 0..size {
            let x = (x0 + col).min(width - 1);
            out[row * size + col] = plane[y * width + x];
        }
    }
}
