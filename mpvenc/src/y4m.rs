use crate::error::EncoderError;

/// One 4:2:0 planar picture. Chroma planes are `ceil(w/2) x ceil(h/2)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePixels {
    pub y: Vec<u8>,
    pub u: Vec<u8>,
    pub v: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

fn malformed(msg: impl Into<String>) -> EncoderError {
    EncoderError::Y4m(msg.into())
}

/// Luma and per-chroma plane sizes in bytes, `None` when they overflow.
fn plane_sizes(width: u32, height: u32) -> Option<(usize, usize)> {
    let y = (width as usize).checked_mul(height as usize)?;
    let uv = (width.div_ceil(2) as usize).checked_mul(height.div_ceil(2) as usize)?;
    Some((y, uv))
}

impl FramePixels {
    pub fn chroma_width(&self) -> u32 {
        self.width.div_ceil(2)
    }

    pub fn chroma_height(&self) -> u32 {
        self.height.div_ceil(2)
    }

    pub fn all_from_y4m(data: &[u8]) -> Result<Vec<Self>, EncoderError> {
        let header_end = data
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| malformed("no header line"))?;
        let header_line = std::str::from_utf8(&data[..header_end])
            .map_err(|_| malformed("header is not ASCII"))?;

        let mut tokens = header_line.split_whitespace();
        if tokens.next() != Some("YUV4MPEG2") {
            return Err(malformed("missing YUV4MPEG2 signature"));
        }

        let mut width = 0u32;
        let mut height = 0u32;

        for token in tokens {
            if !token.is_char_boundary(1) {
                continue;
            }
            let (key, val) = token.split_at(1);
            match key {
                "W" => width = val.parse().map_err(|_| malformed(format!("bad width {val:?}")))?,
                "H" => height = val.parse().map_err(|_| malformed(format!("bad height {val:?}")))?,
                "C" if !val.starts_with("420") => {
                    return Err(malformed(format!("unsupported colour space C{val}")));
                }
                _ => {}
            }
        }

        if width == 0 || height == 0 {
            return Err(malformed("missing W/H in header"));
        }

        let (y_size, uv_size) =
            plane_sizes(width, height).ok_or_else(|| malformed(format!("frame size {width}x{height} too large")))?;
        let frame_data_size = uv_size
            .checked_mul(2)
            .and_then(|uv| uv.checked_add(y_size))
            .ok_or_else(|| malformed(format!("frame size {width}x{height} too large")))?;
        let frame_marker = b"FRAME";

        let mut frames = Vec::new();
        let mut pos = header_end + 1;

        while pos + frame_marker.len() <= data.len() && data[pos..].starts_with(frame_marker) {
            // frame headers may carry parameters up to the newline
            let line_end = data[pos..]
                .iter()
                .position(|&b| b == b'\n')
                .ok_or_else(|| malformed("unterminated FRAME header"))?;
            let pixel_start = pos + line_end + 1;
            if data.len() - pixel_start < frame_data_size {
                return Err(malformed(format!("truncated frame {}", frames.len())));
            }

            let planes = &data[pixel_start..pixel_start + frame_data_size];
            frames.push(Self {
                y: planes[..y_size].to_vec(),
                u: planes[y_size..y_size + uv_size].to_vec(),
                v: planes[y_size + uv_size..].to_vec(),
                width,
                height,
            });

            pos = pixel_start + frame_data_size;
        }

        Ok(frames)
    }

    pub fn all_from_y4m_file(path: &std::path::Path) -> Result<Vec<Self>, EncoderError> {
        let data = std::fs::read(path)?;
        Self::all_from_y4m(&data)
    }

    pub fn from_y4m(data: &[u8]) -> Result<Self, EncoderError> {
        Self::all_from_y4m(data)?
            .into_iter()
            .next()
            .ok_or_else(|| malformed("no FRAME marker"))
    }

    pub fn solid(width: u32, height: u32, y: u8, u: u8, v: u8) -> Self {
        let y_size = width as usize * height as usize;
        let uv_size = width.div_ceil(2) as usize * height.div_ceil(2) as usize;

        Self {
            y: vec![y; y_size],
            u: vec![u; uv_size],
            v: vec![v; uv_size],
            width,
            height,
        }
    }

    /// Test pattern: 8-pixel checkerboard on luma, horizontal and vertical
    /// gradients on chroma. `offset` shifts the pattern right and down by
    /// that many luma pixels, so consecutive offsets give a moving picture.
    pub fn grid(width: u32, height: u32, offset: u32) -> Self {
        let mut frame = Self::solid(width, height, 0, 0, 0);
        for row in 0..height {
            for col in 0..width {
                let cell = ((col + width - offset % width) / 8 + (row + height - offset % height) / 8) % 2;
                frame.y[(row * width + col) as usize] = if cell == 0 { 48 } else { 208 };
            }
        }
        let (cw, ch) = (frame.chroma_width(), frame.chroma_height());
        let shift = offset / 2;
        for row in 0..ch {
            for col in 0..cw {
                let idx = (row * cw + col) as usize;
                let gx = (col + cw - shift % cw) % cw;
                let gy = (row + ch - shift % ch) % ch;
                frame.u[idx] = (64 + gx * 128 / cw) as u8;
                frame.v[idx] = (64 + gy * 128 / ch) as u8;
            }
        }
        frame
    }
}
