/*
 *  display/bitmap.rs
 *
 *  display-handler - two rows, two protocols
 *  (c) 2023-26 display-handler contributors
 *
 *  BMP container and packed 4-bit frame codec for the bitmap display family
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use crate::display::canvas::GlyphCanvas;

/// Header the panel expects in front of packed pixel data
pub const FRAME_HEADER: [u8; 4] = [0x1F, 0x28, 0x66, 0x12];

const FILE_HEADER_LEN: usize = 14;
const INFO_HEADER_LEN: usize = 40;
const PALETTE_START: usize = FILE_HEADER_LEN + INFO_HEADER_LEN;
const PALETTE_ENTRIES: usize = 256;

// header field offsets
const OFF_FILE_SIZE: usize = 2;
const OFF_DATA_OFFSET: usize = 10;
const OFF_COLORS_USED: usize = 46;

/// A frame ready for the wire: header + one byte per pixel pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedFrame(Vec<u8>);

impl PackedFrame {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Packed pixel bytes without the header
    pub fn payload(&self) -> &[u8] {
        &self.0[FRAME_HEADER.len()..]
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for PackedFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Store a canvas as an 8-bit palettized BMP (grey ramp palette, bottom-up
/// rows padded to 4 bytes).
pub fn to_bmp(canvas: &GlyphCanvas) -> Vec<u8> {
    let (w, h) = (canvas.width(), canvas.height());
    let stride = (w + 3) & !3;
    let data_offset = PALETTE_START + PALETTE_ENTRIES * 4;
    let image_size = stride * h;
    let file_size = data_offset + image_size;

    let mut out = Vec::with_capacity(file_size);

    // file header
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&(file_size as u32).to_le_bytes());
    out.extend_from_slice(&[0u8; 4]);
    out.extend_from_slice(&(data_offset as u32).to_le_bytes());

    // BITMAPINFOHEADER
    out.extend_from_slice(&(INFO_HEADER_LEN as u32).to_le_bytes());
    out.extend_from_slice(&(w as i32).to_le_bytes());
    out.extend_from_slice(&(h as i32).to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&8u16.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // BI_RGB
    out.extend_from_slice(&(image_size as u32).to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&(PALETTE_ENTRIES as u32).to_le_bytes());
    out.extend_from_slice(&(PALETTE_ENTRIES as u32).to_le_bytes());

    for i in 0..PALETTE_ENTRIES {
        let v = i as u8;
        out.extend_from_slice(&[v, v, v, 0]);
    }

    for y in (0..h).rev() {
        let row = canvas.row(y);
        out.extend_from_slice(row);
        out.resize(out.len() + (stride - w), 0);
    }

    out
}

#[inline]
fn le_u32(buf: &[u8], at: usize) -> Option<usize> {
    buf.get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as usize)
}

/// Pack a BMP container into the panel's transfer format.
///
/// Sizes, data offset and palette length are all read from the container's
/// own header. Each pixel pair becomes one byte: the two palette
/// intensities are cut to 4 bits, `(a >> 4) | (b & 0xF0)`, then the nibbles
/// are swapped. The panel firmware unpacks exactly this layout.
pub fn encode(container: &[u8]) -> PackedFrame {
    let mut out = FRAME_HEADER.to_vec();

    let (Some(stored), Some(offset), Some(colors)) = (
        le_u32(container, OFF_FILE_SIZE),
        le_u32(container, OFF_DATA_OFFSET),
        le_u32(container, OFF_COLORS_USED),
    ) else {
        return PackedFrame(out);
    };
    if container.len() < PALETTE_START || colors == 0 {
        return PackedFrame(out);
    }

    let palette: Vec<u8> = (0..colors)
        .map(|i| container.get(PALETTE_START + i * 4).copied().unwrap_or(0))
        .collect();
    let intensity = |idx: Option<&u8>| -> u8 {
        idx.and_then(|&c| palette.get(c as usize).copied()).unwrap_or(0)
    };

    let end = stored.min(container.len());
    let pixels = container.get(offset..end).unwrap_or(&[]);
    out.reserve(pixels.len().div_ceil(2));

    for pair in pixels.chunks(2) {
        let a = intensity(pair.first());
        let b = intensity(pair.get(1));
        let packed = (a >> 4) | (b & 0xF0);
        out.push(packed.rotate_left(4));
    }

    PackedFrame(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::pixelcolor::Gray8;
    use embedded_graphics::prelude::*;

    fn container(pixels: &[u8], colors: u32) -> Vec<u8> {
        let offset = PALETTE_START + colors as usize * 4;
        let size = offset + pixels.len();
        let mut c = vec![0u8; offset];
        c[0] = b'B';
        c[1] = b'M';
        c[OFF_FILE_SIZE..OFF_FILE_SIZE + 4].copy_from_slice(&(size as u32).to_le_bytes());
        c[OFF_DATA_OFFSET..OFF_DATA_OFFSET + 4].copy_from_slice(&(offset as u32).to_le_bytes());
        c[OFF_COLORS_USED..OFF_COLORS_USED + 4].copy_from_slice(&colors.to_le_bytes());
        for i in 0..colors as usize {
            c[PALETTE_START + i * 4] = i as u8;
        }
        c.extend_from_slice(pixels);
        c
    }

    #[test]
    fn test_pair_packing_bit_arithmetic() {
        // a=0xF0, b=0x30 -> (0x0F | 0x30) = 0x3F -> swapped 0xF3
        let frame = encode(&container(&[0xF0, 0x30], 256));
        assert_eq!(frame.as_bytes(), &[0x1F, 0x28, 0x66, 0x12, 0xF3]);
    }

    #[test]
    fn test_palette_lookup_is_used() {
        let mut c = container(&[1, 0], 2);
        // index 1 -> full white, index 0 -> black
        c[PALETTE_START + 4] = 0xFF;
        let frame = encode(&c);
        assert_eq!(frame.payload(), &[0xF0]);
    }

    #[test]
    fn test_odd_pixel_count_rounds_up() {
        let frame = encode(&container(&[0xFF, 0xFF, 0xFF], 256));
        assert_eq!(frame.len(), 4 + 2);
        assert_eq!(frame.payload(), &[0xFF, 0xF0]);
    }

    #[test]
    fn test_empty_and_paletteless_are_header_only() {
        assert_eq!(encode(&[]).as_bytes(), &FRAME_HEADER);
        assert_eq!(encode(&container(&[0xFF; 8], 0)).as_bytes(), &FRAME_HEADER);
        assert_eq!(encode(b"BM\x00\x00").as_bytes(), &FRAME_HEADER);
    }

    #[test]
    fn test_stored_size_clamped_to_buffer() {
        let mut c = container(&[0xFF, 0xFF], 256);
        c[OFF_FILE_SIZE..OFF_FILE_SIZE + 4].copy_from_slice(&u32::MAX.to_le_bytes());
        assert_eq!(encode(&c).len(), 5);
    }

    #[test]
    fn test_bmp_layout() {
        let canvas = GlyphCanvas::new(256, 64);
        let bmp = to_bmp(&canvas);
        assert_eq!(&bmp[0..2], b"BM");
        assert_eq!(le_u32(&bmp, OFF_FILE_SIZE), Some(bmp.len()));
        assert_eq!(le_u32(&bmp, OFF_DATA_OFFSET), Some(1078));
        assert_eq!(le_u32(&bmp, OFF_COLORS_USED), Some(256));
        assert_eq!(bmp.len(), 1078 + 256 * 64);
    }

    #[test]
    fn test_bmp_rows_are_bottom_up_and_padded() {
        let mut canvas = GlyphCanvas::new(3, 2);
        Pixel(Point::new(0, 0), Gray8::WHITE).draw(&mut canvas).unwrap();
        let bmp = to_bmp(&canvas);
        let data = &bmp[1078..];
        // stride 4: bottom row first, then top row
        assert_eq!(data, &[0, 0, 0, 0, 255, 0, 0, 0]);
    }

    #[test]
    fn test_full_canvas_frame_length() {
        let canvas = GlyphCanvas::new(256, 64);
        let frame = encode(&to_bmp(&canvas));
        assert_eq!(frame.len(), 4 + 256 * 64 / 2);
        assert!(frame.payload().iter().all(|&b| b == 0));
    }
}
