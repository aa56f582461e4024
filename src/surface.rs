//! Pixel buffers, display surfaces and page compositing.

use log::debug;

use crate::error::{Result, ViewerError};

const BYTES_PER_PIXEL: usize = 4;

/// Byte order of one 4-byte pixel in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgba,
    Bgra,
}

/// A rendered page: tightly packed, row-major, 4 bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    order: ChannelOrder,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw samples. Returns `None` for an empty size or when `data` does
    /// not hold exactly `width*height` pixels.
    pub fn new(width: u32, height: u32, order: ChannelOrder, data: Vec<u8>) -> Option<Self> {
        if width == 0
            || height == 0
            || data.len() != width as usize * height as usize * BYTES_PER_PIXEL
        {
            return None;
        }
        Some(Self {
            width,
            height,
            order,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Rewrite samples in place into `order` (red/blue swap, alpha kept).
    pub fn reorder(&mut self, order: ChannelOrder) {
        if self.order == order {
            return;
        }
        for px in self.data.chunks_exact_mut(BYTES_PER_PIXEL) {
            px.swap(0, 2);
        }
        self.order = order;
    }
}

/// Destination framebuffer owned by a display backend.
#[derive(Debug, Clone)]
pub struct PixelSurface {
    width: u32,
    height: u32,
    order: ChannelOrder,
    data: Vec<u8>,
}

impl PixelSurface {
    pub fn new(width: u32, height: u32, order: ChannelOrder) -> Self {
        Self {
            width,
            height,
            order,
            data: vec![0; width as usize * height as usize * BYTES_PER_PIXEL],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Reallocate for a new size. Contents are cleared.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.data.clear();
        self.data
            .resize(width as usize * height as usize * BYTES_PER_PIXEL, 0);
    }

    /// Fill the whole surface with an opaque RGB color.
    pub fn fill(&mut self, rgb: [u8; 3]) {
        self.fill_rect(SurfaceBox::new(0, 0, self.width, self.height), rgb);
    }

    /// Fill the part of `area` that lies inside the surface.
    pub fn fill_rect(&mut self, area: SurfaceBox, [r, g, b]: [u8; 3]) {
        let px = match self.order {
            ChannelOrder::Rgba => [r, g, b, 0xff],
            ChannelOrder::Bgra => [b, g, r, 0xff],
        };
        let x_end = area.x.saturating_add(area.width).min(self.width) as usize;
        let y_end = area.y.saturating_add(area.height).min(self.height) as usize;
        let stride = self.width as usize * BYTES_PER_PIXEL;
        for y in area.y as usize..y_end {
            let row = &mut self.data[y * stride..(y + 1) * stride];
            for x in area.x as usize..x_end {
                row[x * BYTES_PER_PIXEL..(x + 1) * BYTES_PER_PIXEL].copy_from_slice(&px);
            }
        }
    }
}

/// Sub-rectangle of a surface, in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl SurfaceBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Copy `rendered` centered into `surface_box` of `surface`.
///
/// Converts channel order to the surface's. Fails with `OutOfBounds`, writing
/// nothing, when the box leaves the surface or the page does not fit the box.
pub fn blit(
    rendered: &mut PixelBuffer,
    surface: &mut PixelSurface,
    surface_box: SurfaceBox,
) -> Result<()> {
    let x_offset = i64::from(surface_box.x)
        + (i64::from(surface_box.width) - i64::from(rendered.width)) / 2;
    let y_offset = i64::from(surface_box.y)
        + (i64::from(surface_box.height) - i64::from(rendered.height)) / 2;

    let box_inside = u64::from(surface_box.x) + u64::from(surface_box.width)
        <= u64::from(surface.width)
        && u64::from(surface_box.y) + u64::from(surface_box.height) <= u64::from(surface.height);
    if !box_inside || rendered.width > surface_box.width || rendered.height > surface_box.height {
        return Err(ViewerError::OutOfBounds {
            x: x_offset,
            y: y_offset,
            rendered_w: rendered.width,
            rendered_h: rendered.height,
            surface_w: surface.width,
            surface_h: surface.height,
        });
    }

    rendered.reorder(surface.order);

    // Both offsets are non-negative: the page fits inside a box that fits the surface.
    let (x_offset, y_offset) = (x_offset as usize, y_offset as usize);
    let stride = surface.width as usize * BYTES_PER_PIXEL;
    let row_bytes = rendered.width as usize * BYTES_PER_PIXEL;

    if rendered.width == surface.width {
        let start = y_offset * stride;
        surface.data[start..start + rendered.data.len()].copy_from_slice(&rendered.data);
    } else {
        for (i, row) in rendered.data.chunks_exact(row_bytes).enumerate() {
            let start = (y_offset + i) * stride + x_offset * BYTES_PER_PIXEL;
            surface.data[start..start + row_bytes].copy_from_slice(row);
        }
    }
    debug!(
        "blit: {}x{} at ({x_offset}, {y_offset}) into {}x{}",
        rendered.width, rendered.height, surface.width, surface.height
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, px: [u8; 4]) -> PixelBuffer {
        let data = px.repeat(width as usize * height as usize);
        PixelBuffer::new(width, height, ChannelOrder::Rgba, data).unwrap()
    }

    fn pixel(surface: &PixelSurface, x: u32, y: u32) -> [u8; 4] {
        let i = (y * surface.width() + x) as usize * 4;
        surface.data()[i..i + 4].try_into().unwrap()
    }

    #[test]
    fn buffer_rejects_wrong_length() {
        assert!(PixelBuffer::new(2, 2, ChannelOrder::Rgba, vec![0; 15]).is_none());
    }

    #[test]
    fn smaller_page_is_centered() {
        let mut surface = PixelSurface::new(6, 4, ChannelOrder::Rgba);
        let mut page = solid(2, 2, [9, 9, 9, 255]);
        blit(&mut page, &mut surface, SurfaceBox::new(0, 0, 6, 4)).unwrap();

        for y in 0..4 {
            for x in 0..6 {
                let inside = (2..4).contains(&x) && (1..3).contains(&y);
                let expected = if inside { [9, 9, 9, 255] } else { [0, 0, 0, 0] };
                assert_eq!(pixel(&surface, x, y), expected, "({x}, {y})");
            }
        }
    }

    #[test]
    fn full_width_page_is_centered_vertically() {
        let mut surface = PixelSurface::new(3, 5, ChannelOrder::Rgba);
        let mut page = solid(3, 1, [1, 2, 3, 4]);
        blit(&mut page, &mut surface, SurfaceBox::new(0, 0, 3, 5)).unwrap();
        assert_eq!(pixel(&surface, 0, 2), [1, 2, 3, 4]);
        assert_eq!(pixel(&surface, 2, 2), [1, 2, 3, 4]);
        assert_eq!(pixel(&surface, 0, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn channels_are_swapped_for_bgra_surface() {
        let mut surface = PixelSurface::new(1, 1, ChannelOrder::Bgra);
        let mut page = solid(1, 1, [10, 20, 30, 40]);
        blit(&mut page, &mut surface, SurfaceBox::new(0, 0, 1, 1)).unwrap();
        assert_eq!(pixel(&surface, 0, 0), [30, 20, 10, 40]);
    }

    #[test]
    fn decoration_inset_shifts_placement() {
        let mut surface = PixelSurface::new(8, 8, ChannelOrder::Rgba);
        let mut page = solid(2, 2, [5, 5, 5, 255]);
        // 6x4 content box below a 3px title bar, 1px left border.
        blit(&mut page, &mut surface, SurfaceBox::new(1, 3, 6, 4)).unwrap();
        assert_eq!(pixel(&surface, 3, 4), [5, 5, 5, 255]);
        assert_eq!(pixel(&surface, 4, 5), [5, 5, 5, 255]);
        assert_eq!(pixel(&surface, 2, 4), [0, 0, 0, 0]);
    }

    #[test]
    fn oversized_page_fails_without_writing() {
        let mut surface = PixelSurface::new(4, 4, ChannelOrder::Rgba);
        surface.fill([7, 7, 7]);
        let before = surface.data().to_vec();
        let mut page = solid(5, 2, [1, 1, 1, 1]);
        let err = blit(&mut page, &mut surface, SurfaceBox::new(0, 0, 4, 4)).unwrap_err();
        assert!(matches!(err, ViewerError::OutOfBounds { .. }));
        assert_eq!(surface.data(), &before[..]);
    }

    #[test]
    fn empty_page_cannot_reach_blit() {
        assert!(PixelBuffer::new(0, 3, ChannelOrder::Rgba, vec![]).is_none());
        assert!(PixelBuffer::new(3, 0, ChannelOrder::Rgba, vec![]).is_none());
    }

    #[test]
    fn box_outside_surface_fails() {
        let mut surface = PixelSurface::new(4, 4, ChannelOrder::Rgba);
        let mut page = solid(1, 1, [1, 1, 1, 1]);
        let err = blit(&mut page, &mut surface, SurfaceBox::new(2, 2, 4, 4)).unwrap_err();
        assert!(matches!(err, ViewerError::OutOfBounds { .. }));
    }

    #[test]
    fn fill_rect_is_clipped_to_surface() {
        let mut surface = PixelSurface::new(2, 2, ChannelOrder::Bgra);
        surface.fill_rect(SurfaceBox::new(1, 1, 10, 10), [1, 2, 3]);
        assert_eq!(pixel(&surface, 1, 1), [3, 2, 1, 255]);
        assert_eq!(pixel(&surface, 0, 0), [0, 0, 0, 0]);
    }
}
