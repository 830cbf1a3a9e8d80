use std::io;
use std::path::Path;

use cushy::figures::units::UPx;
use cushy::figures::{Point, Size};
use cushy::styles::Color;

pub type Rgba = [u8; 4];

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RasterBuffer {
    size: Size<UPx>,
    pixels: Vec<Rgba>,
}

impl RasterBuffer {
    pub fn new(size: Size<UPx>) -> Self {
        Self::filled(size, Color(0))
    }

    pub fn filled(size: Size<UPx>, color: Color) -> Self {
        let len = pixel_count(size);
        Self {
            size,
            pixels: vec![rgba(color); len],
        }
    }

    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> Option<Self> {
        let size = Size::new(UPx::new(width), UPx::new(height));
        if bytes.len() != pixel_count(size).checked_mul(4)? {
            return None;
        }

        let pixels = bytes
            .chunks_exact(4)
            .map(|px| [px[0], px[1], px[2], px[3]])
            .collect();
        Some(Self { size, pixels })
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let decoded = image::load_from_memory(bytes)?.into_rgba8();
        let (width, height) = decoded.dimensions();
        if width == 0 || height == 0 {
            return Err(DecodeError::Empty);
        }

        Self::from_rgba8(width, height, decoded.as_raw()).ok_or(DecodeError::Empty)
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, DecodeError> {
        let bytes = std::fs::read(path)?;
        Self::decode(&bytes)
    }

    pub const fn size(&self) -> Size<UPx> {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width.get()
    }

    pub fn height(&self) -> u32 {
        self.size.height.get()
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Rgba] {
        &mut self.pixels
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn coordinate_to_offset(&self, coord: impl ImageCoordinate) -> Option<usize> {
        let coord = coord.to_pixel()?;
        let width = self.width();
        if coord.x >= width || coord.y >= self.height() {
            return None;
        }

        usize::try_from(u64::from(coord.x) + u64::from(coord.y) * u64::from(width)).ok()
    }

    pub fn pixel(&self, coord: impl ImageCoordinate) -> Option<Rgba> {
        self.coordinate_to_offset(coord)
            .map(|offset| self.pixels[offset])
    }

    pub fn pixel_mut(&mut self, coord: impl ImageCoordinate) -> Option<&mut Rgba> {
        self.coordinate_to_offset(coord)
            .map(|offset| &mut self.pixels[offset])
    }

    pub fn alpha(&self, coord: impl ImageCoordinate) -> Option<u8> {
        self.pixel(coord).map(|px| px[3])
    }

    pub fn fill(&mut self, color: Color) {
        self.pixels.fill(rgba(color));
    }

    pub fn clear(&mut self) {
        self.pixels.fill([0; 4]);
    }

    pub fn reset(&mut self, size: Size<UPx>, color: Color) {
        self.size = size;
        self.pixels.clear();
        self.pixels.resize(pixel_count(size), rgba(color));
    }

    /// Becomes a copy of `other`, reusing the allocation.
    pub fn copy_from(&mut self, other: &Self) {
        self.size = other.size;
        self.pixels.clear();
        self.pixels.extend_from_slice(&other.pixels);
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|px| px[3] == 0)
    }
}

fn pixel_count(size: Size<UPx>) -> usize {
    usize::try_from(u64::from(size.width.get()) * u64::from(size.height.get()))
        .unwrap_or(usize::MAX)
}

pub const fn rgba(color: Color) -> Rgba {
    color.0.to_be_bytes()
}

/// Straight-alpha source-over: composites `src`, with its alpha scaled by
/// `opacity`, onto `dst`.
pub fn source_over(dst: &mut Rgba, src: Rgba, opacity: f32) {
    let src_alpha = f32::from(src[3]) / 255. * opacity.clamp(0., 1.);
    if src_alpha <= 0. {
        return;
    }

    let dst_alpha = f32::from(dst[3]) / 255.;
    let out_alpha = src_alpha + dst_alpha * (1. - src_alpha);
    for channel in 0..3 {
        let blended = (f32::from(src[channel]) * src_alpha
            + f32::from(dst[channel]) * dst_alpha * (1. - src_alpha))
            / out_alpha;
        dst[channel] = to_channel(blended);
    }
    dst[3] = to_channel(out_alpha * 255.);
}

/// Destination-out: removes `coverage` of the destination's alpha and leaves
/// its color alone.
pub fn destination_out(dst: &mut Rgba, coverage: f32) {
    let remaining = 1. - coverage.clamp(0., 1.);
    dst[3] = to_channel(f32::from(dst[3]) * remaining);
}

fn to_channel(value: f32) -> u8 {
    value.round().clamp(0., 255.) as u8
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unreadable image data: {0}")]
    Image(#[from] image::ImageError),
    #[error("error reading image: {0}")]
    Io(#[from] io::Error),
    #[error("image has no pixels")]
    Empty,
}

pub trait ImageCoordinate {
    fn to_pixel(self) -> Option<Point<u32>>;
}

impl ImageCoordinate for Point<f32> {
    fn to_pixel(self) -> Option<Point<u32>> {
        if self.x.is_sign_positive() && self.y.is_sign_positive() {
            Some(self.map(|c| c.floor() as u32))
        } else {
            None
        }
    }
}

impl ImageCoordinate for Point<u32> {
    fn to_pixel(self) -> Option<Point<u32>> {
        Some(self)
    }
}

impl ImageCoordinate for Point<i32> {
    fn to_pixel(self) -> Option<Point<u32>> {
        Some(Point::new(
            u32::try_from(self.x).ok()?,
            u32::try_from(self.y).ok()?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn size(width: u32, height: u32) -> Size<UPx> {
        Size::new(UPx::new(width), UPx::new(height))
    }

    #[test]
    fn rejects_mismatched_byte_length() {
        assert!(RasterBuffer::from_rgba8(2, 2, &[0; 15]).is_none());
        assert!(RasterBuffer::from_rgba8(2, 2, &[0; 16]).is_some());
    }

    #[test]
    fn decodes_png() {
        let mut encoded = Cursor::new(Vec::new());
        image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]))
            .write_to(&mut encoded, image::ImageFormat::Png)
            .unwrap();

        let decoded = RasterBuffer::decode(encoded.get_ref()).unwrap();
        assert_eq!(decoded.width(), 3);
        assert_eq!(decoded.height(), 2);
        assert_eq!(decoded.pixel(Point::new(2u32, 1)), Some([10, 20, 30, 255]));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = RasterBuffer::decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, DecodeError::Image(_)));
    }

    #[test]
    fn out_of_bounds_coordinates() {
        let buffer = RasterBuffer::new(size(4, 4));
        assert_eq!(buffer.pixel(Point::new(4u32, 0)), None);
        assert_eq!(buffer.pixel(Point::new(-1i32, 0)), None);
        assert_eq!(buffer.pixel(Point::new(-0.5f32, 1.)), None);
        assert_eq!(buffer.coordinate_to_offset(Point::new(1u32, 2)), Some(9));
    }

    #[test]
    fn byte_view_matches_pixels() {
        let buffer = RasterBuffer::filled(size(2, 3), Color(0x0102_0304));
        assert_eq!(buffer.as_bytes().len(), 24);
        assert_eq!(&buffer.as_bytes()[..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn source_over_opaque_replaces() {
        let mut dst = [1, 2, 3, 255];
        source_over(&mut dst, [200, 100, 50, 255], 1.);
        assert_eq!(dst, [200, 100, 50, 255]);
    }

    #[test]
    fn source_over_onto_transparent_keeps_source_color() {
        let mut dst = [0; 4];
        source_over(&mut dst, [200, 100, 50, 255], 0.5);
        assert_eq!(dst, [200, 100, 50, 128]);
    }

    #[test]
    fn destination_out_scales_alpha() {
        let mut dst = [9, 9, 9, 200];
        destination_out(&mut dst, 0.5);
        assert_eq!(dst, [9, 9, 9, 100]);
        destination_out(&mut dst, 1.);
        assert_eq!(dst[3], 0);
    }
}
