//! Planar YCbCr image views.
//!
//! A [`PlanarImage`] borrows three planes from a caller-owned mapping. Each
//! [`Plane`] is a bounds-checked descriptor (slice, stride, row length, row
//! count) so no raw offset arithmetic leaves this module.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors constructing a plane descriptor.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlaneError {
    /// Row stride is shorter than the row itself.
    #[error("stride {stride} is smaller than row length {row_len}")]
    StrideTooSmall { stride: usize, row_len: usize },

    /// Backing memory ends before the last row does.
    #[error("plane needs {required} bytes, backing slice has {actual}")]
    TooShort { required: usize, actual: usize },
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Dimensions of each chroma plane under 4:2:0 subsampling.
    pub fn chroma(self) -> Dimensions {
        Dimensions {
            width: self.width.div_ceil(2),
            height: self.height.div_ceil(2),
        }
    }

    pub fn is_even(self) -> bool {
        self.width % 2 == 0 && self.height % 2 == 0
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// One plane of a planar image: a row-strided view over borrowed bytes.
#[derive(Debug, Clone, Copy)]
pub struct Plane<'a> {
    data: &'a [u8],
    stride: usize,
    row_len: usize,
    rows: usize,
}

impl<'a> Plane<'a> {
    /// Describe `rows` rows of `row_len` bytes each, `stride` bytes apart.
    ///
    /// The last row only needs `row_len` bytes, so a tightly cropped mapping
    /// without trailing stride padding is accepted.
    pub fn new(data: &'a [u8], stride: usize, row_len: usize, rows: usize) -> Result<Self, PlaneError> {
        if stride < row_len {
            return Err(PlaneError::StrideTooSmall { stride, row_len });
        }

        let required = match rows {
            0 => 0,
            n => (n - 1) * stride + row_len,
        };
        if data.len() < required {
            return Err(PlaneError::TooShort {
                required,
                actual: data.len(),
            });
        }

        Ok(Self {
            data,
            stride,
            row_len,
            rows,
        })
    }

    /// A tightly packed plane (`stride == row_len`).
    pub fn packed(data: &'a [u8], row_len: usize, rows: usize) -> Result<Self, PlaneError> {
        Self::new(data, row_len, row_len, rows)
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn row_len(&self) -> usize {
        self.row_len
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Row `y`, or `None` past the last row.
    pub fn row(&self, y: usize) -> Option<&'a [u8]> {
        if y >= self.rows {
            return None;
        }
        let start = y * self.stride;
        self.data.get(start..start + self.row_len)
    }

    /// Copy the plane into a tightly packed buffer.
    pub fn to_packed(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.row_len * self.rows);
        for y in 0..self.rows {
            if let Some(row) = self.row(y) {
                out.extend_from_slice(row);
            }
        }
        out
    }
}

/// A borrowed 4:2:0 YCbCr image.
///
/// `chroma_step` is the byte distance between successive chroma samples in a
/// row; only `1` (fully planar) is encodable. Semi-planar layouts can still be
/// described so callers get a typed rejection instead of garbage output.
#[derive(Debug, Clone, Copy)]
pub struct PlanarImage<'a> {
    pub y: Plane<'a>,
    pub cb: Plane<'a>,
    pub cr: Plane<'a>,
    pub chroma_step: usize,
    pub size: Dimensions,
}

impl<'a> PlanarImage<'a> {
    pub fn new(y: Plane<'a>, cb: Plane<'a>, cr: Plane<'a>, chroma_step: usize, size: Dimensions) -> Self {
        Self {
            y,
            cb,
            cr,
            chroma_step,
            size,
        }
    }

    /// Whether chroma samples are tightly packed within their rows.
    pub fn is_fully_planar(&self) -> bool {
        self.chroma_step == 1
    }

    /// Whether the plane descriptors cover the declared 4:2:0 geometry.
    pub fn covers_geometry(&self) -> bool {
        let luma = self.size;
        let chroma = self.size.chroma();
        self.y.row_len() >= luma.width as usize
            && self.y.rows() >= luma.height as usize
            && [self.cb, self.cr].iter().all(|plane| {
                plane.row_len() >= chroma.width as usize && plane.rows() >= chroma.height as usize
            })
    }
}

/// An owned, contiguous I420 buffer: `[Y: w*h][Cb: w*h/4][Cr: w*h/4]`.
///
/// Dimensions are always even, so every plane is exactly sized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I420Buffer {
    size: Dimensions,
    data: Vec<u8>,
}

impl I420Buffer {
    /// Allocate a zeroed buffer. Returns `None` for odd dimensions.
    pub fn new(size: Dimensions) -> Option<Self> {
        if !size.is_even() {
            return None;
        }
        Some(Self {
            size,
            data: vec![0; size.pixel_count() * 3 / 2],
        })
    }

    pub fn size(&self) -> Dimensions {
        self.size
    }

    /// The whole contiguous allocation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    fn luma_len(&self) -> usize {
        self.size.pixel_count()
    }

    fn chroma_len(&self) -> usize {
        self.size.pixel_count() / 4
    }

    /// Mutable access to the Y, Cb and Cr planes in that order.
    pub fn planes_mut(&mut self) -> (&mut [u8], &mut [u8], &mut [u8]) {
        let luma_len = self.luma_len();
        let chroma_len = self.chroma_len();
        let (y, chroma) = self.data.split_at_mut(luma_len);
        let (cb, cr) = chroma.split_at_mut(chroma_len);
        (y, cb, cr)
    }

    /// Borrow as a [`PlanarImage`] with chroma stride `width / 2`.
    pub fn as_planar(&self) -> PlanarImage<'_> {
        let Dimensions { width, height } = self.size;
        let (w, h) = (width as usize, height as usize);
        let luma_len = self.luma_len();
        let chroma_len = self.chroma_len();

        let empty = Plane {
            data: &[],
            stride: 0,
            row_len: 0,
            rows: 0,
        };
        let plane = |offset: usize, len: usize, row_len: usize, rows: usize| {
            Plane::packed(&self.data[offset..offset + len], row_len, rows).unwrap_or(empty)
        };

        PlanarImage {
            y: plane(0, luma_len, w, h),
            cb: plane(luma_len, chroma_len, w / 2, h / 2),
            cr: plane(luma_len + chroma_len, chroma_len, w / 2, h / 2),
            chroma_step: 1,
            size: self.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_rows_respect_stride() {
        let data: Vec<u8> = (0..12).collect();
        let plane = Plane::new(&data, 4, 3, 3).unwrap();

        assert_eq!(plane.row(0), Some(&[0, 1, 2][..]));
        assert_eq!(plane.row(2), Some(&[8, 9, 10][..]));
        assert_eq!(plane.row(3), None);
    }

    #[test]
    fn test_plane_accepts_missing_final_padding() {
        let data = vec![0u8; 11];
        assert!(Plane::new(&data, 4, 3, 3).is_ok());
    }

    #[test]
    fn test_plane_rejects_short_backing() {
        let data = vec![0u8; 10];
        assert_eq!(
            Plane::new(&data, 4, 3, 3).unwrap_err(),
            PlaneError::TooShort {
                required: 11,
                actual: 10
            }
        );
    }

    #[test]
    fn test_plane_rejects_small_stride() {
        let data = vec![0u8; 64];
        assert!(matches!(
            Plane::new(&data, 2, 3, 3),
            Err(PlaneError::StrideTooSmall { .. })
        ));
    }

    #[test]
    fn test_row_past_end() {
        let data: Vec<u8> = (0..6).collect();
        let plane = Plane::packed(&data, 2, 3).unwrap();

        assert_eq!(plane.row(2), Some(&[4, 5][..]));
        assert_eq!(plane.row(3), None);
    }

    #[test]
    fn test_to_packed_drops_stride_padding() {
        let data = vec![1, 2, 0xEE, 3, 4, 0xEE];
        let plane = Plane::new(&data, 3, 2, 2).unwrap();
        assert_eq!(plane.to_packed(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_chroma_dimensions_round_up() {
        assert_eq!(Dimensions::new(640, 480).chroma(), Dimensions::new(320, 240));
        assert_eq!(Dimensions::new(5, 3).chroma(), Dimensions::new(3, 2));
    }

    #[test]
    fn test_i420_layout() {
        let mut buf = I420Buffer::new(Dimensions::new(4, 2)).unwrap();
        assert_eq!(buf.as_bytes().len(), 12);

        let (y, cb, cr) = buf.planes_mut();
        assert_eq!((y.len(), cb.len(), cr.len()), (8, 2, 2));
        y.fill(1);
        cb.fill(2);
        cr.fill(3);

        assert_eq!(buf.as_bytes(), &[1, 1, 1, 1, 1, 1, 1, 1, 2, 2, 3, 3]);

        let planar = buf.as_planar();
        assert!(planar.is_fully_planar());
        assert!(planar.covers_geometry());
        assert_eq!(planar.cb.stride(), 2);
        assert_eq!(planar.cr.row(0), Some(&[3, 3][..]));
    }

    #[test]
    fn test_i420_rejects_odd_dimensions() {
        assert!(I420Buffer::new(Dimensions::new(161, 120)).is_none());
        assert!(I420Buffer::new(Dimensions::new(160, 121)).is_none());
    }
}
