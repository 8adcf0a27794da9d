//! Synthetic images and stream inspection shared by unit tests.

use crate::yuv::{Dimensions, PlanarImage, Plane};

/// Extra bytes at the end of every row, so stride handling is exercised.
const ROW_PADDING: usize = 8;

#[derive(Debug, Clone, Copy)]
struct Layout {
    offset: usize,
    stride: usize,
    row_len: usize,
    rows: usize,
}

/// An owned 4:2:0 image with padded strides.
///
/// Chroma is either two separate planes (`chroma_step == 1`) or one
/// interleaved CbCr plane (`chroma_step == 2`).
#[derive(Debug, Clone)]
pub struct TestImage {
    size: Dimensions,
    luma: Vec<u8>,
    luma_stride: usize,
    chroma: Vec<u8>,
    cb: Layout,
    cr: Layout,
    chroma_step: usize,
}

impl TestImage {
    /// Fully planar image filled with constant values.
    pub fn solid(width: u32, height: u32, y: u8, cb: u8, cr: u8) -> Self {
        let size = Dimensions::new(width, height);
        let chroma_size = size.chroma();
        let (w, h) = (width as usize, height as usize);
        let (cw, ch) = (chroma_size.width as usize, chroma_size.height as usize);

        let luma_stride = w + ROW_PADDING;
        let chroma_stride = cw + ROW_PADDING;
        let plane_len = chroma_stride * ch;

        let mut chroma = vec![cb; plane_len];
        chroma.extend(std::iter::repeat(cr).take(plane_len));

        Self {
            size,
            luma: vec![y; luma_stride * h],
            luma_stride,
            chroma,
            cb: Layout {
                offset: 0,
                stride: chroma_stride,
                row_len: cw,
                rows: ch,
            },
            cr: Layout {
                offset: plane_len,
                stride: chroma_stride,
                row_len: cw,
                rows: ch,
            },
            chroma_step: 1,
        }
    }

    /// Semi-planar (NV12-style) image: Cb and Cr interleaved in one plane.
    pub fn semi_planar(width: u32, height: u32) -> Self {
        let size = Dimensions::new(width, height);
        let chroma_size = size.chroma();
        let (w, h) = (width as usize, height as usize);
        let (cw, ch) = (chroma_size.width as usize, chroma_size.height as usize);

        let stride = 2 * cw;
        let layout = |offset| Layout {
            offset,
            stride,
            row_len: stride - 1,
            rows: ch,
        };

        Self {
            size,
            luma: vec![128; w * h],
            luma_stride: w,
            chroma: vec![128; stride * ch],
            cb: layout(0),
            cr: layout(1),
            chroma_step: 2,
        }
    }

    pub fn view(&self) -> PlanarImage<'_> {
        let Dimensions { width, height } = self.size;
        let luma = Plane::new(&self.luma, self.luma_stride, width as usize, height as usize).unwrap();
        let plane = |layout: Layout| {
            Plane::new(
                &self.chroma[layout.offset..],
                layout.stride,
                layout.row_len,
                layout.rows,
            )
            .unwrap()
        };
        PlanarImage::new(luma, plane(self.cb), plane(self.cr), self.chroma_step, self.size)
    }

    /// Set every sample of luma row `y` to `y` and of chroma row `c` to `c`.
    pub fn fill_rows_with_index(&mut self) {
        for (y, row) in self.luma.chunks_mut(self.luma_stride).enumerate() {
            row.fill(y as u8);
        }
        for layout in [self.cb, self.cr] {
            for c in 0..layout.rows {
                let start = layout.offset + c * layout.stride;
                self.chroma[start..start + layout.row_len].fill(c as u8);
            }
        }
    }

    fn fill_luma(&mut self, f: impl Fn(usize, usize) -> u8) {
        let width = self.size.width as usize;
        for (y, row) in self.luma.chunks_mut(self.luma_stride).enumerate() {
            for (x, sample) in row[..width].iter_mut().enumerate() {
                *sample = f(x, y);
            }
        }
    }

    /// Set Cb sample `(x, y)` of the chroma grid to `f(x, y)`.
    pub fn fill_cb(&mut self, f: impl Fn(usize, usize) -> u8) {
        let layout = self.cb;
        for y in 0..layout.rows {
            let start = layout.offset + y * layout.stride;
            let row = &mut self.chroma[start..start + layout.row_len];
            for (x, sample) in row.iter_mut().step_by(self.chroma_step).enumerate() {
                *sample = f(x, y);
            }
        }
    }

    /// Luma samples without stride padding.
    pub fn luma_packed(&self) -> Vec<u8> {
        self.view().y.to_packed()
    }
}

/// Smooth diagonal luma ramp over neutral chroma.
pub fn gradient_image(width: u32, height: u32) -> TestImage {
    let mut image = TestImage::solid(width, height, 0, 128, 128);
    let w = (width as usize).saturating_sub(1).max(1);
    let h = (height as usize).saturating_sub(1).max(1);
    image.fill_luma(|x, y| ((x * 255 / w + y * 255 / h) / 2) as u8);
    image
}

/// `(width, height)` declared by the baseline frame header of a JPEG stream.
pub fn jpeg_dimensions(jpeg: &[u8]) -> Option<(u32, u32)> {
    if jpeg.get(..2)? != [0xFF, 0xD8] {
        return None;
    }

    let mut pos = 2;
    loop {
        let header = jpeg.get(pos..pos + 4)?;
        if header[0] != 0xFF {
            return None;
        }
        let marker = header[1];
        let length = usize::from(u16::from_be_bytes([header[2], header[3]]));
        match marker {
            0xC0 => {
                let sof = jpeg.get(pos + 4..pos + 9)?;
                let height = u16::from_be_bytes([sof[1], sof[2]]);
                let width = u16::from_be_bytes([sof[3], sof[4]]);
                return Some((u32::from(width), u32::from(height)));
            }
            0xDA => return None,
            _ => pos += 2 + length,
        }
    }
}

#[test]
fn test_gradient_image_layout() {
    let image = gradient_image(10, 6);
    let view = image.view();
    assert!(view.is_fully_planar());
    assert!(view.covers_geometry());
    assert_eq!(view.y.stride(), 10 + ROW_PADDING);
    assert_eq!(view.y.row(0).unwrap()[0], 0);
    assert_eq!(view.y.row(5).unwrap()[9], 255);
    assert_eq!(image.luma_packed().len(), 60);
}

#[test]
fn test_semi_planar_layout() {
    let image = TestImage::semi_planar(8, 6);
    let view = image.view();
    assert_eq!(view.chroma_step, 2);
    assert_eq!(view.cb.row_len(), 7);
    assert_eq!(view.cr.rows(), 3);
}
