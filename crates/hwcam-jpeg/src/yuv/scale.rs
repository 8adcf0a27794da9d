//! Planar rescaling for thumbnail generation.
//!
//! Each plane is resized independently with the `image` crate's triangle
//! (bilinear) filter into a fresh contiguous I420 buffer.

use image::imageops::{self, FilterType};
use image::GrayImage;
use tracing::{debug, error};

use super::{Dimensions, I420Buffer, PlanarImage, Plane};
use crate::error::CompressError;

/// Diagnostic code reported when the source planes cannot be scaled.
pub const SCALE_ERROR_INVALID_ARGUMENT: i32 = -1;

/// Scale a 4:2:0 image to `dst_size` with bilinear filtering.
///
/// # Errors
///
/// - `UnsupportedChromaLayout` if the source chroma step is not 1
/// - `InvalidThumbnailDimensions` if either destination dimension is odd
/// - `ScalingFailure` if the source or destination geometry is unusable
///   (empty, or planes smaller than the declared size)
///
/// No buffer is returned on failure.
pub fn scale_i420(src: &PlanarImage<'_>, dst_size: Dimensions) -> Result<I420Buffer, CompressError> {
    if !src.is_fully_planar() {
        error!(chroma_step = src.chroma_step, "thumbnail: interleaved chroma is not supported");
        return Err(CompressError::UnsupportedChromaLayout(src.chroma_step));
    }

    if !dst_size.is_even() {
        error!(
            width = dst_size.width,
            height = dst_size.height,
            "thumbnail: dimensions must be even"
        );
        return Err(CompressError::InvalidThumbnailDimensions(dst_size));
    }

    let code = validate_geometry(src, dst_size);
    if code != 0 {
        error!(code, "thumbnail: planar scale failed");
        return Err(CompressError::ScalingFailure { code });
    }

    let src_luma = src.size;
    let src_chroma = src.size.chroma();
    let dst_chroma = Dimensions::new(dst_size.width / 2, dst_size.height / 2);

    let mut dst = I420Buffer::new(dst_size).ok_or(CompressError::InvalidThumbnailDimensions(dst_size))?;
    let (y, cb, cr) = dst.planes_mut();

    let jobs = [
        (src.y, src_luma, dst_size, y),
        (src.cb, src_chroma, dst_chroma, cb),
        (src.cr, src_chroma, dst_chroma, cr),
    ];
    for (plane, from, to, out) in jobs {
        let scaled = scale_plane(&plane, from, to).ok_or_else(|| {
            error!("thumbnail: plane does not match its declared size");
            CompressError::ScalingFailure {
                code: SCALE_ERROR_INVALID_ARGUMENT,
            }
        })?;
        out.copy_from_slice(&scaled);
    }

    debug!(
        src_width = src_luma.width,
        src_height = src_luma.height,
        dst_width = dst_size.width,
        dst_height = dst_size.height,
        "thumbnail: scaled"
    );
    Ok(dst)
}

/// Returns 0 when scaling can proceed, a negative diagnostic code otherwise.
fn validate_geometry(src: &PlanarImage<'_>, dst_size: Dimensions) -> i32 {
    if src.size.is_empty() || dst_size.is_empty() || !src.covers_geometry() {
        return SCALE_ERROR_INVALID_ARGUMENT;
    }
    0
}

/// Resize the top-left `from` region of `plane` to `to`, tightly packed.
fn scale_plane(plane: &Plane<'_>, from: Dimensions, to: Dimensions) -> Option<Vec<u8>> {
    let (w, h) = (from.width as usize, from.height as usize);
    let mut packed = Vec::with_capacity(w * h);
    for row in 0..h {
        packed.extend_from_slice(plane.row(row)?.get(..w)?);
    }

    if from == to {
        return Some(packed);
    }

    let gray = GrayImage::from_raw(from.width, from.height, packed)?;
    let resized = imageops::resize(&gray, to.width, to.height, FilterType::Triangle);
    Some(resized.into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{gradient_image, TestImage};

    #[test]
    fn test_scale_basic() {
        let src = gradient_image(64, 48);
        let thumb = scale_i420(&src.view(), Dimensions::new(16, 12)).unwrap();

        assert_eq!(thumb.size(), Dimensions::new(16, 12));
        assert_eq!(thumb.as_bytes().len(), 16 * 12 * 3 / 2);
    }

    #[test]
    fn test_scale_preserves_flat_planes() {
        let src = TestImage::solid(40, 30, 90, 60, 200);
        let thumb = scale_i420(&src.view(), Dimensions::new(10, 6)).unwrap();

        let bytes = thumb.as_bytes();
        let (y, chroma) = bytes.split_at(60);
        let (cb, cr) = chroma.split_at(15);
        assert!(y.iter().all(|&v| v == 90));
        assert!(cb.iter().all(|&v| v == 60));
        assert!(cr.iter().all(|&v| v == 200));
    }

    #[test]
    fn test_scale_keeps_gradient_direction() {
        let src = gradient_image(128, 64);
        let thumb = scale_i420(&src.view(), Dimensions::new(32, 16)).unwrap();

        let view = thumb.as_planar();
        let row = view.y.row(8).unwrap();
        assert!(row[0] < row[31], "luma gradient should increase left to right");
    }

    #[test]
    fn test_scale_rejects_odd_dimensions() {
        let src = gradient_image(64, 48);
        let err = scale_i420(&src.view(), Dimensions::new(161, 120)).unwrap_err();
        assert_eq!(
            err,
            CompressError::InvalidThumbnailDimensions(Dimensions::new(161, 120))
        );
    }

    #[test]
    fn test_scale_rejects_interleaved_chroma() {
        let src = TestImage::semi_planar(32, 32);
        let err = scale_i420(&src.view(), Dimensions::new(16, 16)).unwrap_err();
        assert_eq!(err, CompressError::UnsupportedChromaLayout(2));
    }

    #[test]
    fn test_scale_reports_code_for_empty_target() {
        let src = gradient_image(32, 32);
        let err = scale_i420(&src.view(), Dimensions::new(0, 0)).unwrap_err();
        assert_eq!(
            err,
            CompressError::ScalingFailure {
                code: SCALE_ERROR_INVALID_ARGUMENT
            }
        );
    }

    #[test]
    fn test_scale_reports_code_for_undersized_planes() {
        let src = gradient_image(32, 32);
        let mut view = src.view();
        view.size = Dimensions::new(64, 64);

        let err = scale_i420(&view, Dimensions::new(16, 16)).unwrap_err();
        assert!(matches!(err, CompressError::ScalingFailure { .. }));
    }
}
