//! Metadata accessor and per-call settings.

use serde::{Deserialize, Serialize};

use crate::yuv::Dimensions;

/// Quality used when the metadata carries no quality tag.
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Read-only access to the capture metadata of one request.
///
/// Each accessor returns `None` when its tag is absent. Values are passed
/// through unvalidated; [`JpegSettings::from_metadata`] decides what they
/// mean.
pub trait MetadataView {
    /// Main image quality, nominally 1-100.
    fn jpeg_quality(&self) -> Option<i32>;

    /// Requested thumbnail `(width, height)`.
    fn thumbnail_size(&self) -> Option<(i32, i32)>;

    /// Thumbnail quality, nominally 1-100.
    fn thumbnail_quality(&self) -> Option<i32>;

    /// Typed values for the EXIF container.
    fn exif_tags(&self) -> ExifTags;
}

/// GPS fix recorded with the capture.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpsInfo {
    /// Degrees, positive north
    pub latitude: f64,
    /// Degrees, positive east
    pub longitude: f64,
    /// Meters above sea level
    pub altitude: f64,
    /// Fix time in seconds since the Unix epoch (UTC)
    pub timestamp: i64,
    /// Name of the positioning method, e.g. "GPS" or "NETWORK"
    pub processing_method: String,
}

/// Already-extracted values destined for the EXIF container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExifTags {
    pub make: Option<String>,
    pub model: Option<String>,
    /// Clockwise rotation the viewer must apply (0, 90, 180 or 270)
    pub rotation_degrees: i32,
    /// Capture time as `YYYY:MM:DD HH:MM:SS`
    pub datetime: Option<String>,
    /// Exposure time in nanoseconds
    pub exposure_time_ns: Option<i64>,
    pub f_number: Option<f32>,
    pub iso: Option<u16>,
    /// Lens focal length in millimeters
    pub focal_length_mm: Option<f32>,
    pub flash_fired: bool,
    /// True when white balance was chosen automatically
    pub auto_white_balance: bool,
    pub gps: Option<GpsInfo>,
}

/// A concrete, serializable [`MetadataView`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureMetadata {
    pub jpeg_quality: Option<i32>,
    pub thumbnail_size: Option<(i32, i32)>,
    pub thumbnail_quality: Option<i32>,
    pub exif: ExifTags,
}

impl CaptureMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quality(mut self, quality: i32) -> Self {
        self.jpeg_quality = Some(quality);
        self
    }

    pub fn with_thumbnail(mut self, width: i32, height: i32, quality: i32) -> Self {
        self.thumbnail_size = Some((width, height));
        self.thumbnail_quality = Some(quality);
        self
    }
}

impl MetadataView for CaptureMetadata {
    fn jpeg_quality(&self) -> Option<i32> {
        self.jpeg_quality
    }

    fn thumbnail_size(&self) -> Option<(i32, i32)> {
        self.thumbnail_size
    }

    fn thumbnail_quality(&self) -> Option<i32> {
        self.thumbnail_quality
    }

    fn exif_tags(&self) -> ExifTags {
        self.exif.clone()
    }
}

/// Thumbnail generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailRequest {
    /// Target size; may still be odd, which the scaler rejects
    pub size: Dimensions,
    pub quality: u8,
}

/// Encoding settings resolved from a [`MetadataView`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegSettings {
    pub quality: u8,
    pub thumbnail: Option<ThumbnailRequest>,
}

impl JpegSettings {
    /// Resolve the settings for one compression.
    ///
    /// A present quality tag is used (clamped to 1-100); an absent one falls
    /// back to [`DEFAULT_JPEG_QUALITY`]. A thumbnail is requested only when
    /// both dimensions and the thumbnail quality are positive.
    pub fn from_metadata<M: MetadataView + ?Sized>(metadata: &M) -> Self {
        let quality = metadata
            .jpeg_quality()
            .map_or(DEFAULT_JPEG_QUALITY, clamp_quality);

        let thumbnail = match (metadata.thumbnail_size(), metadata.thumbnail_quality()) {
            (Some((width, height)), Some(quality)) if width > 0 && height > 0 && quality > 0 => {
                Some(ThumbnailRequest {
                    size: Dimensions::new(width as u32, height as u32),
                    quality: clamp_quality(quality),
                })
            }
            _ => None,
        };

        Self { quality, thumbnail }
    }
}

fn clamp_quality(quality: i32) -> u8 {
    quality.clamp(1, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_defaults_when_tag_absent() {
        let settings = JpegSettings::from_metadata(&CaptureMetadata::new());
        assert_eq!(settings.quality, 85);
    }

    #[test]
    fn test_quality_uses_tag_when_present() {
        // Regression: a present tag must win over the default, never the
        // other way around.
        for quality in [1, 50, 70, 95, 100] {
            let metadata = CaptureMetadata::new().with_quality(quality);
            assert_eq!(JpegSettings::from_metadata(&metadata).quality, quality as u8);
        }
    }

    #[test]
    fn test_quality_clamped() {
        assert_eq!(
            JpegSettings::from_metadata(&CaptureMetadata::new().with_quality(0)).quality,
            1
        );
        assert_eq!(
            JpegSettings::from_metadata(&CaptureMetadata::new().with_quality(250)).quality,
            100
        );
    }

    #[test]
    fn test_thumbnail_requested() {
        let metadata = CaptureMetadata::new().with_thumbnail(160, 120, 70);
        assert_eq!(
            JpegSettings::from_metadata(&metadata).thumbnail,
            Some(ThumbnailRequest {
                size: Dimensions::new(160, 120),
                quality: 70
            })
        );
    }

    #[test]
    fn test_thumbnail_disabled() {
        for metadata in [
            CaptureMetadata::new(),
            CaptureMetadata::new().with_thumbnail(0, 0, 70),
            CaptureMetadata::new().with_thumbnail(160, 0, 70),
            CaptureMetadata::new().with_thumbnail(-160, 120, 70),
            CaptureMetadata::new().with_thumbnail(160, 120, 0),
            CaptureMetadata::new().with_thumbnail(160, 120, -5),
            CaptureMetadata {
                thumbnail_size: Some((160, 120)),
                ..CaptureMetadata::default()
            },
        ] {
            assert_eq!(JpegSettings::from_metadata(&metadata).thumbnail, None);
        }
    }

    #[test]
    fn test_odd_thumbnail_size_passed_through() {
        let metadata = CaptureMetadata::new().with_thumbnail(161, 120, 70);
        let request = JpegSettings::from_metadata(&metadata).thumbnail.unwrap();
        assert_eq!(request.size, Dimensions::new(161, 120));
    }

    #[test]
    fn test_metadata_deserializes_with_defaults() {
        let metadata: CaptureMetadata =
            serde_json::from_str(r#"{"jpeg_quality": 92, "exif": {"make": "Acme"}}"#).unwrap();
        assert_eq!(metadata.jpeg_quality, Some(92));
        assert_eq!(metadata.exif.make.as_deref(), Some("Acme"));
        assert_eq!(metadata.thumbnail_size, None);
    }
}
