//! EXIF container construction and serialization.
//!
//! The container is assembled from typed [`ExifTags`] values, optionally
//! given a compressed thumbnail, and serialized as `"Exif\0\0"` followed by a
//! little-endian TIFF structure ready to be carried in an APP1 marker.

use std::io::Cursor;

use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use tracing::{debug, error};

use super::view::{ExifTags, GpsInfo};
use crate::encode::MAX_MARKER_PAYLOAD;
use crate::error::CompressError;
use crate::yuv::Dimensions;

/// Identifier preceding the TIFF structure inside an APP1 marker.
pub const EXIF_HEADER: &[u8; 6] = b"Exif\0\0";

/// Pixels per inch declared for both the main image and the thumbnail.
const RESOLUTION_DPI: u32 = 72;
const RESOLUTION_UNIT_INCH: u16 = 2;
const COMPRESSION_JPEG: u16 = 6;
const YCBCR_CENTERED: u16 = 1;
const COLOR_SPACE_SRGB: u16 = 1;

/// Character-code prefix of an ASCII `GPSProcessingMethod`.
const ASCII_CHARSET: &[u8; 8] = b"ASCII\0\0\0";

/// Serialized EXIF payload owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedExif(Vec<u8>);

impl SerializedExif {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// An EXIF container under construction.
#[derive(Debug, Clone)]
pub struct ExifContainer {
    fields: Vec<Field>,
    thumbnail: Option<Vec<u8>>,
}

impl ExifContainer {
    /// Build the primary image fields for an image of `size`.
    ///
    /// # Errors
    ///
    /// `ExifBuildFailure` if a text value cannot be represented (embedded NUL).
    pub fn new(tags: &ExifTags, size: Dimensions) -> Result<Self, CompressError> {
        let mut fields = Vec::new();
        let mut push = |tag: Tag, value: Value| fields.push(primary(tag, value));

        if let Some(make) = &tags.make {
            push(Tag::Make, ascii(make)?);
        }
        if let Some(model) = &tags.model {
            push(Tag::Model, ascii(model)?);
        }
        push(Tag::Orientation, Value::Short(vec![orientation(tags.rotation_degrees)]));
        push(Tag::XResolution, dpi());
        push(Tag::YResolution, dpi());
        push(Tag::ResolutionUnit, Value::Short(vec![RESOLUTION_UNIT_INCH]));
        push(Tag::YCbCrPositioning, Value::Short(vec![YCBCR_CENTERED]));
        if let Some(datetime) = &tags.datetime {
            let value = ascii(datetime)?;
            push(Tag::DateTime, value.clone());
            push(Tag::DateTimeOriginal, value.clone());
            push(Tag::DateTimeDigitized, value);
        }

        push(Tag::ExifVersion, Value::Undefined(b"0230".to_vec(), 0));
        push(Tag::FlashpixVersion, Value::Undefined(b"0100".to_vec(), 0));
        push(Tag::ComponentsConfiguration, Value::Undefined(vec![1, 2, 3, 0], 0));
        push(Tag::ColorSpace, Value::Short(vec![COLOR_SPACE_SRGB]));
        push(Tag::PixelXDimension, Value::Long(vec![size.width]));
        push(Tag::PixelYDimension, Value::Long(vec![size.height]));
        if let Some(ns) = tags.exposure_time_ns.filter(|ns| *ns > 0) {
            push(Tag::ExposureTime, rational(ns as f64 / 1e9, 1_000_000));
        }
        if let Some(f_number) = tags.f_number.filter(|f| *f > 0.0) {
            push(Tag::FNumber, rational(f64::from(f_number), 100));
        }
        if let Some(iso) = tags.iso {
            push(Tag::PhotographicSensitivity, Value::Short(vec![iso]));
        }
        if let Some(focal_length) = tags.focal_length_mm.filter(|f| *f > 0.0) {
            push(Tag::FocalLength, rational(f64::from(focal_length), 1000));
        }
        push(Tag::Flash, Value::Short(vec![u16::from(tags.flash_fired)]));
        push(Tag::WhiteBalance, Value::Short(vec![u16::from(!tags.auto_white_balance)]));

        if let Some(gps) = &tags.gps {
            push_gps(&mut fields, gps)?;
        }

        debug!(fields = fields.len(), "exif: container built");
        Ok(Self {
            fields,
            thumbnail: None,
        })
    }

    /// Attach a compressed thumbnail as the container's IFD1 image.
    ///
    /// Replaces any previously attached thumbnail. Must be called before
    /// [`serialize`](Self::serialize) for the thumbnail to be included.
    ///
    /// # Errors
    ///
    /// `ExifThumbnailAttachFailure` if `jpeg` is empty or cannot fit in an
    /// APP1 marker.
    pub fn attach_thumbnail(&mut self, jpeg: Vec<u8>) -> Result<(), CompressError> {
        if jpeg.is_empty() {
            error!("exif: empty thumbnail");
            return Err(CompressError::ExifThumbnailAttachFailure(
                "thumbnail stream is empty".into(),
            ));
        }
        if jpeg.len() > MAX_MARKER_PAYLOAD {
            error!(bytes = jpeg.len(), "exif: thumbnail too large");
            return Err(CompressError::ExifThumbnailAttachFailure(format!(
                "thumbnail of {} bytes cannot fit in an APP1 marker",
                jpeg.len()
            )));
        }
        self.thumbnail = Some(jpeg);
        Ok(())
    }

    /// Serialize to `"Exif\0\0"` + little-endian TIFF.
    ///
    /// # Errors
    ///
    /// `ExifBuildFailure` if the TIFF writer rejects the container.
    pub fn serialize(&self) -> Result<SerializedExif, CompressError> {
        let thumbnail_fields = [
            thumbnail(Tag::Compression, Value::Short(vec![COMPRESSION_JPEG])),
            thumbnail(Tag::XResolution, dpi()),
            thumbnail(Tag::YResolution, dpi()),
            thumbnail(Tag::ResolutionUnit, Value::Short(vec![RESOLUTION_UNIT_INCH])),
        ];

        let mut writer = Writer::new();
        for field in &self.fields {
            writer.push_field(field);
        }
        if let Some(jpeg) = &self.thumbnail {
            for field in &thumbnail_fields {
                writer.push_field(field);
            }
            writer.set_jpeg(jpeg, In::THUMBNAIL);
        }

        let mut tiff = Cursor::new(Vec::new());
        writer.write(&mut tiff, true).map_err(|err| {
            error!(%err, "exif: serialization failed");
            CompressError::ExifBuildFailure(err.to_string())
        })?;

        let tiff = tiff.into_inner();
        let mut out = Vec::with_capacity(EXIF_HEADER.len() + tiff.len());
        out.extend_from_slice(EXIF_HEADER);
        out.extend_from_slice(&tiff);

        debug!(bytes = out.len(), thumbnail = self.thumbnail.is_some(), "exif: serialized");
        Ok(SerializedExif(out))
    }
}

fn primary(tag: Tag, value: Value) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value,
    }
}

fn thumbnail(tag: Tag, value: Value) -> Field {
    Field {
        tag,
        ifd_num: In::THUMBNAIL,
        value,
    }
}

fn ascii(text: &str) -> Result<Value, CompressError> {
    if text.as_bytes().contains(&0) {
        error!(text, "exif: text value contains NUL");
        return Err(CompressError::ExifBuildFailure(format!(
            "text value {text:?} contains a NUL byte"
        )));
    }
    Ok(Value::Ascii(vec![text.as_bytes().to_vec()]))
}

fn dpi() -> Value {
    Value::Rational(vec![Rational::from((RESOLUTION_DPI, 1))])
}

/// `value` as a rational with fixed `denominator`.
fn rational(value: f64, denominator: u32) -> Value {
    Value::Rational(vec![to_rational(value, denominator)])
}

fn to_rational(value: f64, denominator: u32) -> Rational {
    let numerator = (value.abs() * f64::from(denominator)).round();
    Rational::from((numerator.min(f64::from(u32::MAX)) as u32, denominator))
}

/// EXIF orientation code for a clockwise display rotation.
fn orientation(rotation_degrees: i32) -> u16 {
    match rotation_degrees.rem_euclid(360) {
        90 => 6,
        180 => 3,
        270 => 8,
        _ => 1,
    }
}

fn push_gps(fields: &mut Vec<Field>, gps: &GpsInfo) -> Result<(), CompressError> {
    let latitude_ref = if gps.latitude < 0.0 { "S" } else { "N" };
    let longitude_ref = if gps.longitude < 0.0 { "W" } else { "E" };

    fields.push(primary(Tag::GPSLatitudeRef, ascii(latitude_ref)?));
    fields.push(primary(Tag::GPSLatitude, degrees_minutes_seconds(gps.latitude)));
    fields.push(primary(Tag::GPSLongitudeRef, ascii(longitude_ref)?));
    fields.push(primary(Tag::GPSLongitude, degrees_minutes_seconds(gps.longitude)));
    fields.push(primary(
        Tag::GPSAltitudeRef,
        Value::Byte(vec![u8::from(gps.altitude < 0.0)]),
    ));
    fields.push(primary(Tag::GPSAltitude, rational(gps.altitude, 100)));

    let (date, [hour, minute, second]) = utc_date_time(gps.timestamp);
    fields.push(primary(
        Tag::GPSTimeStamp,
        Value::Rational(vec![
            Rational::from((hour, 1)),
            Rational::from((minute, 1)),
            Rational::from((second, 1)),
        ]),
    ));
    fields.push(primary(Tag::GPSDateStamp, ascii(&date)?));

    if !gps.processing_method.is_empty() {
        let mut method = ASCII_CHARSET.to_vec();
        method.extend_from_slice(gps.processing_method.as_bytes());
        fields.push(primary(Tag::GPSProcessingMethod, Value::Undefined(method, 0)));
    }
    Ok(())
}

fn degrees_minutes_seconds(angle: f64) -> Value {
    let angle = angle.abs();
    let degrees = angle.trunc();
    let minutes = ((angle - degrees) * 60.0).trunc();
    let seconds = ((angle - degrees) * 60.0 - minutes) * 60.0;
    Value::Rational(vec![
        Rational::from((degrees as u32, 1)),
        Rational::from((minutes as u32, 1)),
        to_rational(seconds, 1000),
    ])
}

/// `("YYYY:MM:DD", [h, m, s])` in UTC for a Unix timestamp.
fn utc_date_time(timestamp: i64) -> (String, [u32; 3]) {
    let days = timestamp.div_euclid(86_400);
    let secs = timestamp.rem_euclid(86_400) as u32;

    // Days since 1970-01-01 to a proleptic Gregorian date.
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let day_of_era = z.rem_euclid(146_097);
    let year_of_era = (day_of_era - day_of_era / 1460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let mp = (5 * day_of_year + 2) / 153;
    let day = day_of_year - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = year_of_era + era * 400 + i64::from(month <= 2);

    (
        format!("{year:04}:{month:02}:{day:02}"),
        [secs / 3600, secs / 60 % 60, secs % 60],
    )
}
