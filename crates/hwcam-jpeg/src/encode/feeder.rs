//! Block-aligned row feeding from a planar image into the encoder.
//!
//! The encoder consumes whole 16-row MCU bands. When the image height is not
//! a multiple of 16, the rows of the last band past the bottom edge are
//! filled with the last real row, so the encoder sees the padded height it
//! expects while no read ever goes past the source planes. The frame header
//! still declares the true height.

use std::io::Write;

use super::raw::{CodecError, RawEncoder, RowGroup, CHROMA_MCU_ROWS, MCU_ROWS};
use crate::yuv::PlanarImage;

/// A consumer of MCU bands, tracking how many luma rows it has taken.
pub trait RawDataSink {
    /// True image height the consumer was configured with.
    fn image_height(&self) -> u32;

    /// Luma rows consumed so far.
    fn next_scanline(&self) -> u32;

    /// Consume one band. An error aborts the whole feed.
    fn write_raw_data(&mut self, group: &RowGroup<'_>) -> Result<(), CodecError>;
}

impl<W: Write> RawDataSink for RawEncoder<W> {
    fn image_height(&self) -> u32 {
        RawEncoder::image_height(self)
    }

    fn next_scanline(&self) -> u32 {
        RawEncoder::next_scanline(self)
    }

    fn write_raw_data(&mut self, group: &RowGroup<'_>) -> Result<(), CodecError> {
        RawEncoder::write_raw_data(self, group)
    }
}

/// Feed every row of `image` to `sink` in 16-row bands.
///
/// Stops at the first band the sink rejects; there is no retry.
pub fn feed_rows<S: RawDataSink>(image: &PlanarImage<'_>, sink: &mut S) -> Result<(), CodecError> {
    let height = sink.image_height() as usize;
    if height == 0 {
        return Ok(());
    }
    let last_row = height - 1;

    while (sink.next_scanline() as usize) < height {
        let first = sink.next_scanline() as usize;
        let group = band(image, first, last_row)?;
        sink.write_raw_data(&group)?;
    }
    Ok(())
}

/// Rows `first..first + 16`, each clamped to `last_row`.
fn band<'a>(image: &PlanarImage<'a>, first: usize, last_row: usize) -> Result<RowGroup<'a>, CodecError> {
    let empty: &'a [u8] = &[];
    let mut group = RowGroup {
        luma: [empty; MCU_ROWS],
        cb: [empty; CHROMA_MCU_ROWS],
        cr: [empty; CHROMA_MCU_ROWS],
    };

    for i in 0..MCU_ROWS {
        let row = (first + i).min(last_row);
        group.luma[i] = image
            .y
            .row(row)
            .ok_or(CodecError::MissingRow { plane: "luma", row })?;

        if i % 2 == 0 {
            let chroma_row = row / 2;
            group.cb[i / 2] = image.cb.row(chroma_row).ok_or(CodecError::MissingRow {
                plane: "cb",
                row: chroma_row,
            })?;
            group.cr[i / 2] = image.cr.row(chroma_row).ok_or(CodecError::MissingRow {
                plane: "cr",
                row: chroma_row,
            })?;
        }
    }

    Ok(group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestImage;

    /// Records the first byte of every row it is handed.
    struct Recorder {
        height: u32,
        next: u32,
        luma: Vec<u8>,
        chroma: Vec<u8>,
        fail_on_band: Option<usize>,
        bands: usize,
    }

    impl Recorder {
        fn new(height: u32) -> Self {
            Self {
                height,
                next: 0,
                luma: Vec::new(),
                chroma: Vec::new(),
                fail_on_band: None,
                bands: 0,
            }
        }
    }

    impl RawDataSink for Recorder {
        fn image_height(&self) -> u32 {
            self.height
        }

        fn next_scanline(&self) -> u32 {
            self.next
        }

        fn write_raw_data(&mut self, group: &RowGroup<'_>) -> Result<(), CodecError> {
            if self.fail_on_band == Some(self.bands) {
                return Err(CodecError::TooManyScanlines(self.height));
            }
            self.luma.extend(group.luma.iter().map(|row| row[0]));
            self.chroma.extend(group.cb.iter().map(|row| row[0]));
            self.next += MCU_ROWS as u32;
            self.bands += 1;
            Ok(())
        }
    }

    /// An image whose luma row `y` is filled with `y` and chroma row `c`
    /// with `c`, so recorded bytes identify the source rows.
    fn row_indexed(width: u32, height: u32) -> TestImage {
        let mut image = TestImage::solid(width, height, 0, 0, 0);
        image.fill_rows_with_index();
        image
    }

    #[test]
    fn test_exact_multiple_of_band_height() {
        let image = row_indexed(16, 32);
        let mut recorder = Recorder::new(32);
        feed_rows(&image.view(), &mut recorder).unwrap();

        assert_eq!(recorder.bands, 2);
        assert_eq!(recorder.luma, (0..32).collect::<Vec<u8>>());
        assert_eq!(recorder.chroma, (0..16).collect::<Vec<u8>>());
    }

    #[test]
    fn test_last_band_duplicates_last_row() {
        let image = row_indexed(16, 20);
        let mut recorder = Recorder::new(20);
        feed_rows(&image.view(), &mut recorder).unwrap();

        assert_eq!(recorder.bands, 2);
        let mut expected: Vec<u8> = (0..20).collect();
        expected.extend([19u8; 12]);
        assert_eq!(recorder.luma, expected);

        // Chroma rows come from row / 2 of the clamped luma row.
        let mut expected_chroma: Vec<u8> = (0..10).collect();
        expected_chroma.extend([9u8; 6]);
        assert_eq!(recorder.chroma, expected_chroma);
    }

    #[test]
    fn test_odd_height_chroma_stays_in_bounds() {
        let image = row_indexed(8, 7);
        let mut recorder = Recorder::new(7);
        feed_rows(&image.view(), &mut recorder).unwrap();

        assert_eq!(recorder.bands, 1);
        assert_eq!(&recorder.luma[6..], &[6u8; 10]);
        assert_eq!(recorder.chroma, vec![0, 1, 2, 3, 3, 3, 3, 3]);
    }

    #[test]
    fn test_sink_failure_aborts_immediately() {
        let image = row_indexed(16, 64);
        let mut recorder = Recorder::new(64);
        recorder.fail_on_band = Some(1);

        assert!(feed_rows(&image.view(), &mut recorder).is_err());
        assert_eq!(recorder.bands, 1);
    }

    #[test]
    fn test_missing_rows_reported() {
        let image = row_indexed(16, 16);
        let mut recorder = Recorder::new(32);

        assert!(matches!(
            feed_rows(&image.view(), &mut recorder),
            Err(CodecError::MissingRow { plane: "luma", row: 16 })
        ));
    }
}
