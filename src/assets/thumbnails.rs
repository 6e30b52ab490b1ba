use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageReader};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;

/// Decode an image, picking the format from its content rather than its name.
fn open_image(path: &Path) -> Result<DynamicImage> {
    Ok(ImageReader::open(path)?.with_guessed_format()?.decode()?)
}

/// Pixel size read from the image header, format detected from content.
pub fn read_dimensions(path: &Path) -> Result<(u32, u32)> {
    Ok(ImageReader::open(path)?
        .with_guessed_format()?
        .into_dimensions()?)
}

/// Write a JPEG preview of `source` to `dest` and return its size.
///
/// Images larger than `max_dimension` on either side are scaled down with
/// their aspect ratio kept; smaller ones are re-encoded at their own size.
pub fn generate_thumbnail(source: &Path, dest: &Path, max_dimension: u32, quality: u8) -> Result<(u32, u32)> {
    let img = open_image(source)?;

    let (width, height) = img.dimensions();
    let img = if width > max_dimension || height > max_dimension {
        img.thumbnail(max_dimension, max_dimension)
    } else {
        img
    };

    // JPEG has no alpha channel
    let rgb = img.to_rgb8();

    let mut writer = BufWriter::new(File::create(dest)?);
    let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
    rgb.write_with_encoder(encoder)?;
    writer.flush()?;

    Ok(rgb.dimensions())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    #[test]
    fn test_wide_image_is_bounded() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("wide.png");
        let dest = dir.path().join("wide_thumb.jpg");
        RgbaImage::from_pixel(1024, 512, Rgba([200, 40, 40, 128]))
            .save(&source)
            .unwrap();

        let (w, h) = generate_thumbnail(&source, &dest, 512, 85).unwrap();
        assert_eq!((w, h), (512, 256));
        assert_eq!(image::image_dimensions(&dest).unwrap(), (512, 256));
    }

    #[test]
    fn test_small_image_is_not_upscaled() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("small.png");
        let dest = dir.path().join("small_thumb.jpg");
        RgbaImage::from_pixel(120, 80, Rgba([0, 0, 255, 255]))
            .save(&source)
            .unwrap();

        assert_eq!(generate_thumbnail(&source, &dest, 512, 85).unwrap(), (120, 80));
    }

    #[test]
    fn test_format_is_detected_from_content() {
        let dir = tempdir().unwrap();
        let png = dir.path().join("frame.png");
        RgbaImage::from_pixel(40, 20, Rgba([9, 9, 9, 255])).save(&png).unwrap();

        let unnamed = dir.path().join("frame_export");
        let misnamed = dir.path().join("frame_export.jpg");
        std::fs::copy(&png, &unnamed).unwrap();
        std::fs::copy(&png, &misnamed).unwrap();

        assert_eq!(read_dimensions(&unnamed).unwrap(), (40, 20));
        assert_eq!(read_dimensions(&misnamed).unwrap(), (40, 20));
        let dest = dir.path().join("thumb.jpg");
        assert_eq!(generate_thumbnail(&unnamed, &dest, 512, 85).unwrap(), (40, 20));
    }

    #[test]
    fn test_undecodable_source_fails() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("broken.png");
        std::fs::write(&source, b"not an image").unwrap();

        assert!(generate_thumbnail(&source, &dir.path().join("t.jpg"), 512, 85).is_err());
    }
}
