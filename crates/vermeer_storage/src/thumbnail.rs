use image::ImageFormat;
use image::imageops::FilterType;
use std::io::Cursor;
use vermeer_error::{StorageError, StorageErrorKind, StorageResult};

/// Width of generated thumbnails in pixels.
pub const THUMBNAIL_WIDTH: u32 = 500;

/// Scales an encoded image to `width` pixels wide, preserving aspect
/// ratio, and re-encodes it as WebP.
///
/// ## Examples
///
/// ```
/// use image::RgbaImage;
/// use std::io::Cursor;
/// use vermeer_storage::thumbnail_webp;
///
/// let mut png = Cursor::new(Vec::new());
/// RgbaImage::from_pixel(100, 60, image::Rgba([200, 30, 30, 255]))
///     .write_to(&mut png, image::ImageFormat::Png)
///     .unwrap();
///
/// let webp = thumbnail_webp(png.get_ref(), 50).unwrap();
/// let thumb = image::load_from_memory(&webp).unwrap();
/// assert_eq!((thumb.width(), thumb.height()), (50, 30));
/// ```
#[track_caller]
pub fn thumbnail_webp(bytes: &[u8], width: u32) -> StorageResult<Vec<u8>> {
    let source = image::load_from_memory(bytes).map_err(|e| {
        StorageError::new(StorageErrorKind::Thumbnail(format!(
            "failed to decode source image: {e}"
        )))
    })?;
    let height = ((source.height() as u64 * width as u64) / source.width().max(1) as u64)
        .max(1) as u32;
    let scaled = source.resize_exact(width, height, FilterType::Lanczos3);

    let mut out = Cursor::new(Vec::new());
    scaled.write_to(&mut out, ImageFormat::WebP).map_err(|e| {
        StorageError::new(StorageErrorKind::Thumbnail(format!(
            "failed to encode webp: {e}"
        )))
    })?;
    Ok(out.into_inner())
}
