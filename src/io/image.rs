use crate::core::framebuffer::FrameBuffer;
use image::{ImageBuffer, ImageError, Rgb};
use log::{error, info};
use std::path::Path;

/// Saves the color target of a frame as an RGB PNG.
pub fn save_framebuffer_png<P: AsRef<Path>>(
    framebuffer: &FrameBuffer,
    path: P,
) -> Result<(), ImageError> {
    let path = path.as_ref();
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_raw(
        framebuffer.width as u32,
        framebuffer.height as u32,
        framebuffer.to_rgb8(),
    )
    .ok_or_else(|| {
        ImageError::Parameter(image::error::ParameterError::from_kind(
            image::error::ParameterErrorKind::DimensionMismatch,
        ))
    })?;

    match img.save(path) {
        Ok(()) => {
            info!("Saved frame to '{}'", path.display());
            Ok(())
        }
        Err(e) => {
            error!("Failed to save image to '{}': {}", path.display(), e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn written_png_reads_back_with_same_pixels() {
        let mut fb = FrameBuffer::new(3, 2);
        fb.clear(Vector3::new(1.0, 0.0, 0.0));

        let path = std::env::temp_dir().join(format!("mesh_viewer_{}.png", std::process::id()));
        save_framebuffer_png(&fb, &path).unwrap();

        let back = image::open(&path).unwrap().to_rgb8();
        std::fs::remove_file(&path).ok();
        assert_eq!(back.dimensions(), (3, 2));
        assert_eq!(back.get_pixel(2, 1).0, [255, 0, 0]);
    }
}
