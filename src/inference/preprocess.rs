use super::error::InferenceError;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use tracing::debug;

/// Image shaping applied before a frame is submitted
#[derive(Debug, Clone, Copy)]
pub struct ImageOptions {
    /// Largest width or height sent upstream (0 disables downscaling)
    pub max_dimension: u32,
    /// JPEG re-encode quality (1-100)
    pub jpeg_quality: u8,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            max_dimension: 1024,
            jpeg_quality: 75,
        }
    }
}

/// Decode a frame, downscale it if oversized, convert to RGB, and re-encode as JPEG
pub fn prepare_image(frame: &[u8], options: &ImageOptions) -> Result<Vec<u8>, InferenceError> {
    if frame.is_empty() {
        return Err(InferenceError::Decode("empty frame".to_string()));
    }

    let mut img =
        image::load_from_memory(frame).map_err(|e| InferenceError::Decode(e.to_string()))?;

    let max = options.max_dimension;
    if max > 0 && (img.width() > max || img.height() > max) {
        debug!(
            "Downscaling frame from {}x{} to fit {}x{}",
            img.width(),
            img.height(),
            max,
            max
        );
        // Preserves aspect ratio
        img = img.resize(max, max, FilterType::Lanczos3);
    }

    let rgb = img.to_rgb8();

    let mut encoded = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut encoded, options.jpeg_quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)
        .map_err(|e| InferenceError::Decode(format!("failed to re-encode frame: {}", e)))?;

    Ok(encoded)
}
