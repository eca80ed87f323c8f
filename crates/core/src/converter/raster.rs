//! Raster image re-encoding.

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use tracing::debug;

use super::error::ConverterError;
use super::traits::Converter;
use super::types::{ConversionReport, ConversionRequest, Route};
use super::{read_input, write_output};
use crate::format::FileFormat;

/// Formats accepted as image input.
pub const IMAGE_SOURCES: [FileFormat; 4] = [
    FileFormat::Jpg,
    FileFormat::Jpeg,
    FileFormat::Png,
    FileFormat::Bmp,
];

/// Formats produced by image conversion.
pub const IMAGE_TARGETS: [FileFormat; 3] = [FileFormat::Png, FileFormat::Jpg, FileFormat::Jpeg];

/// Re-encodes raster images between PNG, JPEG and BMP.
///
/// JPEG has no alpha channel, so transparent pixels are composited onto an
/// opaque white background before encoding.
#[derive(Debug, Clone)]
pub struct ImageConverter {
    default_quality: u8,
}

impl ImageConverter {
    pub fn new(default_quality: u8) -> Self {
        Self { default_quality }
    }

    /// Every `(source, target)` pair this converter handles.
    pub fn routes() -> Vec<Route> {
        IMAGE_SOURCES
            .iter()
            .flat_map(|&from| IMAGE_TARGETS.iter().map(move |&to| Route { from, to }))
            .collect()
    }

    /// Decodes `data` and encodes it as `target`.
    pub fn encode(
        data: &[u8],
        source: FileFormat,
        target: FileFormat,
        quality: u8,
    ) -> Result<Vec<u8>, ConverterError> {
        if !(1..=100).contains(&quality) {
            return Err(ConverterError::invalid_options(format!(
                "quality must be between 1 and 100, got {}",
                quality
            )));
        }

        let img = image::load_from_memory(data)
            .map_err(|e| ConverterError::decode_failed(source, e))?;

        let mut buf = Vec::new();
        match target {
            FileFormat::Jpg | FileFormat::Jpeg => {
                let rgb = flatten_onto_white(&img);
                let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
                encoder
                    .encode_image(&rgb)
                    .map_err(|e| ConverterError::encode_failed(target, e))?;
            }
            FileFormat::Png => {
                img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
                    .map_err(|e| ConverterError::encode_failed(target, e))?;
            }
            FileFormat::Bmp => {
                img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Bmp)
                    .map_err(|e| ConverterError::encode_failed(target, e))?;
            }
            other => {
                return Err(ConverterError::UnsupportedRoute {
                    from: source,
                    to: other,
                })
            }
        }
        Ok(buf)
    }
}

/// Composites the image onto white and drops the alpha channel.
pub fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let alpha = px[3] as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        out.put_pixel(x, y, Rgb([blend(px[0]), blend(px[1]), blend(px[2])]));
    }
    out
}

#[async_trait]
impl Converter for ImageConverter {
    fn name(&self) -> &str {
        "image"
    }

    async fn convert(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConversionReport, ConverterError> {
        let data = read_input(&request.input_path).await?;
        let quality = request.options.quality.unwrap_or(self.default_quality);
        let (source, target) = (request.source, request.target);

        let encoded =
            tokio::task::spawn_blocking(move || Self::encode(&data, source, target, quality))
                .await??;

        debug!(
            input = %request.input_path.display(),
            output = %request.output_path.display(),
            bytes = encoded.len(),
            quality,
            "Re-encoded image"
        );
        write_output(&request.output_path, &encoded).await
    }
}
