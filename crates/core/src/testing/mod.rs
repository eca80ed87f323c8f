//! Testing utilities and mock implementations.
//!
//! This module provides a mock conversion capability and small in-memory
//! fixtures so lifecycle and HTTP tests run without real documents.
//!
//! # Example
//!
//! ```rust,ignore
//! use fileforge_core::testing::{fixtures, MockConverter};
//!
//! let mock = Arc::new(MockConverter::new());
//! mock.set_next_error(ConverterError::invalid_options("boom")).await;
//!
//! let pdf = fixtures::sample_pdf("Hello");
//! ```

mod mock_converter;

pub use mock_converter::{MockConverter, RecordedConversion};

/// Test fixtures and helper functions.
pub mod fixtures {
    use image::codecs::jpeg::JpegEncoder;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};
    use std::io::Cursor;

    /// A PNG whose left half is fully transparent and right half opaque red.
    pub fn png_with_alpha(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgba([0, 0, 0, 0])
            } else {
                Rgba([255, 0, 0, 255])
            }
        });
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .expect("encode png fixture");
        buf
    }

    /// An opaque BMP filled with one color.
    pub fn bmp(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([20, 120, 200]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Bmp)
            .expect("encode bmp fixture");
        buf
    }

    /// A detailed high-quality JPEG, so recompression visibly changes it.
    pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            let noise = ((x * 7919 + y * 104_729) % 97) as u8;
            Rgb([
                (x * 255 / width.max(1)) as u8 ^ noise,
                (y * 255 / height.max(1)) as u8,
                noise.wrapping_mul(3),
            ])
        });
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, 95)
            .encode_image(&img)
            .expect("encode jpeg fixture");
        buf
    }

    /// A one-page PDF showing `text`.
    pub fn sample_pdf(text: &str) -> Vec<u8> {
        build_pdf(text, None)
    }

    /// A one-page PDF showing `text` and a DCT-encoded image.
    pub fn pdf_with_jpeg(text: &str, width: u32, height: u32) -> Vec<u8> {
        build_pdf(text, Some((jpeg(width, height), width, height)))
    }

    fn build_pdf(text: &str, image: Option<(Vec<u8>, u32, u32)>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });

        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ];

        let mut resources = dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        };

        if let Some((data, width, height)) = image {
            let image_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => i64::from(width),
                    "Height" => i64::from(height),
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                    "Filter" => "DCTDecode",
                },
                data,
            ));
            resources.set(
                "XObject",
                dictionary! {
                    "Im1" => image_id,
                },
            );
            operations.extend([
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        i64::from(width).into(),
                        0.into(),
                        0.into(),
                        i64::from(height).into(),
                        72.into(),
                        400.into(),
                    ],
                ),
                Operation::new("Do", vec!["Im1".into()]),
                Operation::new("Q", vec![]),
            ]);
        }

        let resources_id = doc.add_object(resources);
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).expect("save pdf fixture");
        buf
    }
}
