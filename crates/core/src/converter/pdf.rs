//! PDF to DOCX conversion.

use std::collections::HashSet;

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{GenericImageView, ImageFormat};
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, warn};

use super::docx::DocxBuilder;
use super::error::ConverterError;
use super::raster::flatten_onto_white;
use super::traits::Converter;
use super::types::{CompressionLevel, ConversionReport, ConversionRequest};
use super::{read_input, write_output};
use crate::format::FileFormat;

/// Upper bound on `/Parent` hops when looking up inherited page resources.
const MAX_PAGE_TREE_DEPTH: usize = 32;

/// Extracts page text and embedded JPEG images from a PDF into a DOCX.
///
/// Each PDF page becomes one paragraph followed by the page's pictures, with
/// a page break between pages. Layout is not preserved.
#[derive(Debug, Clone, Default)]
pub struct PdfToDocxConverter;

impl PdfToDocxConverter {
    pub fn new() -> Self {
        Self
    }

    /// Converts PDF bytes to DOCX bytes.
    pub fn transform(
        data: &[u8],
        compression: Option<CompressionLevel>,
    ) -> Result<Vec<u8>, ConverterError> {
        let doc = Document::load_mem(data)
            .map_err(|e| ConverterError::decode_failed(FileFormat::Pdf, e))?;
        if doc.is_encrypted() {
            return Err(ConverterError::decode_failed(
                FileFormat::Pdf,
                "encrypted documents are not supported",
            ));
        }

        let pages = doc.get_pages();
        if pages.is_empty() {
            return Err(ConverterError::decode_failed(
                FileFormat::Pdf,
                "document has no pages",
            ));
        }

        let mut builder = DocxBuilder::new();
        let mut embedded: HashSet<ObjectId> = HashSet::new();

        for (i, (&page_number, &page_id)) in pages.iter().enumerate() {
            if i > 0 {
                builder.page_break();
            }

            let text = match doc.extract_text(&[page_number]) {
                Ok(text) => text,
                Err(e) => {
                    warn!(page = page_number, error = %e, "Failed to extract page text");
                    String::new()
                }
            };
            builder.paragraph(text.trim_end());

            for image_id in page_image_ids(&doc, page_id) {
                // Shared XObjects are embedded once.
                if !embedded.insert(image_id) {
                    continue;
                }
                let Some(jpeg) = jpeg_stream(&doc, image_id) else {
                    continue;
                };
                match recompress(jpeg, compression) {
                    Ok((bytes, width, height)) => {
                        builder.picture(bytes, width, height);
                    }
                    Err(e) => {
                        warn!(page = page_number, error = %e, "Skipping embedded image");
                    }
                }
            }
        }

        debug!(
            pages = pages.len(),
            paragraphs = builder.paragraph_count(),
            pictures = builder.picture_count(),
            "Assembled DOCX"
        );

        builder
            .build()
            .map_err(|e| ConverterError::encode_failed(FileFormat::Docx, e))
    }
}

#[async_trait]
impl Converter for PdfToDocxConverter {
    fn name(&self) -> &str {
        "pdf-to-docx"
    }

    async fn convert(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConversionReport, ConverterError> {
        let data = read_input(&request.input_path).await?;
        let compression = request.options.compression;

        let docx =
            tokio::task::spawn_blocking(move || Self::transform(&data, compression)).await??;

        write_output(&request.output_path, &docx).await
    }
}

/// Follows a reference to the object it names.
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// XObject ids listed in a page's resources, walking up the page tree when
/// the page inherits them.
fn page_image_ids(doc: &Document, page_id: ObjectId) -> Vec<ObjectId> {
    let mut node = doc.get_dictionary(page_id).ok();
    let mut depth = 0;

    while let Some(dict) = node {
        let xobjects = dict
            .get(b"Resources")
            .ok()
            .and_then(|res| resolve(doc, res))
            .and_then(|res| res.as_dict().ok())
            .and_then(|res| res.get(b"XObject").ok())
            .and_then(|x| resolve(doc, x))
            .and_then(|x| x.as_dict().ok());

        if let Some(xobjects) = xobjects {
            return xobjects
                .iter()
                .filter_map(|(_, obj)| obj.as_reference().ok())
                .collect();
        }

        depth += 1;
        if depth > MAX_PAGE_TREE_DEPTH {
            break;
        }
        node = dict
            .get(b"Parent")
            .ok()
            .and_then(|p| p.as_reference().ok())
            .and_then(|id| doc.get_dictionary(id).ok());
    }

    Vec::new()
}

/// Raw JPEG bytes of an image XObject encoded solely with `DCTDecode`.
fn jpeg_stream(doc: &Document, id: ObjectId) -> Option<&[u8]> {
    let Ok(Object::Stream(stream)) = doc.get_object(id) else {
        return None;
    };
    let subtype = stream.dict.get(b"Subtype").ok()?.as_name().ok()?;
    if subtype != b"Image" {
        return None;
    }

    let is_dct = match stream.dict.get(b"Filter").ok()? {
        Object::Name(name) => name.as_slice() == b"DCTDecode",
        Object::Array(filters) => {
            filters.len() == 1
                && matches!(&filters[0], Object::Name(name) if name.as_slice() == b"DCTDecode")
        }
        _ => false,
    };
    is_dct.then_some(stream.content.as_slice())
}

/// Re-encodes a JPEG at the compression level's quality. Without a level the
/// original bytes are kept.
fn recompress(
    jpeg: &[u8],
    compression: Option<CompressionLevel>,
) -> Result<(Vec<u8>, u32, u32), ConverterError> {
    let img = image::load_from_memory_with_format(jpeg, ImageFormat::Jpeg)
        .map_err(|e| ConverterError::decode_failed(FileFormat::Jpeg, e))?;
    let (width, height) = img.dimensions();

    let Some(level) = compression else {
        return Ok((jpeg.to_vec(), width, height));
    };

    let rgb = flatten_onto_white(&img);
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, level.jpeg_quality())
        .encode_image(&rgb)
        .map_err(|e| ConverterError::encode_failed(FileFormat::Jpeg, e))?;
    Ok((out, width, height))
}
