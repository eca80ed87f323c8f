//! Minimal WordprocessingML package writer.
//!
//! Produces a `.docx` holding paragraphs, page breaks and inline JPEG
//! pictures. Styling is left to the consuming word processor.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// EMUs per pixel at 96 DPI.
const EMU_PER_PX: u64 = 9525;

/// Widest picture placed on a page: 6 inches.
const MAX_PICTURE_WIDTH_EMU: u64 = 6 * 914_400;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="jpeg" ContentType="image/jpeg"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_OPEN: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture"><w:body>"#;

const DOCUMENT_CLOSE: &str = r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr></w:body></w:document>"#;

#[derive(Debug, Clone)]
enum Block {
    Paragraph(String),
    PageBreak,
    Picture { index: usize, cx: u64, cy: u64 },
}

/// Builds a `.docx` in memory.
#[derive(Debug, Default)]
pub struct DocxBuilder {
    blocks: Vec<Block>,
    pictures: Vec<Vec<u8>>,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a paragraph of plain text.
    pub fn paragraph(&mut self, text: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::Paragraph(text.into()));
        self
    }

    /// Starts a new page.
    pub fn page_break(&mut self) -> &mut Self {
        self.blocks.push(Block::PageBreak);
        self
    }

    /// Appends a JPEG picture scaled to fit the page width.
    pub fn picture(&mut self, jpeg: Vec<u8>, width_px: u32, height_px: u32) -> &mut Self {
        let (cx, cy) = fit_extent(width_px, height_px);
        let index = self.pictures.len() + 1;
        self.pictures.push(jpeg);
        self.blocks.push(Block::Picture { index, cx, cy });
        self
    }

    pub fn paragraph_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, Block::Paragraph(_)))
            .count()
    }

    pub fn picture_count(&self) -> usize {
        self.pictures.len()
    }

    /// Serializes the package.
    pub fn build(&self) -> zip::result::ZipResult<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(CONTENT_TYPES.as_bytes())?;

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(PACKAGE_RELS.as_bytes())?;

        zip.start_file("word/document.xml", options)?;
        zip.write_all(self.document_xml().as_bytes())?;

        zip.start_file("word/_rels/document.xml.rels", options)?;
        zip.write_all(self.document_rels().as_bytes())?;

        // JPEG data is already compressed.
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (i, data) in self.pictures.iter().enumerate() {
            zip.start_file(format!("word/media/image{}.jpeg", i + 1), stored)?;
            zip.write_all(data)?;
        }

        Ok(zip.finish()?.into_inner())
    }

    fn document_xml(&self) -> String {
        let mut xml = String::from(DOCUMENT_OPEN);
        for block in &self.blocks {
            match block {
                Block::Paragraph(text) => {
                    xml.push_str("<w:p>");
                    for (i, line) in text.split('\n').enumerate() {
                        if i > 0 {
                            xml.push_str("<w:r><w:br/></w:r>");
                        }
                        if !line.is_empty() {
                            xml.push_str(r#"<w:r><w:t xml:space="preserve">"#);
                            xml.push_str(&escape_xml(line));
                            xml.push_str("</w:t></w:r>");
                        }
                    }
                    xml.push_str("</w:p>");
                }
                Block::PageBreak => {
                    xml.push_str(r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#);
                }
                Block::Picture { index, cx, cy } => {
                    xml.push_str(&picture_xml(*index, *cx, *cy));
                }
            }
        }
        xml.push_str(DOCUMENT_CLOSE);
        xml
    }

    fn document_rels(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for i in 1..=self.pictures.len() {
            xml.push_str(&format!(
                r#"<Relationship Id="rIdImg{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image{i}.jpeg"/>"#
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }
}

fn picture_xml(index: usize, cx: u64, cy: u64) -> String {
    format!(
        concat!(
            r#"<w:p><w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#,
            r#"<wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{i}" name="Picture {i}"/>"#,
            r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            r#"<pic:pic><pic:nvPicPr><pic:cNvPr id="{i}" name="image{i}.jpeg"/><pic:cNvPicPr/></pic:nvPicPr>"#,
            r#"<pic:blipFill><a:blip r:embed="rIdImg{i}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic>"#,
            r#"</a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#,
        ),
        i = index,
        cx = cx,
        cy = cy,
    )
}

/// Picture extent in EMUs, scaled down to the page width.
fn fit_extent(width_px: u32, height_px: u32) -> (u64, u64) {
    let cx = width_px.max(1) as u64 * EMU_PER_PX;
    let cy = height_px.max(1) as u64 * EMU_PER_PX;
    if cx <= MAX_PICTURE_WIDTH_EMU {
        (cx, cy)
    } else {
        (MAX_PICTURE_WIDTH_EMU, cy * MAX_PICTURE_WIDTH_EMU / cx)
    }
}

/// Escapes text for XML content and drops characters XML 1.0 forbids.
fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' => out.push(' '),
            c if (c as u32) < 0x20 => {}
            c => out.push(c),
        }
    }
    out
}
