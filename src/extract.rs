//! Multi-format text extraction for binary documents (PDF, OOXML).
//!
//! Decoders return [`ExtractedContent`] with native structure intact — PDF
//! page breaks, worksheet boundaries, Word block types — so the paginator can
//! address native units directly instead of re-deriving them from flat text.
//! The rest of the crate never touches raw bytes.

use std::io::Read;
use std::path::Path;

use thiserror::Error;

use crate::models::{Block, BlockKind, ExtractedContent, Sheet};

/// Supported MIME types.
pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const MIME_TEXT: &str = "text/plain";

/// Maximum worksheets to process in an xlsx.
const XLSX_MAX_SHEETS: usize = 100;
/// Maximum cells to process per sheet (avoids unbounded memory).
const XLSX_MAX_CELLS_PER_SHEET: usize = 100_000;
/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Extraction failure. Never panics; callers skip the source.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("OOXML extraction failed: {0}")]
    Ooxml(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Map a file extension to a supported MIME type.
pub fn content_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some(MIME_PDF),
        "docx" => Some(MIME_DOCX),
        "xlsx" => Some(MIME_XLSX),
        "txt" | "md" | "markdown" | "text" => Some(MIME_TEXT),
        _ => None,
    }
}

/// Read and decode a file, choosing the decoder by extension.
pub fn extract_path(path: &Path) -> Result<ExtractedContent, ExtractError> {
    let content_type = content_type_for_path(path).ok_or_else(|| {
        ExtractError::UnsupportedContentType(path.display().to_string())
    })?;
    let bytes = std::fs::read(path)?;
    extract_bytes(&bytes, content_type)
}

/// Decode binary content into structured extraction output.
pub fn extract_bytes(bytes: &[u8], content_type: &str) -> Result<ExtractedContent, ExtractError> {
    match content_type {
        MIME_PDF => extract_pdf(bytes),
        MIME_DOCX => extract_docx(bytes),
        MIME_XLSX => extract_xlsx(bytes),
        MIME_TEXT => Ok(ExtractedContent::PlainText(
            String::from_utf8_lossy(bytes).into_owned(),
        )),
        other => Err(ExtractError::UnsupportedContentType(other.to_string())),
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<ExtractedContent, ExtractError> {
    pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map(ExtractedContent::PdfPages)
        .map_err(|e| ExtractError::Pdf(e.to_string()))
}

fn read_zip_entry_bounded(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
    name: &str,
    max_bytes: u64,
) -> Result<Vec<u8>, ExtractError> {
    let entry = archive
        .by_name(name)
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    let mut out = Vec::new();
    entry
        .take(max_bytes)
        .read_to_end(&mut out)
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    if out.len() as u64 >= max_bytes {
        return Err(ExtractError::Ooxml(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, max_bytes
        )));
    }
    Ok(out)
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

// ═══════════════════════════════════════════════════════════════════════
// DOCX
// ═══════════════════════════════════════════════════════════════════════

/// Decode `word/document.xml` into typed blocks.
///
/// Paragraphs styled `Heading*`/`Title` become heading blocks (the paginator
/// forces a page break before them); tables are carried whole as one block.
fn extract_docx(bytes: &[u8]) -> Result<ExtractedContent, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    let doc_xml = read_zip_entry_bounded(&mut archive, "word/document.xml", MAX_XML_ENTRY_BYTES)?;
    let blocks = parse_docx_blocks(&doc_xml)?;
    Ok(ExtractedContent::WordBlocks(blocks))
}

fn parse_docx_blocks(xml: &[u8]) -> Result<Vec<Block>, ExtractError> {
    let mut blocks = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut in_text = false;
    let mut in_table = false;
    let mut para_text = String::new();
    let mut para_is_heading = false;
    let mut table_rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => match e.local_name().as_ref() {
                b"tbl" => {
                    in_table = true;
                    table_rows.clear();
                }
                b"tr" if in_table => row.clear(),
                b"tc" if in_table => cell.clear(),
                b"p" if !in_table => {
                    para_text.clear();
                    para_is_heading = false;
                }
                b"t" => in_text = true,
                b"pStyle" => {
                    if !in_table && style_is_heading(&e) {
                        para_is_heading = true;
                    }
                }
                _ => {}
            },
            Ok(quick_xml::events::Event::Empty(e)) => {
                if e.local_name().as_ref() == b"pStyle" && !in_table && style_is_heading(&e) {
                    para_is_heading = true;
                }
            }
            Ok(quick_xml::events::Event::Text(te)) if in_text => {
                let text = te.unescape().unwrap_or_default();
                if in_table {
                    cell.push_str(&text);
                } else {
                    para_text.push_str(&text);
                }
            }
            Ok(quick_xml::events::Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" if in_table => {
                    if !cell.is_empty() && !cell.ends_with(' ') {
                        cell.push(' ');
                    }
                }
                b"tc" if in_table => row.push(cell.trim().to_string()),
                b"tr" if in_table => table_rows.push(std::mem::take(&mut row)),
                b"tbl" => {
                    in_table = false;
                    if table_rows.iter().any(|r| r.iter().any(|c| !c.is_empty())) {
                        blocks.push(Block {
                            kind: BlockKind::Table,
                            html: table_html(&table_rows),
                        });
                    }
                }
                b"p" if !in_table => {
                    let text = para_text.trim();
                    if !text.is_empty() {
                        let (kind, html) = if para_is_heading {
                            (BlockKind::Heading, format!("<h2>{}</h2>", escape_html(text)))
                        } else {
                            (BlockKind::Paragraph, format!("<p>{}</p>", escape_html(text)))
                        };
                        blocks.push(Block { kind, html });
                    }
                }
                _ => {}
            },
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(blocks)
}

fn style_is_heading(e: &quick_xml::events::BytesStart) -> bool {
    e.attributes().flatten().any(|attr| {
        attr.key.local_name().as_ref() == b"val"
            && (attr.value.starts_with(b"Heading") || attr.value.as_ref() == b"Title")
    })
}

fn table_html(rows: &[Vec<String>]) -> String {
    let mut out = String::from("<table>");
    for row in rows {
        out.push_str("<tr>");
        for cell in row {
            out.push_str("<td>");
            out.push_str(&escape_html(cell));
            out.push_str("</td>");
        }
        out.push_str("</tr>");
    }
    out.push_str("</table>");
    out
}

// ═══════════════════════════════════════════════════════════════════════
// XLSX
// ═══════════════════════════════════════════════════════════════════════

/// Decode a workbook into one [`Sheet`] per worksheet, in workbook order.
fn extract_xlsx(bytes: &[u8]) -> Result<ExtractedContent, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    let shared_strings = read_shared_strings(&mut archive)?;
    let display_names = read_workbook_sheet_names(&mut archive)?;
    let sheet_paths = list_worksheet_paths(&mut archive)?;

    let mut sheets = Vec::new();
    for (idx, path) in sheet_paths.into_iter().take(XLSX_MAX_SHEETS).enumerate() {
        let sheet_xml = read_zip_entry_bounded(&mut archive, &path, MAX_XML_ENTRY_BYTES)?;
        let text = extract_sheet_cells(&sheet_xml, &shared_strings)?;
        let name = display_names
            .get(idx)
            .cloned()
            .unwrap_or_else(|| format!("Sheet {}", idx + 1));
        sheets.push(Sheet { name, text });
    }
    Ok(ExtractedContent::Sheets(sheets))
}

/// Shared strings table, or empty when the workbook has none.
fn read_shared_strings(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
) -> Result<Vec<String>, ExtractError> {
    if archive.by_name("xl/sharedStrings.xml").is_err() {
        return Ok(Vec::new());
    }
    let xml = read_zip_entry_bounded(archive, "xl/sharedStrings.xml", MAX_XML_ENTRY_BYTES)?;
    let mut strings = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_si = false;
    let mut in_text = false;
    let mut current = String::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"si" {
                    in_si = true;
                    current.clear();
                } else if in_si && e.local_name().as_ref() == b"t" {
                    in_text = true;
                }
            }
            Ok(quick_xml::events::Event::Text(te)) if in_text => {
                current.push_str(te.unescape().unwrap_or_default().as_ref());
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text = false;
                } else if e.local_name().as_ref() == b"si" {
                    in_si = false;
                    strings.push(std::mem::take(&mut current));
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

/// Worksheet display names from `xl/workbook.xml`, in document order.
fn read_workbook_sheet_names(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
) -> Result<Vec<String>, ExtractError> {
    if archive.by_name("xl/workbook.xml").is_err() {
        return Ok(Vec::new());
    }
    let xml = read_zip_entry_bounded(archive, "xl/workbook.xml", MAX_XML_ENTRY_BYTES)?;
    let mut names = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) | Ok(quick_xml::events::Event::Empty(e)) => {
                if e.local_name().as_ref() == b"sheet" {
                    for attr in e.attributes().flatten() {
                        if attr.key.local_name().as_ref() == b"name" {
                            names.push(String::from_utf8_lossy(&attr.value).into_owned());
                        }
                    }
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(names)
}

fn list_worksheet_paths(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
) -> Result<Vec<String>, ExtractError> {
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("xl/worksheets/sheet") && n.ends_with(".xml"))
        .map(|s| s.to_string())
        .collect();
    names.sort_by_key(|name| {
        name.trim_start_matches("xl/worksheets/sheet")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    Ok(names)
}

/// Cell texts of one worksheet, space-joined. Shared-string cells are looked
/// up in the table; other cells contribute their raw value.
fn extract_sheet_cells(xml: &[u8], shared_strings: &[String]) -> Result<String, ExtractError> {
    let mut cells: Vec<String> = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_value = false;
    let mut cell_is_shared_str = false;
    loop {
        if cells.len() >= XLSX_MAX_CELLS_PER_SHEET {
            break;
        }
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"c" {
                    cell_is_shared_str = e.attributes().flatten().any(|a| {
                        a.key.local_name().as_ref() == b"t" && a.value.as_ref() == b"s"
                    });
                } else if e.local_name().as_ref() == b"v" {
                    in_value = true;
                }
            }
            Ok(quick_xml::events::Event::Text(te)) if in_value => {
                let value = te.unescape().unwrap_or_default();
                let value = value.trim();
                if !value.is_empty() {
                    if cell_is_shared_str {
                        if let Ok(i) = value.parse::<usize>() {
                            if let Some(s) = shared_strings.get(i) {
                                cells.push(s.clone());
                            }
                        }
                    } else {
                        cells.push(value.to_string());
                    }
                }
                in_value = false;
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == b"v" {
                    in_value = false;
                } else if e.local_name().as_ref() == b"c" {
                    cell_is_shared_str = false;
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(cells.join(" "))
}
