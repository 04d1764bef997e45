//! Core data models for pagemark.
//!
//! These types represent the sources, pages, and extraction output that flow
//! through the pagination and citation-addressing pipeline. A [`Source`] is a
//! user-added document; its content is addressable as a contiguous run of
//! [`Page`]s numbered from 1. Page payloads are a tagged variant so PDF pages,
//! virtual text chunks, worksheet pages, and transcript segments share one
//! addressing model while keeping their format-specific fields.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// What kind of thing a source is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// An uploaded file (PDF, Word, spreadsheet, plain text).
    File,
    /// A fetched web page.
    Web,
    /// Pasted text.
    Text,
    /// A video with a time-coded transcript.
    Youtube,
    /// A generated report re-added as a source.
    Report,
}

impl SourceKind {
    /// Short label used in CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::File => "file",
            SourceKind::Web => "web",
            SourceKind::Text => "text",
            SourceKind::Youtube => "youtube",
            SourceKind::Report => "report",
        }
    }
}

/// Which viewer surface a page renders in.
///
/// Navigation must switch the active mode before scrolling: the scroll
/// anchor for a page does not exist until its mode has rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Rendered PDF pages.
    Pdf,
    /// Plain or structured text pages (virtual chunks, sheets, Word sections).
    Text,
    /// Time-coded media transcript.
    Media,
}

/// The payload of one addressable page.
///
/// The resolver and navigation layers only use the common projections
/// ([`renderable_text`](PageContent::renderable_text),
/// [`view_mode`](PageContent::view_mode)); format-specific fields are for the
/// paginator and the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum PageContent {
    /// Text of one native PDF page.
    PdfPage { text: String },
    /// A virtual page cut from unstructured text at a sentence/word boundary.
    TextChunk { text: String },
    /// Word-derived markup. Rendered as rich markup and never re-flowed or
    /// text-trimmed by the paginator.
    StructuredBlocks { html: String },
    /// One spreadsheet worksheet.
    SheetPage { sheet_name: String, text: String },
    /// One transcript segment; ordinal position doubles as the page number.
    TranscriptSegment {
        start_secs: f64,
        end_secs: Option<f64>,
        text: String,
    },
}

impl PageContent {
    /// The textual content of the page as handed to the answer generator.
    pub fn renderable_text(&self) -> &str {
        match self {
            PageContent::PdfPage { text }
            | PageContent::TextChunk { text }
            | PageContent::SheetPage { text, .. }
            | PageContent::TranscriptSegment { text, .. } => text,
            PageContent::StructuredBlocks { html } => html,
        }
    }

    /// Whether the content must be rendered as markup rather than plain text.
    pub fn is_structured(&self) -> bool {
        matches!(self, PageContent::StructuredBlocks { .. })
    }

    /// The viewer mode this page belongs to.
    pub fn view_mode(&self) -> ViewMode {
        match self {
            PageContent::PdfPage { .. } => ViewMode::Pdf,
            PageContent::TranscriptSegment { .. } => ViewMode::Media,
            _ => ViewMode::Text,
        }
    }
}

/// One addressable unit inside a source.
///
/// Page numbers are 1-based, unique, and contiguous within their source.
/// They are never reused or reordered once assigned for an extraction pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub number: usize,
    pub content: PageContent,
    /// SHA-256 of the renderable text, for staleness detection when a later
    /// pass re-derives pagination.
    pub hash: String,
}

impl Page {
    pub fn new(number: usize, content: PageContent) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content.renderable_text().as_bytes());
        let hash = format!("{:x}", hasher.finalize());
        Page {
            number,
            content,
            hash,
        }
    }
}

/// A user-added document, web page, text paste, or video whose content is
/// available to the chat.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    /// Opaque id, stable for the session.
    pub id: String,
    pub kind: SourceKind,
    /// Display name (file name, page title, ...).
    pub name: String,
    /// Full extracted text. Fallback content when no finer page split exists.
    pub raw_text: String,
    /// Ordered pages, numbered `1..=page_count`. Never empty: a source with
    /// unparseable content carries a single placeholder page.
    pub pages: Vec<Page>,
}

impl Source {
    pub fn new(
        kind: SourceKind,
        name: impl Into<String>,
        raw_text: String,
        pages: Vec<Page>,
    ) -> Self {
        debug_assert!(!pages.is_empty(), "a source always has at least one page");
        Source {
            id: Uuid::new_v4().to_string(),
            kind,
            name: name.into(),
            raw_text,
            pages,
        }
    }

    /// Number of addressable pages. Always >= 1.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Look up a page by its 1-based number.
    pub fn page(&self, number: usize) -> Option<&Page> {
        if number == 0 {
            return None;
        }
        self.pages.get(number - 1)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Extraction output
// ═══════════════════════════════════════════════════════════════════════

/// Kind of a Word-derived structural block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Heading,
    Paragraph,
    Table,
}

/// One structural block of a block-structured document.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    /// Markup for the block, preserved verbatim through pagination.
    pub html: String,
}

impl Block {
    /// Whether a page break must be forced before this block.
    pub fn is_heading(&self) -> bool {
        self.kind == BlockKind::Heading
    }

    /// The block's text with markup stripped.
    pub fn visible_text(&self) -> String {
        let mut out = String::with_capacity(self.html.len());
        let mut in_tag = false;
        for c in self.html.chars() {
            match c {
                '<' => in_tag = true,
                '>' => in_tag = false,
                c if !in_tag => out.push(c),
                _ => {}
            }
        }
        out
    }

    /// Word count of the visible text, used against the page word budget.
    pub fn word_count(&self) -> usize {
        self.visible_text().split_whitespace().count()
    }
}

/// One spreadsheet worksheet as extracted.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub text: String,
}

/// One time-coded transcript segment as provided by the transcript fetcher.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub start_secs: f64,
    pub end_secs: Option<f64>,
    pub text: String,
}

/// What a per-format decoder hands the paginator.
///
/// Native structure is preserved (page breaks, worksheet boundaries, block
/// types) so pagination can address native units directly instead of
/// re-deriving them from flat text.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedContent {
    PlainText(String),
    PdfPages(Vec<String>),
    Sheets(Vec<Sheet>),
    WordBlocks(Vec<Block>),
    Transcript(Vec<Segment>),
}

impl ExtractedContent {
    /// Flatten to plain text, for [`Source::raw_text`].
    pub fn plain_text(&self) -> String {
        match self {
            ExtractedContent::PlainText(text) => text.clone(),
            ExtractedContent::PdfPages(pages) => pages.join("\n\n"),
            ExtractedContent::Sheets(sheets) => sheets
                .iter()
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join("\n\n"),
            ExtractedContent::WordBlocks(blocks) => blocks
                .iter()
                .map(|b| b.visible_text())
                .collect::<Vec<_>>()
                .join("\n\n"),
            ExtractedContent::Transcript(segments) => segments
                .iter()
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}
