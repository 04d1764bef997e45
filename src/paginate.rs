//! Content pagination across heterogeneous source formats.
//!
//! Splits extraction output into [`Page`]s with stable, contiguous 1-based
//! numbers. Native paged formats (PDF pages, worksheets, transcript segments)
//! map one native unit to one page; unstructured text is cut into virtual
//! pages at sentence/word boundaries; block-structured documents accumulate
//! whole blocks against a word budget with forced breaks before headings.
//!
//! Output is deterministic: identical input and options always produce
//! identical pages, and every source yields at least one page.

use crate::models::{Block, ExtractedContent, Page, PageContent, Source};

/// Shown as the single page of a source whose content could not be read.
pub const EMPTY_CONTENT_PLACEHOLDER: &str =
    "No readable content could be extracted from this source.";

/// Budgets controlling virtual pagination.
#[derive(Debug, Clone)]
pub struct PaginateOptions {
    /// Character budget per virtual page of unstructured text.
    pub target_chunk_chars: usize,
    /// Word budget per page of block-structured content.
    pub target_chunk_words: usize,
    /// Inputs shorter than this (after trimming) get the placeholder page.
    pub min_content_chars: usize,
}

impl Default for PaginateOptions {
    fn default() -> Self {
        PaginateOptions {
            target_chunk_chars: 2000,
            target_chunk_words: 550,
            min_content_chars: 10,
        }
    }
}

/// Split extracted content into pages numbered `1..=N` with no gaps.
pub fn paginate(content: &ExtractedContent, opts: &PaginateOptions) -> Vec<Page> {
    let pages = match content {
        ExtractedContent::PlainText(text) => paginate_text(text, opts),
        ExtractedContent::PdfPages(texts) => texts
            .iter()
            .map(|text| PageContent::PdfPage { text: text.clone() })
            .collect(),
        ExtractedContent::Sheets(sheets) => sheets
            .iter()
            .map(|sheet| PageContent::SheetPage {
                sheet_name: sheet.name.clone(),
                text: sheet.text.clone(),
            })
            .collect(),
        ExtractedContent::WordBlocks(blocks) => paginate_blocks(blocks, opts),
        ExtractedContent::Transcript(segments) => segments
            .iter()
            .map(|seg| PageContent::TranscriptSegment {
                start_secs: seg.start_secs,
                end_secs: seg.end_secs,
                text: seg.text.clone(),
            })
            .collect(),
    };

    number_pages(pages)
}

/// Re-derive a source's pages in place from its raw text.
///
/// Used when pagination was deferred (a source added before its first
/// activation carries only the placeholder page) or when raw text changed.
pub fn repaginate_source(source: &mut Source, opts: &PaginateOptions) {
    source.pages = paginate(
        &ExtractedContent::PlainText(source.raw_text.clone()),
        opts,
    );
}

/// Whether a source still carries only the lazy placeholder page despite
/// having real raw text to paginate.
pub fn needs_repagination(source: &Source, opts: &PaginateOptions) -> bool {
    source.pages.len() == 1
        && source.pages[0].content.renderable_text() == EMPTY_CONTENT_PLACEHOLDER
        && source.raw_text.trim().chars().count() >= opts.min_content_chars
}

fn number_pages(contents: Vec<PageContent>) -> Vec<Page> {
    if contents.is_empty() {
        return vec![Page::new(
            1,
            PageContent::TextChunk {
                text: EMPTY_CONTENT_PLACEHOLDER.to_string(),
            },
        )];
    }
    contents
        .into_iter()
        .enumerate()
        .map(|(i, content)| Page::new(i + 1, content))
        .collect()
}

/// Virtual pagination of unstructured text.
///
/// Greedily fills each page up to the character budget, cutting at the last
/// sentence end inside the budget, falling back to the last word boundary.
/// Never cuts mid-word.
fn paginate_text(text: &str, opts: &PaginateOptions) -> Vec<PageContent> {
    let trimmed = text.trim();
    if trimmed.chars().count() < opts.min_content_chars {
        return Vec::new();
    }

    let budget = opts.target_chunk_chars.max(1);
    let mut chunks = Vec::new();
    let mut rest = trimmed;

    while !rest.is_empty() {
        let cut = split_point(rest, budget);
        let (head, tail) = rest.split_at(cut);
        let head = head.trim_end();
        if !head.is_empty() {
            chunks.push(PageContent::TextChunk {
                text: head.to_string(),
            });
        }
        rest = tail.trim_start();
    }

    chunks
}

/// Byte offset at which to cut `s` for a page of at most `max_chars` chars.
///
/// Prefers the last sentence terminator followed by whitespace within the
/// budget, then the last whitespace, then a hard cut at the budget (which is
/// always a char boundary).
fn split_point(s: &str, max_chars: usize) -> usize {
    let mut budget_end = s.len();
    for (count, (idx, _)) in s.char_indices().enumerate() {
        if count == max_chars {
            budget_end = idx;
            break;
        }
    }
    if budget_end == s.len() {
        return s.len();
    }

    let window = &s[..budget_end];
    if let Some(cut) = last_sentence_break(window) {
        return cut;
    }
    if let Some(pos) = window.rfind(char::is_whitespace) {
        if pos > 0 {
            return pos;
        }
    }
    budget_end
}

/// Byte offset just after the last sentence terminator in `window` that is
/// followed by whitespace (or a newline), if any.
fn last_sentence_break(window: &str) -> Option<usize> {
    let mut best = None;
    let mut iter = window.char_indices().peekable();
    while let Some((i, c)) = iter.next() {
        match c {
            '.' | '!' | '?' => {
                if let Some(&(_, next)) = iter.peek() {
                    if next.is_whitespace() {
                        best = Some(i + c.len_utf8());
                    }
                }
            }
            '\n' => best = Some(i + 1),
            _ => {}
        }
    }
    best
}

/// Block pagination for Word-like documents.
///
/// Accumulates whole blocks until the word budget is met. A heading always
/// starts a new page, and the final partial page is flushed. Block markup is
/// carried verbatim; pages are marked structured.
fn paginate_blocks(blocks: &[Block], opts: &PaginateOptions) -> Vec<PageContent> {
    let budget = opts.target_chunk_words.max(1);
    let mut pages = Vec::new();
    let mut buf: Vec<&str> = Vec::new();
    let mut words = 0usize;

    let mut flush = |buf: &mut Vec<&str>, words: &mut usize, pages: &mut Vec<PageContent>| {
        if !buf.is_empty() {
            pages.push(PageContent::StructuredBlocks {
                html: buf.join("\n"),
            });
            buf.clear();
            *words = 0;
        }
    };

    for block in blocks {
        if block.html.trim().is_empty() {
            continue;
        }
        if block.is_heading() {
            flush(&mut buf, &mut words, &mut pages);
        }
        buf.push(&block.html);
        words += block.word_count();
        if words >= budget {
            flush(&mut buf, &mut words, &mut pages);
        }
    }
    flush(&mut buf, &mut words, &mut pages);

    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlockKind, Segment, Sheet};

    fn opts() -> PaginateOptions {
        PaginateOptions::default()
    }

    fn sentence_text(chars: usize) -> String {
        let sentence = "The quick brown fox jumps over the lazy dog. ";
        sentence.repeat(chars / sentence.len() + 1)
    }

    #[test]
    fn page_numbers_are_contiguous_for_every_kind() {
        let inputs = vec![
            ExtractedContent::PlainText(sentence_text(7000)),
            ExtractedContent::PdfPages(vec!["one".into(), "two".into(), "three".into()]),
            ExtractedContent::Sheets(vec![
                Sheet {
                    name: "Budget".into(),
                    text: "a b c".into(),
                },
                Sheet {
                    name: "Plan".into(),
                    text: "d e f".into(),
                },
            ]),
            ExtractedContent::WordBlocks(vec![
                Block {
                    kind: BlockKind::Heading,
                    html: "<h1>Intro</h1>".into(),
                },
                Block {
                    kind: BlockKind::Paragraph,
                    html: "<p>Body text.</p>".into(),
                },
                Block {
                    kind: BlockKind::Heading,
                    html: "<h1>Next</h1>".into(),
                },
            ]),
            ExtractedContent::Transcript(vec![
                Segment {
                    start_secs: 0.0,
                    end_secs: Some(4.5),
                    text: "hello".into(),
                },
                Segment {
                    start_secs: 4.5,
                    end_secs: None,
                    text: "world".into(),
                },
            ]),
        ];

        for input in inputs {
            let pages = paginate(&input, &opts());
            assert!(!pages.is_empty());
            let numbers: Vec<usize> = pages.iter().map(|p| p.number).collect();
            let expected: Vec<usize> = (1..=pages.len()).collect();
            assert_eq!(numbers, expected, "gap in numbering for {:?}", input);
        }
    }

    #[test]
    fn empty_input_yields_one_placeholder_page() {
        for input in [
            ExtractedContent::PlainText(String::new()),
            ExtractedContent::PlainText("   \n ".into()),
            ExtractedContent::PlainText("tiny".into()),
            ExtractedContent::PdfPages(Vec::new()),
            ExtractedContent::Transcript(Vec::new()),
        ] {
            let pages = paginate(&input, &opts());
            assert_eq!(pages.len(), 1);
            assert_eq!(
                pages[0].content.renderable_text(),
                EMPTY_CONTENT_PLACEHOLDER
            );
        }
    }

    #[test]
    fn single_native_page_stays_single() {
        let pages = paginate(&ExtractedContent::PdfPages(vec!["only page".into()]), &opts());
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].number, 1);
        assert!(!pages[0].content.is_structured());
    }

    #[test]
    fn pagination_is_deterministic() {
        let input = ExtractedContent::PlainText(sentence_text(9000));
        let a = paginate(&input, &opts());
        let b = paginate(&input, &opts());
        assert_eq!(a, b);
    }

    #[test]
    fn five_thousand_chars_make_three_pages() {
        let text = sentence_text(5000);
        let text = &text[..5000];
        let pages = paginate(&ExtractedContent::PlainText(text.to_string()), &opts());
        assert_eq!(pages.len(), 3);
        for page in &pages[..2] {
            let chunk = page.content.renderable_text();
            assert!(chunk.chars().count() <= 2000);
            // each cut lands after a full word, so chunks never end mid-word
            assert!(chunk.ends_with('.'), "chunk ended mid-sentence: {:?}", chunk);
        }
    }

    #[test]
    fn text_split_never_cuts_words_or_codepoints() {
        let word = "köttbullar";
        let text = std::iter::repeat(word)
            .take(600)
            .collect::<Vec<_>>()
            .join(" ");
        let pages = paginate(&ExtractedContent::PlainText(text), &opts());
        assert!(pages.len() > 1);
        for page in &pages {
            for piece in page.content.renderable_text().split_whitespace() {
                assert_eq!(piece, word, "word was split across pages");
            }
        }
    }

    #[test]
    fn heading_forces_page_break() {
        let blocks = vec![
            Block {
                kind: BlockKind::Paragraph,
                html: "<p>lead-in</p>".into(),
            },
            Block {
                kind: BlockKind::Heading,
                html: "<h1>Chapter</h1>".into(),
            },
            Block {
                kind: BlockKind::Paragraph,
                html: "<p>body</p>".into(),
            },
        ];
        let pages = paginate(&ExtractedContent::WordBlocks(blocks), &opts());
        assert_eq!(pages.len(), 2);
        assert!(pages.iter().all(|p| p.content.is_structured()));
        assert_eq!(
            pages[1].content.renderable_text(),
            "<h1>Chapter</h1>\n<p>body</p>"
        );
    }

    #[test]
    fn block_word_budget_flushes_and_keeps_tail() {
        let para = Block {
            kind: BlockKind::Paragraph,
            html: format!("<p>{}</p>", "word ".repeat(200).trim_end()),
        };
        let blocks = vec![para.clone(), para.clone(), para.clone(), para];
        let small = PaginateOptions {
            target_chunk_words: 300,
            ..PaginateOptions::default()
        };
        let pages = paginate(&ExtractedContent::WordBlocks(blocks), &small);
        // 200-word blocks against a 300-word budget: two blocks per page
        assert_eq!(pages.len(), 2);
    }

    #[test]
    fn transcript_segments_are_never_merged() {
        let segments: Vec<Segment> = (0..30)
            .map(|i| Segment {
                start_secs: i as f64 * 5.0,
                end_secs: Some(i as f64 * 5.0 + 5.0),
                text: format!("segment {}", i),
            })
            .collect();
        let pages = paginate(&ExtractedContent::Transcript(segments), &opts());
        assert_eq!(pages.len(), 30);
        match &pages[2].content {
            PageContent::TranscriptSegment { start_secs, .. } => {
                assert_eq!(*start_secs, 10.0)
            }
            other => panic!("expected transcript segment, got {:?}", other),
        }
    }

    #[test]
    fn repagination_replaces_lazy_placeholder() {
        let mut source = crate::models::Source::new(
            crate::models::SourceKind::Text,
            "paste",
            sentence_text(4500),
            paginate(&ExtractedContent::PlainText(String::new()), &opts()),
        );
        assert!(needs_repagination(&source, &opts()));
        repaginate_source(&mut source, &opts());
        assert!(source.page_count() > 1);
        assert!(!needs_repagination(&source, &opts()));
    }
}
