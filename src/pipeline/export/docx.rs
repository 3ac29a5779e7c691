//! Word (.docx) rendering of extracted text.
//!
//! The whole text goes into one paragraph. Line breaks and tabs become
//! `<w:br/>` and `<w:tab/>` inside a single run, so the document looks like
//! the text area the user reviewed.

use std::io::Cursor;

use docx_rs::{BreakType, Docx, Paragraph, Run};

use super::ExportError;

/// Build the in-memory document model for `text`.
pub fn build_document(text: &str) -> Docx {
    let cleaned = clean_text(text);
    let mut run = Run::new();

    for (i, line) in cleaned.split('\n').enumerate() {
        if i > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        for (j, segment) in line.split('\t').enumerate() {
            if j > 0 {
                run = run.add_tab();
            }
            if !segment.is_empty() {
                run = run.add_text(segment);
            }
        }
    }

    Docx::new().add_paragraph(Paragraph::new().add_run(run))
}

/// Render `text` as a packed .docx archive.
pub fn render_docx(text: &str) -> Result<Vec<u8>, ExportError> {
    let mut buf = Cursor::new(Vec::new());
    build_document(text)
        .build()
        .pack(&mut buf)
        .map_err(|e| ExportError::DocumentWrite(e.to_string()))?;

    let bytes = buf.into_inner();
    tracing::debug!(chars = text.len(), size = bytes.len(), "Rendered docx");
    Ok(bytes)
}

/// Normalize line endings and drop characters XML 1.0 cannot carry.
///
/// Tesseract ends every page with a form feed, which would otherwise make
/// the document unreadable in Word.
fn clean_text(text: &str) -> String {
    text.replace("\r\n", "\n")
        .chars()
        .map(|c| if c == '\r' { '\n' } else { c })
        .filter(|&c| is_xml_char(c))
        .collect()
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n')
        || ('\u{20}'..='\u{D7FF}').contains(&c)
        || ('\u{E000}'..='\u{FFFD}').contains(&c)
        || c >= '\u{10000}'
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{DocumentChild, ParagraphChild, RunChild};

    /// Paragraph count and flattened text of a packed document.
    fn read_back(bytes: &[u8]) -> (usize, String) {
        let docx = docx_rs::read_docx(bytes).unwrap();
        let mut paragraphs = 0;
        let mut buf = String::new();

        for node in &docx.document.children {
            if let DocumentChild::Paragraph(paragraph) = node {
                paragraphs += 1;
                for child in &paragraph.children {
                    if let ParagraphChild::Run(run) = child {
                        for child in &run.children {
                            match child {
                                RunChild::Text(text) => buf.push_str(&text.text),
                                RunChild::Break(_) => buf.push('\n'),
                                RunChild::Tab(_) => buf.push('\t'),
                                _ => (),
                            }
                        }
                    }
                }
            }
        }

        (paragraphs, buf)
    }

    #[test]
    fn output_is_a_zip_archive() {
        let bytes = render_docx("Hello").unwrap();
        assert_eq!(&bytes[..4], b"PK\x03\x04");
    }

    #[test]
    fn text_lands_in_single_paragraph() {
        let bytes = render_docx("Hello\nWorld\n").unwrap();
        let (paragraphs, text) = read_back(&bytes);
        assert_eq!(paragraphs, 1);
        assert_eq!(text, "Hello\nWorld\n");
    }

    #[test]
    fn tabs_are_preserved() {
        let bytes = render_docx("Skills\tRust\nLanguages\tEnglish").unwrap();
        let (_, text) = read_back(&bytes);
        assert_eq!(text, "Skills\tRust\nLanguages\tEnglish");
    }

    #[test]
    fn vietnamese_text_survives() {
        let bytes = render_docx("Nguyễn Văn A\nKỹ sư phần mềm").unwrap();
        let (_, text) = read_back(&bytes);
        assert_eq!(text, "Nguyễn Văn A\nKỹ sư phần mềm");
    }

    #[test]
    fn empty_text_still_builds_a_document() {
        let bytes = render_docx("").unwrap();
        let (paragraphs, text) = read_back(&bytes);
        assert_eq!(paragraphs, 1);
        assert_eq!(text, "");
    }

    #[test]
    fn markup_characters_do_not_break_the_document() {
        let bytes = render_docx("R&D <lead> \"C++\"").unwrap();
        let (paragraphs, _) = read_back(&bytes);
        assert_eq!(paragraphs, 1);
    }

    #[test]
    fn form_feed_and_carriage_returns_are_cleaned() {
        assert_eq!(clean_text("Page one\x0c"), "Page one");
        assert_eq!(clean_text("a\r\nb\rc"), "a\nb\nc");
        assert_eq!(clean_text("bell\x07 nul\x00"), "bell nul");

        let bytes = render_docx("Tesseract output\n\x0c").unwrap();
        let (_, text) = read_back(&bytes);
        assert_eq!(text, "Tesseract output\n");
    }

    #[test]
    fn xml_char_ranges() {
        assert!(is_xml_char('a'));
        assert!(is_xml_char('\t'));
        assert!(is_xml_char('ế'));
        assert!(is_xml_char('😀'));
        assert!(!is_xml_char('\u{0B}'));
        assert!(!is_xml_char('\u{FFFE}'));
    }
}
