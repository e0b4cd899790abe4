//! Tagged-block corpus codec
//!
//! Every question is serialized as one block:
//!
//! ```text
//! [ID: q_001]
//! [MAIN_CONCEPT: Strategic Risk]
//! [CONCEPTS: Strategic Risk; SSBR; Governance]
//!
//! Question text...
//!
//! ---
//! ```
//!
//! Blocks are joined by one blank line to form the corpus blob that the
//! search backend indexes. Decoding is positional and never fails: fragments
//! come back from the backend possibly truncated or re-chunked, so anything
//! unreadable degrades to sentinel values.

use crate::document::Document;
use crate::{UNKNOWN_CONCEPT, UNKNOWN_ID};

/// Line that terminates every block
pub const BLOCK_TERMINATOR: &str = "---";

const ID_LABEL: &str = "ID";
const MAIN_CONCEPT_LABEL: &str = "MAIN_CONCEPT";
const CONCEPTS_LABEL: &str = "CONCEPTS";
const CONCEPT_SEPARATOR: &str = "; ";

/// Index of the first question-text line (after three headers and a blank)
const TEXT_START_LINE: usize = 4;

/// Serialize one document into a tagged block
pub fn encode_fragment(doc: &Document) -> String {
    let concepts = doc
        .concepts
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(CONCEPT_SEPARATOR);

    [
        format!("[{}: {}]", ID_LABEL, doc.id.trim()),
        format!("[{}: {}]", MAIN_CONCEPT_LABEL, doc.main_concept.trim()),
        format!("[{}: {}]", CONCEPTS_LABEL, concepts),
        String::new(),
        doc.text.trim().to_string(),
        String::new(),
        BLOCK_TERMINATOR.to_string(),
    ]
    .join("\n")
}

/// Assemble the full corpus blob: blocks separated by a blank line, trimmed,
/// with exactly one trailing newline.
pub fn render_corpus(docs: &[Document]) -> String {
    let blocks: Vec<String> = docs.iter().map(encode_fragment).collect();
    format!("{}\n", blocks.join("\n\n").trim())
}

/// Parse a fragment back into a document.
///
/// Headers are read positionally from lines 0..=2; the question text runs
/// from line 4 up to the next `---` line (or end of input). Missing or
/// malformed headers fall back to `UNKNOWN_ID` / `UNKNOWN` / no concepts.
///
/// A chunk with no readable header and no `---` line is not a block at all;
/// its whole content becomes the text.
pub fn decode_fragment(raw: &str) -> Document {
    let lines: Vec<&str> = raw.lines().collect();

    let id = lines.first().and_then(|line| header_value(line, ID_LABEL));
    let main_concept = lines
        .get(1)
        .and_then(|line| header_value(line, MAIN_CONCEPT_LABEL));
    let concepts = lines
        .get(2)
        .and_then(|line| header_value(line, CONCEPTS_LABEL));

    let headerless = id.is_none() && main_concept.is_none() && concepts.is_none();
    if headerless && !lines.contains(&BLOCK_TERMINATOR) {
        return Document::new(UNKNOWN_ID, raw.trim(), UNKNOWN_CONCEPT, Vec::new());
    }

    let id = id.unwrap_or_else(|| UNKNOWN_ID.to_string());
    let main_concept = main_concept.unwrap_or_else(|| UNKNOWN_CONCEPT.to_string());
    let concepts = concepts
        .map(|value| split_concepts(&value))
        .unwrap_or_default();

    let text = if lines.len() > TEXT_START_LINE {
        let body = &lines[TEXT_START_LINE..];
        let end = body
            .iter()
            .position(|line| *line == BLOCK_TERMINATOR)
            .unwrap_or(body.len());
        body[..end].join("\n").trim().to_string()
    } else {
        String::new()
    };

    Document::new(id, text, main_concept, concepts)
}

/// Split a corpus blob into its blocks, each ending with the terminator line.
///
/// A trailing block without a terminator is kept as-is. Blank lines between
/// blocks are dropped.
pub fn split_corpus(blob: &str) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in blob.lines() {
        if current.is_empty() && line.trim().is_empty() {
            continue;
        }
        current.push(line);
        if line == BLOCK_TERMINATOR {
            fragments.push(current.join("\n"));
            current.clear();
        }
    }

    if !current.is_empty() {
        let rest = current.join("\n");
        if !rest.trim().is_empty() {
            fragments.push(rest);
        }
    }

    fragments
}

/// Decode every block of a corpus blob
pub fn decode_corpus(blob: &str) -> Vec<Document> {
    split_corpus(blob)
        .iter()
        .map(|fragment| decode_fragment(fragment))
        .collect()
}

/// Value of a `[LABEL: value]` line, or `None` when the line has another shape
fn header_value(line: &str, label: &str) -> Option<String> {
    let rest = line.strip_prefix('[')?.strip_prefix(label)?.strip_prefix(':')?;
    let rest = rest.trim();
    // Only the closing bracket; a value may itself end in `]`
    let value = rest.strip_suffix(']').unwrap_or(rest);
    Some(value.trim().to_string())
}

fn split_concepts(value: &str) -> Vec<String> {
    value
        .split(';')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, text: &str, main: &str, concepts: &[&str]) -> Document {
        Document::new(
            id,
            text,
            main,
            concepts.iter().map(|c| c.to_string()).collect(),
        )
    }

    #[test]
    fn test_encode_exact_shape() {
        let d = doc("q_001", "What is SSBR?", "SSBR", &["SSBR", "Strategic Risk", "Audit"]);
        let expected = "[ID: q_001]\n\
                        [MAIN_CONCEPT: SSBR]\n\
                        [CONCEPTS: SSBR; Strategic Risk; Audit]\n\
                        \n\
                        What is SSBR?\n\
                        \n\
                        ---";
        assert_eq!(encode_fragment(&d), expected);
    }

    #[test]
    fn test_encode_empty_concepts() {
        let d = doc("q_002", "Text", UNKNOWN_CONCEPT, &[]);
        let encoded = encode_fragment(&d);
        assert!(encoded.contains("[CONCEPTS: ]"));
        assert!(encoded.contains("[MAIN_CONCEPT: UNKNOWN]"));
    }

    #[test]
    fn test_round_trip() {
        let cases = vec![
            doc("q_001", "Single line question?", "Risk", &["Risk", "Audit"]),
            doc("q_002", "First line\nsecond line\n\nafter blank", "Governance", &[]),
            doc("q_003", "", UNKNOWN_CONCEPT, &[]),
            doc("q_004", "Ünïcödé question: with punctuation; and [brackets]", "Ethics", &["Ethics", "ESG", "Reporting"]),
        ];

        for original in cases {
            let decoded = decode_fragment(&encode_fragment(&original));
            assert_eq!(decoded, original);
        }
    }

    #[test]
    fn test_round_trip_trims_whitespace() {
        let original = doc("  q_005 ", "  padded text \n", " Risk ", &[" A ", "B  "]);
        let decoded = decode_fragment(&encode_fragment(&original));
        assert_eq!(decoded.id, "q_005");
        assert_eq!(decoded.text, "padded text");
        assert_eq!(decoded.main_concept, "Risk");
        assert_eq!(decoded.concepts, vec!["A", "B"]);
    }

    #[test]
    fn test_decode_empty_input() {
        let decoded = decode_fragment("");
        assert_eq!(decoded.id, UNKNOWN_ID);
        assert_eq!(decoded.main_concept, UNKNOWN_CONCEPT);
        assert!(decoded.concepts.is_empty());
        assert_eq!(decoded.text, "");
        assert_eq!(decoded.score, 0.0);
    }

    #[test]
    fn test_decode_only_id_line() {
        let decoded = decode_fragment("[ID: q_042]");
        assert_eq!(decoded.id, "q_042");
        assert_eq!(decoded.main_concept, UNKNOWN_CONCEPT);
        assert!(decoded.concepts.is_empty());
        assert_eq!(decoded.text, "");
    }

    #[test]
    fn test_decode_missing_terminator() {
        let raw = "[ID: q_010]\n[MAIN_CONCEPT: Liquidity]\n[CONCEPTS: Liquidity; Cash]\n\nHow is liquidity measured?\nExplain.";
        let decoded = decode_fragment(raw);
        assert_eq!(decoded.id, "q_010");
        assert_eq!(decoded.concepts, vec!["Liquidity", "Cash"]);
        assert_eq!(decoded.text, "How is liquidity measured?\nExplain.");
    }

    #[test]
    fn test_decode_stops_at_first_terminator() {
        let raw = "[ID: q_011]\n[MAIN_CONCEPT: A]\n[CONCEPTS: A]\n\nBody\n\n---\n\n[ID: q_012]\n[MAIN_CONCEPT: B]";
        let decoded = decode_fragment(raw);
        assert_eq!(decoded.id, "q_011");
        assert_eq!(decoded.text, "Body");
    }

    #[test]
    fn test_round_trip_bracketed_concepts() {
        let original = doc("q_006", "Which accord introduced the LCR?", "Basel [III]", &["Basel [III]", "[Capital]"]);
        let decoded = decode_fragment(&encode_fragment(&original));
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_decode_headerless_chunk_keeps_text() {
        let raw = "Explain how liquidity coverage is measured.\nGive an example.";
        let decoded = decode_fragment(raw);
        assert_eq!(decoded.id, UNKNOWN_ID);
        assert_eq!(decoded.main_concept, UNKNOWN_CONCEPT);
        assert!(decoded.concepts.is_empty());
        assert_eq!(decoded.text, raw);

        let padded = decode_fragment("\n  A lone sentence.  \n");
        assert_eq!(padded.text, "A lone sentence.");
    }

    #[test]
    fn test_decode_malformed_headers() {
        let raw = "some chunk from the middle\nof a document\n[CONCEPTS: x]\n\nline four\n";
        let decoded = decode_fragment(raw);
        assert_eq!(decoded.id, UNKNOWN_ID);
        assert_eq!(decoded.main_concept, UNKNOWN_CONCEPT);
        assert_eq!(decoded.concepts, vec!["x"]);
        assert_eq!(decoded.text, "line four");
    }

    #[test]
    fn test_decode_concepts_drops_empties() {
        let raw = "[ID: q_1]\n[MAIN_CONCEPT: A]\n[CONCEPTS: ; A ;; B;]\n\nT\n\n---";
        assert_eq!(decode_fragment(raw).concepts, vec!["A", "B"]);
    }

    #[test]
    fn test_render_corpus_layout() {
        let docs = vec![
            doc("q_001", "One?", "A", &["A"]),
            doc("q_002", "Two?", "B", &["B"]),
        ];
        let blob = render_corpus(&docs);

        assert!(blob.ends_with("---\n"));
        assert!(!blob.ends_with("\n\n"));
        assert_eq!(blob.matches("---\n\n[ID: q_002]").count(), 1);
        assert!(!blob.contains("---\n\n\n"));
        assert!(blob.starts_with("[ID: q_001]"));
    }

    #[test]
    fn test_split_corpus_recovers_blocks() {
        let docs = vec![
            doc("q_001", "One?\n\nwith a blank line", "A", &["A"]),
            doc("q_002", "Two?", "B", &[]),
            doc("q_003", "", UNKNOWN_CONCEPT, &[]),
        ];
        let blob = render_corpus(&docs);

        let fragments = split_corpus(&blob);
        assert_eq!(fragments.len(), 3);
        assert_eq!(fragments[1], encode_fragment(&docs[1]));
        assert_eq!(decode_corpus(&blob), docs);
    }

    #[test]
    fn test_split_corpus_keeps_unterminated_tail() {
        let blob = "[ID: q_001]\n[MAIN_CONCEPT: A]\n[CONCEPTS: ]\n\nOne\n\n---\n\n[ID: q_002]\n[MAIN_CONCEPT: B]\n\n\n";
        let fragments = split_corpus(blob);
        assert_eq!(fragments.len(), 2);
        assert_eq!(decode_fragment(&fragments[1]).id, "q_002");
    }
}
