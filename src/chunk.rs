//! Block-boundary batching for extractor calls.
//!
//! Packs whole raw blocks (blank-line separated) into chunks that respect a
//! character budget, so each extractor call sees complete records. Only a
//! single block that alone exceeds the budget is hard-split; everything else
//! stays intact on block boundaries.

use crate::models::RawBlock;

/// Pack block texts into chunks of at most `max_chars` characters, keeping
/// block order. Deterministic. No blocks, no chunks.
pub fn chunk_blocks(blocks: &[RawBlock], max_chars: usize) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    for block in blocks {
        let text = block.text.trim();
        if text.is_empty() {
            continue;
        }

        // Flush when adding this block would exceed the budget.
        let would_be = if current.is_empty() {
            text.len()
        } else {
            current.len() + 2 + text.len()
        };
        if would_be > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }

        if text.len() > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            hard_split(text, max_chars, &mut chunks);
        } else {
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(text);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Split one oversized block at line boundaries where possible, never inside
/// a UTF-8 character.
fn hard_split(text: &str, max_chars: usize, chunks: &mut Vec<String>) {
    let mut remaining = text;
    while !remaining.is_empty() {
        let mut split_at = remaining.len().min(max_chars);
        if split_at < remaining.len() {
            while split_at > 0 && !remaining.is_char_boundary(split_at) {
                split_at -= 1;
            }
            if let Some(pos) = remaining[..split_at].rfind('\n') {
                split_at = pos + 1;
            }
        }
        if split_at == 0 {
            // Budget smaller than one character; take the character anyway.
            split_at = remaining
                .chars()
                .next()
                .map(|c| c.len_utf8())
                .unwrap_or(remaining.len());
        }
        let (piece, rest) = remaining.split_at(split_at);
        let piece = piece.trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }
        remaining = rest;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(text: &str) -> RawBlock {
        RawBlock {
            item_id: None,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_everything_fits_in_one_chunk() {
        let blocks = vec![block("Image: a.jpg\nExtracted Text: CAP"), block("Image: b.jpg")];
        let chunks = chunk_blocks(&blocks, 5000);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], "Image: a.jpg\nExtracted Text: CAP\n\nImage: b.jpg");
    }

    #[test]
    fn test_splits_between_blocks_not_inside() {
        let a = "Image: a.jpg\nExtracted Text: 10uF ceramic";
        let b = "Image: b.jpg\nExtracted Text: 10K resistor";
        let chunks = chunk_blocks(&[block(a), block(b)], a.len() + 10);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], a);
        assert_eq!(chunks[1], b);
    }

    #[test]
    fn test_oversized_block_hard_splits_under_budget() {
        let lines: Vec<String> = (0..40).map(|i| format!("line number {}", i)).collect();
        let big = lines.join("\n");
        let chunks = chunk_blocks(&[block(&big)], 100);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= 100, "chunk over budget: {}", chunk.len());
        }
        // No line was cut in half.
        let rejoined: Vec<&str> = chunks.iter().flat_map(|c| c.lines()).collect();
        let original: Vec<&str> = big.lines().collect();
        assert_eq!(rejoined, original);
    }

    #[test]
    fn test_multibyte_text_never_panics() {
        let big = "µΩ±°".repeat(50);
        let chunks = chunk_blocks(&[block(&big)], 7);
        assert!(!chunks.is_empty());
        assert_eq!(chunks.concat(), big);
    }

    #[test]
    fn test_empty_blocks_are_skipped() {
        let chunks = chunk_blocks(&[block(""), block("  \n ")], 100);
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_deterministic() {
        let blocks: Vec<RawBlock> = (0..20)
            .map(|i| block(&format!("Image: {}.jpg\nExtracted Text: part {}", i, i)))
            .collect();
        let first = chunk_blocks(&blocks, 120);
        let second = chunk_blocks(&blocks, 120);
        assert_eq!(first, second);
    }
}
