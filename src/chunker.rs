//! Fixed-width text chunking.
//!
//! A chunk is a window of at most `window` characters cut straight across
//! the input with no sentence or word awareness. Concatenating the output in
//! order reproduces the input exactly.

/// Splits `text` into consecutive windows of at most `window` characters.
///
/// Every chunk except possibly the last holds exactly `window` characters.
/// Windows count `char`s, not bytes, so multi-byte text is never torn. An
/// empty input (or a zero window) yields no chunks.
pub fn chunk_text(text: &str, window: usize) -> Vec<String> {
    if text.is_empty() || window == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut filled = 0usize;
    for ch in text.chars() {
        current.push(ch);
        filled += 1;
        if filled == window {
            chunks.push(std::mem::take(&mut current));
            filled = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejoining_chunks_reproduces_input() {
        let text = "the quick brown fox jumps over the lazy dog".repeat(40);
        let chunks = chunk_text(&text, 512);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn all_chunks_except_last_are_full_width() {
        let text = "x".repeat(5000);
        let chunks = chunk_text(&text, 512);
        assert_eq!(chunks.len(), 10);
        for chunk in &chunks[..chunks.len() - 1] {
            assert_eq!(chunk.chars().count(), 512);
        }
        assert_eq!(chunks.last().unwrap().chars().count(), 5000 - 9 * 512);
    }

    #[test]
    fn short_input_yields_single_chunk() {
        let chunks = chunk_text("short", 512);
        assert_eq!(chunks, vec!["short".to_string()]);
    }

    #[test]
    fn exact_multiple_has_no_trailing_fragment() {
        let text = "ab".repeat(512);
        let chunks = chunk_text(&text, 512);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.chars().count() == 512));
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk_text("", 512).is_empty());
    }

    #[test]
    fn multibyte_text_is_not_torn() {
        let text = "héllo wörld åéîøü".repeat(100);
        let chunks = chunk_text(&text, 7);
        assert_eq!(chunks.concat(), text);
        for chunk in &chunks[..chunks.len() - 1] {
            assert_eq!(chunk.chars().count(), 7);
        }
    }

    #[test]
    fn chunking_is_deterministic() {
        let text = "determinism matters for restartable ingestion".repeat(30);
        assert_eq!(chunk_text(&text, 64), chunk_text(&text, 64));
    }
}
