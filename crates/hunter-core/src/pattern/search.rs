//! Searching compiled patterns inside byte buffers.
//!
//! The anchor chunk is located with a substring search; the remaining chunks
//! are checked by direct comparison at their target offsets. After a failed
//! candidate the search resumes just past the anchor bytes that were matched.

use memchr::memmem;

use super::CompiledPattern;

/// Check whether every chunk of `pattern` matches with the pattern starting at `start`.
pub fn matches_at(pattern: &CompiledPattern, buffer: &[u8], start: usize) -> bool {
    pattern.chunks().iter().all(|chunk| {
        let from = start + chunk.target_offset;
        buffer
            .get(from..from + chunk.length)
            .is_some_and(|window| window == pattern.chunk_bytes(chunk))
    })
}

/// Find the first match of `pattern` in `buffer` at or after `from`.
///
/// Returns the offset of the start of the pattern (not of its anchor chunk).
///
/// # Example
///
/// ```
/// use hunter_core::pattern::{CompiledPattern, find_in_buffer};
///
/// let p = CompiledPattern::compile("demo", "AA ?? CC").unwrap();
/// let buffer = [0x00, 0xAA, 0x00, 0xBB, 0xAA, 0x11, 0xCC];
/// assert_eq!(find_in_buffer(&p, &buffer, 0), Some(4));
/// ```
pub fn find_in_buffer(pattern: &CompiledPattern, buffer: &[u8], from: usize) -> Option<usize> {
    let anchor = pattern.anchor();
    let anchor_bytes = pattern.chunk_bytes(anchor);
    let finder = memmem::Finder::new(anchor_bytes);

    // A match starting at `from` has its anchor `target_offset` bytes later.
    let mut hint = from.saturating_add(anchor.target_offset);
    while hint < buffer.len() {
        let found = hint + finder.find(&buffer[hint..])?;
        let start = found - anchor.target_offset;
        if matches_at(pattern, buffer, start) {
            return Some(start);
        }
        hint = found + anchor.length;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(text: &str) -> CompiledPattern {
        CompiledPattern::compile("test", text).unwrap()
    }

    #[test]
    fn test_single_chunk_found() {
        let p = compile("45 6D 65 74 74 61");
        let mut buffer = vec![0u8; 64];
        buffer[40..46].copy_from_slice(b"Emetta");
        assert_eq!(find_in_buffer(&p, &buffer, 0), Some(40));
    }

    #[test]
    fn test_single_chunk_not_found() {
        let p = compile("45 6D 65 74 74 61");
        let buffer = b"Emett_ and Emetx";
        assert_eq!(find_in_buffer(&p, buffer, 0), None);
    }

    #[test]
    fn test_later_candidate_after_mismatch() {
        // first candidate at 0 fails the trailing chunk, second at 8 matches
        let p = compile("AA BB ?? ?? CC");
        let buffer = [
            0xAA, 0xBB, 0x01, 0x02, 0xDD, 0x00, 0x00, 0x00, //
            0xAA, 0xBB, 0x03, 0x04, 0xCC, 0x00,
        ];
        assert_eq!(find_in_buffer(&p, &buffer, 0), Some(8));
    }

    #[test]
    fn test_trailing_chunk_past_buffer_end_is_mismatch() {
        let p = compile("AA ?? ?? CC");
        let buffer = [0x00, 0xAA, 0x01, 0x02];
        assert_eq!(find_in_buffer(&p, &buffer, 0), None);
    }

    #[test]
    fn test_leading_wildcards_return_pattern_start() {
        let p = compile("?? ?? AA BB");
        let buffer = [0xAA, 0xBB, 0x10, 0x11, 0xAA, 0xBB];
        // the anchor at 0 cannot have two bytes before it
        assert_eq!(find_in_buffer(&p, &buffer, 0), Some(2));
    }

    #[test]
    fn test_from_offset_skips_earlier_matches() {
        let p = compile("90 90");
        let buffer = [0x90, 0x90, 0x00, 0x90, 0x90];
        assert_eq!(find_in_buffer(&p, &buffer, 0), Some(0));
        assert_eq!(find_in_buffer(&p, &buffer, 1), Some(3));
        assert_eq!(find_in_buffer(&p, &buffer, 4), None);
    }

    #[test]
    fn test_leading_wildcards_never_start_before_from() {
        let p = compile("?? ?? ?? AA");
        let buffer = [0x00, 0x00, 0x00, 0x00, 0xAA, 0x00, 0x00, 0x00, 0x00, 0xAA];
        assert_eq!(find_in_buffer(&p, &buffer, 0), Some(1));
        assert_eq!(find_in_buffer(&p, &buffer, 1), Some(1));
        // the anchor at 4 would put the pattern start at 1
        assert_eq!(find_in_buffer(&p, &buffer, 3), Some(6));
        assert_eq!(find_in_buffer(&p, &buffer, 7), None);
    }

    #[test]
    fn test_matches_at() {
        let p = compile("01 ?? 03");
        let buffer = [0x01, 0xFF, 0x03];
        assert!(matches_at(&p, &buffer, 0));
        assert!(!matches_at(&p, &buffer, 1));
    }

    #[test]
    fn test_empty_buffer() {
        let p = compile("01");
        assert_eq!(find_in_buffer(&p, &[], 0), None);
    }
}
