//! Array-of-bytes pattern compilation.
//!
//! A pattern is written as two-digit hex bytes separated by whitespace, with
//! `??` standing for a byte that is not compared:
//!
//! ```text
//! 48 8B 0D ?? ?? ?? ?? 48 8D 54 24 38
//! ```
//!
//! Compilation keeps only the concrete bytes and describes them as chunks:
//! maximal runs of concrete bytes together with the offset, relative to the
//! start of the pattern, at which each run must appear.

pub mod search;
pub mod signature;

use std::fmt;

use crate::error::{Error, Result};

pub use search::{find_in_buffer, matches_at};
pub use signature::{PatternSet, PatternSignature, load_patterns, save_patterns};

/// One maximal run of concrete bytes inside a compiled pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Offset of the run inside [`CompiledPattern::raw_bytes`].
    pub source_offset: usize,
    /// Offset of the run relative to the start of a match.
    pub target_offset: usize,
    /// Number of bytes in the run.
    pub length: usize,
}

/// A signature ready to be searched for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPattern {
    name: String,
    raw_bytes: Vec<u8>,
    chunks: Vec<Chunk>,
    /// Absolute address of the first match, filled in by a search.
    pub resolved_address: Option<u64>,
}

impl CompiledPattern {
    /// Compile pattern text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedPattern`] when a token is neither `??` nor
    /// exactly two hex digits, or when the pattern has no concrete byte.
    ///
    /// # Example
    ///
    /// ```
    /// use hunter_core::pattern::CompiledPattern;
    ///
    /// let p = CompiledPattern::compile("demo", "48 8B ?? ?? 90").unwrap();
    /// assert_eq!(p.raw_bytes(), &[0x48, 0x8B, 0x90]);
    /// assert_eq!(p.chunks().len(), 2);
    /// assert_eq!(p.chunks()[1].target_offset, 4);
    /// ```
    pub fn compile(name: &str, text: &str) -> Result<Self> {
        let mut raw_bytes = Vec::new();
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut target_offset = 0usize;
        let mut open_chunk = false;

        let text_bytes = text.as_bytes();
        let mut pos = 0usize;
        while pos < text_bytes.len() {
            if text_bytes[pos].is_ascii_whitespace() {
                pos += 1;
                continue;
            }

            let token = text_bytes.get(pos..pos + 2).ok_or_else(|| {
                Error::malformed_pattern(name, format!("truncated token at column {}", pos))
            })?;

            if token == b"??" {
                open_chunk = false;
                target_offset += 1;
                pos += 2;
                continue;
            }

            let byte = decode_hex_pair(token).ok_or_else(|| {
                Error::malformed_pattern(
                    name,
                    format!(
                        "invalid token '{}' at column {}",
                        String::from_utf8_lossy(token),
                        pos
                    ),
                )
            })?;
            pos += 2;

            raw_bytes.push(byte);
            if !open_chunk {
                chunks.push(Chunk {
                    source_offset: raw_bytes.len() - 1,
                    target_offset,
                    length: 0,
                });
                open_chunk = true;
            }
            if let Some(chunk) = chunks.last_mut() {
                chunk.length += 1;
            }
            target_offset += 1;
        }

        if chunks.is_empty() {
            return Err(Error::malformed_pattern(name, "pattern has no concrete bytes"));
        }

        Ok(Self {
            name: name.to_string(),
            raw_bytes,
            chunks,
            resolved_address: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw_bytes
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Bytes of a single chunk.
    pub fn chunk_bytes(&self, chunk: &Chunk) -> &[u8] {
        &self.raw_bytes[chunk.source_offset..chunk.source_offset + chunk.length]
    }

    /// The first chunk, used as the substring-search anchor.
    pub fn anchor(&self) -> &Chunk {
        // compile() never produces an empty chunk list
        &self.chunks[0]
    }

    /// Total number of bytes a match covers, trailing wildcards excluded.
    pub fn span(&self) -> usize {
        self.chunks
            .last()
            .map(|c| c.target_offset + c.length)
            .unwrap_or(0)
    }

    /// Render the pattern back to text, wildcards included.
    pub fn to_pattern_text(&self) -> String {
        let mut tokens = Vec::with_capacity(self.span());
        let mut cursor = 0usize;
        for chunk in &self.chunks {
            while cursor < chunk.target_offset {
                tokens.push("??".to_string());
                cursor += 1;
            }
            for byte in self.chunk_bytes(chunk) {
                tokens.push(format!("{:02X}", byte));
                cursor += 1;
            }
        }
        tokens.join(" ")
    }
}

/// Diagnostic layout: concrete bytes, then one `(src,tgt,len)` line per chunk.
impl fmt::Display for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.raw_bytes {
            write!(f, "{:02X} ", byte)?;
        }
        for chunk in &self.chunks {
            write!(
                f,
                "\n({},{},{})",
                chunk.source_offset, chunk.target_offset, chunk.length
            )?;
        }
        Ok(())
    }
}

fn decode_hex_pair(token: &[u8]) -> Option<u8> {
    let hi = (token[0] as char).to_digit(16)?;
    let lo = (token[1] as char).to_digit(16)?;
    u8::try_from(hi * 16 + lo).ok()
}

/// Compile a batch, keeping going past malformed entries.
///
/// Each entry yields its own result so one bad pattern does not prevent the
/// rest of the batch from being used.
pub fn compile_all(set: &PatternSet) -> Vec<Result<CompiledPattern>> {
    set.patterns
        .iter()
        .map(|sig| CompiledPattern::compile(&sig.name, &sig.pattern))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_concrete_runs(text: &str) -> Vec<usize> {
        let mut runs = Vec::new();
        let mut current = 0;
        for token in text.split_whitespace() {
            if token == "??" {
                if current > 0 {
                    runs.push(current);
                }
                current = 0;
            } else {
                current += 1;
            }
        }
        if current > 0 {
            runs.push(current);
        }
        runs
    }

    #[test]
    fn test_compile_without_wildcards() {
        let p = CompiledPattern::compile("plain", "45 6D 65 74 74 61").unwrap();
        assert_eq!(p.raw_bytes(), b"Emetta");
        assert_eq!(
            p.chunks(),
            &[Chunk {
                source_offset: 0,
                target_offset: 0,
                length: 6
            }]
        );
        assert_eq!(p.resolved_address, None);
    }

    #[test]
    fn test_compile_with_wildcards() {
        let p = CompiledPattern::compile("rip", "48 8B 0D ?? ?? ?? ?? E8 ?? 48").unwrap();
        assert_eq!(p.raw_bytes(), &[0x48, 0x8B, 0x0D, 0xE8, 0x48]);
        assert_eq!(
            p.chunks(),
            &[
                Chunk {
                    source_offset: 0,
                    target_offset: 0,
                    length: 3
                },
                Chunk {
                    source_offset: 3,
                    target_offset: 7,
                    length: 1
                },
                Chunk {
                    source_offset: 4,
                    target_offset: 9,
                    length: 1
                },
            ]
        );
        assert_eq!(p.span(), 10);
    }

    #[test]
    fn test_chunk_runs_match_manual_count() {
        let samples = [
            "48 8B 0D ?? ?? ?? ?? 48 8D 54 24 38 C6 44 24 20 00 E8 ?? ?? ?? ?? 48 8B 5C 24 70",
            "48 8B 05 ?? ?? ?? ?? 41 8B 94 00 ?? ?? ?? ?? 89 57",
            "?? ?? 90 ?? 91 92 ??",
            "45 6D 65 74 74 61",
        ];
        for text in samples {
            let p = CompiledPattern::compile("sample", text).unwrap();
            let lengths: Vec<usize> = p.chunks().iter().map(|c| c.length).collect();
            assert_eq!(lengths, count_concrete_runs(text), "pattern: {}", text);
        }
    }

    #[test]
    fn test_leading_wildcards_offset_first_chunk() {
        let p = CompiledPattern::compile("lead", "?? ?? AA BB").unwrap();
        assert_eq!(p.anchor().target_offset, 2);
        assert_eq!(p.to_pattern_text(), "?? ?? AA BB");
    }

    #[test]
    fn test_tokens_without_separators() {
        let p = CompiledPattern::compile("packed", "488B??0D").unwrap();
        assert_eq!(p.raw_bytes(), &[0x48, 0x8B, 0x0D]);
        assert_eq!(p.chunks().len(), 2);
    }

    #[test]
    fn test_lowercase_hex_accepted() {
        let p = CompiledPattern::compile("lower", "de ad be ef").unwrap();
        assert_eq!(p.raw_bytes(), &[0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_malformed_patterns_rejected() {
        for text in ["48 8G", "48 8", "?", "48 ? 90", "zz", "", "?? ??"] {
            let err = CompiledPattern::compile("bad", text).unwrap_err();
            assert!(
                matches!(err, Error::MalformedPattern { .. }),
                "expected MalformedPattern for {:?}",
                text
            );
        }
    }

    #[test]
    fn test_display_lists_bytes_then_chunks() {
        let p = CompiledPattern::compile("disp", "AA ?? BB CC").unwrap();
        assert_eq!(p.to_string(), "AA BB CC \n(0,0,1)\n(1,2,2)");
    }

    #[test]
    fn test_format_roundtrip() {
        let text = "48 8B 0D ?? ?? ?? ?? B2 01 E8";
        let p = CompiledPattern::compile("round", text).unwrap();
        assert_eq!(p.to_pattern_text(), text);
    }

    #[test]
    fn test_compile_all_keeps_going() {
        let set = PatternSet {
            patterns: vec![
                PatternSignature::new("good", "90 90"),
                PatternSignature::new("bad", "9G"),
                PatternSignature::new("also_good", "CC ?? CC"),
            ],
        };
        let results = compile_all(&set);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }
}
