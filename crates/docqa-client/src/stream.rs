//! Chunk assembly for streamed text responses.
//!
//! Bytes arrive in arbitrary read-sized pieces. `Utf8Decoder` turns them into
//! text without splitting multi-byte characters, and `ChunkAssembler` cuts that
//! text into newline-delimited chunks. Nothing here knows about timing or the
//! transcript; see `render` for that.

/// Replacement emitted for bytes that are not valid UTF-8.
const REPLACEMENT: char = '\u{FFFD}';

/// Incremental UTF-8 decoder.
///
/// An incomplete sequence at the end of a read is held back and completed by
/// the next read.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Create a decoder with no pending bytes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next read.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let joined;
        let mut input: &[u8] = if self.pending.is_empty() {
            bytes
        } else {
            let mut buf = std::mem::take(&mut self.pending);
            buf.extend_from_slice(bytes);
            joined = buf;
            &joined
        };

        let mut out = String::with_capacity(input.len());
        loop {
            match std::str::from_utf8(input) {
                Ok(s) => {
                    out.push_str(s);
                    break;
                }
                Err(e) => {
                    let (valid, rest) = input.split_at(e.valid_up_to());
                    if let Ok(s) = std::str::from_utf8(valid) {
                        out.push_str(s);
                    }
                    match e.error_len() {
                        Some(len) => {
                            out.push(REPLACEMENT);
                            input = &rest[len..];
                        }
                        None => {
                            // Truncated sequence: wait for the rest.
                            self.pending = rest.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flush at end of stream. A dangling partial sequence becomes U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            REPLACEMENT.to_string()
        }
    }

    /// Number of bytes held back waiting for completion.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Splits a decoded byte stream into newline-delimited chunks.
///
/// The internal buffer always holds exactly the text received after the last
/// newline; everything before it has already been returned.
#[derive(Debug, Default)]
pub struct ChunkAssembler {
    decoder: Utf8Decoder,
    buffer: String,
}

impl ChunkAssembler {
    /// Create an empty assembler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one read and return the chunks it completed.
    ///
    /// Chunks that are blank after trimming are dropped.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let text = self.decoder.decode(bytes);
        self.buffer.push_str(&text);

        let Some(last_newline) = self.buffer.rfind('\n') else {
            return Vec::new();
        };
        let tail = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, tail);

        complete
            .strip_suffix('\n')
            .unwrap_or(&complete)
            .split('\n')
            .filter_map(renderable)
            .collect()
    }

    /// End of stream: return the unterminated tail if it has content.
    pub fn finish(&mut self) -> Option<String> {
        let flushed = self.decoder.finish();
        self.buffer.push_str(&flushed);
        let tail = std::mem::take(&mut self.buffer);
        renderable(&tail)
    }

    /// Text received after the last newline.
    #[must_use]
    pub fn buffered(&self) -> &str {
        &self.buffer
    }
}

/// A segment is rendered as-is unless it is blank. CR of a CRLF pair is dropped.
fn renderable(segment: &str) -> Option<String> {
    let segment = segment.strip_suffix('\r').unwrap_or(segment);
    if segment.trim().is_empty() {
        None
    } else {
        Some(segment.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assemble(reads: &[&[u8]]) -> Vec<String> {
        let mut asm = ChunkAssembler::new();
        let mut out = Vec::new();
        for read in reads {
            out.extend(asm.push(read));
        }
        out.extend(asm.finish());
        out
    }

    // =========================================================================
    // Decoder
    // =========================================================================

    #[test]
    fn decodes_ascii_directly() {
        let mut d = Utf8Decoder::new();
        assert_eq!(d.decode(b"hello"), "hello");
        assert_eq!(d.pending_len(), 0);
    }

    #[test]
    fn two_byte_char_split_across_reads() {
        let bytes = "café".as_bytes();
        let (a, b) = bytes.split_at(bytes.len() - 1);
        let mut d = Utf8Decoder::new();
        assert_eq!(d.decode(a), "caf");
        assert_eq!(d.pending_len(), 1);
        assert_eq!(d.decode(b), "é");
        assert_eq!(d.pending_len(), 0);
    }

    #[test]
    fn four_byte_char_split_over_three_reads() {
        let bytes = "🦀".as_bytes();
        let mut d = Utf8Decoder::new();
        assert_eq!(d.decode(&bytes[..1]), "");
        assert_eq!(d.decode(&bytes[1..3]), "");
        assert_eq!(d.decode(&bytes[3..]), "🦀");
    }

    #[test]
    fn invalid_bytes_become_replacement() {
        let mut d = Utf8Decoder::new();
        assert_eq!(d.decode(b"a\xffb"), "a\u{FFFD}b");
    }

    #[test]
    fn dangling_sequence_at_end_is_replaced() {
        let mut d = Utf8Decoder::new();
        assert_eq!(d.decode(&"é".as_bytes()[..1]), "");
        assert_eq!(d.finish(), "\u{FFFD}");
        assert_eq!(d.finish(), "");
    }

    // =========================================================================
    // Assembler
    // =========================================================================

    #[test]
    fn sections_across_two_reads() {
        let chunks = assemble(&[b"Sect", b"ion 1\nSection 2\n"]);
        assert_eq!(chunks, vec!["Section 1", "Section 2"]);
    }

    #[test]
    fn first_read_completes_nothing() {
        let mut asm = ChunkAssembler::new();
        assert!(asm.push(b"Sect").is_empty());
        assert_eq!(asm.buffered(), "Sect");
        assert_eq!(asm.push(b"ion 1\nSec"), vec!["Section 1"]);
        assert_eq!(asm.buffered(), "Sec");
    }

    #[test]
    fn unterminated_tail_flushed_on_finish() {
        let chunks = assemble(&[b"partial"]);
        assert_eq!(chunks, vec!["partial"]);
    }

    #[test]
    fn blank_chunks_are_dropped() {
        let chunks = assemble(&[b"a\n\n\n  \nb\n\t\n"]);
        assert_eq!(chunks, vec!["a", "b"]);
    }

    #[test]
    fn blank_tail_is_not_flushed() {
        let mut asm = ChunkAssembler::new();
        assert_eq!(asm.push(b"done\n   "), vec!["done"]);
        assert_eq!(asm.finish(), None);
    }

    #[test]
    fn crlf_is_treated_as_newline() {
        let chunks = assemble(&[b"one\r\ntwo\r", b"\nthree"]);
        assert_eq!(chunks, vec!["one", "two", "three"]);
    }

    #[test]
    fn chunk_content_is_not_trimmed() {
        let chunks = assemble(&[b"  - bullet\n"]);
        assert_eq!(chunks, vec!["  - bullet"]);
    }

    #[test]
    fn multibyte_char_split_inside_chunk() {
        let text = "## Résumé\n";
        let bytes = text.as_bytes();
        // Split inside the first 'é'.
        let pos = text.find('é').unwrap() + 1;
        let chunks = assemble(&[&bytes[..pos], &bytes[pos..]]);
        assert_eq!(chunks, vec!["## Résumé"]);
    }

    #[test]
    fn every_two_read_partition_yields_the_same_chunks() {
        let text = "# Notes\nα β γ\n\n- 🦀 crab\ntrailing";
        let bytes = text.as_bytes();
        let expected = vec!["# Notes", "α β γ", "- 🦀 crab", "trailing"];

        for split in 0..=bytes.len() {
            let (a, b) = bytes.split_at(split);
            assert_eq!(assemble(&[a, b]), expected, "split at {split}");
        }
    }

    #[test]
    fn byte_at_a_time_reconstructs_text() {
        let text = "Línea 1\nLínea 2\n日本語\n";
        let reads: Vec<&[u8]> = text.as_bytes().chunks(1).collect();
        let chunks = assemble(&reads);
        assert_eq!(chunks.join("\n"), text.trim_end());
    }
}
