//! Incremental decoder for `text/event-stream` bodies

/// Splits arbitrarily chunked bytes into the payloads of `data:` lines
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes; returns the data payloads of every line completed by them
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(data) = data_payload(&line) {
                payloads.push(data);
            }
        }
        payloads
    }

    /// Flush a trailing line left without a newline
    pub fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.buffer);
        data_payload(&line)
    }
}

fn data_payload(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim_end_matches(&['\n', '\r'][..]);
    let data = line.strip_prefix("data:")?;
    Some(data.strip_prefix(' ').unwrap_or(data).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"a\"").is_empty());
        assert_eq!(decoder.push(b":1}\r\n\r\ndata: x\n"), vec!["{\"a\":1}", "x"]);
    }

    #[test]
    fn test_non_data_lines_ignored() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b": comment\nevent: message\nid: 3\ndata:y\n");
        assert_eq!(payloads, vec!["y"]);
    }

    #[test]
    fn test_multibyte_char_split_across_chunks() {
        let bytes = "data: こんにちは\n".as_bytes();
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(&bytes[..8]).is_empty());
        assert_eq!(decoder.push(&bytes[8..]), vec!["こんにちは"]);
    }

    #[test]
    fn test_finish_flushes_trailing_line() {
        let mut decoder = SseDecoder::new();
        decoder.push(b"data: tail");
        assert_eq!(decoder.finish().as_deref(), Some("tail"));
        assert_eq!(decoder.finish(), None);
    }
}
