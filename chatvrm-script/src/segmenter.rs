//! Sentence segmentation of generated text into speakable chunks
//!
//! Text is cut right after every terminator character, and any piece still
//! longer than the configured maximum is hard-wrapped. The chunks are
//! borrowed slices of the input, so concatenating them gives back the input.

use chatvrm_core::config::{SegmenterConfig, DEFAULT_MAX_LENGTH, DEFAULT_TERMINATORS};

/// Split `text` into chunks of at most `max_length` UTF-16 code units using
/// the default terminator set
pub fn segment(text: &str, max_length: usize) -> Vec<String> {
    Segments::new(text, max_length, DEFAULT_TERMINATORS)
        .map(str::to_string)
        .collect()
}

/// Reusable segmenter bound to a configuration
#[derive(Debug, Clone)]
pub struct Segmenter {
    max_length: usize,
    terminators: String,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            terminators: DEFAULT_TERMINATORS.to_string(),
        }
    }
}

impl Segmenter {
    pub fn new(config: &SegmenterConfig) -> Self {
        Self {
            max_length: config.max_length,
            terminators: config.terminators.clone(),
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Lazily split `text`; the returned iterator can be cloned and replayed
    pub fn split<'a>(&'a self, text: &'a str) -> Segments<'a> {
        Segments::new(text, self.max_length, &self.terminators)
    }

    pub fn segment(&self, text: &str) -> Vec<String> {
        self.split(text).map(str::to_string).collect()
    }
}

/// Iterator over the chunks of a text
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    rest: &'a str,
    pending: &'a str,
    max_length: usize,
    terminators: &'a str,
}

impl<'a> Segments<'a> {
    pub fn new(text: &'a str, max_length: usize, terminators: &'a str) -> Self {
        Self {
            rest: text,
            pending: "",
            max_length,
            terminators,
        }
    }

    fn next_sentence(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        let end = self
            .rest
            .char_indices()
            .find(|(_, c)| self.terminators.contains(*c))
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(self.rest.len());
        let (sentence, tail) = self.rest.split_at(end);
        self.rest = tail;
        Some(sentence)
    }
}

/// Byte offset of the first char that would push the UTF-16 length of
/// `piece` past `max_units`; a char never straddles the cut
fn utf16_cut(piece: &str, max_units: usize) -> Option<usize> {
    let mut units = 0;
    for (i, c) in piece.char_indices() {
        units += c.len_utf16();
        if units > max_units {
            // a lone astral char wider than the limit still has to advance
            return Some(if i == 0 { c.len_utf8() } else { i }).filter(|&end| end < piece.len());
        }
    }
    None
}

impl<'a> Iterator for Segments<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pending.is_empty() {
            self.pending = self.next_sentence()?;
        }

        let cut = match self.max_length {
            0 => None,
            n => utf16_cut(self.pending, n),
        };

        let chunk = match cut {
            Some(i) => {
                let (head, tail) = self.pending.split_at(i);
                self.pending = tail;
                head
            }
            None => std::mem::take(&mut self.pending),
        };
        Some(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_after_fullwidth_terminators() {
        assert_eq!(
            segment("こんにちは。元気ですか？", 60),
            vec!["こんにちは。", "元気ですか？"]
        );
    }

    #[test]
    fn test_hard_wraps_long_runs() {
        let text = "a".repeat(130);
        let lengths: Vec<usize> = segment(&text, 60).iter().map(|c| c.chars().count()).collect();
        assert_eq!(lengths, vec![60, 60, 10]);
    }

    #[test]
    fn test_exact_multiple_has_no_empty_tail() {
        let text = "b".repeat(120);
        let chunks = segment(&text, 60);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| !c.is_empty()));
    }

    #[test]
    fn test_ascii_terminators_and_newline() {
        assert_eq!(
            segment("Hi there! How are you?\nFine.", 60),
            vec!["Hi there!", " How are you?", "\n", "Fine."]
        );
    }

    #[test]
    fn test_consecutive_terminators_stay_separate() {
        assert_eq!(segment("え。。ok", 60), vec!["え。", "。", "ok"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(segment("", 60).is_empty());
    }

    #[test]
    fn test_zero_max_length_disables_wrapping() {
        let text = "x".repeat(200);
        assert_eq!(segment(&text, 0), vec![text.clone()]);
    }

    #[test]
    fn test_wraps_on_char_boundaries() {
        let text = "あ".repeat(7);
        let chunks = segment(&text, 3);
        assert_eq!(chunks, vec!["あああ", "あああ", "あ"]);
    }

    #[test]
    fn test_astral_chars_count_as_two_units() {
        let text = "😀".repeat(61);
        let units: Vec<usize> = segment(&text, 60).iter().map(|c| c.encode_utf16().count()).collect();
        assert_eq!(units, vec![60, 60, 2]);
    }

    #[test]
    fn test_surrogate_pair_is_never_split() {
        let chunks = segment("ab😀c", 3);
        assert_eq!(chunks, vec!["ab", "😀c"]);
    }

    #[test]
    fn test_lone_wide_char_still_advances() {
        assert_eq!(segment("😀😀", 1), vec!["😀", "😀"]);
    }

    #[test]
    fn test_segments_are_restartable() {
        let segmenter = Segmenter::default();
        let text = "One. Two! Three?";
        let segments = segmenter.split(text);
        let first: Vec<&str> = segments.clone().collect();
        let second: Vec<&str> = segments.collect();
        assert_eq!(first, second);
        assert_eq!(first.concat(), text);
    }

    #[test]
    fn test_custom_terminators() {
        let config = SegmenterConfig {
            max_length: 60,
            terminators: ",".to_string(),
        };
        let segmenter = Segmenter::new(&config);
        assert_eq!(segmenter.segment("a,b.c"), vec!["a,", "b.c"]);
    }
}
