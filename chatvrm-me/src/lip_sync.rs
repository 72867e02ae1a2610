//! Mouth-open value from playing audio

use chatvrm_core::ExpressionPreset;

/// Samples inspected per analysis, matching a 2048-point analyser window
pub const WINDOW_SIZE: usize = 2048;

/// Values below this are treated as silence
pub const SILENCE_THRESHOLD: f32 = 0.1;

/// Map a window of PCM samples (nominally `[-1, 1]`) to a `[0, 1]` mouth-open
/// value. Only the last `WINDOW_SIZE` samples are used.
pub fn volume(samples: &[f32]) -> f32 {
    let start = samples.len().saturating_sub(WINDOW_SIZE);
    let peak = samples[start..]
        .iter()
        .filter(|s| s.is_finite())
        .fold(0.0f32, |acc, s| acc.max(s.abs()));

    let value = 1.0 / (1.0 + (-45.0 * peak + 5.0).exp());
    if value < SILENCE_THRESHOLD {
        0.0
    } else {
        value
    }
}

/// Rolling analyzer fed with decoded audio as it plays
#[derive(Debug, Clone)]
pub struct LipSyncAnalyzer {
    preset: ExpressionPreset,
    window: Vec<f32>,
}

impl Default for LipSyncAnalyzer {
    fn default() -> Self {
        Self::new(ExpressionPreset::Aa)
    }
}

impl LipSyncAnalyzer {
    pub fn new(preset: ExpressionPreset) -> Self {
        Self {
            preset,
            window: Vec::with_capacity(WINDOW_SIZE),
        }
    }

    /// Mouth preset the analyzer drives
    pub fn preset(&self) -> ExpressionPreset {
        self.preset
    }

    /// Append newly played samples, keeping only the latest window
    pub fn push(&mut self, samples: &[f32]) {
        self.window.extend_from_slice(samples);
        if self.window.len() > WINDOW_SIZE {
            let excess = self.window.len() - WINDOW_SIZE;
            self.window.drain(..excess);
        }
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }

    /// Current `(preset, value)` pair for `ExpressionController::lip_sync`
    pub fn update(&self) -> (ExpressionPreset, f32) {
        (self.preset, volume(&self.window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_is_zero() {
        assert_eq!(volume(&[]), 0.0);
        assert_eq!(volume(&[0.0; 512]), 0.0);
        assert_eq!(volume(&[0.01, -0.02]), 0.0);
    }

    #[test]
    fn test_loud_audio_opens_mouth() {
        let v = volume(&[0.0, -0.5, 0.2]);
        assert!(v > 0.99 && v <= 1.0);
    }

    #[test]
    fn test_sigmoid_midpoint() {
        // 45 * peak == 5 puts the curve at one half
        let v = volume(&[5.0 / 45.0]);
        assert!((v - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_non_finite_samples_ignored() {
        assert_eq!(volume(&[f32::NAN, f32::INFINITY]), 0.0);
    }

    #[test]
    fn test_analyzer_keeps_latest_window() {
        let mut analyzer = LipSyncAnalyzer::default();
        analyzer.push(&[0.9; 16]);
        analyzer.push(&vec![0.0; WINDOW_SIZE]);
        assert_eq!(analyzer.update(), (ExpressionPreset::Aa, 0.0));

        analyzer.push(&[0.6]);
        assert!(analyzer.update().1 > 0.9);

        analyzer.reset();
        assert_eq!(analyzer.update().1, 0.0);
    }
}
