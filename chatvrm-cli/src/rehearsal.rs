// Offline rehearsal: plays screenplays through the expression controller on
// a simulated render clock and reports every weight write

use chatvrm_core::{EmotionTag, ExpressionConfig, ExpressionPreset};
use chatvrm_me::{lip_sync::volume, ExpressionController, RecordingSink};
use chatvrm_script::Screenplay;
use std::f32::consts::PI;
use std::sync::Arc;

/// Sample rate of the synthetic voice signal
const SAMPLE_RATE: f32 = 16_000.0;

#[derive(Debug, Clone, Copy)]
pub struct RehearsalOptions {
    pub fps: u32,
    /// Simulated speaking time per character
    pub secs_per_char: f64,
}

impl Default for RehearsalOptions {
    fn default() -> Self {
        Self {
            fps: 30,
            secs_per_char: 0.1,
        }
    }
}

/// One presentation write at a point on the simulated clock
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub time: f64,
    pub preset: ExpressionPreset,
    pub weight: f32,
}

/// Stand-in for decoded speech: a 220 Hz tone whose loudness pulses at
/// syllable rate
fn voice_samples(start: f64, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| {
            let t = start as f32 + i as f32 / SAMPLE_RATE;
            let envelope = 0.2 * (2.0 * PI * 4.0 * t).sin().abs();
            envelope * (2.0 * PI * 220.0 * t).sin()
        })
        .collect()
}

pub fn rehearse(screenplays: &[Screenplay], config: &ExpressionConfig, options: RehearsalOptions) -> Vec<Frame> {
    let sink = Arc::new(RecordingSink::new());
    let mut controller = ExpressionController::for_model(config, sink.clone());
    let delta = 1.0 / f64::from(options.fps.max(1));
    let samples_per_frame = (SAMPLE_RATE as f64 * delta) as usize;

    let mut frames = Vec::new();
    let mut clock = 0.0;
    let mut tick = |controller: &mut ExpressionController, clock: &mut f64| {
        controller.update(delta);
        *clock += delta;
        frames.extend(sink.take().into_iter().map(|(preset, weight)| Frame {
            time: *clock,
            preset,
            weight,
        }));
    };

    for play in screenplays {
        controller.play_emotion(play.expression);

        let speaking = play.talk.message.chars().count() as f64 * options.secs_per_char;
        let mut elapsed = 0.0;
        while elapsed < speaking {
            let samples = voice_samples(elapsed, samples_per_frame);
            controller.lip_sync(ExpressionPreset::Aa, volume(&samples));
            tick(&mut controller, &mut clock);
            elapsed += delta;
        }
        controller.lip_sync(ExpressionPreset::Aa, 0.0);
        tick(&mut controller, &mut clock);
    }

    controller.play_emotion(EmotionTag::Neutral);
    tick(&mut controller, &mut clock);
    frames
}
