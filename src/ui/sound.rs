/// Sound effects: procedural chiptune blips via rodio, one per game event.
///
/// Every buffer is synthesized into an in-memory WAV at startup and played
/// fire-and-forget through a detached `Sink`.
///
/// Without the "sound" feature the engine is a stub that ignores events.

use bobo::sim::event::GameEvent;

/// One slot per distinct effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sfx {
    Jump,
    Collect,
    ExitOpen,
    Stomp,
    Hit,
    LevelComplete,
    NextLevel,
    GameOver,
    Win,
}

impl Sfx {
    pub const ALL: [Sfx; 9] = [
        Sfx::Jump,
        Sfx::Collect,
        Sfx::ExitOpen,
        Sfx::Stomp,
        Sfx::Hit,
        Sfx::LevelComplete,
        Sfx::NextLevel,
        Sfx::GameOver,
        Sfx::Win,
    ];

    /// The effect for an event, if it has one.
    pub fn for_event(event: &GameEvent) -> Option<Sfx> {
        match event {
            GameEvent::Jumped => Some(Sfx::Jump),
            GameEvent::Collected { .. } => Some(Sfx::Collect),
            GameEvent::ExitOpened => Some(Sfx::ExitOpen),
            GameEvent::Stomped { .. } => Some(Sfx::Stomp),
            // The game-over jingle replaces the hit on the last life.
            GameEvent::Damaged { lives_left: 0, .. } => None,
            GameEvent::Damaged { .. } => Some(Sfx::Hit),
            GameEvent::LevelCompleted { .. } => Some(Sfx::LevelComplete),
            GameEvent::LevelStarted { level } if *level > 0 => Some(Sfx::NextLevel),
            GameEvent::GameOver => Some(Sfx::GameOver),
            GameEvent::Won => Some(Sfx::Win),
            GameEvent::LevelStarted { .. } | GameEvent::NextLevelReady { .. } => None,
        }
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::Sfx;
    use bobo::sim::event::GameEvent;

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = std::f32::consts::TAU;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: Vec<Arc<Vec<u8>>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("no audio output: {e}");
                    return None;
                }
            };
            let buffers = Sfx::ALL.iter().map(|&s| Arc::new(make_wav(&synth(s)))).collect();
            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, sfx: Sfx) {
            let Some(buf) = self.buffers.get(sfx as usize) else { return };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }

        pub fn play_events(&self, events: &[GameEvent]) {
            for sfx in events.iter().filter_map(Sfx::for_event) {
                self.play(sfx);
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveforms
    // ════════════════════════════════════════════════════════════

    #[derive(Clone, Copy)]
    enum Wave {
        Sine,
        Square,
        Triangle,
        Saw,
        /// Square with a 25% duty cycle.
        Pulse,
    }

    fn osc(wave: Wave, phase: f32) -> f32 {
        let p = phase.fract();
        match wave {
            Wave::Sine => (p * TAU).sin(),
            Wave::Square => if p < 0.5 { 1.0 } else { -1.0 },
            Wave::Pulse => if p < 0.25 { 1.0 } else { -1.0 },
            Wave::Triangle => 4.0 * (p - 0.5).abs() - 1.0,
            Wave::Saw => 2.0 * p - 1.0,
        }
    }

    /// A tone gliding from `f0` to `f1`, linear fade out.
    fn sweep(wave: Wave, f0: f32, f1: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut phase = 0.0;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                phase += (f0 + (f1 - f0) * t) / SAMPLE_RATE as f32;
                osc(wave, phase) * (1.0 - t) * volume
            })
            .collect()
    }

    fn tone(wave: Wave, freq: f32, duration: f32, volume: f32) -> Vec<f32> {
        sweep(wave, freq, freq, duration, volume)
    }

    /// Notes played together.
    fn chord(wave: Wave, freqs: &[f32], duration: f32, volume: f32) -> Vec<f32> {
        let per = volume / freqs.len().max(1) as f32;
        let mut out = vec![0.0; (SAMPLE_RATE as f32 * duration) as usize];
        for &f in freqs {
            for (acc, s) in out.iter_mut().zip(tone(wave, f, duration, per)) {
                *acc += s;
            }
        }
        out
    }

    fn noise(duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut rng: u32 = 0x2545_f491;
        (0..n)
            .map(|i| {
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let v = (rng >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0;
                v * (1.0 - i as f32 / n as f32) * volume
            })
            .collect()
    }

    fn synth(sfx: Sfx) -> Vec<f32> {
        match sfx {
            // C5 up to G5
            Sfx::Jump => sweep(Wave::Sine, 523.0, 784.0, 0.12, 0.3),
            // E6
            Sfx::Collect => {
                let mut s = tone(Wave::Triangle, 1319.0, 0.06, 0.35);
                s.extend(tone(Wave::Triangle, 1760.0, 0.08, 0.35));
                s
            }
            Sfx::ExitOpen => {
                let mut s = tone(Wave::Square, 784.0, 0.08, 0.15);
                s.extend(tone(Wave::Square, 1047.0, 0.15, 0.15));
                s
            }
            // G3
            Sfx::Stomp => sweep(Wave::Square, 196.0, 98.0, 0.1, 0.2),
            Sfx::Hit => noise(0.2, 0.3),
            Sfx::LevelComplete => {
                let mut s = Vec::new();
                for f in [523.0, 659.0, 784.0] {
                    s.extend(tone(Wave::Square, f, 0.09, 0.15));
                }
                s.extend(chord(Wave::Square, &[523.0, 659.0, 784.0], 0.35, 0.25));
                s
            }
            // A4
            Sfx::NextLevel => tone(Wave::Pulse, 440.0, 0.15, 0.15),
            // C3
            Sfx::GameOver => sweep(Wave::Saw, 131.0, 65.0, 0.8, 0.25),
            Sfx::Win => {
                let mut s = Vec::new();
                for f in [523.0, 659.0, 784.0, 1047.0] {
                    s.extend(tone(Wave::Triangle, f, 0.1, 0.3));
                }
                s.extend(chord(Wave::Triangle, &[523.0, 659.0, 784.0, 1047.0], 0.6, 0.35));
                s
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: 16-bit mono PCM
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let bits_per_sample: u16 = 16;
        let block_align: u16 = bits_per_sample / 8;
        let byte_rate = SAMPLE_RATE * block_align as u32;
        let data_size = samples.len() as u32 * block_align as u32;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&1u16.to_le_bytes()); // mono
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }

}

// ════════════════════════════════════════════════════════════
//  Public API: no-ops when the sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    #[cfg_attr(not(feature = "sound"), allow(dead_code))]
    pub fn play(&self, _sfx: Sfx) {}
    pub fn play_events(&self, _events: &[GameEvent]) {}
}
