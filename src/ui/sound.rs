/// Sound engine: procedural 8-bit style music and cues via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Cues are fire-and-forget (non-blocking) via rodio's Sink; the background
/// loop lives in its own sink, created paused and started on the first
/// `start_music()` call.
///
/// Compile with `--no-default-features` or without "sound" feature
/// to disable audio entirely (the stub SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

    use crate::config::AudioConfig;

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = std::f32::consts::PI * 2.0;

    /// Pre-generated WAV buffers for each cue, plus the music sink.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        volume: f32,
        music: Sink,
        sfx_jump: Arc<Vec<u8>>,
        sfx_die: Arc<Vec<u8>>,
        sfx_win: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new(cfg: &AudioConfig) -> Option<Self> {
            if !cfg.enabled {
                return None;
            }
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("audio device unavailable: {e}");
                    return None;
                }
            };

            let music = Sink::try_new(&handle).ok()?;
            music.pause();
            music.set_volume(cfg.volume);
            let loop_src = rodio::Decoder::new(Cursor::new(make_wav(&gen_music()))).ok()?;
            music.append(loop_src.repeat_infinite());

            Some(SoundEngine {
                _stream: stream,
                handle,
                volume: cfg.volume,
                music,
                sfx_jump: Arc::new(make_wav(&gen_jump())),
                sfx_die: Arc::new(make_wav(&gen_die())),
                sfx_win: Arc::new(make_wav(&gen_win())),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.set_volume(self.volume);
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        /// Start the background loop. Later calls do nothing.
        pub fn start_music(&self) {
            if self.music.is_paused() {
                self.music.play();
            }
        }

        pub fn play_jump(&self) { self.play(&self.sfx_jump); }
        pub fn play_die(&self) { self.play(&self.sfx_die); }
        pub fn play_win(&self) { self.play(&self.sfx_win); }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators — all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    /// Square-ish tone (sine + 3rd harmonic) for retro feel.
    fn retro(t: f32, freq: f32) -> f32 {
        (t * freq * TAU).sin() * 0.7 + (t * freq * 3.0 * TAU).sin() * 0.3
    }

    /// Append one note, `freq == 0` is a rest.
    fn push_note(samples: &mut Vec<f32>, freq: f32, duration: f32, volume: f32) {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32).powf(2.0);
            let wave = if freq > 0.0 { retro(t, freq) } else { 0.0 };
            samples.push(wave * env * volume);
        }
    }

    /// Background loop: two bars of a minor arpeggio over a bass line.
    /// Loops seamlessly since every note ends at zero amplitude.
    fn gen_music() -> Vec<f32> {
        const STEP: f32 = 0.15;
        let melody = [
            440.0_f32, 523.0, 659.0, 523.0, 440.0, 523.0, 659.0, 784.0,
            349.0, 440.0, 523.0, 440.0, 392.0, 494.0, 587.0, 0.0,
        ];
        let bass = [110.0_f32, 110.0, 87.0, 98.0];
        let mut lead = Vec::new();
        for &f in &melody {
            push_note(&mut lead, f, STEP, 0.18);
        }
        let mut low = Vec::new();
        for &f in &bass {
            push_note(&mut low, f, STEP * 4.0, 0.22);
        }
        lead.iter()
            .zip(low.iter().chain(std::iter::repeat(&0.0)))
            .map(|(a, b)| a + b)
            .collect()
    }

    /// Jump: quick upward chirp
    fn gen_jump() -> Vec<f32> {
        let duration = 0.08;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 300.0 + t * 500.0; // 300Hz → 800Hz
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - t).powf(0.6);
                (ti * freq * TAU).sin() * env * 0.2
            })
            .collect()
    }

    /// Death: short noise burst over a descending tone
    fn gen_die() -> Vec<f32> {
        let duration = 0.35;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut rng: u32 = 12345;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 440.0 - t * 300.0; // descending
                let ti = i as f32 / SAMPLE_RATE as f32;
                let tone = (ti * freq * TAU).sin();
                // Simple LCG noise
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let env = (1.0 - t).powf(0.8);
                (tone * 0.6 + noise * 0.4) * env * 0.3
            })
            .collect()
    }

    /// Goal reached: ascending fanfare C5→E5→G5→C6 with a held top note
    fn gen_win() -> Vec<f32> {
        let notes = [523.0_f32, 659.0, 784.0];
        let mut samples = Vec::new();
        for &freq in &notes {
            push_note(&mut samples, freq, 0.1, 0.3);
        }
        push_note(&mut samples, 1047.0, 0.35, 0.3);
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder — wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        // RIFF header
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        // fmt chunk
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM format
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
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
//  Public API — compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new(_cfg: &crate::config::AudioConfig) -> Option<Self> { Some(SoundEngine) }
    pub fn start_music(&self) {}
    pub fn play_jump(&self) {}
    pub fn play_die(&self) {}
    pub fn play_win(&self) {}
}
