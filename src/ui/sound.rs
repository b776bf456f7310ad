/// Quiz sound cues via rodio.
///
/// Every cue is a short note sequence rendered once at startup into an
/// in-memory WAV buffer. Playback is fire-and-forget on a detached Sink.
///
/// Build without the "sound" feature to get a silent stub with the same API.

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;

    /// One note of a cue: frequency in Hz (0 = rest) and length in seconds.
    type Note = (f32, f32);

    const CORRECT: &[Note] = &[(784.0, 0.06), (1047.0, 0.12)];
    const WRONG: &[Note] = &[(220.0, 0.10), (175.0, 0.18)];
    const TIMEOUT: &[Note] = &[(330.0, 0.08), (0.0, 0.04), (330.0, 0.08), (247.0, 0.20)];
    const TIER_UP: &[Note] = &[(523.0, 0.07), (659.0, 0.07), (784.0, 0.07), (1047.0, 0.20)];
    const GAME_OVER: &[Note] = &[(440.0, 0.14), (370.0, 0.14), (311.0, 0.14), (261.0, 0.35)];
    const QUESTION: &[Note] = &[(660.0, 0.04)];
    const COUNTDOWN: &[Note] = &[(1200.0, 0.05)];

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_correct: Arc<Vec<u8>>,
        sfx_wrong: Arc<Vec<u8>>,
        sfx_timeout: Arc<Vec<u8>>,
        sfx_tier_up: Arc<Vec<u8>>,
        sfx_game_over: Arc<Vec<u8>>,
        sfx_question: Arc<Vec<u8>>,
        sfx_countdown: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!("no audio output, sound disabled: {e}");
                    return None;
                }
            };
            let cue = |notes: &[Note], volume| Arc::new(make_wav(&render(notes, volume)));

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_correct: cue(CORRECT, 0.30),
                sfx_wrong: cue(WRONG, 0.30),
                sfx_timeout: cue(TIMEOUT, 0.30),
                sfx_tier_up: cue(TIER_UP, 0.28),
                sfx_game_over: cue(GAME_OVER, 0.30),
                sfx_question: cue(QUESTION, 0.15),
                sfx_countdown: cue(COUNTDOWN, 0.20),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }

        pub fn play_correct(&self) { self.play(&self.sfx_correct); }
        pub fn play_wrong(&self) { self.play(&self.sfx_wrong); }
        pub fn play_timeout(&self) { self.play(&self.sfx_timeout); }
        pub fn play_tier_up(&self) { self.play(&self.sfx_tier_up); }
        pub fn play_game_over(&self) { self.play(&self.sfx_game_over); }
        pub fn play_question(&self) { self.play(&self.sfx_question); }
        pub fn play_countdown(&self) { self.play(&self.sfx_countdown); }
    }

    // ════════════════════════════════════════════════════════════
    //  Synthesis
    // ════════════════════════════════════════════════════════════

    /// Render a note sequence as a square-ish wave (fundamental plus third
    /// harmonic) with a per-note decay.
    pub(super) fn render(notes: &[Note], volume: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &(freq, dur) in notes {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            for i in 0..n {
                if freq <= 0.0 {
                    samples.push(0.0);
                    continue;
                }
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.7);
                let phase = t * freq * 2.0 * std::f32::consts::PI;
                let wave = phase.sin() * 0.75 + (phase * 3.0).sin() * 0.25;
                samples.push(wave * env * volume);
            }
        }
        samples
    }

    /// Wrap mono f32 samples into a 16-bit PCM WAV buffer.
    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        let channels: u16 = 1;
        let bits: u16 = 16;
        let byte_rate = SAMPLE_RATE * channels as u32 * bits as u32 / 8;
        let block_align = channels * bits / 8;
        let data_size = samples.len() as u32 * 2;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let v = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }

}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_correct(&self) {}
    pub fn play_wrong(&self) {}
    pub fn play_timeout(&self) {}
    pub fn play_tier_up(&self) {}
    pub fn play_game_over(&self) {}
    pub fn play_question(&self) {}
    pub fn play_countdown(&self) {}
}
