/// Sound engine: short procedural UI cues via rodio.
///
/// Every cue is rendered once into an in-memory WAV buffer at init time and
/// played fire-and-forget through a detached Sink.
///
/// Build without the "sound" feature (or set `[audio] enabled = false`) to
/// get the silent stub.

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_open: Arc<Vec<u8>>,
        sfx_close: Arc<Vec<u8>>,
        sfx_nav: Arc<Vec<u8>>,
        sfx_coin: Arc<Vec<u8>>,
        sfx_unlock: Arc<Vec<u8>>,
        sfx_deny: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("no audio output: {}", e);
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_open: Arc::new(make_wav(&gen_sweep(440.0, 880.0, 0.08))),
                sfx_close: Arc::new(make_wav(&gen_sweep(880.0, 440.0, 0.08))),
                sfx_nav: Arc::new(make_wav(&gen_blip(660.0, 0.035, 0.2))),
                sfx_coin: Arc::new(make_wav(&gen_arpeggio(&[988.0, 1319.0], 0.06))),
                sfx_unlock: Arc::new(make_wav(&gen_arpeggio(&[523.0, 659.0, 784.0, 1047.0], 0.09))),
                sfx_deny: Arc::new(make_wav(&gen_buzz(150.0, 0.14))),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_open(&self) { self.play(&self.sfx_open); }
        pub fn play_close(&self) { self.play(&self.sfx_close); }
        pub fn play_nav(&self) { self.play(&self.sfx_nav); }
        pub fn play_coin(&self) { self.play(&self.sfx_coin); }
        pub fn play_unlock(&self) { self.play(&self.sfx_unlock); }
        pub fn play_deny(&self) { self.play(&self.sfx_deny); }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators — all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    fn sample_count(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Sine blip with a linear fade out.
    fn gen_blip(freq: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = sample_count(duration);
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - i as f32 / n as f32;
                (t * freq * TAU).sin() * env * volume
            })
            .collect()
    }

    /// Glide between two pitches (menu open rises, close falls).
    fn gen_sweep(from: f32, to: f32, duration: f32) -> Vec<f32> {
        let n = sample_count(duration);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                let freq = from + (to - from) * p;
                phase += freq / SAMPLE_RATE as f32;
                (phase * TAU).sin() * (1.0 - p).powf(0.7) * 0.25
            })
            .collect()
    }

    /// Rising notes with a touch of 2nd harmonic; the last one rings longer.
    fn gen_arpeggio(notes: &[f32], note_dur: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for (k, &freq) in notes.iter().enumerate() {
            let dur = if k + 1 == notes.len() { note_dur * 2.5 } else { note_dur };
            let n = sample_count(dur);
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = (t * freq * TAU).sin() * 0.75 + (t * freq * 2.0 * TAU).sin() * 0.25;
                samples.push(wave * env * 0.28);
            }
        }
        samples
    }

    /// Low square-ish buzz for a refused action.
    fn gen_buzz(freq: f32, duration: f32) -> Vec<f32> {
        let n = sample_count(duration);
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let s = (t * freq * TAU).sin();
                let square = if s >= 0.0 { 1.0 } else { -1.0 };
                square * (1.0 - i as f32 / n as f32) * 0.15
            })
            .collect()
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder — 16-bit PCM mono
    // ════════════════════════════════════════════════════════════

    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
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
//  Public API — compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_open(&self) {}
    pub fn play_close(&self) {}
    pub fn play_nav(&self) {}
    pub fn play_coin(&self) {}
    pub fn play_unlock(&self) {}
    pub fn play_deny(&self) {}
}
