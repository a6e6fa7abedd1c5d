//! Synthesized audio feedback.
//!
//! Every named sound is a fixed-frequency sine tone rendered to PCM; named
//! patterns are short sequences of sounds at fixed offsets. Rendered tones
//! go to an [`AudioSink`]: normally [`CpalSink`] on the default output
//! device, which mixes every scheduled tone into one stream. With no sink
//! attached, playback is a no-op.

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::events::Event;
use crate::storage::AudioConfig;

/// Peak amplitude at full volume.
const MAX_GAIN: f32 = 0.3;
/// Length of the linear fade at the end of each tone.
const FADE_MS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sound {
    Beep,
    Tick,
    Complete,
    Warning,
    Start,
    Explosion,
    Chime,
}

impl Sound {
    pub const ALL: [Sound; 7] = [
        Sound::Beep,
        Sound::Tick,
        Sound::Complete,
        Sound::Warning,
        Sound::Start,
        Sound::Explosion,
        Sound::Chime,
    ];

    pub fn tone(&self) -> Tone {
        let (frequency_hz, duration_ms) = match self {
            Sound::Beep => (800.0, 200),
            Sound::Tick => (1000.0, 50),
            Sound::Complete => (880.0, 500),
            Sound::Warning => (440.0, 300),
            Sound::Start => (660.0, 150),
            Sound::Explosion => (110.0, 800),
            Sound::Chime => (528.0, 1000),
        };
        Tone {
            frequency_hz,
            duration_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    Completion,
    PhaseChange,
    Countdown,
    Alarm,
}

impl Pattern {
    /// `(offset_ms, sound)` pairs, in play order.
    pub fn steps(&self) -> Vec<(u64, Sound)> {
        match self {
            Pattern::Completion => vec![
                (0, Sound::Complete),
                (600, Sound::Complete),
                (1200, Sound::Complete),
            ],
            Pattern::PhaseChange => vec![(0, Sound::Beep), (300, Sound::Beep)],
            Pattern::Countdown => vec![(0, Sound::Tick), (1000, Sound::Tick), (2000, Sound::Tick)],
            Pattern::Alarm => (0..4).map(|i| (i * 400, Sound::Warning)).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency_hz: f32,
    pub duration_ms: u32,
}

/// Render a sine tone as mono `f32` samples with a linear fade-out.
pub fn render_tone(tone: Tone, sample_rate: u32, gain: f32) -> Vec<f32> {
    let total = (u64::from(sample_rate) * u64::from(tone.duration_ms) / 1000) as usize;
    let fade = ((u64::from(sample_rate) * u64::from(FADE_MS) / 1000) as usize).min(total);
    let step = std::f32::consts::TAU * tone.frequency_hz / sample_rate as f32;

    (0..total)
        .map(|i| {
            let envelope = if i + fade >= total && fade > 0 {
                (total - i) as f32 / fade as f32
            } else {
                1.0
            };
            (step * i as f32).sin() * gain * envelope
        })
        .collect()
}

/// Output device for rendered tones.
pub trait AudioSink: Send {
    /// Play `samples` for `sound` after `offset_ms`. Must not block for the
    /// length of the offset.
    fn play(&mut self, offset_ms: u64, sound: Sound, samples: &[f32]) -> std::io::Result<()>;
}

/// Rings the terminal bell once per tone. Fallback for hosts without an
/// output device; the samples themselves are not played.
#[derive(Debug, Default)]
pub struct TerminalBell;

fn ring() -> std::io::Result<()> {
    let mut err = std::io::stderr();
    err.write_all(b"\x07")?;
    err.flush()
}

impl AudioSink for TerminalBell {
    fn play(&mut self, offset_ms: u64, _sound: Sound, _samples: &[f32]) -> std::io::Result<()> {
        if offset_ms == 0 {
            return ring();
        }
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(offset_ms));
            if let Err(e) = ring() {
                debug!("terminal bell failed: {e}");
            }
        });
        Ok(())
    }
}

/// One tone handed to a [`BufferSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct Played {
    pub offset_ms: u64,
    pub sound: Sound,
    pub samples: Vec<f32>,
}

/// Collects played tones in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct BufferSink {
    played: Arc<Mutex<Vec<Played>>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<Played> {
        self.played.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn sounds(&self) -> Vec<(u64, Sound)> {
        self.played()
            .into_iter()
            .map(|p| (p.offset_ms, p.sound))
            .collect()
    }
}

impl AudioSink for BufferSink {
    fn play(&mut self, offset_ms: u64, sound: Sound, samples: &[f32]) -> std::io::Result<()> {
        let mut played = self
            .played
            .lock()
            .map_err(|_| std::io::Error::other("buffer sink poisoned"))?;
        played.push(Played {
            offset_ms,
            sound,
            samples: samples.to_vec(),
        });
        Ok(())
    }
}

/// Tones waiting to be played, mixed into one mono signal.
///
/// Offsets are counted in frames from the next [`Mixer::fill`], so every
/// tone of a pattern keeps its spacing however late the stream asks.
#[derive(Debug, Default)]
pub struct Mixer {
    voices: Vec<Voice>,
}

#[derive(Debug)]
struct Voice {
    delay: usize,
    samples: Vec<f32>,
    pos: usize,
}

impl Mixer {
    pub fn schedule(&mut self, delay_frames: usize, samples: Vec<f32>) {
        if samples.is_empty() {
            return;
        }
        self.voices.push(Voice {
            delay: delay_frames,
            samples,
            pos: 0,
        });
    }

    pub fn is_idle(&self) -> bool {
        self.voices.is_empty()
    }

    /// Fill an interleaved buffer, writing each mixed frame to every
    /// channel. Silence where nothing is scheduled.
    pub fn fill(&mut self, out: &mut [f32], channels: usize) {
        for frame in out.chunks_mut(channels.max(1)) {
            let mut value = 0.0;
            for voice in &mut self.voices {
                if voice.delay > 0 {
                    voice.delay -= 1;
                } else if let Some(sample) = voice.samples.get(voice.pos) {
                    value += sample;
                    voice.pos += 1;
                }
            }
            frame.fill(value.clamp(-1.0, 1.0));
        }
        self.voices.retain(|v| v.pos < v.samples.len());
    }
}

/// Schedules tones on a shared [`Mixer`]. Clones share the mixer; whoever
/// owns the output stream drains it.
#[derive(Debug, Clone)]
pub struct MixerSink {
    mixer: Arc<Mutex<Mixer>>,
    sample_rate: u32,
}

impl MixerSink {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            mixer: Arc::default(),
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn mixer(&self) -> Arc<Mutex<Mixer>> {
        Arc::clone(&self.mixer)
    }
}

impl AudioSink for MixerSink {
    fn play(&mut self, offset_ms: u64, _sound: Sound, samples: &[f32]) -> std::io::Result<()> {
        let delay = u64::from(self.sample_rate).saturating_mul(offset_ms) / 1000;
        self.mixer
            .lock()
            .map_err(|_| std::io::Error::other("audio mixer poisoned"))?
            .schedule(delay as usize, samples.to_vec());
        Ok(())
    }
}

#[cfg(feature = "device-audio")]
pub use device::{AudioOutputError, CpalSink};

#[cfg(feature = "device-audio")]
mod device {
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};

    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{
        BuildStreamError, DefaultStreamConfigError, FromSample, PlayStreamError, Sample,
        SampleFormat, SizedSample, Stream, StreamConfig,
    };
    use thiserror::Error;
    use tracing::{debug, error, info};

    use super::{AudioSink, Mixer, MixerSink, Sound};

    #[derive(Debug, Error)]
    pub enum AudioOutputError {
        #[error("no default output device")]
        NoDefaultDevice,
        #[error("error getting default device config: {0}")]
        OutputDeviceConfig(#[from] DefaultStreamConfigError),
        #[error("error opening output stream: {0}")]
        OpenStream(#[from] BuildStreamError),
        #[error("error starting stream: {0}")]
        StartStream(#[from] PlayStreamError),
        #[error("unsupported sample format: {0}")]
        UnsupportedFormat(String),
        #[error("audio thread unavailable: {0}")]
        Thread(String),
    }

    /// Plays tones on the default output device.
    ///
    /// The cpal stream lives on its own thread for as long as the sink
    /// exists; dropping the sink closes it.
    pub struct CpalSink {
        inner: MixerSink,
        _shutdown: mpsc::Sender<()>,
    }

    impl CpalSink {
        /// Open the default output device and start a stream on it.
        pub fn open() -> Result<Self, AudioOutputError> {
            let (ready_tx, ready_rx) = mpsc::channel();
            let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

            std::thread::Builder::new()
                .name("timekeep-audio".into())
                .spawn(move || match start_stream() {
                    Ok((stream, sink)) => {
                        let _ = ready_tx.send(Ok(sink));
                        // Returns once the sink (and its sender) is dropped.
                        let _ = shutdown_rx.recv();
                        drop(stream);
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                    }
                })
                .map_err(|e| AudioOutputError::Thread(e.to_string()))?;

            let inner = ready_rx
                .recv()
                .map_err(|e| AudioOutputError::Thread(e.to_string()))??;
            info!(sample_rate = inner.sample_rate(), "audio output opened");
            Ok(Self {
                inner,
                _shutdown: shutdown_tx,
            })
        }

        pub fn sample_rate(&self) -> u32 {
            self.inner.sample_rate()
        }
    }

    impl AudioSink for CpalSink {
        fn play(&mut self, offset_ms: u64, sound: Sound, samples: &[f32]) -> std::io::Result<()> {
            debug!(?sound, offset_ms, "queue tone");
            self.inner.play(offset_ms, sound, samples)
        }
    }

    fn start_stream() -> Result<(Stream, MixerSink), AudioOutputError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioOutputError::NoDefaultDevice)?;
        let supported = device.default_output_config()?;
        let format = supported.sample_format();
        let config: StreamConfig = supported.config();
        let sink = MixerSink::new(config.sample_rate.0);
        let mixer = sink.mixer();

        let stream = match format {
            SampleFormat::F32 => build::<f32>(&device, &config, mixer)?,
            SampleFormat::I16 => build::<i16>(&device, &config, mixer)?,
            SampleFormat::U16 => build::<u16>(&device, &config, mixer)?,
            SampleFormat::I32 => build::<i32>(&device, &config, mixer)?,
            other => return Err(AudioOutputError::UnsupportedFormat(format!("{other:?}"))),
        };
        stream.play()?;
        Ok((stream, sink))
    }

    fn build<T>(
        device: &cpal::Device,
        config: &StreamConfig,
        mixer: Arc<Mutex<Mixer>>,
    ) -> Result<Stream, AudioOutputError>
    where
        T: SizedSample + FromSample<f32>,
    {
        let channels = usize::from(config.channels);
        let mut scratch: Vec<f32> = Vec::new();
        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                scratch.clear();
                scratch.resize(data.len(), 0.0);
                if let Ok(mut mixer) = mixer.lock() {
                    mixer.fill(&mut scratch, channels);
                }
                for (out, sample) in data.iter_mut().zip(&scratch) {
                    *out = T::from_sample(*sample);
                }
            },
            move |err| error!("audio output error: {err}"),
            None,
        )?;
        Ok(stream)
    }
}

pub struct AudioEngine {
    sink: Option<Box<dyn AudioSink>>,
    sample_rate: u32,
    volume: u8,
    enabled: bool,
}

impl AudioEngine {
    pub fn new(sink: Box<dyn AudioSink>, sample_rate: u32) -> Self {
        Self {
            sink: Some(sink),
            sample_rate,
            volume: 70,
            enabled: true,
        }
    }

    /// The default output device, else the terminal bell when
    /// `terminal_bell` is set, else silence.
    pub fn from_config(config: &AudioConfig) -> Self {
        #[cfg(feature = "device-audio")]
        if config.device {
            match CpalSink::open() {
                Ok(sink) => {
                    let sample_rate = sink.sample_rate();
                    return Self::new(Box::new(sink), sample_rate);
                }
                Err(e) => debug!("audio context unavailable: {e}"),
            }
        }
        if config.terminal_bell {
            Self::new(Box::new(TerminalBell), config.sample_rate)
        } else {
            Self::silent()
        }
    }

    /// An engine with no output device.
    pub fn silent() -> Self {
        Self {
            sink: None,
            sample_rate: 44_100,
            volume: 70,
            enabled: true,
        }
    }

    pub fn has_output(&self) -> bool {
        self.sink.is_some()
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// Volume in percent, clamped to 100.
    pub fn set_volume(&mut self, volume: u8) {
        self.volume = volume.min(100);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn gain(&self) -> f32 {
        MAX_GAIN * f32::from(self.volume) / 100.0
    }

    fn play_at(&mut self, offset_ms: u64, sound: Sound) {
        if !self.enabled {
            return;
        }
        let gain = self.gain();
        let sample_rate = self.sample_rate;
        let Some(sink) = self.sink.as_mut() else {
            debug!(?sound, "no audio output, skipping");
            return;
        };
        let samples = render_tone(sound.tone(), sample_rate, gain);
        if let Err(e) = sink.play(offset_ms, sound, &samples) {
            warn!(?sound, "audio playback failed: {e}");
        }
    }

    pub fn play_sound(&mut self, sound: Sound) {
        self.play_at(0, sound);
    }

    pub fn play_pattern(&mut self, pattern: Pattern) {
        for (offset_ms, sound) in pattern.steps() {
            self.play_at(offset_ms, sound);
        }
    }

    /// Sound cue for an engine event.
    pub fn cue_for(event: &Event) -> Option<Cue> {
        match event {
            Event::TimerStarted { .. } => Some(Cue::Sound(Sound::Start)),
            Event::TimerCompleted { kind, .. } if *kind != crate::timer::TimerKind::Bomb => {
                Some(Cue::Pattern(Pattern::Completion))
            }
            Event::BombExploded { .. } => Some(Cue::Sound(Sound::Explosion)),
            Event::BombDefused { .. } => Some(Cue::Sound(Sound::Chime)),
            Event::PhaseChanged { .. } | Event::PomodoroSessionCompleted { .. } => {
                Some(Cue::Pattern(Pattern::PhaseChange))
            }
            Event::SegmentCompleted { .. } => Some(Cue::Sound(Sound::Chime)),
            Event::PeriodEnded { .. } => Some(Cue::Pattern(Pattern::Alarm)),
            Event::LapRecorded { .. } => Some(Cue::Sound(Sound::Tick)),
            _ => None,
        }
    }

    pub fn play(&mut self, cue: Cue) {
        match cue {
            Cue::Sound(sound) => self.play_sound(sound),
            Cue::Pattern(pattern) => self.play_pattern(pattern),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Sound(Sound),
    Pattern(Pattern),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::TimerKind;
    use chrono::Utc;

    #[test]
    fn tone_length_and_fade() {
        let samples = render_tone(Sound::Beep.tone(), 44_100, 0.3);
        assert_eq!(samples.len(), 8820);
        assert!(samples.iter().all(|s| s.abs() <= 0.3 + f32::EPSILON));
        let last = *samples.last().unwrap();
        assert!(last.abs() < 0.001);
    }

    #[test]
    fn patterns_play_at_fixed_offsets() {
        let sink = BufferSink::new();
        let mut audio = AudioEngine::new(Box::new(sink.clone()), 8_000);
        audio.play_pattern(Pattern::Completion);
        assert_eq!(
            sink.sounds(),
            vec![
                (0, Sound::Complete),
                (600, Sound::Complete),
                (1200, Sound::Complete)
            ]
        );
        assert_eq!(
            Pattern::Alarm.steps(),
            vec![
                (0, Sound::Warning),
                (400, Sound::Warning),
                (800, Sound::Warning),
                (1200, Sound::Warning)
            ]
        );
    }

    #[test]
    fn volume_scales_amplitude() {
        let sink = BufferSink::new();
        let mut audio = AudioEngine::new(Box::new(sink.clone()), 8_000);
        audio.set_volume(250);
        assert_eq!(audio.volume(), 100);
        audio.set_volume(0);
        audio.play_sound(Sound::Tick);
        assert!(sink.played()[0].samples.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn disabled_or_missing_output_is_silent() {
        let sink = BufferSink::new();
        let mut audio = AudioEngine::new(Box::new(sink.clone()), 8_000);
        audio.set_enabled(false);
        audio.play_sound(Sound::Beep);
        assert!(sink.played().is_empty());

        let mut silent = AudioEngine::silent();
        assert!(!silent.has_output());
        silent.play_pattern(Pattern::Alarm);
    }

    #[test]
    fn bomb_completion_uses_explosion_only() {
        let completed = Event::TimerCompleted {
            kind: TimerKind::Bomb,
            at: Utc::now(),
        };
        assert_eq!(AudioEngine::cue_for(&completed), None);
        let exploded = Event::BombExploded { at: Utc::now() };
        assert_eq!(
            AudioEngine::cue_for(&exploded),
            Some(Cue::Sound(Sound::Explosion))
        );
    }

    #[test]
    fn mixer_plays_rendered_tones_at_their_offsets() {
        let sink = MixerSink::new(1_000);
        let mixer = sink.mixer();
        let mut audio = AudioEngine::new(Box::new(sink), 1_000);
        audio.set_volume(100);
        audio.play_pattern(Pattern::PhaseChange);

        // Two beeps of 200 frames at frames 0 and 300, on two channels.
        let mut out = vec![0.0f32; 2 * 600];
        mixer.lock().unwrap().fill(&mut out, 2);
        let frames: Vec<f32> = out.chunks(2).map(|f| f[0]).collect();
        assert!(out.chunks(2).all(|f| f[0] == f[1]));

        let expected = render_tone(Sound::Beep.tone(), 1_000, MAX_GAIN * 100.0 / 100.0);
        assert_eq!(&frames[..200], &expected[..]);
        assert!(frames[200..300].iter().all(|s| *s == 0.0));
        assert_eq!(&frames[300..500], &expected[..]);
        assert!(mixer.lock().unwrap().is_idle());
    }

    #[test]
    fn mixer_sums_and_clamps_overlapping_tones() {
        let mut mixer = Mixer::default();
        mixer.schedule(0, vec![0.8; 4]);
        mixer.schedule(2, vec![0.8; 4]);
        let mut out = vec![0.0f32; 8];
        mixer.fill(&mut out, 1);
        assert_eq!(out, vec![0.8, 0.8, 1.0, 1.0, 0.8, 0.8, 0.0, 0.0]);
        assert!(mixer.is_idle());
    }

    #[test]
    fn config_without_outputs_is_silent() {
        let config = AudioConfig {
            device: false,
            terminal_bell: false,
            ..AudioConfig::default()
        };
        assert!(!AudioEngine::from_config(&config).has_output());
    }
}
