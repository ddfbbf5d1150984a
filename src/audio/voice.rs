//! Audio backends: rodio output and the silent fallback
//!
//! The backend turns fetched WAV bytes into a live [`SpeechAudio`]. Rodio
//! does not report a playback position, so `RodioSpeech` keeps its own
//! wall-clock tally of time spent playing, the same way the rest of the
//! ecosystem handles sinks without position queries.

use std::io::Cursor;
use std::time::{Duration, Instant};

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tracing::debug;

use super::clock::SpeechAudio;
use super::wav::wav_duration;
use super::{PlaybackError, PlaybackResult};

/// Owner of the process-wide audio output stream
///
/// The stream itself is not `Send`; keep this on the thread that created it
/// and hand clones of the handle to whoever opens voices.
pub struct AudioOutput {
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl AudioOutput {
    /// Open the default output device
    pub fn open() -> PlaybackResult<Self> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| PlaybackError::NoDevice(e.to_string()))?;
        Ok(Self {
            _stream: stream,
            handle,
        })
    }

    /// A shareable handle to the output mixer
    pub fn handle(&self) -> OutputStreamHandle {
        self.handle.clone()
    }
}

/// Factory turning WAV bytes into playable speech audio
pub trait AudioBackend: Send + Sync {
    /// Open an utterance's audio, paused at position zero
    fn open(&self, wav: Vec<u8>, volume: f32) -> PlaybackResult<Box<dyn SpeechAudio>>;
}

/// Backend playing through a rodio output stream
pub struct RodioBackend {
    handle: OutputStreamHandle,
}

impl RodioBackend {
    /// Create a backend from an output handle
    pub fn new(handle: OutputStreamHandle) -> Self {
        Self { handle }
    }
}

impl AudioBackend for RodioBackend {
    fn open(&self, wav: Vec<u8>, volume: f32) -> PlaybackResult<Box<dyn SpeechAudio>> {
        RodioSpeech::open(&self.handle, wav, volume)
            .map(|speech| Box::new(speech) as Box<dyn SpeechAudio>)
    }
}

/// One utterance's audio on a rodio sink
pub struct RodioSpeech {
    sink: Sink,
    duration: f32,
    started: Option<Instant>,
    accumulated: Duration,
}

impl RodioSpeech {
    /// Decode WAV bytes onto a fresh, paused sink
    pub fn open(
        handle: &OutputStreamHandle,
        wav: Vec<u8>,
        volume: f32,
    ) -> PlaybackResult<Self> {
        let header_duration = wav_duration(&wav);
        let decoder =
            Decoder::new(Cursor::new(wav)).map_err(|e| PlaybackError::Decode(e.to_string()))?;
        let duration = header_duration
            .or_else(|| decoder.total_duration().map(|d| d.as_secs_f32()))
            .unwrap_or(0.0);

        let sink = Sink::try_new(handle).map_err(|e| PlaybackError::Output(e.to_string()))?;
        sink.pause();
        sink.set_volume(volume.clamp(0.0, 1.0));
        sink.append(decoder);

        debug!(duration, "opened speech audio");
        Ok(Self {
            sink,
            duration,
            started: None,
            accumulated: Duration::ZERO,
        })
    }

    /// Total length of the asset in seconds
    pub fn duration(&self) -> f32 {
        self.duration
    }
}

impl SpeechAudio for RodioSpeech {
    fn play(&mut self) -> PlaybackResult<()> {
        self.sink.play();
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(started) = self.started.take() {
            self.accumulated += started.elapsed();
        }
        self.sink.pause();
    }

    fn rewind(&mut self) {
        self.sink.stop();
        self.started = None;
        self.accumulated = Duration::ZERO;
    }

    fn position(&self) -> f32 {
        let mut elapsed = self.accumulated;
        if let Some(started) = self.started {
            elapsed += started.elapsed();
        }
        let position = elapsed.as_secs_f32();
        if self.duration > 0.0 {
            position.min(self.duration)
        } else {
            position
        }
    }

    fn is_ended(&self) -> bool {
        self.sink.empty()
    }
}

/// Silent speech audio driven by the wall clock
///
/// Used when no output device is available: the mouth still animates on the
/// cue timeline, nothing is heard.
pub struct NullSpeech {
    duration: f32,
    started: Option<Instant>,
    accumulated: Duration,
}

impl NullSpeech {
    /// Create silent audio of a known duration
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            started: None,
            accumulated: Duration::ZERO,
        }
    }
}

impl SpeechAudio for NullSpeech {
    fn play(&mut self) -> PlaybackResult<()> {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(started) = self.started.take() {
            self.accumulated += started.elapsed();
        }
    }

    fn rewind(&mut self) {
        self.started = None;
        self.accumulated = Duration::ZERO;
    }

    fn position(&self) -> f32 {
        let mut elapsed = self.accumulated;
        if let Some(started) = self.started {
            elapsed += started.elapsed();
        }
        elapsed.as_secs_f32().min(self.duration)
    }

    fn is_ended(&self) -> bool {
        let mut elapsed = self.accumulated;
        if let Some(started) = self.started {
            elapsed += started.elapsed();
        }
        elapsed.as_secs_f32() >= self.duration
    }
}

/// Backend producing silent audio sized from the WAV header
pub struct NullBackend;

impl AudioBackend for NullBackend {
    fn open(&self, wav: Vec<u8>, _volume: f32) -> PlaybackResult<Box<dyn SpeechAudio>> {
        let duration = wav_duration(&wav).unwrap_or(0.0);
        Ok(Box::new(NullSpeech::new(duration)))
    }
}
