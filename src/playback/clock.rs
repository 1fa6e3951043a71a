use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{
    DEFAULT_PLAYBACK_RATE, PlaybackState, TrackRole, Transport, TransportError, TransportFactory,
    WaveformOptions, clamp_rate, clamp_width,
};

type ProgressListener = Box<dyn FnMut(TrackRole, f64) + Send>;

/// In-process transport modelling a media element: it buffers, plays at a
/// rate, and advances only when driven by `advance`.
pub struct ClockTransport {
    role: TrackRole,
    audio_url: String,
    width_px: u32,
    position: f64,
    duration: f64,
    rate: f64,
    playing: bool,
    buffered: bool,
    destroyed: bool,
    destroyed_count: Arc<AtomicUsize>,
    on_progress: Option<ProgressListener>,
}

impl ClockTransport {
    pub fn audio_url(&self) -> &str {
        &self.audio_url
    }

    pub fn width(&self) -> u32 {
        self.width_px
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Mark media as buffered or not (not-ready transports refuse to play).
    pub fn set_buffered(&mut self, buffered: bool) {
        self.buffered = buffered;
    }

    /// Register a listener for playback-progress events.
    pub fn on_progress(&mut self, listener: impl FnMut(TrackRole, f64) + Send + 'static) {
        self.on_progress = Some(Box::new(listener));
    }

    /// Advance wall-clock time by `dt` seconds. Position moves by
    /// `dt * rate` while playing and stops at the end of the media.
    /// Emits a progress event and returns the new position.
    pub fn advance(&mut self, dt: f64) -> f64 {
        if self.playing && !self.destroyed {
            self.position = (self.position + dt * self.rate).min(self.duration);
            if self.position >= self.duration {
                self.playing = false;
            }
            if let Some(listener) = self.on_progress.as_mut() {
                listener(self.role, self.position);
            }
        }
        self.position
    }
}

impl Transport for ClockTransport {
    fn role(&self) -> TrackRole {
        self.role
    }

    fn is_ready(&self) -> bool {
        self.buffered && !self.destroyed
    }

    fn toggle_play(&mut self) -> Result<(), TransportError> {
        if self.destroyed {
            return Err(TransportError::Destroyed(self.role));
        }
        if !self.buffered {
            return Err(TransportError::NotReady(self.role));
        }
        if !self.playing && self.position >= self.duration {
            // Replay from the start once finished
            self.position = 0.0;
        }
        self.playing = !self.playing;
        Ok(())
    }

    fn seek(&mut self, seconds: f64) {
        self.position = seconds.clamp(0.0, self.duration);
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.rate = clamp_rate(rate);
    }

    fn set_width(&mut self, px: u32) {
        self.width_px = clamp_width(px);
    }

    fn current_time(&self) -> f64 {
        self.position
    }

    fn state(&self) -> PlaybackState {
        PlaybackState {
            is_playing: self.playing,
            position_seconds: self.position,
            duration_seconds: self.duration,
            playback_rate: self.rate,
        }
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.playing = false;
        self.on_progress = None;
        self.destroyed_count.fetch_add(1, Ordering::SeqCst);
        log::debug!("Destroyed {} transport for {}", self.role, self.audio_url);
    }
}

/// Creates `ClockTransport`s of a fixed media duration, already buffered.
pub struct ClockFactory {
    duration: f64,
    destroyed_count: Arc<AtomicUsize>,
}

impl ClockFactory {
    /// Non-finite or negative durations become zero-length media.
    pub fn new(duration: f64) -> Self {
        let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        Self {
            duration,
            destroyed_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared count of transports this factory created that were destroyed.
    pub fn destroyed_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.destroyed_count)
    }
}

impl TransportFactory for ClockFactory {
    type Transport = ClockTransport;

    fn create(
        &mut self,
        role: TrackRole,
        audio_url: &str,
        options: &WaveformOptions,
    ) -> Result<ClockTransport, TransportError> {
        if audio_url.trim().is_empty() {
            return Err(TransportError::Load {
                url: audio_url.to_string(),
                reason: format!("no audio URL for {role} track"),
            });
        }

        Ok(ClockTransport {
            role,
            audio_url: audio_url.to_string(),
            width_px: clamp_width(options.width_px),
            position: 0.0,
            duration: self.duration,
            rate: DEFAULT_PLAYBACK_RATE,
            playing: false,
            buffered: true,
            destroyed: false,
            destroyed_count: Arc::clone(&self.destroyed_count),
            on_progress: None,
        })
    }
}
