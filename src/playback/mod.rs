pub mod clock;

use std::fmt;

use thiserror::Error;

pub use clock::{ClockFactory, ClockTransport};

/// Waveform width bounds in pixels.
pub const MIN_WAVEFORM_WIDTH: u32 = 300;
pub const MAX_WAVEFORM_WIDTH: u32 = 900;
pub const DEFAULT_WAVEFORM_WIDTH: u32 = 600;

/// Playback rate bounds.
pub const MIN_PLAYBACK_RATE: f64 = 0.5;
pub const MAX_PLAYBACK_RATE: f64 = 2.0;
pub const DEFAULT_PLAYBACK_RATE: f64 = 1.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("{0} track is not ready (still buffering)")]
    NotReady(TrackRole),
    #[error("{0} track has been destroyed")]
    Destroyed(TrackRole),
    #[error("Failed to load {url}: {reason}")]
    Load { url: String, reason: String },
}

/// Which of the two recordings a transport plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackRole {
    User,
    Reference,
}

impl fmt::Display for TrackRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Reference => write!(f, "reference"),
        }
    }
}

/// Per-transport playback state. The transport is authoritative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub position_seconds: f64,
    pub duration_seconds: f64,
    pub playback_rate: f64,
}

/// Visual options a transport is created with.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformOptions {
    pub width_px: u32,
    pub height_px: u32,
    pub wave_color: String,
    pub progress_color: String,
}

impl Default for WaveformOptions {
    fn default() -> Self {
        Self {
            width_px: DEFAULT_WAVEFORM_WIDTH,
            height_px: 80,
            wave_color: "#94a3b8".to_string(),
            progress_color: "#f97316".to_string(),
        }
    }
}

/// An audio-playback handle wrapping one media source with waveform rendering.
pub trait Transport {
    fn role(&self) -> TrackRole;
    /// True once enough media is buffered to start playback.
    fn is_ready(&self) -> bool;
    fn toggle_play(&mut self) -> Result<(), TransportError>;
    fn seek(&mut self, seconds: f64);
    fn set_playback_rate(&mut self, rate: f64);
    fn set_width(&mut self, px: u32);
    fn current_time(&self) -> f64;
    fn state(&self) -> PlaybackState;
    /// Release decoder resources. Must be safe to call more than once.
    fn destroy(&mut self);
}

/// Creates transports bound to a container and audio URL.
pub trait TransportFactory {
    type Transport: Transport;

    fn create(
        &mut self,
        role: TrackRole,
        audio_url: &str,
        options: &WaveformOptions,
    ) -> Result<Self::Transport, TransportError>;
}

/// Dismissible, non-blocking message for the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub message: String,
    pub tracks: Vec<TrackRole>,
}

/// Result of a `play_both` call.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayBothOutcome {
    pub toggled: Vec<TrackRole>,
    pub failed: Vec<(TrackRole, TransportError)>,
}

impl PlayBothOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Snapshot of both positions. Drift is reported, never corrected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncPosition {
    pub user: f64,
    pub reference: f64,
}

impl SyncPosition {
    /// `user - reference`, in seconds.
    pub fn drift(&self) -> f64 {
        self.user - self.reference
    }
}

/// Drives the user and reference transports together.
///
/// Both transports are acquired in `open` and destroyed when the
/// synchronizer is closed or dropped. They start together but share no
/// clock, so they may drift apart over a long playback.
pub struct DualTransport<T: Transport> {
    user: T,
    reference: T,
    width_px: u32,
    playback_rate: f64,
    notices: Vec<Notice>,
    closed: bool,
}

impl<T: Transport> DualTransport<T> {
    pub fn open<F>(
        factory: &mut F,
        user_url: &str,
        reference_url: &str,
        options: &WaveformOptions,
    ) -> Result<Self, TransportError>
    where
        F: TransportFactory<Transport = T>,
    {
        let width_px = clamp_width(options.width_px);
        let options = WaveformOptions {
            width_px,
            ..options.clone()
        };

        let user = factory.create(TrackRole::User, user_url, &options)?;
        let reference = match factory.create(TrackRole::Reference, reference_url, &options) {
            Ok(t) => t,
            Err(e) => {
                let mut user = user;
                user.destroy();
                return Err(e);
            }
        };

        Ok(Self {
            user,
            reference,
            width_px,
            playback_rate: DEFAULT_PLAYBACK_RATE,
            notices: Vec::new(),
            closed: false,
        })
    }

    /// Toggle play/pause on both transports in one call.
    ///
    /// Each toggle is independent: a transport that isn't ready (e.g. still
    /// buffering) is left untouched and doesn't prevent the other from
    /// changing state. All failures from this call are reported as a single
    /// notice.
    pub fn play_both(&mut self) -> PlayBothOutcome {
        let mut outcome = PlayBothOutcome {
            toggled: Vec::new(),
            failed: Vec::new(),
        };
        let closed = self.closed;

        for transport in [&mut self.user, &mut self.reference] {
            let role = transport.role();
            let toggled = if closed {
                Err(TransportError::Destroyed(role))
            } else if !transport.is_ready() {
                Err(TransportError::NotReady(role))
            } else {
                transport.toggle_play()
            };
            match toggled {
                Ok(()) => outcome.toggled.push(role),
                Err(e) => {
                    log::warn!("Could not toggle {role} track: {e}");
                    outcome.failed.push((role, e));
                }
            }
        }

        if !outcome.failed.is_empty() {
            let tracks: Vec<TrackRole> = outcome.failed.iter().map(|(r, _)| *r).collect();
            let names: Vec<String> = tracks.iter().map(|r| r.to_string()).collect();
            self.notices.push(Notice {
                message: format!(
                    "The {} recording is still loading. Try again in a moment.",
                    names.join(" and ")
                ),
                tracks,
            });
        }

        outcome
    }

    /// Set waveform width on both transports (clamped to 300..=900 px).
    pub fn set_width(&mut self, px: u32) -> u32 {
        let px = clamp_width(px);
        self.width_px = px;
        self.user.set_width(px);
        self.reference.set_width(px);
        px
    }

    /// Set playback rate on both transports (clamped to 0.5..=2.0).
    pub fn set_playback_rate(&mut self, rate: f64) -> f64 {
        let rate = clamp_rate(rate);
        self.playback_rate = rate;
        self.user.set_playback_rate(rate);
        self.reference.set_playback_rate(rate);
        rate
    }

    /// Seek both transports to the same position.
    pub fn seek_both(&mut self, seconds: f64) {
        let seconds = seconds.max(0.0);
        self.user.seek(seconds);
        self.reference.seek(seconds);
    }

    pub fn positions(&self) -> SyncPosition {
        SyncPosition {
            user: self.user.current_time(),
            reference: self.reference.current_time(),
        }
    }

    pub fn states(&self) -> (PlaybackState, PlaybackState) {
        (self.user.state(), self.reference.state())
    }

    pub fn width(&self) -> u32 {
        self.width_px
    }

    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    pub fn user(&self) -> &T {
        &self.user
    }

    pub fn reference(&self) -> &T {
        &self.reference
    }

    pub fn user_mut(&mut self) -> &mut T {
        &mut self.user
    }

    pub fn reference_mut(&mut self) -> &mut T {
        &mut self.reference
    }

    /// Pending notices, oldest first. Taking them dismisses them.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Destroy both transports. Idempotent; also runs on drop.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.user.destroy();
        self.reference.destroy();
        log::debug!("Destroyed user and reference transports");
    }
}

impl<T: Transport> Drop for DualTransport<T> {
    fn drop(&mut self) {
        self.close();
    }
}

pub fn clamp_width(px: u32) -> u32 {
    px.clamp(MIN_WAVEFORM_WIDTH, MAX_WAVEFORM_WIDTH)
}

pub fn clamp_rate(rate: f64) -> f64 {
    if rate.is_nan() {
        return DEFAULT_PLAYBACK_RATE;
    }
    rate.clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE)
}
