//! Simulated playback clock for wellbeing videos.
//!
//! A terminal cannot play the video itself, so the host advances a clock at
//! real-time rate and reports it the way a media element would.

use std::time::Instant;

/// One position report from the clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaSample {
    pub current: f64,
    pub duration: f64,
    pub ended: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MediaClock {
    duration: f64,
    position: f64,
    running_since: Option<Instant>,
    ended: bool,
}

impl MediaClock {
    /// A stopped clock at position zero. Negative or non-finite durations count as zero.
    #[must_use]
    pub fn load(duration_seconds: f64) -> Self {
        let duration = if duration_seconds.is_finite() {
            duration_seconds.max(0.0)
        } else {
            0.0
        };
        Self {
            duration,
            ..Self::default()
        }
    }

    pub fn play(&mut self, now: Instant) {
        if !self.ended && self.running_since.is_none() {
            self.running_since = Some(now);
        }
    }

    pub fn pause(&mut self, now: Instant) {
        self.advance(now);
        self.running_since = None;
    }

    pub fn toggle(&mut self, now: Instant) {
        if self.is_running() {
            self.pause(now);
        } else {
            self.play(now);
        }
    }

    /// Move the position by `delta` seconds and report where it landed.
    pub fn seek(&mut self, delta: f64, now: Instant) -> Option<MediaSample> {
        if self.ended {
            return None;
        }
        if self.running_since.is_some() {
            self.running_since = Some(now);
        }
        self.position = (self.position + delta).clamp(0.0, self.duration);
        Some(self.sample())
    }

    /// Advance to `now`. Reports nothing while stopped.
    pub fn advance(&mut self, now: Instant) -> Option<MediaSample> {
        let since = self.running_since?;
        let elapsed = now.saturating_duration_since(since).as_secs_f64();
        self.running_since = Some(now);
        self.position = (self.position + elapsed).min(self.duration);
        Some(self.sample())
    }

    fn sample(&mut self) -> MediaSample {
        if self.position >= self.duration {
            self.ended = true;
            self.running_since = None;
        }
        MediaSample {
            current: self.position,
            duration: self.duration,
            ended: self.ended,
        }
    }

    #[must_use]
    pub fn position(&self) -> f64 {
        self.position
    }

    #[must_use]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    #[must_use]
    pub fn has_ended(&self) -> bool {
        self.ended
    }
}
