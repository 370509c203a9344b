//! Playback clock abstraction
//!
//! The audio player owns the clock; the sampler only polls it once per frame.

use crate::timeline::Seconds;
use serde::{Deserialize, Serialize};

/// One consistent snapshot of the audio clock
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockReading {
    /// Current audio position in seconds
    pub time: Seconds,
    /// Whether playback is paused
    pub paused: bool,
    /// Whether playback has finished
    pub ended: bool,
}

impl ClockReading {
    /// A clock that is playing at `time`
    pub fn playing(time: Seconds) -> Self {
        Self {
            time,
            paused: false,
            ended: false,
        }
    }

    /// A paused clock at `time`
    pub fn paused(time: Seconds) -> Self {
        Self {
            time,
            paused: true,
            ended: false,
        }
    }

    /// A clock whose playback has ended at `time`
    pub fn ended(time: Seconds) -> Self {
        Self {
            time,
            paused: false,
            ended: true,
        }
    }

    /// Whether the clock is stalled (paused or ended)
    pub fn is_stalled(&self) -> bool {
        self.paused || self.ended
    }
}

impl Default for ClockReading {
    /// An idle player: nothing loaded, reported as paused at zero
    fn default() -> Self {
        Self::paused(0.0)
    }
}

/// Read-only time source polled by the frame sampler
pub trait PlaybackClock {
    /// Take one snapshot of the clock
    fn reading(&self) -> ClockReading;
}

impl PlaybackClock for ClockReading {
    fn reading(&self) -> ClockReading {
        *self
    }
}

/// Externally driven clock for tests and headless replays
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ManualClock {
    reading: ClockReading,
}

impl ManualClock {
    /// Create a playing clock at `time`
    pub fn at(time: Seconds) -> Self {
        Self {
            reading: ClockReading::playing(time),
        }
    }

    /// Move to `time`
    pub fn set_time(&mut self, time: Seconds) {
        self.reading.time = time;
    }

    /// Pause or resume
    pub fn set_paused(&mut self, paused: bool) {
        self.reading.paused = paused;
    }

    /// Mark playback ended
    pub fn set_ended(&mut self, ended: bool) {
        self.reading.ended = ended;
    }
}

impl PlaybackClock for ManualClock {
    fn reading(&self) -> ClockReading {
        self.reading
    }
}

/// Frame-advanced playback position for a single utterance.
///
/// Stands in for an audio player whose output device is external: the host
/// advances it by the frame delta and it reports `ended` once the
/// utterance duration has elapsed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelinePlayback {
    position: Seconds,
    duration: Seconds,
    paused: bool,
    loaded: bool,
}

impl TimelinePlayback {
    /// Create an idle player
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new utterance of `duration` seconds from the beginning
    pub fn start(&mut self, duration: Seconds) {
        self.position = 0.0;
        self.duration = if duration.is_finite() {
            duration.max(0.0)
        } else {
            0.0
        };
        self.paused = false;
        self.loaded = true;
    }

    /// Advance by `delta` seconds; no-op while paused or ended.
    ///
    /// Returns `true` on the frame playback reaches the end.
    pub fn advance(&mut self, delta: Seconds) -> bool {
        if !self.loaded || self.paused || self.is_ended() {
            return false;
        }
        if delta.is_finite() && delta > 0.0 {
            self.position = (self.position + delta).min(self.duration);
        }
        self.is_ended()
    }

    /// Pause playback
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume playback
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Toggle pause, returning the new paused state
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Unload the utterance
    pub fn stop(&mut self) {
        *self = Self::default();
    }

    /// Current position in seconds
    pub fn position(&self) -> Seconds {
        self.position
    }

    /// Whether an utterance is loaded and has played to its end
    pub fn is_ended(&self) -> bool {
        self.loaded && self.position >= self.duration
    }
}

impl PlaybackClock for TimelinePlayback {
    fn reading(&self) -> ClockReading {
        ClockReading {
            time: self.position,
            paused: self.paused || !self.loaded,
            ended: self.is_ended(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_playback_is_paused() {
        let playback = TimelinePlayback::new();
        let reading = playback.reading();
        assert!(reading.paused);
        assert!(!reading.ended);
    }

    #[test]
    fn test_advance_until_end() {
        let mut playback = TimelinePlayback::new();
        playback.start(0.5);
        assert!(!playback.advance(0.2));
        assert_eq!(playback.reading(), ClockReading::playing(0.2));
        assert!(playback.advance(0.4));
        assert_eq!(playback.position(), 0.5);
        assert!(playback.reading().ended);
        // Stays ended without re-reporting the transition
        assert!(!playback.advance(0.1));
    }

    #[test]
    fn test_pause_freezes_position() {
        let mut playback = TimelinePlayback::new();
        playback.start(1.0);
        playback.advance(0.25);
        assert!(playback.toggle_pause());
        playback.advance(0.25);
        assert_eq!(playback.position(), 0.25);
        assert!(playback.reading().paused);
        playback.resume();
        playback.advance(0.25);
        assert_eq!(playback.position(), 0.5);
    }

    #[test]
    fn test_restart_resets_position() {
        let mut playback = TimelinePlayback::new();
        playback.start(0.3);
        playback.advance(1.0);
        playback.start(2.0);
        assert_eq!(playback.reading(), ClockReading::playing(0.0));
    }

    #[test]
    fn test_manual_clock() {
        let mut clock = ManualClock::at(0.15);
        assert_eq!(clock.reading(), ClockReading::playing(0.15));
        clock.set_paused(true);
        assert!(clock.reading().is_stalled());
    }
}
