//! Playback state for the animation controller

use std::fmt;

/// Where the controller is in its play/pause/stop cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl PlaybackState {
    /// Check if time advances on update
    pub fn is_playing(self) -> bool {
        self == Self::Playing
    }

    /// State after `pause()`
    pub fn paused(self) -> Self {
        match self {
            Self::Playing => Self::Paused,
            other => other,
        }
    }

    /// State after `resume()`
    pub fn resumed(self) -> Self {
        match self {
            Self::Paused => Self::Playing,
            other => other,
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stopped => "stopped",
            Self::Playing => "playing",
            Self::Paused => "paused",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_stopped() {
        assert_eq!(PlaybackState::default(), PlaybackState::Stopped);
        assert!(!PlaybackState::default().is_playing());
    }

    #[test]
    fn test_transitions() {
        assert_eq!(PlaybackState::Playing.paused(), PlaybackState::Paused);
        assert_eq!(PlaybackState::Paused.resumed(), PlaybackState::Playing);

        // Only Playing pauses and only Paused resumes
        assert_eq!(PlaybackState::Stopped.paused(), PlaybackState::Stopped);
        assert_eq!(PlaybackState::Stopped.resumed(), PlaybackState::Stopped);
        assert_eq!(PlaybackState::Playing.resumed(), PlaybackState::Playing);
        assert_eq!(PlaybackState::Paused.paused(), PlaybackState::Paused);
    }
}
