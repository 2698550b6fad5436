//! Auto-continue countdown driven by the session clock.
//!
//! The countdown is anchored to the session-duration counter rather than a
//! wall-clock instant, so it advances exactly with clock ticks.

use serde::Serialize;

use crate::error::TrainerError;

/// Auto-continue setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(into = "u64")]
pub enum AutoContinue {
    #[default]
    Off,
    Secs10,
    Secs20,
    Secs30,
}

impl AutoContinue {
    pub fn seconds(self) -> Option<u64> {
        match self {
            AutoContinue::Off => None,
            AutoContinue::Secs10 => Some(10),
            AutoContinue::Secs20 => Some(20),
            AutoContinue::Secs30 => Some(30),
        }
    }

    pub fn is_on(self) -> bool {
        self != AutoContinue::Off
    }
}

impl From<AutoContinue> for u64 {
    fn from(v: AutoContinue) -> u64 {
        v.seconds().unwrap_or(0)
    }
}

impl TryFrom<u64> for AutoContinue {
    type Error = TrainerError;
    fn try_from(secs: u64) -> Result<Self, Self::Error> {
        match secs {
            0 => Ok(AutoContinue::Off),
            10 => Ok(AutoContinue::Secs10),
            20 => Ok(AutoContinue::Secs20),
            30 => Ok(AutoContinue::Secs30),
            other => Err(TrainerError::Config(format!(
                "auto-continue must be 0, 10, 20 or 30 seconds, got {other}"
            ))),
        }
    }
}

/// Countdown state: the configured period plus the anchor while armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AutoContinueScheduler {
    setting: AutoContinue,
    anchor_s: Option<u64>,
}

impl AutoContinueScheduler {
    pub fn setting(&self) -> AutoContinue {
        self.setting
    }

    /// Session-clock reading at which the running countdown started.
    pub fn anchor_s(&self) -> Option<u64> {
        self.anchor_s
    }

    pub fn is_armed(&self) -> bool {
        self.anchor_s.is_some()
    }

    /// Change the setting. Any enabled value arms a fresh countdown at `now_s`;
    /// `Off` disarms.
    pub fn configure(&mut self, setting: AutoContinue, now_s: u64) {
        self.setting = setting;
        self.anchor_s = setting.is_on().then_some(now_s);
    }

    /// Start a fresh countdown at `now_s` if auto-continue is enabled.
    pub fn rearm(&mut self, now_s: u64) -> bool {
        if self.setting.is_on() {
            self.anchor_s = Some(now_s);
            true
        } else {
            false
        }
    }

    pub fn disarm(&mut self) {
        self.anchor_s = None;
    }

    /// Seconds left on the running countdown, floored at zero.
    pub fn remaining(&self, now_s: u64) -> Option<u64> {
        let period = self.setting.seconds()?;
        let anchor = self.anchor_s?;
        Some(period.saturating_sub(now_s.saturating_sub(anchor)))
    }

    /// Disarm and report `true` when the running countdown has expired at `now_s`.
    pub fn poll_expired(&mut self, now_s: u64) -> bool {
        if self.remaining(now_s) == Some(0) {
            self.disarm();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arming_and_remaining() {
        let mut s = AutoContinueScheduler::default();
        assert_eq!(s.remaining(5), None);
        s.configure(AutoContinue::Secs10, 5);
        assert_eq!(s.anchor_s(), Some(5));
        assert_eq!(s.remaining(5), Some(10));
        assert_eq!(s.remaining(12), Some(3));
        assert_eq!(s.remaining(15), Some(0));
        assert_eq!(s.remaining(40), Some(0));
    }

    #[test]
    fn off_disarms_without_side_effects() {
        let mut s = AutoContinueScheduler::default();
        s.configure(AutoContinue::Secs20, 0);
        s.configure(AutoContinue::Off, 3);
        assert!(!s.is_armed());
        assert_eq!(s.remaining(100), None);
        assert!(!s.poll_expired(100));
    }

    #[test]
    fn poll_disarms_once() {
        let mut s = AutoContinueScheduler::default();
        s.configure(AutoContinue::Secs10, 0);
        assert!(!s.poll_expired(9));
        assert!(s.poll_expired(10));
        assert!(!s.is_armed());
        assert!(!s.poll_expired(11));
        assert_eq!(s.setting(), AutoContinue::Secs10);
    }

    #[test]
    fn rearm_requires_enabled_setting() {
        let mut s = AutoContinueScheduler::default();
        assert!(!s.rearm(4));
        s.configure(AutoContinue::Secs30, 0);
        assert!(s.rearm(7));
        assert_eq!(s.anchor_s(), Some(7));
    }

    #[test]
    fn seconds_round_trip() {
        assert_eq!(AutoContinue::try_from(20), Ok(AutoContinue::Secs20));
        assert_eq!(u64::from(AutoContinue::Off), 0);
        assert!(AutoContinue::try_from(15).is_err());
    }
}
