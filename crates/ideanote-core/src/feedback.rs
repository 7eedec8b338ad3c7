//! Save-feedback banner
//!
//! A short message ("Note saved") shown after a mutation and hidden again once
//! its timeout passes. Showing a new message restarts the timer.

use std::time::{Duration, Instant};

use crate::config::DEFAULT_BANNER_TIMEOUT_MS;

#[derive(Debug, Clone)]
pub struct SaveBanner {
    message: Option<String>,
    shown_at: Option<Instant>,
    timeout: Duration,
}

impl Default for SaveBanner {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_BANNER_TIMEOUT_MS))
    }
}

impl SaveBanner {
    pub fn new(timeout: Duration) -> Self {
        Self {
            message: None,
            shown_at: None,
            timeout,
        }
    }

    pub fn show(&mut self, message: impl Into<String>) {
        self.show_at(message, Instant::now());
    }

    /// Show a message as of `now`, replacing any pending one
    pub fn show_at(&mut self, message: impl Into<String>, now: Instant) {
        self.message = Some(message.into());
        self.shown_at = Some(now);
    }

    /// Hide the banner if its time is up; returns true if it was hidden
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.shown_at {
            Some(shown_at) if now.saturating_duration_since(shown_at) >= self.timeout => {
                self.clear();
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.message = None;
        self.shown_at = None;
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_visible(&self) -> bool {
        self.message.is_some()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
