use std::time::Duration;

use serde::{Deserialize, Serialize};
use wave_director_core::{Announcement, AnnouncementStyle, Event};

use super::{Progress, BANNER};

/// Tuning of the visibility-reduction event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlackoutConfig {
    /// Visibility factor while the blackout lasts.
    pub visibility: f32,
    /// How long the blackout lasts.
    pub duration_ms: u64,
}

impl Default for BlackoutConfig {
    fn default() -> Self {
        Self {
            visibility: 0.25,
            duration_ms: 30_000,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Blackout {
    config: BlackoutConfig,
    remaining: Duration,
}

impl Blackout {
    pub(crate) fn new(config: BlackoutConfig) -> Self {
        Self {
            config,
            remaining: Duration::ZERO,
        }
    }

    pub(crate) fn duration(&self) -> Duration {
        Duration::from_millis(self.config.duration_ms)
    }

    pub(crate) fn activate(&mut self, out: &mut Vec<Event>) -> Progress {
        self.remaining = self.duration();
        out.push(Event::VisibilityChanged {
            factor: self.config.visibility,
        });
        out.push(Announcement::new("Lights out!", AnnouncementStyle::Danger, BANNER).into_event());
        Progress::Continue
    }

    pub(crate) fn update(&mut self, dt: Duration) -> Progress {
        self.remaining = self.remaining.saturating_sub(dt);
        if self.remaining.is_zero() {
            Progress::Finished
        } else {
            Progress::Continue
        }
    }

    pub(crate) fn deactivate(&mut self, out: &mut Vec<Event>) {
        self.remaining = Duration::ZERO;
        out.push(Event::VisibilityChanged { factor: 1.0 });
        out.push(
            Announcement::new("Power restored", AnnouncementStyle::Info, BANNER).into_event(),
        );
    }
}
