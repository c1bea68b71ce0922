//! Live OS color-scheme signal.
//!
//! The store never owns the OS appearance; it only watches it. Hosts either
//! push values into an [`AppearanceSignal`] from their own platform callback,
//! or run [`spawn_appearance_poller`] with an [`AppearanceDetector`] so that
//! scheduled dark mode and manual OS switches are picked up at runtime.

use crate::theme::SystemAppearance;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Shared, observable OS appearance.
#[derive(Debug, Clone)]
pub struct AppearanceSignal {
    tx: Arc<watch::Sender<SystemAppearance>>,
}

impl AppearanceSignal {
    pub fn new(initial: SystemAppearance) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Current OS appearance.
    pub fn current(&self) -> SystemAppearance {
        *self.tx.borrow()
    }

    /// Publish a new reading. Returns true if it differed from the last one.
    ///
    /// Subscribers are only woken on an actual change.
    pub fn set(&self, appearance: SystemAppearance) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == appearance {
                false
            } else {
                *current = appearance;
                true
            }
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<SystemAppearance> {
        self.tx.subscribe()
    }

    /// True once nobody can observe or publish through this signal any more.
    fn is_orphaned(&self) -> bool {
        Arc::strong_count(&self.tx) == 1 && self.tx.receiver_count() == 0
    }
}

impl Default for AppearanceSignal {
    fn default() -> Self {
        Self::new(SystemAppearance::Unspecified)
    }
}

/// Source of OS appearance readings.
///
/// `detect` may block (platform APIs can go over IPC), so pollers call it on
/// the blocking pool.
pub trait AppearanceDetector: Send + Sync + 'static {
    fn detect(&self) -> SystemAppearance;
}

/// Detector that always reports the same value.
#[derive(Debug, Clone, Copy)]
pub struct FixedAppearance(pub SystemAppearance);

impl AppearanceDetector for FixedAppearance {
    fn detect(&self) -> SystemAppearance {
        self.0
    }
}

/// Reads the desktop color scheme through the platform APIs.
#[cfg(feature = "os-appearance")]
#[derive(Debug, Clone, Copy, Default)]
pub struct OsAppearanceDetector;

#[cfg(feature = "os-appearance")]
impl AppearanceDetector for OsAppearanceDetector {
    fn detect(&self) -> SystemAppearance {
        match dark_light::detect() {
            dark_light::Mode::Dark => SystemAppearance::Dark,
            dark_light::Mode::Light => SystemAppearance::Light,
            dark_light::Mode::Default => SystemAppearance::Unspecified,
        }
    }
}

/// Best available detector for this build.
pub fn default_detector() -> Arc<dyn AppearanceDetector> {
    #[cfg(feature = "os-appearance")]
    {
        Arc::new(OsAppearanceDetector)
    }
    #[cfg(not(feature = "os-appearance"))]
    {
        Arc::new(FixedAppearance(SystemAppearance::Unspecified))
    }
}

/// Poll `detector` every `interval` and publish changes into `signal`.
///
/// The first reading is taken immediately. The task ends once the signal
/// is orphaned (no other handles and no subscribers).
pub fn spawn_appearance_poller(
    signal: AppearanceSignal,
    detector: Arc<dyn AppearanceDetector>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if signal.is_orphaned() {
                tracing::debug!("Appearance signal dropped, stopping poller");
                break;
            }

            let detector = Arc::clone(&detector);
            let appearance = match tokio::task::spawn_blocking(move || detector.detect()).await {
                Ok(appearance) => appearance,
                Err(e) => {
                    tracing::warn!("Appearance detection failed: {}", e);
                    continue;
                }
            };

            if signal.set(appearance) {
                tracing::debug!("System appearance changed to {}", appearance);
            }
        }
    })
}
