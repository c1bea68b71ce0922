//! Theme preference store.
//!
//! The store is the single source of truth for the user's theme mode. It
//! bridges three things:
//! - a durable single-record [`SettingsStorage`]
//! - the live OS color scheme ([`AppearanceSignal`])
//! - reactive in-memory state read by the UI ([`ThemeSnapshot`], [`ThemeSubscription`])
//!
//! Mutations update memory synchronously and hand persistence to a
//! background writer task, so callers never wait on I/O. Every storage
//! failure is logged and absorbed; the running session always reflects the
//! last mode the user picked.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use theme_pref::services::appearance::AppearanceSignal;
//! use theme_pref::settings_io::MemorySettingsStorage;
//! use theme_pref::store::ThemePreferenceStore;
//! use theme_pref::theme::{ResolvedTheme, SystemAppearance, ThemeMode};
//!
//! # async fn demo() {
//! let appearance = AppearanceSignal::new(SystemAppearance::Dark);
//! let store = ThemePreferenceStore::new(Arc::new(MemorySettingsStorage::new()), appearance);
//! store.initialize().await;
//! assert_eq!(store.theme(), ResolvedTheme::Dark);
//!
//! store.set_dark_mode(false);
//! assert_eq!(store.mode(), ThemeMode::Light);
//! # }
//! ```

use crate::services::appearance::AppearanceSignal;
use crate::settings::{SettingsError, ThemeSettings};
use crate::settings_io::{DirectoryContext, SettingsStorage, SharedSettingsStorage};
use crate::theme::{ResolvedTheme, SystemAppearance, ThemeMode, ThemePalette};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};

/// Store tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StoreOptions {
    /// How often the OS appearance is re-read, in milliseconds
    #[serde(default = "default_appearance_poll_interval_ms")]
    pub appearance_poll_interval_ms: u64,
}

fn default_appearance_poll_interval_ms() -> u64 {
    2000
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            appearance_poll_interval_ms: default_appearance_poll_interval_ms(),
        }
    }
}

impl StoreOptions {
    pub fn appearance_poll_interval(&self) -> Duration {
        Duration::from_millis(self.appearance_poll_interval_ms.max(1))
    }
}

/// Initial-load gate.
///
/// `Loading` until the first read of durable storage has finished, whatever
/// its outcome; `Ready` for the rest of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Loading,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PreferenceState {
    mode: ThemeMode,
    readiness: Readiness,
    /// Set once the user has picked a mode; a late initial load must not clobber it
    user_set: bool,
}

impl Default for PreferenceState {
    fn default() -> Self {
        Self {
            mode: ThemeMode::default(),
            readiness: Readiness::Loading,
            user_set: false,
        }
    }
}

/// Everything a screen needs to render with the current theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeSnapshot {
    pub mode: ThemeMode,
    pub theme: ResolvedTheme,
    pub is_dark: bool,
    pub colors: &'static ThemePalette,
    pub is_ready: bool,
}

impl ThemeSnapshot {
    fn new(state: PreferenceState, appearance: SystemAppearance) -> Self {
        let theme = state.mode.resolve(appearance);
        Self {
            mode: state.mode,
            theme,
            is_dark: theme.is_dark(),
            colors: ThemePalette::for_theme(theme),
            is_ready: state.readiness == Readiness::Ready,
        }
    }
}

enum WriteRequest {
    Persist(ThemeMode),
    Flush(oneshot::Sender<()>),
}

struct Inner {
    state: watch::Sender<PreferenceState>,
    appearance: AppearanceSignal,
    storage: SharedSettingsStorage,
    writer: mpsc::UnboundedSender<WriteRequest>,
    load_started: AtomicBool,
}

/// Shared handle to the theme preference.
///
/// Cloning is cheap; all clones observe and mutate the same state. Create
/// one at startup and pass it down to whatever needs it.
#[derive(Clone)]
pub struct ThemePreferenceStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ThemePreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemePreferenceStore")
            .field("state", &*self.inner.state.borrow())
            .field("appearance", &self.inner.appearance.current())
            .finish_non_exhaustive()
    }
}

impl ThemePreferenceStore {
    /// Create a store in the `Loading` state with mode `System`.
    ///
    /// Spawns the background settings writer, so this must be called from
    /// within a Tokio runtime.
    pub fn new(storage: SharedSettingsStorage, appearance: AppearanceSignal) -> Self {
        let (state, _rx) = watch::channel(PreferenceState::default());
        let (writer, requests) = mpsc::unbounded_channel();

        tokio::spawn(run_settings_writer(Arc::clone(&storage), requests));

        Self {
            inner: Arc::new(Inner {
                state,
                appearance,
                storage,
                writer,
                load_started: AtomicBool::new(false),
            }),
        }
    }

    /// Create a store backed by the settings file in `dir_context`.
    pub fn open(dir_context: &DirectoryContext, appearance: AppearanceSignal) -> Self {
        Self::new(Arc::new(dir_context.settings_storage()), appearance)
    }

    /// Load the persisted preference and mark the store ready.
    ///
    /// Only the first call reads storage; later calls just wait until that
    /// load has finished. The load runs on its own task, so dropping the
    /// returned future (a startup timeout, a losing `select!` branch) does
    /// not stop the store from becoming ready. Never fails: a missing,
    /// unreadable or invalid record leaves the current mode in place.
    pub async fn initialize(&self) {
        if !self.inner.load_started.swap(true, Ordering::AcqRel) {
            let store = self.clone();
            tokio::spawn(async move { store.load_and_mark_ready().await });
        }
        self.wait_ready().await;
    }

    async fn load_and_mark_ready(&self) {
        let loaded = self.load_stored_mode().await;

        self.inner.state.send_modify(|state| {
            match loaded {
                Some(mode) if state.user_set => {
                    tracing::debug!(
                        "Ignoring stored theme mode {}, user already chose {}",
                        mode,
                        state.mode
                    );
                }
                Some(mode) => state.mode = mode,
                None => {}
            }
            state.readiness = Readiness::Ready;
        });

        tracing::debug!("Theme preference ready, mode {}", self.mode());
    }

    async fn load_stored_mode(&self) -> Option<ThemeMode> {
        let contents = match self.inner.storage.read().await {
            Ok(Some(contents)) => contents,
            Ok(None) => {
                tracing::debug!("No stored theme preference, using defaults");
                return None;
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to read theme settings: {}",
                    SettingsError::from(e)
                );
                return None;
            }
        };

        match ThemeSettings::decode(&contents) {
            Ok(settings) => {
                tracing::debug!("Loaded stored theme mode {}", settings.mode);
                Some(settings.mode)
            }
            Err(e) => {
                tracing::warn!("Ignoring stored theme settings: {}", e);
                None
            }
        }
    }

    /// Wait until the initial load has completed.
    pub async fn wait_ready(&self) {
        let mut rx = self.inner.state.subscribe();
        // The sender lives as long as `self`, so this cannot observe a closed channel
        let _ = rx.wait_for(|state| state.readiness == Readiness::Ready).await;
    }

    /// Change the preference.
    ///
    /// The in-memory mode (and every subscriber) sees `next` before this
    /// returns. The new record is written in the background; a failed write
    /// is logged and otherwise ignored.
    pub fn set_mode(&self, next: ThemeMode) {
        self.update_mode(|_| next);
        tracing::info!("Theme mode set to {}", next);
    }

    /// Pin dark (`true`) or light (`false`). Leaves `System` mode.
    pub fn set_dark_mode(&self, enabled: bool) {
        self.set_mode(if enabled {
            ThemeMode::Dark
        } else {
            ThemeMode::Light
        });
    }

    /// Switch to the opposite of what is currently displayed.
    ///
    /// Always pins an explicit mode: in `System` mode with a dark OS this
    /// yields `Light`. Returns the new mode.
    pub fn toggle_theme(&self) -> ThemeMode {
        let appearance = self.appearance();
        let next = self.update_mode(|mode| mode.resolve(appearance).opposite().as_mode());
        tracing::info!("Theme toggled to {}", next);
        next
    }

    /// Replace the mode with `next(current)` under the state lock and queue
    /// the write while still holding it, so the write order matches the
    /// order in which modes were applied.
    fn update_mode(&self, next: impl FnOnce(ThemeMode) -> ThemeMode) -> ThemeMode {
        let mut applied = ThemeMode::default();
        self.inner.state.send_if_modified(|state| {
            applied = next(state.mode);
            state.user_set = true;
            if self.inner.writer.send(WriteRequest::Persist(applied)).is_err() {
                tracing::debug!("Settings writer stopped, theme mode {} not persisted", applied);
            }
            if state.mode == applied {
                false
            } else {
                state.mode = applied;
                true
            }
        });
        applied
    }

    pub fn mode(&self) -> ThemeMode {
        self.inner.state.borrow().mode
    }

    pub fn readiness(&self) -> Readiness {
        self.inner.state.borrow().readiness
    }

    pub fn is_ready(&self) -> bool {
        self.readiness() == Readiness::Ready
    }

    /// OS appearance as last reported.
    pub fn appearance(&self) -> SystemAppearance {
        self.inner.appearance.current()
    }

    /// Theme for the current mode and OS appearance.
    pub fn resolved_theme(&self) -> ResolvedTheme {
        self.mode().resolve(self.appearance())
    }

    /// Alias for [`Self::resolved_theme`].
    pub fn theme(&self) -> ResolvedTheme {
        self.resolved_theme()
    }

    pub fn is_dark(&self) -> bool {
        self.resolved_theme().is_dark()
    }

    pub fn colors(&self) -> &'static ThemePalette {
        ThemePalette::for_theme(self.resolved_theme())
    }

    pub fn snapshot(&self) -> ThemeSnapshot {
        ThemeSnapshot::new(*self.inner.state.borrow(), self.appearance())
    }

    /// Observe every change to mode, readiness or OS appearance.
    pub fn subscribe(&self) -> ThemeSubscription {
        let mut state = self.inner.state.subscribe();
        let mut appearance = self.inner.appearance.subscribe();
        let last = ThemeSnapshot::new(*state.borrow_and_update(), *appearance.borrow_and_update());
        ThemeSubscription {
            state,
            appearance,
            state_closed: false,
            appearance_closed: false,
            last,
        }
    }

    /// Wait until every write queued before this call has been attempted.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.inner.writer.send(WriteRequest::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }

    /// Path of the settings file, for file-backed storage.
    pub fn settings_path(&self) -> Option<PathBuf> {
        self.inner.storage.location().map(|p| p.to_path_buf())
    }
}

/// Reactive view of a [`ThemePreferenceStore`].
pub struct ThemeSubscription {
    state: watch::Receiver<PreferenceState>,
    appearance: watch::Receiver<SystemAppearance>,
    state_closed: bool,
    appearance_closed: bool,
    last: ThemeSnapshot,
}

impl ThemeSubscription {
    /// Snapshot as of the last `changed()` (or subscription time).
    pub fn current(&self) -> ThemeSnapshot {
        self.last
    }

    /// Wait for the next visible change.
    ///
    /// Changes that leave the snapshot identical (e.g. the OS flipping while
    /// a mode is pinned) are skipped. Returns `None` once the store and the
    /// appearance signal have both gone away.
    pub async fn changed(&mut self) -> Option<ThemeSnapshot> {
        loop {
            if self.state_closed && self.appearance_closed {
                return None;
            }

            tokio::select! {
                res = self.state.changed(), if !self.state_closed => {
                    if res.is_err() {
                        self.state_closed = true;
                        continue;
                    }
                }
                res = self.appearance.changed(), if !self.appearance_closed => {
                    if res.is_err() {
                        self.appearance_closed = true;
                        continue;
                    }
                }
            }

            let snapshot = ThemeSnapshot::new(
                *self.state.borrow_and_update(),
                *self.appearance.borrow_and_update(),
            );
            if snapshot != self.last {
                self.last = snapshot;
                return Some(snapshot);
            }
        }
    }
}

/// Background task performing settings writes in the order they were requested.
async fn run_settings_writer(
    storage: SharedSettingsStorage,
    mut requests: mpsc::UnboundedReceiver<WriteRequest>,
) {
    while let Some(request) = requests.recv().await {
        match request {
            WriteRequest::Persist(mode) => match persist_mode(storage.as_ref(), mode).await {
                Ok(()) => tracing::debug!("Persisted theme mode {}", mode),
                Err(e) => tracing::warn!("Failed to persist theme mode {}: {}", mode, e),
            },
            WriteRequest::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    tracing::debug!("Settings writer stopped");
}

async fn persist_mode(storage: &dyn SettingsStorage, mode: ThemeMode) -> Result<(), SettingsError> {
    let contents = ThemeSettings::new(mode).encode()?;
    storage.write(&contents).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings_io::MemorySettingsStorage;

    fn store_with(
        storage: &MemorySettingsStorage,
        appearance: SystemAppearance,
    ) -> (ThemePreferenceStore, AppearanceSignal) {
        let signal = AppearanceSignal::new(appearance);
        let store = ThemePreferenceStore::new(Arc::new(storage.clone()), signal.clone());
        (store, signal)
    }

    #[tokio::test]
    async fn test_starts_loading_in_system_mode() {
        let (store, _signal) = store_with(&MemorySettingsStorage::new(), SystemAppearance::Light);
        assert_eq!(store.mode(), ThemeMode::System);
        assert_eq!(store.readiness(), Readiness::Loading);
        assert!(!store.snapshot().is_ready);
    }

    #[tokio::test]
    async fn test_initialize_adopts_stored_mode() {
        let storage = MemorySettingsStorage::with_contents(r#"{"mode":"dark"}"#);
        let (store, _signal) = store_with(&storage, SystemAppearance::Light);

        store.initialize().await;
        assert_eq!(store.mode(), ThemeMode::Dark);
        assert!(store.is_ready());
    }

    #[tokio::test]
    async fn test_initialize_survives_read_failure() {
        let storage = MemorySettingsStorage::with_contents(r#"{"mode":"dark"}"#);
        storage.fail_reads(true);
        let (store, _signal) = store_with(&storage, SystemAppearance::Light);

        store.initialize().await;
        assert_eq!(store.mode(), ThemeMode::System);
        assert!(store.is_ready());
    }

    #[tokio::test]
    async fn test_initialize_reads_storage_once() {
        let storage = MemorySettingsStorage::with_contents(r#"{"mode":"dark"}"#);
        let (store, _signal) = store_with(&storage, SystemAppearance::Light);
        store.initialize().await;

        // A later record must not be picked up by a second initialize
        storage.write(r#"{"mode":"light"}"#).await.unwrap();
        store.initialize().await;
        assert_eq!(store.mode(), ThemeMode::Dark);
    }

    #[tokio::test]
    async fn test_user_choice_during_load_wins() {
        let storage = MemorySettingsStorage::with_contents(r#"{"mode":"dark"}"#);
        let (store, _signal) = store_with(&storage, SystemAppearance::Light);

        store.set_mode(ThemeMode::Light);
        store.initialize().await;
        assert_eq!(store.mode(), ThemeMode::Light);
        assert!(store.is_ready());
    }

    #[tokio::test]
    async fn test_set_mode_is_visible_before_write() {
        let storage = MemorySettingsStorage::new();
        let (store, _signal) = store_with(&storage, SystemAppearance::Light);

        store.set_mode(ThemeMode::Dark);
        assert_eq!(store.mode(), ThemeMode::Dark);
        assert!(store.is_dark());

        store.flush().await;
        assert_eq!(
            ThemeSettings::decode(&storage.contents().unwrap()).unwrap().mode,
            ThemeMode::Dark
        );
    }

    #[tokio::test]
    async fn test_writes_land_in_call_order() {
        let storage = MemorySettingsStorage::new();
        let (store, _signal) = store_with(&storage, SystemAppearance::Light);

        store.set_mode(ThemeMode::Dark);
        store.set_mode(ThemeMode::System);
        store.set_mode(ThemeMode::Light);
        store.flush().await;

        assert_eq!(storage.write_count(), 3);
        assert_eq!(
            ThemeSettings::decode(&storage.contents().unwrap()).unwrap().mode,
            ThemeMode::Light
        );
    }

    #[tokio::test]
    async fn test_toggle_from_system_dark_pins_light() {
        let (store, _signal) = store_with(&MemorySettingsStorage::new(), SystemAppearance::Dark);
        store.initialize().await;
        assert_eq!(store.theme(), ResolvedTheme::Dark);

        assert_eq!(store.toggle_theme(), ThemeMode::Light);
        assert_eq!(store.mode(), ThemeMode::Light);

        assert_eq!(store.toggle_theme(), ThemeMode::Dark);
        assert_eq!(store.mode(), ThemeMode::Dark);
    }

    #[tokio::test]
    async fn test_resolved_theme_follows_os_changes() {
        let (store, signal) = store_with(&MemorySettingsStorage::new(), SystemAppearance::Light);
        assert_eq!(store.resolved_theme(), ResolvedTheme::Light);

        signal.set(SystemAppearance::Dark);
        assert_eq!(store.resolved_theme(), ResolvedTheme::Dark);
        assert!(std::ptr::eq(store.colors(), ThemePalette::for_theme(ResolvedTheme::Dark)));

        store.set_dark_mode(false);
        assert_eq!(store.resolved_theme(), ResolvedTheme::Light);
    }

    #[tokio::test]
    async fn test_subscription_sees_mode_and_os_changes() {
        let (store, signal) = store_with(&MemorySettingsStorage::new(), SystemAppearance::Light);
        let mut sub = store.subscribe();
        assert_eq!(sub.current().theme, ResolvedTheme::Light);

        store.initialize().await;
        let snapshot = sub.changed().await.unwrap();
        assert!(snapshot.is_ready);

        signal.set(SystemAppearance::Dark);
        let snapshot = sub.changed().await.unwrap();
        assert_eq!(snapshot.theme, ResolvedTheme::Dark);
        assert!(snapshot.is_dark);

        store.set_mode(ThemeMode::Light);
        let snapshot = sub.changed().await.unwrap();
        assert_eq!(snapshot.mode, ThemeMode::Light);
        assert_eq!(snapshot.theme, ResolvedTheme::Light);
    }

    #[tokio::test]
    async fn test_subscription_skips_invisible_changes() {
        let (store, signal) = store_with(&MemorySettingsStorage::new(), SystemAppearance::Light);
        store.initialize().await;
        store.set_mode(ThemeMode::Dark);
        let mut sub = store.subscribe();

        // Pinned dark: the OS flipping does not change what is displayed
        signal.set(SystemAppearance::Dark);
        store.set_mode(ThemeMode::Light);

        let snapshot = sub.changed().await.unwrap();
        assert_eq!(snapshot.mode, ThemeMode::Light);
    }

    #[tokio::test]
    async fn test_subscription_ends_when_sources_drop() {
        let (store, signal) = store_with(&MemorySettingsStorage::new(), SystemAppearance::Light);
        let mut sub = store.subscribe();
        drop(store);
        drop(signal);
        assert_eq!(sub.changed().await, None);
    }

    /// Storage whose reads take a while, to exercise cancelled loads.
    struct SlowStorage {
        inner: MemorySettingsStorage,
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl SettingsStorage for SlowStorage {
        async fn read(&self) -> std::io::Result<Option<String>> {
            tokio::time::sleep(self.delay).await;
            self.inner.read().await
        }

        async fn write(&self, contents: &str) -> std::io::Result<()> {
            self.inner.write(contents).await
        }
    }

    #[tokio::test]
    async fn test_cancelled_initialize_still_becomes_ready() {
        let storage = SlowStorage {
            inner: MemorySettingsStorage::with_contents(r#"{"mode":"dark"}"#),
            delay: Duration::from_millis(200),
        };
        let store = ThemePreferenceStore::new(
            Arc::new(storage),
            AppearanceSignal::new(SystemAppearance::Light),
        );

        let first = tokio::time::timeout(Duration::from_millis(10), store.initialize()).await;
        assert!(first.is_err(), "first initialize should have timed out");
        assert!(!store.is_ready());

        tokio::time::timeout(Duration::from_secs(2), store.initialize())
            .await
            .expect("second initialize should finish once the load completes");
        assert!(store.is_ready());
        assert_eq!(store.mode(), ThemeMode::Dark);
    }

    #[tokio::test]
    async fn test_concurrent_toggles_do_not_lose_flips() {
        let storage = MemorySettingsStorage::new();
        let (store, _signal) = store_with(&storage, SystemAppearance::Light);
        store.set_mode(ThemeMode::Light);

        // An even number of flips from Light lands back on Light only if
        // no two toggles read the same starting mode
        std::thread::scope(|scope| {
            for _ in 0..8 {
                let store = store.clone();
                scope.spawn(move || {
                    for _ in 0..50 {
                        store.toggle_theme();
                    }
                });
            }
        });
        assert_eq!(store.mode(), ThemeMode::Light);

        store.flush().await;
        assert_eq!(storage.write_count(), 1 + 8 * 50);
        assert_eq!(
            ThemeSettings::decode(&storage.contents().unwrap()).unwrap().mode,
            ThemeMode::Light
        );
    }

    #[test]
    fn test_store_options_defaults() {
        let options: StoreOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, StoreOptions::default());
        assert_eq!(options.appearance_poll_interval(), Duration::from_secs(2));

        let options: StoreOptions =
            serde_json::from_str(r#"{"appearance_poll_interval_ms": 0}"#).unwrap();
        assert_eq!(options.appearance_poll_interval(), Duration::from_millis(1));
    }

    #[tokio::test]
    async fn test_snapshot_serializes_for_hosts() {
        let (store, _signal) = store_with(&MemorySettingsStorage::new(), SystemAppearance::Dark);
        store.initialize().await;
        let json = serde_json::to_value(store.snapshot()).unwrap();
        assert_eq!(json["mode"], "system");
        assert_eq!(json["theme"], "dark");
        assert_eq!(json["isDark"], true);
        assert_eq!(json["isReady"], true);
        assert_eq!(json["colors"]["background"], "#0b0f14");
    }
}
