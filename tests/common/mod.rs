pub mod tracing;

use std::sync::Arc;
use tempfile::TempDir;
use theme_pref::services::appearance::AppearanceSignal;
use theme_pref::{DirectoryContext, SystemAppearance, ThemePreferenceStore};

/// A store backed by a settings file inside a private temp directory.
pub struct TestHarness {
    pub temp_dir: TempDir,
    pub dir_context: DirectoryContext,
    pub appearance: AppearanceSignal,
}

impl TestHarness {
    pub fn new(appearance: SystemAppearance) -> Self {
        tracing::init_tracing_from_env();
        let temp_dir = TempDir::new().unwrap();
        let dir_context = DirectoryContext::for_testing(temp_dir.path());
        Self {
            temp_dir,
            dir_context,
            appearance: AppearanceSignal::new(appearance),
        }
    }

    /// Open a new store on the same settings file, as a fresh process would.
    pub fn open_store(&self) -> ThemePreferenceStore {
        ThemePreferenceStore::new(
            Arc::new(self.dir_context.settings_storage()),
            self.appearance.clone(),
        )
    }

    /// Write raw contents to the settings file.
    pub fn write_settings(&self, contents: &str) {
        let path = self.dir_context.settings_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    pub fn read_settings(&self) -> Option<String> {
        std::fs::read_to_string(self.dir_context.settings_path()).ok()
    }
}
