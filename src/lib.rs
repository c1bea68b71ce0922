// Theme preference library - exposes all modules for hosts and tests

pub mod services;
pub mod settings;
pub mod settings_io;
pub mod store;
pub mod theme;

pub use settings::{SettingsError, ThemeSettings};
pub use settings_io::{DirectoryContext, LocalSettingsStorage, SettingsStorage};
pub use store::{Readiness, StoreOptions, ThemePreferenceStore, ThemeSnapshot, ThemeSubscription};
pub use theme::{ResolvedTheme, SystemAppearance, ThemeMode, ThemePalette};
