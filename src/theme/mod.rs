//! Theme preference types and the two built-in palettes.
//!
//! This module is split into:
//! - `types`: the stored preference, the resolved theme and the OS signal
//! - `palette`: immutable color tables selected by the resolved theme
//!
//! # Example
//!
//! ```
//! use theme_pref::theme::{ResolvedTheme, SystemAppearance, ThemeMode, ThemePalette};
//!
//! let theme = ThemeMode::System.resolve(SystemAppearance::Dark);
//! assert_eq!(theme, ResolvedTheme::Dark);
//! assert_eq!(ThemePalette::for_theme(theme).background.to_string(), "#0b0f14");
//! ```

mod palette;
mod types;

pub use palette::*;
pub use types::*;
