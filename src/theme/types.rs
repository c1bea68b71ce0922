use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The user's stored theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    /// Follow the operating system's color scheme
    #[default]
    System,
}

impl ThemeMode {
    pub const ALL: [ThemeMode; 3] = [ThemeMode::Light, ThemeMode::Dark, ThemeMode::System];

    /// The literal used in the settings file.
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
            ThemeMode::System => "system",
        }
    }

    /// Combine this preference with the OS-reported appearance.
    ///
    /// `System` follows the OS, treating anything other than an explicit
    /// dark report as light. Explicit modes ignore the OS entirely.
    pub fn resolve(self, appearance: SystemAppearance) -> ResolvedTheme {
        match self {
            ThemeMode::Light => ResolvedTheme::Light,
            ThemeMode::Dark => ResolvedTheme::Dark,
            ThemeMode::System => match appearance {
                SystemAppearance::Dark => ResolvedTheme::Dark,
                SystemAppearance::Light | SystemAppearance::Unspecified => ResolvedTheme::Light,
            },
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the three mode literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownThemeMode(pub String);

impl fmt::Display for UnknownThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown theme mode '{}' (expected light, dark or system)",
            self.0
        )
    }
}

impl std::error::Error for UnknownThemeMode {}

impl FromStr for ThemeMode {
    type Err = UnknownThemeMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            "system" => Ok(ThemeMode::System),
            _ => Err(UnknownThemeMode(s.to_string())),
        }
    }
}

/// The theme actually used for presentation. Never `System`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedTheme {
    Light,
    Dark,
}

impl ResolvedTheme {
    pub fn is_dark(self) -> bool {
        self == ResolvedTheme::Dark
    }

    pub fn opposite(self) -> Self {
        match self {
            ResolvedTheme::Light => ResolvedTheme::Dark,
            ResolvedTheme::Dark => ResolvedTheme::Light,
        }
    }

    /// The explicit mode that pins this theme.
    pub fn as_mode(self) -> ThemeMode {
        match self {
            ResolvedTheme::Light => ThemeMode::Light,
            ResolvedTheme::Dark => ThemeMode::Dark,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.as_mode().as_str()
    }
}

impl fmt::Display for ResolvedTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Color scheme reported by the host OS.
///
/// `Unspecified` covers platforms that report nothing, or report a value
/// we don't recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemAppearance {
    Light,
    Dark,
    #[default]
    Unspecified,
}

impl SystemAppearance {
    pub const ALL: [SystemAppearance; 3] = [
        SystemAppearance::Light,
        SystemAppearance::Dark,
        SystemAppearance::Unspecified,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SystemAppearance::Light => "light",
            SystemAppearance::Dark => "dark",
            SystemAppearance::Unspecified => "unspecified",
        }
    }
}

impl fmt::Display for SystemAppearance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SystemAppearance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(SystemAppearance::Light),
            "dark" => Ok(SystemAppearance::Dark),
            "unspecified" | "none" | "unknown" => Ok(SystemAppearance::Unspecified),
            other => Err(format!(
                "unknown appearance '{other}' (expected light, dark or unspecified)"
            )),
        }
    }
}
