use super::types::ResolvedTheme;
use serde::{Serialize, Serializer};
use std::fmt;

/// An sRGB color with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }

    /// CSS functional notation, e.g. `rgb(11, 15, 20)` or `rgba(0, 0, 0, 0.60)`.
    pub fn to_css(&self) -> String {
        if self.is_opaque() {
            format!("rgb({}, {}, {})", self.r, self.g, self.b)
        } else {
            format!(
                "rgba({}, {}, {}, {:.2})",
                self.r,
                self.g,
                self.b,
                f32::from(self.a) / 255.0
            )
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if !self.is_opaque() {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Semantic color roles used by every screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemePalette {
    pub background: Color,
    pub surface: Color,
    pub surface_alt: Color,
    pub text: Color,
    pub subtext: Color,
    pub muted: Color,
    pub border: Color,
    pub border_soft: Color,
    pub accent: Color,
    pub danger: Color,
    pub overlay: Color,
    pub tab_inactive: Color,
}

pub static LIGHT_PALETTE: ThemePalette = ThemePalette {
    background: Color::rgb(0xf5, 0xf6, 0xf8),
    surface: Color::rgb(0xff, 0xff, 0xff),
    surface_alt: Color::rgb(0xee, 0xf1, 0xf5),
    text: Color::rgb(0x0f, 0x17, 0x2a),
    subtext: Color::rgb(0x47, 0x55, 0x69),
    muted: Color::rgb(0x94, 0xa3, 0xb8),
    border: Color::rgb(0xe2, 0xe8, 0xf0),
    border_soft: Color::rgb(0xf1, 0xf5, 0xf9),
    accent: Color::rgb(0xf7, 0x93, 0x1a),
    danger: Color::rgb(0xdc, 0x26, 0x26),
    overlay: Color::rgba(0x0f, 0x17, 0x2a, 0x73),
    tab_inactive: Color::rgb(0x94, 0xa3, 0xb8),
};

pub static DARK_PALETTE: ThemePalette = ThemePalette {
    background: Color::rgb(0x0b, 0x0f, 0x14),
    surface: Color::rgb(0x13, 0x1a, 0x22),
    surface_alt: Color::rgb(0x1b, 0x24, 0x30),
    text: Color::rgb(0xf8, 0xfa, 0xfc),
    subtext: Color::rgb(0xcb, 0xd5, 0xe1),
    muted: Color::rgb(0x64, 0x74, 0x8b),
    border: Color::rgb(0x26, 0x32, 0x41),
    border_soft: Color::rgb(0x1e, 0x28, 0x35),
    accent: Color::rgb(0xf7, 0x93, 0x1a),
    danger: Color::rgb(0xf8, 0x71, 0x71),
    overlay: Color::rgba(0x00, 0x00, 0x00, 0x99),
    tab_inactive: Color::rgb(0x6b, 0x72, 0x80),
};

impl ThemePalette {
    pub fn for_theme(theme: ResolvedTheme) -> &'static ThemePalette {
        match theme {
            ResolvedTheme::Light => &LIGHT_PALETTE,
            ResolvedTheme::Dark => &DARK_PALETTE,
        }
    }

    /// Role name and color pairs, in declaration order.
    pub fn roles(&self) -> [(&'static str, Color); 12] {
        [
            ("background", self.background),
            ("surface", self.surface),
            ("surfaceAlt", self.surface_alt),
            ("text", self.text),
            ("subtext", self.subtext),
            ("muted", self.muted),
            ("border", self.border),
            ("borderSoft", self.border_soft),
            ("accent", self.accent),
            ("danger", self.danger),
            ("overlay", self.overlay),
            ("tabInactive", self.tab_inactive),
        ]
    }
}
