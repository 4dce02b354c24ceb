//! Chakra color themes.
//!
//! Every lookup here is total: unknown labels resolve to the crown entry of
//! the active palette.

use std::fmt;

use serde::{Deserialize, Serialize};

/// RGBA color with sRGB-encoded components in 0-1
///
/// Values are never linearized; both render surfaces blend them as stored.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    /// Prime-matched bins and orbit pulses
    pub const HIGHLIGHT: Color = Color::rgba(1.0, 0.843, 0.0, 1.0);

    /// Background used by every mode
    pub const BACKGROUND: Color = Color::rgba(0.02, 0.012, 0.059, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from `0xRRGGBB`
    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as f32 / 255.0,
            g: ((hex >> 8) & 0xFF) as f32 / 255.0,
            b: (hex & 0xFF) as f32 / 255.0,
            a: 1.0,
        }
    }

    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: alpha.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Multiply alpha, e.g. by a growth or fade factor
    pub fn fade(self, factor: f32) -> Self {
        self.with_alpha(self.a * factor)
    }

    pub fn lerp(self, other: Color, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// Brighten toward white by `amount` (0-1), keeping alpha
    pub fn lighten(self, amount: f32) -> Self {
        let alpha = self.a;
        self.lerp(Color::WHITE, amount).with_alpha(alpha)
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [to_byte(self.r), to_byte(self.g), to_byte(self.b), to_byte(self.a)]
    }

    /// Hue rotation in HSV space, used for rainbow sweeps in canvas modes
    pub fn from_hsv(hue_deg: f32, saturation: f32, value: f32) -> Self {
        let hue = hue_deg.rem_euclid(360.0);
        let c = value * saturation;
        let x = c * (1.0 - ((hue / 60.0) % 2.0 - 1.0).abs());
        let m = value - c;

        let (r1, g1, b1) = if hue < 60.0 {
            (c, x, 0.0)
        } else if hue < 120.0 {
            (x, c, 0.0)
        } else if hue < 180.0 {
            (0.0, c, x)
        } else if hue < 240.0 {
            (0.0, x, c)
        } else if hue < 300.0 {
            (x, 0.0, c)
        } else {
            (c, 0.0, x)
        };

        Self::rgba(r1 + m, g1 + m, b1 + m, 1.0)
    }
}

/// The seven canonical energy centers, root to crown
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Chakra {
    Root,
    Sacral,
    SolarPlexus,
    Heart,
    Throat,
    ThirdEye,
    #[default]
    Crown,
}

impl Chakra {
    /// Root to crown
    pub const ALL: [Chakra; 7] = [
        Chakra::Root,
        Chakra::Sacral,
        Chakra::SolarPlexus,
        Chakra::Heart,
        Chakra::Throat,
        Chakra::ThirdEye,
        Chakra::Crown,
    ];

    /// Parse a label, ignoring case, whitespace, `-` and `_`
    pub fn parse(label: &str) -> Option<Chakra> {
        let key: String = label
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "root" | "muladhara" => Some(Chakra::Root),
            "sacral" | "svadhisthana" => Some(Chakra::Sacral),
            "solarplexus" | "solar" | "manipura" => Some(Chakra::SolarPlexus),
            "heart" | "anahata" => Some(Chakra::Heart),
            "throat" | "vishuddha" => Some(Chakra::Throat),
            "thirdeye" | "ajna" => Some(Chakra::ThirdEye),
            "crown" | "sahasrara" => Some(Chakra::Crown),
            _ => None,
        }
    }

    /// Parse with the crown fallback
    pub fn parse_or_default(label: &str) -> Chakra {
        Chakra::parse(label).unwrap_or_default()
    }

    /// Position from the root (0) to the crown (6)
    pub fn index(self) -> usize {
        self as usize
    }

    /// Next chakra upward, wrapping from crown to root
    pub fn next(self) -> Chakra {
        Chakra::ALL[(self.index() + 1) % Chakra::ALL.len()]
    }

    pub fn name(self) -> &'static str {
        match self {
            Chakra::Root => "root",
            Chakra::Sacral => "sacral",
            Chakra::SolarPlexus => "solar plexus",
            Chakra::Heart => "heart",
            Chakra::Throat => "throat",
            Chakra::ThirdEye => "third eye",
            Chakra::Crown => "crown",
        }
    }
}

impl fmt::Display for Chakra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Named color palettes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Palette {
    #[default]
    Classic,
    Pastel,
    Neon,
    Cosmic,
}

impl Palette {
    pub const ALL: [Palette; 4] = [
        Palette::Classic,
        Palette::Pastel,
        Palette::Neon,
        Palette::Cosmic,
    ];

    pub fn parse(name: &str) -> Option<Palette> {
        match name.trim().to_lowercase().as_str() {
            "classic" | "default" => Some(Palette::Classic),
            "pastel" | "alternate" => Some(Palette::Pastel),
            "neon" => Some(Palette::Neon),
            "cosmic" => Some(Palette::Cosmic),
            _ => None,
        }
    }

    pub fn next(self) -> Palette {
        let index = Palette::ALL.iter().position(|&p| p == self).unwrap_or(0);
        Palette::ALL[(index + 1) % Palette::ALL.len()]
    }

    /// Colors root to crown
    pub fn colors(self) -> [Color; 7] {
        match self {
            Palette::Classic => [
                Color::from_hex(0xFF0000),
                Color::from_hex(0xFF7F00),
                Color::from_hex(0xFFFF00),
                Color::from_hex(0x00FF00),
                Color::from_hex(0x0000FF),
                Color::from_hex(0x4B0082),
                Color::from_hex(0x8B00FF),
            ],
            Palette::Pastel => [
                Color::from_hex(0xFF9AA2),
                Color::from_hex(0xFFB347),
                Color::from_hex(0xFDFD96),
                Color::from_hex(0xB5EAD7),
                Color::from_hex(0xAEC6CF),
                Color::from_hex(0xB39EB5),
                Color::from_hex(0xE0BBE4),
            ],
            Palette::Neon => [
                Color::from_hex(0xFF073A),
                Color::from_hex(0xFF6700),
                Color::from_hex(0xFFF01F),
                Color::from_hex(0x39FF14),
                Color::from_hex(0x1F51FF),
                Color::from_hex(0xBC13FE),
                Color::from_hex(0xE0B0FF),
            ],
            Palette::Cosmic => [
                Color::from_hex(0x8B0000),
                Color::from_hex(0xD2691E),
                Color::from_hex(0xDAA520),
                Color::from_hex(0x2E8B57),
                Color::from_hex(0x4682B4),
                Color::from_hex(0x483D8B),
                Color::from_hex(0x9370DB),
            ],
        }
    }

    pub fn color(self, chakra: Chakra) -> Color {
        self.colors()[chakra.index()]
    }
}

/// How the surrounding UI selects a palette
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaletteSelection {
    Named(Palette),
    /// `false` → classic, `true` → pastel
    Alternate(bool),
}

impl PaletteSelection {
    pub fn palette(self) -> Palette {
        match self {
            PaletteSelection::Named(palette) => palette,
            PaletteSelection::Alternate(false) => Palette::Classic,
            PaletteSelection::Alternate(true) => Palette::Pastel,
        }
    }
}

impl Default for PaletteSelection {
    fn default() -> Self {
        PaletteSelection::Named(Palette::Classic)
    }
}

/// Colors a generator needs for one frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThemeColors {
    pub palette: Palette,
    pub selected: Chakra,
    /// Color of the selected chakra
    pub accent: Color,
    /// Palette row, root to crown
    pub chakras: [Color; 7],
}

impl ThemeColors {
    pub fn chakra(&self, chakra: Chakra) -> Color {
        self.chakras[chakra.index()]
    }

    /// Cycle through the palette, e.g. to color rings or bars
    pub fn cycle(&self, index: usize) -> Color {
        self.chakras[index % self.chakras.len()]
    }
}

impl Default for ThemeColors {
    fn default() -> Self {
        ThemeResolver::theme(Chakra::default(), PaletteSelection::default())
    }
}

/// Maps chakra labels and palette selections to colors
pub struct ThemeResolver;

impl ThemeResolver {
    /// Resolve a free-form label; unknown labels use the crown color
    pub fn resolve(label: &str, selection: PaletteSelection) -> Color {
        let palette = selection.palette();
        match Chakra::parse(label) {
            Some(chakra) => palette.color(chakra),
            None => {
                log::trace!("unknown chakra label {:?}, using crown", label);
                palette.color(Chakra::Crown)
            }
        }
    }

    /// Full per-frame theme for a selected chakra
    pub fn theme(selected: Chakra, selection: PaletteSelection) -> ThemeColors {
        let palette = selection.palette();
        ThemeColors {
            palette,
            selected,
            accent: palette.color(selected),
            chakras: palette.colors(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_and_space_insensitive() {
        assert_eq!(Chakra::parse("Solar Plexus"), Some(Chakra::SolarPlexus));
        assert_eq!(Chakra::parse("  solarplexus "), Some(Chakra::SolarPlexus));
        assert_eq!(Chakra::parse("THIRD-EYE"), Some(Chakra::ThirdEye));
        assert_eq!(Chakra::parse("third_eye"), Some(Chakra::ThirdEye));
        assert_eq!(Chakra::parse("Anahata"), Some(Chakra::Heart));
    }

    #[test]
    fn test_unknown_label_resolves_to_crown() {
        let selection = PaletteSelection::Named(Palette::Neon);
        assert_eq!(
            ThemeResolver::resolve("spleen", selection),
            Palette::Neon.color(Chakra::Crown)
        );
        assert_eq!(
            ThemeResolver::resolve("", selection),
            Palette::Neon.color(Chakra::Crown)
        );
    }

    #[test]
    fn test_exact_match_wins() {
        let color = ThemeResolver::resolve("root", PaletteSelection::default());
        assert_eq!(color, Color::from_hex(0xFF0000));
    }

    #[test]
    fn test_alternate_toggle_selects_pastel() {
        let classic = ThemeResolver::resolve("heart", PaletteSelection::Alternate(false));
        let alternate = ThemeResolver::resolve("heart", PaletteSelection::Alternate(true));
        assert_eq!(classic, Palette::Classic.color(Chakra::Heart));
        assert_eq!(alternate, Palette::Pastel.color(Chakra::Heart));
        assert_ne!(classic, alternate);
    }

    #[test]
    fn test_every_palette_defines_every_chakra() {
        for palette in Palette::ALL {
            for chakra in Chakra::ALL {
                let color = palette.color(chakra);
                assert_eq!(color.a, 1.0);
            }
        }
    }

    #[test]
    fn test_palette_and_chakra_cycle_wrap() {
        assert_eq!(Palette::Cosmic.next(), Palette::Classic);
        assert_eq!(Chakra::Crown.next(), Chakra::Root);
    }

    #[test]
    fn test_hex_and_rgba8_roundtrip_channels() {
        assert_eq!(Color::from_hex(0x12AB34).to_rgba8(), [0x12, 0xAB, 0x34, 0xFF]);
    }

    #[test]
    fn test_hsv_primary_hues() {
        assert_eq!(Color::from_hsv(0.0, 1.0, 1.0).to_rgba8(), [255, 0, 0, 255]);
        assert_eq!(Color::from_hsv(120.0, 1.0, 1.0).to_rgba8(), [0, 255, 0, 255]);
        assert_eq!(Color::from_hsv(600.0, 1.0, 1.0).to_rgba8(), [0, 0, 255, 255]);
    }
}
