use serde::{Deserialize, Serialize};

/// Color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

pub const RED: Rgba = Rgba::new(1.0, 0.0, 0.0, 1.0);
pub const GREEN: Rgba = Rgba::new(0.0, 1.0, 0.0, 1.0);
pub const BLUE: Rgba = Rgba::new(0.0, 0.0, 1.0, 1.0);
pub const YELLOW: Rgba = Rgba::new(1.0, 1.0, 0.0, 1.0);
pub const MAGENTA: Rgba = Rgba::new(1.0, 0.0, 1.0, 1.0);
pub const CYAN: Rgba = Rgba::new(0.0, 1.0, 1.0, 1.0);
pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);
pub const GREY: Rgba = Rgba::new(0.5, 0.5, 0.5, 1.0);

const NAMED_COLORS: &[(&str, Rgba)] = &[
    ("red", RED),
    ("green", GREEN),
    ("blue", BLUE),
    ("yellow", YELLOW),
    ("magenta", MAGENTA),
    ("cyan", CYAN),
    ("black", BLACK),
    ("white", WHITE),
    ("grey", GREY),
];

impl Rgba {
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Looks up one of the named colors.
    ///
    /// ```
    /// use robolab_viewer::colors::{Rgba, RED};
    /// assert_eq!(Rgba::from_name("red"), Some(RED));
    /// assert_eq!(Rgba::from_name("Grey").unwrap().r, 0.5);
    /// assert!(Rgba::from_name("octarine").is_none());
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        NAMED_COLORS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, c)| *c)
    }

    /// Same color with another alpha.
    pub fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    /// Packed `0xRRGGBB` form, alpha is dropped.
    pub fn to_int(&self) -> u32 {
        rgb_to_int(self.r, self.g, self.b)
    }

    pub fn is_transparent(&self) -> bool {
        self.a < 1.0
    }
}

/// Packs a color into a 24 bit integer.
///
/// ```
/// use robolab_viewer::colors::rgb_to_int;
/// assert_eq!(rgb_to_int(1.0, 0.0, 0.0), 16711680);
/// assert_eq!(rgb_to_int(0.0, 1.0, 0.0), 65280);
/// assert_eq!(rgb_to_int(0.0, 0.0, 1.0), 255);
/// assert_eq!(rgb_to_int(1.0, 1.0, 1.0), 0xffffff);
/// ```
pub fn rgb_to_int(r: f64, g: f64, b: f64) -> u32 {
    let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0) as u32;
    channel(r) * 256 * 256 + channel(g) * 256 + channel(b)
}
