//! Built-in glyph shapes.
//!
//! Each glyph is an open stroke through points of the unit square, with `x`
//! to the right and `y` up. Point order is stroke order; glyph order in
//! [`DEFAULT_WORD`] is left-to-right layout order.

/// A point in unit-square glyph space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphPoint {
    pub x: f64,
    pub y: f64,
}

/// A stylized letter: an ordered, open stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub name: char,
    pub points: &'static [GlyphPoint],
}

impl Glyph {
    pub const fn new(name: char, points: &'static [GlyphPoint]) -> Self {
        Self { name, points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Largest `x` over the stroke, or 0 for an empty glyph.
    pub fn max_x(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.x)
            .reduce(f64::max)
            .unwrap_or(0.0)
    }

    /// Smallest `y` over the stroke, or 0 for an empty glyph.
    pub fn min_y(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.y)
            .reduce(f64::min)
            .unwrap_or(0.0)
    }
}

macro_rules! stroke {
    ($(($x:expr, $y:expr)),* $(,)?) => {
        &[$(GlyphPoint { x: $x, y: $y }),*]
    };
}

pub const L: Glyph = Glyph::new('L', stroke![(0.0, 1.0), (0.0, 0.0), (1.0, 0.0)]);
pub const I: Glyph = Glyph::new('I', stroke![(0.0, 1.0), (0.0, 0.0)]);
pub const N: Glyph = Glyph::new('N', stroke![(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (1.0, 1.0)]);
pub const U: Glyph = Glyph::new('U', stroke![(0.0, 1.0), (0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);
pub const S: Glyph = Glyph::new(
    'S',
    stroke![(1.0, 1.0), (0.0, 0.7), (1.0, 0.3), (0.5, 0.0), (0.0, 0.1)],
);

/// The word traced by default.
pub const DEFAULT_WORD: &[Glyph] = &[L, I, N, U, S];

/// Look up a built-in glyph by letter, case-insensitively.
pub fn glyph_for(letter: char) -> Option<Glyph> {
    let letter = letter.to_ascii_uppercase();
    DEFAULT_WORD.iter().copied().find(|g| g.name == letter)
}
