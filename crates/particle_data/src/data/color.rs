use serde::{Deserialize, Serialize};

/// Display color of a particle group.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

const PALETTE: [(u8, u8, u8); 8] = [
    (239, 71, 111),
    (255, 209, 102),
    (6, 214, 160),
    (17, 138, 178),
    (155, 93, 229),
    (241, 91, 181),
    (0, 187, 249),
    (254, 228, 64),
];

impl Color {
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Default color for the `index`-th group; cycles through a fixed palette.
    #[must_use]
    pub fn palette(index: usize) -> Self {
        let (r, g, b) = PALETTE[index % PALETTE.len()];
        Self { r, g, b }
    }

    /// Normalized `[r, g, b]` for renderers that want floats.
    #[must_use]
    pub fn to_f32(self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_cycles() {
        assert_eq!(Color::palette(0), Color::palette(PALETTE.len()));
        assert_ne!(Color::palette(0), Color::palette(1));
    }

    #[test]
    fn test_to_f32_range() {
        let c = Color::rgb(255, 0, 51).to_f32();
        assert_eq!(c[0], 1.0);
        assert_eq!(c[1], 0.0);
        assert!((c[2] - 0.2).abs() < 1e-6);
    }
}
