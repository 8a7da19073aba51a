//! Spawnable primitive shapes and their randomized material

use serde::{Deserialize, Serialize};

/// One entry of the spawn palette
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum GeometryVariant {
    Box { size: f32 },
    Sphere { radius: f32 },
    Cone { radius: f32, height: f32 },
}

impl GeometryVariant {
    /// Box, sphere, cone at wand-tip scale
    pub fn default_palette() -> Vec<GeometryVariant> {
        vec![
            GeometryVariant::Box { size: 0.1 },
            GeometryVariant::Sphere { radius: 0.1 },
            GeometryVariant::Cone {
                radius: 0.05,
                height: 0.1,
            },
        ]
    }

    /// Shape tag as written in config
    pub fn tag(&self) -> &'static str {
        match self {
            GeometryVariant::Box { .. } => "box",
            GeometryVariant::Sphere { .. } => "sphere",
            GeometryVariant::Cone { .. } => "cone",
        }
    }
}

/// Phong-style material of a spawned instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// 0xRRGGBB
    pub color: u32,
    pub shininess: f32,
}

impl Material {
    /// Color is `floor(0xFFFFFF * u)` where `u` in `[0, 1)` comes from the seed
    pub fn from_seed(seed: u64, shininess: f32) -> Self {
        let unit = (seed >> 11) as f64 / (1u64 << 53) as f64;
        Self {
            color: (f64::from(0xFF_FFFFu32) * unit).floor() as u32,
            shininess,
        }
    }

    pub fn rgb(&self) -> [u8; 3] {
        let [_, r, g, b] = self.color.to_be_bytes();
        [r, g, b]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_stays_in_rgb_range() {
        for seed in [0, 1, u64::MAX / 2, u64::MAX] {
            let material = Material::from_seed(seed, 0.7);
            assert!(material.color <= 0xFF_FFFF);
        }
        assert_eq!(Material::from_seed(0, 0.7).color, 0);
    }

    #[test]
    fn test_rgb_channels() {
        let material = Material {
            color: 0x12_34_56,
            shininess: 0.7,
        };
        assert_eq!(material.rgb(), [0x12, 0x34, 0x56]);
    }

    #[test]
    fn test_palette_toml_shape() {
        #[derive(Deserialize)]
        struct Wrapper {
            palette: Vec<GeometryVariant>,
        }
        let parsed: Wrapper = toml::from_str(
            r#"palette = [{ shape = "cone", radius = 0.05, height = 0.1 }, { shape = "box", size = 0.2 }]"#,
        )
        .unwrap();
        assert_eq!(parsed.palette[0].tag(), "cone");
        assert_eq!(parsed.palette[1], GeometryVariant::Box { size: 0.2 });
    }
}
