//! Color utility functions shared across the engine.
//!
//! This module provides hex color conversion, the default label palette and
//! the collision-free instance color allocator used for instance
//! segmentation polygons.

use rand::Rng;

use crate::error::{EngineError, Result};

/// Convert HSV to RGB.
///
/// # Arguments
/// * `h` - Hue in degrees (0-360)
/// * `s` - Saturation (0.0-1.0)
/// * `v` - Value/brightness (0.0-1.0)
///
/// # Returns
/// RGB tuple with values in range 0.0-1.0
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (r + m, g + m, b + m)
}

/// Format an RGB triple as `#rrggbb`.
pub fn format_hex_color(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

/// Parse `#rrggbb` (or `rrggbb`), case-insensitively.
pub fn parse_hex_color(value: &str) -> Result<[u8; 3]> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(EngineError::invalid_color(value));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| EngineError::invalid_color(value))
    };
    Ok([channel(0)?, channel(2)?, channel(4)?])
}

/// Default base color for the label at palette slot `index`.
pub fn default_label_color(index: usize) -> String {
    // Golden angle for good distribution
    let hue = (index as f32 * 137.5) % 360.0;
    let (r, g, b) = hsv_to_rgb(hue, 0.7, 0.9);
    let to_u8 = |c: f32| (c * 255.0).round().clamp(0.0, 255.0) as u8;
    format_hex_color([to_u8(r), to_u8(g), to_u8(b)])
}

/// Case-insensitive color equality, ignoring a leading `#`.
pub fn colors_match(a: &str, b: &str) -> bool {
    a.trim()
        .trim_start_matches('#')
        .eq_ignore_ascii_case(b.trim().trim_start_matches('#'))
}

/// Pick a random color that collides with neither a label base color nor a
/// live instance color.
///
/// After `max_attempts` colliding candidates the last candidate is returned
/// anyway, so the allocation never blocks.
pub fn allocate_instance_color<R: Rng + ?Sized>(
    rng: &mut R,
    label_colors: &[String],
    instance_colors: &[String],
    max_attempts: usize,
) -> String {
    let taken = |candidate: &str| {
        label_colors
            .iter()
            .chain(instance_colors)
            .any(|c| colors_match(c, candidate))
    };

    let mut candidate = random_hex_color(rng);
    for _ in 1..max_attempts {
        if !taken(&candidate) {
            return candidate;
        }
        candidate = random_hex_color(rng);
    }

    if taken(&candidate) {
        log::warn!(
            "Instance color retry budget ({}) exhausted, accepting {}",
            max_attempts,
            candidate
        );
    }
    candidate
}

fn random_hex_color<R: Rng + ?Sized>(rng: &mut R) -> String {
    let value: u32 = rng.random_range(0..=0xFF_FFFF);
    format!("#{:06x}", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_hsv_to_rgb_red() {
        let (r, g, b) = hsv_to_rgb(0.0, 1.0, 1.0);
        assert!((r - 1.0).abs() < 0.01);
        assert!(g.abs() < 0.01);
        assert!(b.abs() < 0.01);
    }

    #[test]
    fn test_hsv_to_rgb_blue() {
        let (r, g, b) = hsv_to_rgb(240.0, 1.0, 1.0);
        assert!(r.abs() < 0.01);
        assert!(g.abs() < 0.01);
        assert!((b - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_hex_round_trip_and_errors() {
        assert_eq!(parse_hex_color("#FF8000").expect("valid"), [255, 128, 0]);
        assert_eq!(format_hex_color([255, 128, 0]), "#ff8000");
        assert!(parse_hex_color("#ff80").is_err());
        assert!(parse_hex_color("#gg0000").is_err());
    }

    #[test]
    fn test_default_label_colors_differ() {
        let a = default_label_color(0);
        let b = default_label_color(1);
        assert_ne!(a, b);
        assert!(parse_hex_color(&a).is_ok());
    }

    #[test]
    fn test_colors_match_ignores_case() {
        assert!(colors_match("#ABCDEF", "#abcdef"));
        assert!(colors_match("abcdef", "#ABCDEF"));
        assert!(!colors_match("#abcdef", "#abcdee"));
    }

    #[test]
    fn test_instance_colors_are_unique() {
        let mut rng = StdRng::seed_from_u64(7);
        let labels = vec!["#FF0000".to_string(), "#00ff00".to_string()];
        let mut instances: Vec<String> = Vec::new();

        for _ in 0..50 {
            let color = allocate_instance_color(&mut rng, &labels, &instances, 100);
            assert!(!labels.iter().any(|c| colors_match(c, &color)));
            assert!(!instances.iter().any(|c| colors_match(c, &color)));
            instances.push(color);
        }
    }

    /// Rng that always yields the same value, to force collisions.
    struct Constant;

    impl rand::RngCore for Constant {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            dst.fill(0);
        }
    }

    #[test]
    fn test_exhausted_budget_returns_last_candidate() {
        let mut rng = Constant;
        let first = allocate_instance_color(&mut rng, &[], &[], 10);
        let labels = vec![first.to_uppercase()];

        let color = allocate_instance_color(&mut rng, &labels, &[], 10);
        assert!(colors_match(&color, &first));
    }
}
