//! Spark payload generation.
//!
//! Everything in this module is a pure function of the step counter, the
//! elapsed run time and the board position, so payload shapes are fully
//! reproducible in tests.

use serde::{Deserialize, Serialize};

pub mod pattern;

/// Highest addressable coordinate on the 512x512 board.
pub const MAX_COORD: u32 = 511;

/// Visual parameters for a single spark, serialized as the request body.
///
/// Wire format: `{"color": [h, s, l], "radius": float, "transparency": float,
/// "time_to_grow": int}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparkPayload {
    pub color: [u16; 3],
    pub radius: f64,
    pub transparency: f64,
    pub time_to_grow: u64,
}

/// Fixed overrides for the otherwise pulsing payload properties.
///
/// An override is used exactly as configured; only dynamically computed
/// values are clamped into their documented ranges.
#[derive(Debug, Clone, Copy, Default, clap::Args)]
pub struct SparkTuning {
    /// pin the spark radius instead of the dynamic pulse
    #[arg(long, value_name = "PIXELS")]
    pub radius: Option<f64>,

    /// pin the spark transparency instead of the dynamic pulse
    #[arg(long, value_name = "ALPHA")]
    pub transparency: Option<f64>,

    /// pin the spark growth time instead of the dynamic pulse
    #[arg(long, value_name = "MILLISECONDS")]
    pub time_to_grow: Option<u64>,
}

impl SparkTuning {
    /// Build the payload for one spark at the given elapsed time and step.
    pub fn payload_at(&self, t_ms: f64, step: u64, x: u32, y: u32, max_coord: u32) -> SparkPayload {
        let (radius, transparency, time_to_grow) = dynamic_properties(t_ms / 1000.0, step);
        SparkPayload {
            color: color_from_params(t_ms, x, y, max_coord),
            radius: self.radius.unwrap_or(radius),
            transparency: self.transparency.unwrap_or(transparency),
            time_to_grow: self.time_to_grow.unwrap_or(time_to_grow),
        }
    }
}

/// Derive a vibrant HSL color from elapsed time and board position.
///
/// Hue wraps into `[0, 360)`; saturation and lightness swing around their
/// base values and are clamped into `[0, 100]`.
pub fn color_from_params(t_ms: f64, x: u32, y: u32, max_coord: u32) -> [u16; 3] {
    let max = max_coord.max(1) as f64;
    let fx = x as f64 / max;
    let fy = y as f64 / max;

    let hue = (t_ms * 0.05 + fx * 360.0 + fy * 180.0).rem_euclid(360.0);
    let sat = 85.0 + 15.0 * (t_ms * 0.01 + fx * std::f64::consts::PI).sin();
    let light = 45.0 + 20.0 * (t_ms * 0.008 - fy * 2.0).cos();

    [
        hue as u16,
        sat.clamp(0.0, 100.0) as u16,
        light.clamp(0.0, 100.0) as u16,
    ]
}

/// Pulsing radius, transparency and growth time, clamped into
/// `[10, 60]` px, `[0.2, 0.95]` and `[200, 1000]` ms respectively.
pub fn dynamic_properties(t_secs: f64, step: u64) -> (f64, f64, u64) {
    let radius = 20.0 + 15.0 * (t_secs * 2.0 + step as f64 * 0.05).sin();
    let transparency = 0.4 + 0.3 * (t_secs * 1.5).cos();
    let time_to_grow = 400.0 + 200.0 * (step as f64 * 0.1).sin();

    (
        radius.clamp(10.0, 60.0),
        transparency.clamp(0.2, 0.95),
        time_to_grow.clamp(200.0, 1000.0) as u64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_colors_stay_in_range() {
        for step in 0..2000u64 {
            let t_ms = step as f64 * 13.7;
            let x = (step * 7 % 512) as u32;
            let y = (step * 13 % 512) as u32;

            let [h, s, l] = color_from_params(t_ms, x, y, MAX_COORD);
            assert!(h < 360, "hue {h} out of range at step {step}");
            assert!((70..=100).contains(&s), "saturation {s} at step {step}");
            assert!((25..=65).contains(&l), "lightness {l} at step {step}");
        }
    }

    #[test]
    fn dynamic_properties_are_clamped() {
        for step in 0..2000u64 {
            let t_secs = step as f64 * 0.37;
            let (radius, transparency, time_to_grow) = dynamic_properties(t_secs, step);

            assert!((10.0..=60.0).contains(&radius));
            assert!((0.2..=0.95).contains(&transparency));
            assert!((200..=1000).contains(&time_to_grow));
        }
    }

    #[test]
    fn tuning_overrides_replace_the_dynamic_pulse() {
        let tuning = SparkTuning {
            radius: Some(150.0),
            transparency: Some(1.0),
            time_to_grow: Some(5000),
        };

        let payload = tuning.payload_at(0.0, 0, 10, 20, MAX_COORD);
        assert_eq!(150.0, payload.radius);
        assert_eq!(1.0, payload.transparency);
        assert_eq!(5000, payload.time_to_grow);
    }

    #[test]
    fn payload_wire_format() {
        let payload = SparkPayload {
            color: [300, 90, 50],
            radius: 30.0,
            transparency: 0.8,
            time_to_grow: 400,
        };

        let value = serde_json::to_value(&payload).expect("serialize spark payload");
        assert_eq!(
            serde_json::json!({
                "color": [300, 90, 50],
                "radius": 30.0,
                "transparency": 0.8,
                "time_to_grow": 400,
            }),
            value,
        );
    }
}
