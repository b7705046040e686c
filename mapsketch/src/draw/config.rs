#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::draw::PointStyle;

const DEFAULT_DRAG_THRESHOLD: usize = 10;
const DEFAULT_HIT_TOLERANCE_PX: f64 = 7.0;

/// Configuration of a [`DrawingSession`](super::DrawingSession).
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DrawingConfig {
    drag_threshold: usize,
    hit_tolerance_px: f64,
    point_style: PointStyle,
    floating_point_style: PointStyle,
}

impl Default for DrawingConfig {
    fn default() -> Self {
        Self {
            drag_threshold: DEFAULT_DRAG_THRESHOLD,
            hit_tolerance_px: DEFAULT_HIT_TOLERANCE_PX,
            point_style: PointStyle::COMMITTED,
            floating_point_style: PointStyle::FLOATING,
        }
    }
}

impl DrawingConfig {
    /// Number of drag motion samples from which a pick on an existing point is considered the end
    /// of a drag rather than a click.
    ///
    /// Default value is `10`. It was not calibrated against real input devices, so hosts with
    /// high-frequency pointers may want a larger value.
    ///
    /// [`DrawingTool`](super::DrawingTool) does not pick when a drag ends, so with the tool the
    /// threshold only matters for picks delivered by the host right after a drag.
    pub fn drag_threshold(&self) -> usize {
        self.drag_threshold
    }

    /// Sets number of drag motion samples from which a pick on an existing point is considered
    /// the end of a drag rather than a click.
    pub fn with_drag_threshold(mut self, threshold: usize) -> Self {
        self.drag_threshold = threshold;
        self
    }

    /// Sets number of drag motion samples from which a pick on an existing point is considered
    /// the end of a drag rather than a click.
    pub fn set_drag_threshold(&mut self, threshold: usize) {
        self.drag_threshold = threshold;
    }

    /// Distance in pixels within which a pointer press grabs a point for dragging.
    pub fn hit_tolerance_px(&self) -> f64 {
        self.hit_tolerance_px
    }

    /// Sets distance in pixels within which a pointer press grabs a point for dragging.
    pub fn with_hit_tolerance_px(mut self, tolerance: f64) -> Self {
        self.hit_tolerance_px = tolerance;
        self
    }

    /// Sets distance in pixels within which a pointer press grabs a point for dragging.
    pub fn set_hit_tolerance_px(&mut self, tolerance: f64) {
        self.hit_tolerance_px = tolerance;
    }

    /// Style of the points placed by the user.
    pub fn point_style(&self) -> PointStyle {
        self.point_style
    }

    /// Sets style of the points placed by the user.
    pub fn with_point_style(mut self, style: PointStyle) -> Self {
        self.point_style = style;
        self
    }

    /// Sets style of the points placed by the user.
    pub fn set_point_style(&mut self, style: PointStyle) {
        self.point_style = style;
    }

    /// Style of the point following the pointer.
    pub fn floating_point_style(&self) -> PointStyle {
        self.floating_point_style
    }

    /// Sets style of the point following the pointer.
    pub fn with_floating_point_style(mut self, style: PointStyle) -> Self {
        self.floating_point_style = style;
        self
    }

    /// Sets style of the point following the pointer.
    pub fn set_floating_point_style(&mut self, style: PointStyle) {
        self.floating_point_style = style;
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;
    use crate::Color;

    #[test]
    fn partial_config_uses_defaults() {
        let config: DrawingConfig =
            serde_json::from_str(r#"{"drag_threshold": 4}"#).expect("valid config");

        assert_eq!(config.drag_threshold(), 4);
        assert_eq!(config.hit_tolerance_px(), DEFAULT_HIT_TOLERANCE_PX);
        assert_eq!(config.point_style(), PointStyle::COMMITTED);
    }

    #[test]
    fn colors_are_hex_strings() {
        let config = DrawingConfig::default().with_point_style(PointStyle {
            color: Color::BLUE,
            ..PointStyle::COMMITTED
        });
        let json = serde_json::to_value(config).expect("serializable");

        assert_eq!(json["point_style"]["color"], "#0000FFFF");
    }

    #[test]
    fn invalid_color_is_rejected() {
        let result = serde_json::from_str::<DrawingConfig>(
            r##"{"point_style": {"size": 1.0, "color": "red", "outline_color": "#000000", "outline_width": 0.0}}"##,
        );

        assert!(result.is_err());
    }
}
