//! Marker and shape styling
//!
//! Deterministic and total: every category (and every unknown type string)
//! maps to exactly one style.

use place_types::{LocationType, ShapeKind};
use serde::Serialize;

pub const DEFAULT_COLOR: &str = "#a8e6cf";

const MARKER_SIZE: u32 = 30;
const SELECTED_MARKER_SIZE: u32 = 35;
/// The white dot inside a pin is this much smaller than the pin
const INNER_DOT_INSET: u32 = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerStyle {
    pub color: &'static str,
    /// Pin diameter in pixels
    pub size: u32,
    pub inner_size: u32,
    /// Pixel offset of the geographic point inside the icon
    pub anchor: [u32; 2],
    /// `rgba(r, g, b, 0.5)` of the pin color
    pub shadow: String,
    /// Selected pins bounce
    pub bounce: bool,
}

impl MarkerStyle {
    /// Div-icon markup for browser renderers
    pub fn icon_html(&self) -> String {
        let half = self.size / 2;
        let dot_margin = self.inner_size / 2;
        let animation = if self.bounce {
            " animation: bounce 1s infinite alternate;"
        } else {
            ""
        };
        format!(
            "<div class=\"marker-pin\" style=\"background: {color}; width: {size}px; height: {size}px; \
             margin: -{half}px 0 0 -{half}px; box-shadow: 0 2px 10px {shadow};{animation}\">\
             <div style=\"width: {inner}px; height: {inner}px; margin: {dot}px 0 0 {dot}px; \
             background: #fff; position: absolute; border-radius: 50%;\"></div></div>",
            color = self.color,
            size = self.size,
            half = half,
            shadow = self.shadow,
            animation = animation,
            inner = self.inner_size,
            dot = dot_margin,
        )
    }
}

pub fn type_color(place_type: LocationType) -> &'static str {
    match place_type {
        LocationType::Bar => "#f0600d",
        LocationType::Restaurant => "#facc15",
        LocationType::Hotel => "#22c55e",
        LocationType::Sport => "#3b82f6",
        LocationType::WaterWell
        | LocationType::Office
        | LocationType::Store
        | LocationType::Warehouse
        | LocationType::Other => DEFAULT_COLOR,
    }
}

pub fn marker_style(place_type: LocationType, selected: bool) -> MarkerStyle {
    let color = type_color(place_type);
    let size = if selected {
        SELECTED_MARKER_SIZE
    } else {
        MARKER_SIZE
    };
    MarkerStyle {
        color,
        size,
        inner_size: size - INNER_DOT_INSET,
        anchor: [size / 2, size / 2],
        shadow: shadow_rgba(color),
        bounce: selected,
    }
}

/// Style for a raw upstream type string; unknown strings get the default
pub fn marker_style_for(raw_type: &str, selected: bool) -> MarkerStyle {
    marker_style(LocationType::parse(raw_type), selected)
}

fn shadow_rgba(hex: &str) -> String {
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .unwrap_or(0)
    };
    format!(
        "rgba({}, {}, {}, 0.5)",
        channel(1..3),
        channel(3..5),
        channel(5..7)
    )
}

/// Stroke of user-drawn shapes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShapeStyle {
    pub color: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

pub fn shape_style(kind: ShapeKind) -> ShapeStyle {
    match kind {
        ShapeKind::Polygon => ShapeStyle {
            color: "#97009c",
            weight: None,
        },
        ShapeKind::Line => ShapeStyle {
            color: "#f357a1",
            weight: Some(3),
        },
        ShapeKind::Circle | ShapeKind::Rectangle => ShapeStyle {
            color: "#662d91",
            weight: None,
        },
        ShapeKind::Point => ShapeStyle {
            color: DEFAULT_COLOR,
            weight: None,
        },
    }
}
