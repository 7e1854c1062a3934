//! Application-wide constants and default values
//!
//! This module centralizes the palettes, derived-column prefixes and default
//! values used throughout the engine, making them easier to maintain.

/// Prefix for every column the engine derives and writes into the shared
/// tables. Columns carrying it are never offered as data columns.
pub const DERIVED_PREFIX: &str = "reef:";

/// Factor map names. The realized columns are `<name>:id` and `<name>:glyph`.
pub mod factor {
    /// Vertex color map name
    pub const VERTEX_COLOR: &str = "reef:color";

    /// Vertex marker map name
    pub const VERTEX_MARKER: &str = "reef:marker";

    /// Edge color map name
    pub const EDGE_COLOR: &str = "reef:edge:color";

    /// Factor assigned to rows with a missing value in the factor column
    pub const NULL_FACTOR: &str = "NaN";

    /// Factor used when no column is selected
    pub const DEFAULT_FACTOR: &str = "None";
}

/// Default palettes
pub mod palette {
    /// Default vertex/edge color palette (the qualitative "Set3" scheme)
    pub const COLORS: [&str; 12] = [
        "#8DD3C7", "#FFFFB3", "#BEBADA", "#FB8072", "#80B1D3", "#FDB462",
        "#B3DE69", "#FCCDE5", "#D9D9D9", "#BC80BD", "#CCEBC5", "#FFED6F",
    ];

    /// Default marker palette. Marker names are understood by the client
    /// renderer; the engine treats them as opaque glyph tokens.
    pub const MARKERS: [&str; 13] = [
        "circle", "diamond", "hex", "triangle", "square", "plus", "star",
        "circle_cross", "diamond_cross", "circle_dot", "hex_dot",
        "triangle_dot", "circle_x",
    ];
}

/// Histogram defaults
pub mod histogram {
    /// Default number of bins
    pub const DEFAULT_NBINS: usize = 10;

    /// Headroom factor applied to the largest bin for axis scaling
    pub const AXIS_HEADROOM: f64 = 1.05;
}

/// Graph layout defaults
pub mod graph {
    /// Derived vertex position columns
    pub const VERTEX_X: &str = "reef:graph:x";
    pub const VERTEX_Y: &str = "reef:graph:y";

    /// Derived edge polyline columns
    pub const EDGE_XS: &str = "reef:graph:xs";
    pub const EDGE_YS: &str = "reef:graph:ys";

    /// Derived edge arrow columns
    pub const ARROW_X0: &str = "reef:graph:arrow_x0";
    pub const ARROW_Y0: &str = "reef:graph:arrow_y0";
    pub const ARROW_X1: &str = "reef:graph:arrow_x1";
    pub const ARROW_Y1: &str = "reef:graph:arrow_y1";
    pub const ARROW_ANGLE: &str = "reef:graph:arrow_angle";

    /// Placeholder position for vertices a layout algorithm did not place
    pub const PLACEHOLDER_POSITION: (f64, f64) = (-1.0, 0.0);

    /// Arrow head offset relative to the edge direction, in radians
    pub const ARROW_HEAD_ANGLE: f64 = std::f64::consts::PI / 6.0;
}

/// Map projection defaults
pub mod map {
    /// Derived mercator coordinate columns
    pub const MERCATOR_X: &str = "reef:map:x";
    pub const MERCATOR_Y: &str = "reef:map:y";

    /// Earth radius used by the Web-Mercator projection, in meters
    pub const MERCATOR_K: f64 = 6378137.0;
}

/// Embedding defaults
pub mod embedding {
    /// Prefix of the derived embedding feature columns; the component index
    /// is appended (`reef:embed:feature:0`, `reef:embed:feature:1`, ...)
    pub const FEATURE_PREFIX: &str = "reef:embed:feature:";

    /// Default number of output components
    pub const DEFAULT_COMPONENTS: usize = 2;
}

/// Session defaults
pub mod session {
    /// Default vertex glyph size
    pub const DEFAULT_VERTEX_SIZE: f64 = 12.0;

    /// Default vertex opacity
    pub const DEFAULT_VERTEX_OPACITY: f64 = 1.0;

    /// Default edge line width
    pub const DEFAULT_EDGE_WIDTH: f64 = 1.2;

    /// Default edge opacity
    pub const DEFAULT_EDGE_OPACITY: f64 = 1.0;

    /// Default annotation font size
    pub const DEFAULT_FONT_SIZE: u32 = 11;
}
