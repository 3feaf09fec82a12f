//! Configuration for the layout resolver

/// Cross-axis placement for `below`, `above`, `left of` and `right of`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelativeAlignment {
    /// Center on the target's cross axis (`below` centers horizontally)
    #[default]
    Center,
    /// Align with the target's start edge (`below` shares the target's x)
    Start,
}

/// Configuration options for layout resolution
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Canvas size used when the document declares none (width, height)
    pub canvas_size: (f64, f64),

    /// Default size for rectangles (width, height)
    pub default_rect_size: (f64, f64),

    /// Default radius for circles
    pub default_circle_radius: f64,

    /// Default size for ellipses (width, height)
    pub default_ellipse_size: (f64, f64),

    /// Default size for images (width, height)
    pub default_image_size: (f64, f64),

    /// How relatively placed elements line up with their target
    pub relative_alignment: RelativeAlignment,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            canvas_size: (800.0, 600.0),
            default_rect_size: (100.0, 60.0),
            default_circle_radius: 50.0,
            default_ellipse_size: (100.0, 60.0),
            default_image_size: (100.0, 100.0),
            relative_alignment: RelativeAlignment::Center,
        }
    }
}

impl LayoutConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fallback canvas size
    pub fn with_canvas_size(mut self, width: f64, height: f64) -> Self {
        self.canvas_size = (width, height);
        self
    }

    /// Set the default rectangle size
    pub fn with_rect_size(mut self, width: f64, height: f64) -> Self {
        self.default_rect_size = (width, height);
        self
    }

    /// Set the default circle radius
    pub fn with_circle_radius(mut self, radius: f64) -> Self {
        self.default_circle_radius = radius;
        self
    }

    pub fn with_ellipse_size(mut self, width: f64, height: f64) -> Self {
        self.default_ellipse_size = (width, height);
        self
    }

    pub fn with_image_size(mut self, width: f64, height: f64) -> Self {
        self.default_image_size = (width, height);
        self
    }

    /// Set the cross-axis policy for relative placement
    pub fn with_relative_alignment(mut self, alignment: RelativeAlignment) -> Self {
        self.relative_alignment = alignment;
        self
    }
}
