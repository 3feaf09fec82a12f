//! Configuration for SVG rendering

/// Configuration options for SVG output
#[derive(Debug, Clone, PartialEq)]
pub struct SvgConfig {
    /// Whether to emit the XML declaration
    pub standalone: bool,

    /// Whether to format output with indentation
    pub pretty_print: bool,

    /// Decimal places kept for coordinates and lengths
    pub precision: usize,

    /// `font-family` on the root element
    pub font_family: String,
}

impl Default for SvgConfig {
    fn default() -> Self {
        Self {
            standalone: false,
            pretty_print: true,
            precision: 2,
            font_family: "Roboto, sans-serif".to_string(),
        }
    }
}

impl SvgConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether output is standalone
    pub fn with_standalone(mut self, standalone: bool) -> Self {
        self.standalone = standalone;
        self
    }

    /// Set whether to pretty-print output
    pub fn with_pretty_print(mut self, pretty: bool) -> Self {
        self.pretty_print = pretty;
        self
    }

    /// Set the number of decimal places for numbers
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Set the default font family
    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }
}

/// Debug layers drawn on top of the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DebugOverlay {
    /// Dashed outline around every element's bounding box
    pub boxes: bool,
    /// Element name at the top-left corner of every box
    pub labels: bool,
    /// 100px grid with coordinates
    pub grid: bool,
}

impl DebugOverlay {
    /// No overlay
    pub fn none() -> Self {
        Self::default()
    }

    /// Every overlay layer
    pub fn all() -> Self {
        Self {
            boxes: true,
            labels: true,
            grid: true,
        }
    }

    pub fn with_boxes(mut self, boxes: bool) -> Self {
        self.boxes = boxes;
        self
    }

    pub fn with_labels(mut self, labels: bool) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_grid(mut self, grid: bool) -> Self {
        self.grid = grid;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.boxes || self.labels || self.grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SvgConfig::default();
        assert!(!config.standalone);
        assert!(config.pretty_print);
        assert_eq!(config.precision, 2);
        assert_eq!(config.font_family, "Roboto, sans-serif");
    }

    #[test]
    fn test_builder_pattern() {
        let config = SvgConfig::new()
            .with_standalone(true)
            .with_pretty_print(false)
            .with_precision(4)
            .with_font_family("serif");

        assert!(config.standalone);
        assert!(!config.pretty_print);
        assert_eq!(config.precision, 4);
        assert_eq!(config.font_family, "serif");
    }

    #[test]
    fn test_debug_overlay() {
        assert!(!DebugOverlay::none().is_enabled());
        assert!(DebugOverlay::none().with_grid(true).is_enabled());
        assert_eq!(
            DebugOverlay::all(),
            DebugOverlay::none()
                .with_boxes(true)
                .with_labels(true)
                .with_grid(true)
        );
    }
}
