use serde::{Deserialize, Serialize};

/// Anything that can show the indicator on a stage: the DOM, a terminal line,
/// an off-screen buffer in tests.
pub trait Surface {
    /// Current rendered width of the stage.
    fn stage_width(&self) -> f64;

    /// Current rendered width of the moving indicator.
    fn indicator_width(&self) -> f64;

    /// Moves the indicator to horizontal offset `x` from the stage's left
    /// edge. Vertical placement is the surface's business and does not
    /// depend on position.
    fn place_indicator(&mut self, x: f64);
}

/// Geometry of one render pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageLayout {
    pub stage_width: f64,
    pub indicator_width: f64,
    pub inset: f64,
}

impl StageLayout {
    /// Distance the indicator can move between the two insets.
    pub fn travel(&self) -> f64 {
        (self.stage_width - self.indicator_width - 2.0 * self.inset).max(0.0)
    }

    /// Horizontal offset for a normalised position.
    pub fn offset(&self, position: f64) -> f64 {
        self.inset + position.clamp(0.0, 1.0) * self.travel()
    }
}

/// Maps the normalised track position to a physical offset on a [`Surface`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Renderer {
    inset: f64,
}

impl Renderer {
    pub fn new(inset: f64) -> Self {
        Self { inset }
    }

    /// Measures `surface` and computes the layout without touching it.
    pub fn layout<S: Surface + ?Sized>(&self, surface: &S) -> StageLayout {
        StageLayout {
            stage_width: surface.stage_width(),
            indicator_width: surface.indicator_width(),
            inset: self.inset,
        }
    }

    /// Places the indicator for `position` and returns the offset used.
    pub fn render<S: Surface + ?Sized>(&self, surface: &mut S, position: f64) -> f64 {
        let x = self.layout(surface).offset(position);
        surface.place_indicator(x);
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct FixedSurface {
        stage: f64,
        indicator: f64,
        placed: Option<f64>,
    }

    impl Surface for FixedSurface {
        fn stage_width(&self) -> f64 {
            self.stage
        }

        fn indicator_width(&self) -> f64 {
            self.indicator
        }

        fn place_indicator(&mut self, x: f64) {
            self.placed = Some(x);
        }
    }

    #[test]
    fn centre_of_three_hundred_pixel_stage() {
        let mut surface = FixedSurface {
            stage: 300.0,
            indicator: 20.0,
            placed: None,
        };
        let renderer = Renderer::new(20.0);

        assert_eq!(renderer.layout(&surface).travel(), 240.0);
        assert_eq!(renderer.render(&mut surface, 0.5), 140.0);
        assert_eq!(surface.placed, Some(140.0));
    }

    #[test]
    fn ends_sit_on_the_insets() {
        let layout = StageLayout {
            stage_width: 300.0,
            indicator_width: 20.0,
            inset: 20.0,
        };
        assert_eq!(layout.offset(0.0), 20.0);
        assert_eq!(layout.offset(1.0), 260.0);
    }

    #[test]
    fn cramped_stage_keeps_indicator_at_inset() {
        let mut surface = FixedSurface {
            stage: 50.0,
            indicator: 20.0,
            placed: None,
        };
        let renderer = Renderer::new(20.0);
        renderer.render(&mut surface, 1.0);
        assert_eq!(surface.placed, Some(20.0));
    }
}
