//! Optional presentation capabilities.
//!
//! Rendering itself is outside the harness. These traits are the seam: a
//! [`Renderer`] shows the live session, and controllers may expose an
//! [`InputSink`] (human-driven) or a [`Drawable`] overlay. The harness
//! wires whichever of these a controller offers through capability
//! queries, never by inspecting concrete types.

use std::sync::Arc;

/// Directional input from a human operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// Up arrow or equivalent.
    Up,
    /// Down arrow or equivalent.
    Down,
    /// Left arrow or equivalent.
    Left,
    /// Right arrow or equivalent.
    Right,
    /// Any other key, by platform code.
    Other(u32),
}

/// Receives keyboard input for a human-operated controller.
pub trait InputSink: Send + Sync {
    /// A key went down.
    fn key_pressed(&self, key: Key);
    /// A key went up.
    fn key_released(&self, key: Key);
}

/// An RGB colour for overlay primitives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// A primitive drawn over the game view, addressed by session node index.
#[derive(Clone, Debug, PartialEq)]
pub enum OverlayPrimitive {
    /// Highlight individual nodes.
    Points {
        /// Node indices.
        nodes: Vec<usize>,
        /// Fill colour.
        color: Rgb,
    },
    /// Draw line segments between node pairs.
    Lines {
        /// `(from, to)` node index pairs.
        segments: Vec<(usize, usize)>,
        /// Stroke colour.
        color: Rgb,
    },
}

/// Primitives collected from every [`Drawable`] for one repaint.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlayLayer {
    primitives: Vec<OverlayPrimitive>,
}

impl OverlayLayer {
    /// Queue a primitive.
    pub fn push(&mut self, primitive: OverlayPrimitive) {
        self.primitives.push(primitive);
    }

    /// Primitives in draw order.
    pub fn primitives(&self) -> &[OverlayPrimitive] {
        &self.primitives
    }

    /// Drop everything queued so far.
    pub fn clear(&mut self) {
        self.primitives.clear();
    }
}

/// A controller that can annotate the game view (e.g. planned paths).
pub trait Drawable<S>: Send + Sync {
    /// Add overlay primitives for the current session state.
    fn draw(&self, session: &S, layer: &mut OverlayLayer);
}

/// Settings applied when a view is opened.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderSettings {
    /// Window scale factor.
    pub scale_factor: f64,
    /// Run the render thread as a daemon (does not keep the process alive).
    pub daemon: bool,
    /// Render from the controlled entity's restricted point of view.
    pub entity_point_of_view: bool,
}

/// A visual view of the live session.
pub trait Renderer<S>: Send {
    /// Open the view on the initial session state.
    fn show(&mut self, session: &S, settings: &RenderSettings);
    /// Route keyboard input to a human-operated controller.
    fn attach_input(&mut self, input: Arc<dyn InputSink>);
    /// Register an overlay drawn on every repaint.
    fn add_drawable(&mut self, drawable: Arc<dyn Drawable<S>>);
    /// Redraw after the session advanced.
    fn repaint(&mut self, session: &S);
}

/// Creates one [`Renderer`] per visualised run.
pub trait RendererFactory<S>: Send + Sync {
    /// Build a fresh renderer.
    fn create(&self) -> Box<dyn Renderer<S>>;
}

impl<S, F> RendererFactory<S> for F
where
    F: Fn() -> Box<dyn Renderer<S>> + Send + Sync,
{
    fn create(&self) -> Box<dyn Renderer<S>> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_layer_keeps_draw_order() {
        let mut layer = OverlayLayer::default();
        layer.push(OverlayPrimitive::Points {
            nodes: vec![1, 2],
            color: Rgb(255, 0, 0),
        });
        layer.push(OverlayPrimitive::Lines {
            segments: vec![(1, 2)],
            color: Rgb(0, 255, 0),
        });
        assert_eq!(layer.primitives().len(), 2);
        assert!(matches!(layer.primitives()[0], OverlayPrimitive::Points { .. }));
        layer.clear();
        assert!(layer.primitives().is_empty());
    }
}
