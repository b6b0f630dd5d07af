//! A renderer that records what the harness asked it to do.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use quarry_core::{Drawable, InputSink, OverlayLayer, RenderSettings, Renderer};

/// Everything a [`RecordingRenderer`] observed, shared with the test.
#[derive(Default)]
pub struct RenderLog {
    shows: AtomicUsize,
    repaints: AtomicUsize,
    drawables: AtomicUsize,
    settings: Mutex<Option<RenderSettings>>,
    inputs: Mutex<Vec<Arc<dyn InputSink>>>,
    overlay_primitives: AtomicUsize,
}

impl RenderLog {
    pub fn shows(&self) -> usize {
        self.shows.load(Ordering::SeqCst)
    }

    pub fn repaints(&self) -> usize {
        self.repaints.load(Ordering::SeqCst)
    }

    pub fn drawables(&self) -> usize {
        self.drawables.load(Ordering::SeqCst)
    }

    /// Primitives emitted by attached drawables across all repaints.
    pub fn overlay_primitives(&self) -> usize {
        self.overlay_primitives.load(Ordering::SeqCst)
    }

    pub fn settings(&self) -> Option<RenderSettings> {
        *self.settings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Input sinks attached so far.
    pub fn inputs(&self) -> Vec<Arc<dyn InputSink>> {
        self.inputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// [`Renderer`] that draws nothing but counts every call.
pub struct RecordingRenderer<S> {
    log: Arc<RenderLog>,
    drawables: Vec<Arc<dyn Drawable<S>>>,
}

impl<S> RecordingRenderer<S> {
    pub fn new(log: Arc<RenderLog>) -> Self {
        Self {
            log,
            drawables: Vec::new(),
        }
    }
}

impl<S> Renderer<S> for RecordingRenderer<S> {
    fn show(&mut self, session: &S, settings: &RenderSettings) {
        self.log.shows.fetch_add(1, Ordering::SeqCst);
        *self
            .log
            .settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(*settings);
        self.repaint(session);
    }

    fn attach_input(&mut self, input: Arc<dyn InputSink>) {
        self.log
            .inputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(input);
    }

    fn add_drawable(&mut self, drawable: Arc<dyn Drawable<S>>) {
        self.log.drawables.fetch_add(1, Ordering::SeqCst);
        self.drawables.push(drawable);
    }

    fn repaint(&mut self, session: &S) {
        self.log.repaints.fetch_add(1, Ordering::SeqCst);
        let mut layer = OverlayLayer::default();
        for drawable in &self.drawables {
            drawable.draw(session, &mut layer);
        }
        self.log
            .overlay_primitives
            .fetch_add(layer.primitives().len(), Ordering::SeqCst);
    }
}
