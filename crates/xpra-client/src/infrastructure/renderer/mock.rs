//! Recording renderer for unit testing.
//!
//! Every call is pushed into shared `Mutex` records so a test can hand the
//! renderer (via [`RecordingRendererFactory`]) to a
//! [`Client`](crate::application::Client) and still inspect, per window,
//! what was drawn, cleared and released.
//!
//! ```ignore
//! let renderers = RecordingRendererFactory::new();
//! let mut client = Client::new(defaults, Collaborators {
//!     renderers: Box::new(renderers.clone()),
//!     ..
//! });
//! // ... new-window 7, lost-window 7 ...
//! assert_eq!(renderers.released_count(7), 1);
//! ```

use std::sync::{Arc, Mutex};

use xpra_core::protocol::packets::DrawPacket;
use xpra_core::{CanvasRect, Renderer, Wid};

use crate::application::client::RendererFactory;

/// Calls recorded by one [`RecordingRenderer`].
#[derive(Debug, Default)]
pub struct RendererLog {
    pub draws: Vec<DrawPacket>,
    pub cleared: Vec<CanvasRect>,
    pub scales: Vec<f64>,
    pub releases: usize,
}

/// A renderer that records calls into a shared [`RendererLog`].
#[derive(Debug, Clone)]
pub struct RecordingRenderer {
    pub log: Arc<Mutex<RendererLog>>,
    canvas: (u32, u32),
}

impl RecordingRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            log: Arc::new(Mutex::new(RendererLog::default())),
            canvas: (width, height),
        }
    }
}

impl Renderer for RecordingRenderer {
    fn draw(&mut self, packet: &DrawPacket) {
        self.log.lock().unwrap().draws.push(packet.clone());
    }

    fn clear_rect(&mut self, rect: CanvasRect) {
        self.log.lock().unwrap().cleared.push(rect);
    }

    fn canvas_size(&self) -> (u32, u32) {
        self.canvas
    }

    fn rescale(&mut self, scale: f64) {
        self.log.lock().unwrap().scales.push(scale);
    }

    fn release(&mut self) {
        self.log.lock().unwrap().releases += 1;
    }
}

/// Factory that hands out [`RecordingRenderer`]s and keeps their logs by wid.
#[derive(Debug, Clone, Default)]
pub struct RecordingRendererFactory {
    /// `(wid, log)` per created renderer, oldest first.
    pub created: Arc<Mutex<Vec<(Wid, Arc<Mutex<RendererLog>>)>>>,
}

impl RecordingRendererFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log of the most recent renderer created for `wid`.
    fn latest(&self, wid: Wid) -> Option<Arc<Mutex<RendererLog>>> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(w, _)| *w == wid)
            .map(|(_, log)| Arc::clone(log))
    }

    pub fn draws(&self, wid: Wid) -> Vec<DrawPacket> {
        self.latest(wid)
            .map(|log| log.lock().unwrap().draws.clone())
            .unwrap_or_default()
    }

    pub fn cleared(&self, wid: Wid) -> Vec<CanvasRect> {
        self.latest(wid)
            .map(|log| log.lock().unwrap().cleared.clone())
            .unwrap_or_default()
    }

    pub fn released_count(&self, wid: Wid) -> usize {
        self.latest(wid)
            .map(|log| log.lock().unwrap().releases)
            .unwrap_or(0)
    }

    /// Releases across every renderer ever created for `wid`.
    pub fn total_releases(&self, wid: Wid) -> usize {
        self.created
            .lock()
            .unwrap()
            .iter()
            .filter(|(w, _)| *w == wid)
            .map(|(_, log)| log.lock().unwrap().releases)
            .sum()
    }
}

impl RendererFactory for RecordingRendererFactory {
    fn create(&mut self, wid: Wid, w: u32, h: u32) -> Box<dyn Renderer> {
        let renderer = RecordingRenderer::new(w, h);
        self.created
            .lock()
            .unwrap()
            .push((wid, Arc::clone(&renderer.log)));
        Box::new(renderer)
    }
}
