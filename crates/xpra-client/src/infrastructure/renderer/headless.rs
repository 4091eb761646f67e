//! Renderer for running without a display.
//!
//! Nothing is painted.  The renderer keeps the canvas bookkeeping a real one
//! would (size, scale, damage count) so the binary can log meaningful numbers
//! and the client's resize logic behaves exactly as with a canvas.

use tracing::{debug, trace};
use xpra_core::protocol::packets::DrawPacket;
use xpra_core::{CanvasRect, Renderer, Wid};

use crate::application::client::RendererFactory;

/// A renderer that only counts.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessRenderer {
    width: u32,
    height: u32,
    scale: f64,
    frames: u64,
    cleared: usize,
    released: bool,
}

impl HeadlessRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            scale: 1.0,
            frames: 0,
            cleared: 0,
            released: false,
        }
    }

    /// Number of `draw`/`eos` packets received.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Number of stale-region clears.
    pub fn cleared(&self) -> usize {
        self.cleared
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Renderer for HeadlessRenderer {
    fn draw(&mut self, packet: &DrawPacket) {
        self.frames += 1;
        trace!(
            wid = packet.wid,
            coding = %packet.coding,
            sequence = packet.sequence,
            "headless draw"
        );
    }

    fn clear_rect(&mut self, _rect: CanvasRect) {
        self.cleared += 1;
    }

    fn canvas_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn rescale(&mut self, scale: f64) {
        self.scale = scale;
    }

    fn release(&mut self) {
        debug!(frames = self.frames, "headless renderer released");
        self.released = true;
    }
}

/// Creates one [`HeadlessRenderer`] per surface, sized to the window.
#[derive(Debug, Default)]
pub struct HeadlessRendererFactory {
    created: u64,
}

impl HeadlessRendererFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderers created so far.
    pub fn created(&self) -> u64 {
        self.created
    }
}

impl RendererFactory for HeadlessRendererFactory {
    fn create(&mut self, wid: Wid, w: u32, h: u32) -> Box<dyn Renderer> {
        self.created += 1;
        debug!(wid, w, h, "creating headless renderer");
        Box::new(HeadlessRenderer::new(w, h))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use xpra_core::Metadata;

    fn draw() -> DrawPacket {
        DrawPacket {
            wid: 1,
            x: 0,
            y: 0,
            w: 1,
            h: 1,
            coding: "png".into(),
            data: vec![],
            sequence: 1,
            rowstride: 0,
            options: Metadata::new(),
        }
    }

    #[test]
    fn test_counts_frames_and_clears() {
        // Arrange
        let mut renderer = HeadlessRenderer::new(640, 480);

        // Act
        renderer.draw(&draw());
        renderer.draw(&draw());
        renderer.clear_rect(CanvasRect { x: 0.0, y: 0.0, w: 1.0, h: 1.0 });

        // Assert
        assert_eq!(renderer.frames(), 2);
        assert_eq!(renderer.cleared(), 1);
        assert_eq!(renderer.canvas_size(), (640, 480));
    }

    #[test]
    fn test_release_and_rescale_are_recorded() {
        let mut renderer = HeadlessRenderer::new(1, 1);
        renderer.rescale(1.5);
        renderer.release();
        assert_eq!(renderer.scale(), 1.5);
        assert!(renderer.is_released());
    }

    #[test]
    fn test_factory_sizes_canvas_to_window() {
        let mut factory = HeadlessRendererFactory::new();
        let renderer = factory.create(9, 300, 200);
        assert_eq!(renderer.canvas_size(), (300, 200));
        assert_eq!(factory.created(), 1);
    }
}
