//! The Surface entity: one remote window or overlay.
//!
//! A [`Surface`] owns its geometry, metadata and the [`Renderer`] that paints
//! it.  It never owns its parent; the parent link is a plain [`Wid`] that the
//! [`SurfaceRegistry`](super::registry::SurfaceRegistry) resolves on demand.

use serde::Serialize;
use tracing::debug;

use crate::protocol::packets::{DrawPacket, Metadata};

/// Server-assigned window identifier.  `0` means "no window".
pub type Wid = u64;

/// A rectangle in canvas pixel space.
///
/// Coordinates are fractional because stale-region clearing divides the new
/// window size by the surface scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// Paints one surface.
///
/// The renderer is the boundary to whatever displays pixels: a browser canvas,
/// a native window, or nothing at all in headless mode.  Decoding of the pixel
/// encodings happens behind this trait.
#[cfg_attr(test, mockall::automock)]
pub trait Renderer: Send {
    /// Paints (or, for `eos`, finalises) one damage region.
    fn draw(&mut self, packet: &DrawPacket);

    /// Blanks `rect` on every canvas the renderer keeps (visible and back buffer).
    fn clear_rect(&mut self, rect: CanvasRect);

    /// Current canvas dimensions in pixels.
    fn canvas_size(&self) -> (u32, u32);

    /// Applies a new display scale factor.
    fn rescale(&mut self, scale: f64);

    /// Releases every resource held for the surface.  Called once when the
    /// server reports the window lost; a bulk registry clear just drops it.
    fn release(&mut self);
}

/// Plain-data view of a surface, attached to outward events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfaceSnapshot {
    pub wid: Wid,
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
    pub scale: Option<f64>,
    pub parent: Option<Wid>,
    pub overlay: bool,
    pub metadata: Metadata,
}

/// One remote window or override-redirect overlay.
pub struct Surface {
    pub wid: Wid,
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
    /// Display scale factor; `None` means 1.
    pub scale: Option<f64>,
    /// Weak link to the parent surface.  Maintained by the registry.
    pub(crate) parent: Option<Wid>,
    /// `true` for override-redirect windows (menus, tooltips).
    pub overlay: bool,
    pub metadata: Metadata,
    /// Client properties delivered with `new-window`.
    pub properties: Metadata,
    renderer: Box<dyn Renderer>,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("wid", &self.wid)
            .field("x", &self.x)
            .field("y", &self.y)
            .field("w", &self.w)
            .field("h", &self.h)
            .field("scale", &self.scale)
            .field("parent", &self.parent)
            .field("overlay", &self.overlay)
            .finish_non_exhaustive()
    }
}

impl Surface {
    /// Creates a top-level (non-overlay) surface with no parent.
    pub fn new(
        wid: Wid,
        (x, y, w, h): (i32, i32, u32, u32),
        metadata: Metadata,
        properties: Metadata,
        renderer: Box<dyn Renderer>,
    ) -> Self {
        Self {
            wid,
            x,
            y,
            w,
            h,
            scale: None,
            parent: None,
            overlay: false,
            metadata,
            properties,
            renderer,
        }
    }

    /// Creates an overlay surface attached to `parent`.
    pub fn new_overlay(
        wid: Wid,
        geometry: (i32, i32, u32, u32),
        metadata: Metadata,
        properties: Metadata,
        parent: Wid,
        renderer: Box<dyn Renderer>,
    ) -> Self {
        let mut surface = Self::new(wid, geometry, metadata, properties, renderer);
        surface.overlay = true;
        surface.parent = Some(parent);
        surface
    }

    /// The parent link as stored.  Use
    /// [`SurfaceRegistry::parent_of`](super::registry::SurfaceRegistry::parent_of)
    /// to get only parents that are still registered.
    pub fn parent(&self) -> Option<Wid> {
        self.parent
    }

    /// Forwards a `draw` or `eos` packet to the renderer.
    pub fn draw(&mut self, packet: &DrawPacket) {
        self.renderer.draw(packet);
    }

    /// Replaces the metadata map wholesale.
    pub fn update_metadata(&mut self, metadata: Metadata) {
        self.metadata = metadata;
    }

    /// Applies a server-side resize.
    ///
    /// The regions right of the new width and below the new height (in canvas
    /// space, i.e. divided by the scale) are blanked before the new size is
    /// stored.  `x` and `y` are left untouched.
    pub fn resize(&mut self, w: u32, h: u32) {
        let scale = self.scale.unwrap_or(1.0);
        let (cw, ch) = self.renderer.canvas_size();
        let (cw, ch) = (f64::from(cw), f64::from(ch));
        let stale = [
            CanvasRect {
                x: f64::from(w) / scale,
                y: 0.0,
                w: cw,
                h: ch,
            },
            CanvasRect {
                x: 0.0,
                y: f64::from(h) / scale,
                w: cw,
                h: ch,
            },
        ];
        for rect in stale {
            self.renderer.clear_rect(rect);
        }
        self.w = w;
        self.h = h;
    }

    /// Stores and applies a new display scale.
    pub fn rescale(&mut self, scale: f64) {
        debug!(wid = self.wid, scale, "rescaling surface");
        self.scale = Some(scale);
        self.renderer.rescale(scale);
    }

    /// Releases the renderer's resources.
    pub fn destroy(&mut self) {
        self.renderer.release();
    }

    /// Returns a plain-data copy suitable for event payloads.
    pub fn snapshot(&self) -> SurfaceSnapshot {
        SurfaceSnapshot {
            wid: self.wid,
            x: self.x,
            y: self.y,
            w: self.w,
            h: self.h,
            scale: self.scale,
            parent: self.parent,
            overlay: self.overlay,
            metadata: self.metadata.clone(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
