//! Domain entities for the session client.
//!
//! This module contains pure state with no infrastructure dependencies: the
//! [`surface::Surface`] entity and the [`registry::SurfaceRegistry`] that owns
//! every live surface.
//!
//! # Who owns what? (for beginners)
//!
//! A popup menu on the remote desktop is an "overlay" that belongs to some
//! top-level window.  It is tempting to give each surface a pointer to its
//! parent, but then a parent could be freed while a child still points at it.
//!
//! Instead, the registry owns every surface by window id (`wid`), and a child
//! only stores its parent's `wid`.  Looking up a parent that has already been
//! removed simply returns `None`, and the child behaves as a root from then on.

/// Remote window entity and the renderer seam it paints through.
pub mod surface;

/// `wid → Surface` map with parent/root resolution.
pub mod registry;
