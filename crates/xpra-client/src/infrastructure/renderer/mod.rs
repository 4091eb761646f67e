//! Surface renderers.
//!
//! The binary runs without a display, so its renderer only tracks canvas
//! state.  A graphical front-end supplies its own
//! [`Renderer`](xpra_core::Renderer) through a
//! [`RendererFactory`](crate::application::RendererFactory).

pub mod headless;
pub mod mock;

pub use headless::{HeadlessRenderer, HeadlessRendererFactory};
