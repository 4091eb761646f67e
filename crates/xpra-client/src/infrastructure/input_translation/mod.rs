//! DOM input → Xpra packet translation.
//!
//! Both translators are stateless apart from what the protocol requires; they
//! are the default [`KeyboardTranslator`](crate::application::input::KeyboardTranslator)
//! and [`MouseTranslator`](crate::application::input::MouseTranslator).

pub mod keyboard;
pub mod mouse;

pub use keyboard::XpraKeyboard;
pub use mouse::XpraMouse;
