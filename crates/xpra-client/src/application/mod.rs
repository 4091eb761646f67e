//! Application layer for the session client.
//!
//! Holds the [`Client`](client::Client) state machine and the traits it talks
//! through.  Nothing here performs I/O or knows about tokio.
//!
//! **Dependency rule**: this layer may depend on `xpra_core`, but MUST NOT
//! import anything from `infrastructure`.
//!
//! # Sub-modules
//!
//! - **`client`** – connection lifecycle, window protocol and input gating.
//! - **`events`** – [`ClientEvent`](events::ClientEvent) and the synchronous
//!   [`EventBus`](events::EventBus).
//! - **`capabilities`** – the `hello` dictionary and screen-size lists.
//! - **`config`** – layered configuration and the visible session state.
//! - **`input`** – local input events and the translator traits.
//! - **`transport`** – the packet transport trait and its events.

pub mod capabilities;
pub mod client;
pub mod config;
pub mod events;
pub mod input;
pub mod transport;

pub use client::{Client, Collaborators, LogLevel, RendererFactory};
pub use config::{ClientConfig, ConfigOverrides, SessionState};
pub use events::{ClientEvent, EventBus, EventKind, SubscriptionId};
pub use transport::{Transport, TransportEvent};
