// dropwire - binding layer for searchable, remotely-populated select widgets
//
// Turns a plain selection control into a searchable dropdown and keeps it
// synchronized with an external reactive data store. The crate is headless:
// rendering, the UI toolkit, and the reactive store are collaborators the
// host application plugs in behind traits.
//
// Architecture:
// - Lifecycle controller: idempotent destroy-then-create per control
// - Instance registry: at most one live widget instance per control id
// - Remote query adapter (reqwest): debounced, paginated search protocol
// - Selection binder: one sink write per user-driven value change
// - Refresh bus (tokio broadcast): re-initializes registered controls when
//   the upstream data set changes

//! Headless controller for searchable select widgets backed by a paginated
//! remote search endpoint or a static option list.
//!
//! The host application implements two traits and drives everything through
//! handles:
//!
//! ```text
//! WidgetHost (your UI layer)          StateSink (your reactive store)
//!      ▲   │ user events                      ▲
//!      │   ▼                                  │ set(key, value)
//! SelectController ── initialize(config) ──► WidgetInstance
//!      │                                      │
//!      │ RefreshBus ("data changed")          │ OptionSource
//!      └── re-initialize registered controls  └── RemoteSource | StaticSource
//! ```
//!
//! `initialize` is idempotent: calling it again for the same control id
//! destroys the prior instance first, so hooks are never duplicated. Search
//! input is debounced (250 ms by default) and responses are tagged with
//! monotonically increasing sequence numbers, so an out-of-order or
//! superseded response is discarded instead of regressing the rendered
//! result set.

pub mod binder;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod options;
pub mod refresh;
pub mod registry;
pub mod remote;
pub mod source;
pub mod widget;

pub use binder::{SelectionBinder, StateSink};
pub use config::{SelectConfig, DEFAULT_DEBOUNCE_MS};
pub use controller::{SelectController, SelectHandle};
pub use error::SelectError;
pub use events::SelectEvent;
pub use options::{OptionItem, SearchPage, SearchRequest};
pub use refresh::RefreshBus;
pub use remote::RemoteSource;
pub use source::{OptionSource, StaticSource};
pub use widget::{DropdownParent, WidgetHost, WidgetOptions};
