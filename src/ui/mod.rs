//! Terminal user interface built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! - **[`app`]**: application state, event loop, pane focus, selection
//! - **[`panes`]**: render functions for the source, graph and status panes
//! - **[`search`]**: the symbol search prompt with completion
//! - **[`theme`]**: colour palettes, handed to each pane explicitly
//!
//! Construct an [`App`] from a [`Session`] and call [`App::run`].
//!
//! [`Session`]: crate::session::Session
//! [`App::run`]: app::App::run

pub mod app;
pub mod panes;
pub mod search;
pub mod theme;

pub use app::App;
pub use theme::Theme;
