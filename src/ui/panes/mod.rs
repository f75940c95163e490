//! TUI pane rendering
//!
//! - [`source`]: the program text with the execution line marked
//! - [`graph`]: struct boxes and pointer arrows
//! - [`status`]: stepper state and keybindings
//! - [`completion`]: the search prompt and its completion popup
//!
//! Each pane exports a `render_*` function taking the [`Theme`] explicitly.
//!
//! [`Theme`]: crate::ui::theme::Theme

pub mod completion;
pub mod graph;
pub mod source;
pub mod status;

pub use completion::render_search_prompt;
pub use graph::{cell_to_graph, render_graph_pane, GraphRenderData};
pub use source::render_source_pane;
pub use status::{render_status_bar, StatusRenderData};
