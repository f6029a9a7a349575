//! # TUI Components
//!
//! This module contains all UI components for the terminal interface.
//!
//! ## Component Architecture
//!
//! Components in this directory follow two patterns:
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Simple display components that receive all data as parameters:
//! - `TitleBar`: Top bar with the breadcrumb and status
//! - `StatusBar`: Bottom line with key hints and scroll position
//!
//! ### Stateful Components (Persistent State + Transient View)
//!
//! The state lives in the navigator and implements a core view contract;
//! a short-lived view borrows it to draw each frame:
//! - `ListPane` / `ListPaneView`: filterable selector list (`SelectorList`)
//! - `LogViewer` / `LogViewerView`: scrollable event text (`TextViewer`)
//!
//! ## Module Structure
//!
//! ```text
//! components/
//! ├── mod.rs         (this file)
//! ├── title_bar.rs   (Top and bottom bars)
//! ├── list_pane.rs   (Groups and streams)
//! └── log_viewer.rs  (Events of one stream)
//! ```

pub mod list_pane;
pub mod log_viewer;
mod title_bar;

pub use list_pane::{ListPane, ListPaneView};
pub use log_viewer::{LogViewer, LogViewerView};
pub use title_bar::{StatusBar, TitleBar};
