//! # Core Application Logic
//!
//! This module contains Loupe's browsing logic.
//! It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • Navigator (states)   │
//!                    │  • Message (events)     │
//!                    │  • Action (work)        │
//!                    │                         │
//!                    │  No terminal. No HTTP.  │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │    TUI     │      │    CLI     │      │  Service   │
//!     │  Adapter   │      │ one-shot   │      │  (HTTP)    │
//!     │ (ratatui)  │      │ commands   │      │            │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`navigation`]: The three-level state machine and its effects
//! - [`actions`]: `Action`, `Message` and the tags that keep them apart
//! - [`bridge`]: Paced hand-off from a paging worker thread
//! - [`backoff`]: Poll cadence shared by follow mode and the detail view
//! - [`model`]: Groups, streams, events and cursors
//! - [`reference`]: Single-line stream references for piping
//! - [`config`]: Layered settings

pub mod actions;
pub mod backoff;
pub mod bridge;
pub mod component;
pub mod config;
pub mod keys;
pub mod model;
pub mod navigation;
pub mod reference;
