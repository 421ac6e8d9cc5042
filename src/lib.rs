//! Terminal front-end for a Markdown to PDF conversion service.
//!
//! The core ([`session`], [`poller`], [`service`]) never draws anything; it
//! reports through the [`presenter::Presenter`] port. The TUI ([`app`],
//! [`ui`]) and the one-shot CLI commands are two bindings of that port.

pub mod app;
pub mod config;
pub mod error;
pub mod poller;
pub mod presenter;
pub mod service;
pub mod session;
pub mod status;
pub mod theme;
pub mod ui;

pub use error::ConvertError;
