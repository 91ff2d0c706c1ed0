//! `pdf12step` - Printable meeting directories from 12 Step Meeting List sites
//!
//! This library downloads meeting listings from a WordPress site running the
//! 12 Step Meeting List plugin, groups and filters them, and renders a
//! printable HTML directory through minijinja templates.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod meetings;
pub mod render;

pub use client::{Client, Format};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use meetings::{Meeting, MeetingSet, Value};
pub use render::{Context, RenderOptions};
