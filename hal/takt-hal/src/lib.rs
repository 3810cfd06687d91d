//! Takt Hardware Abstraction Layer
//!
//! This crate defines the traits a platform adapter implements so that the
//! cycle monitor can run on different input backends (sysfs GPIO on a
//! Raspberry Pi, a simulated line bank in tests, ...).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (takt-monitor)             │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  takt-hal (this crate - traits)         │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  takt-hal-    │       │  takt-hal-    │
//! │    sysfs      │       │     sim       │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::InputPin`] - A single digital input
//! - [`gpio::DigitalInputs`] - A bank of digital inputs addressed by line number
//! - [`edge::EdgeNotifier`] - Rising-edge notification with upstream debounce

#![deny(unsafe_code)]

pub mod edge;
pub mod gpio;

// Re-export key traits at crate root for convenience
pub use edge::{EdgeError, EdgeEvent, EdgeHandler, EdgeNotifier};
pub use gpio::{DigitalInputs, InputPin, Line};
