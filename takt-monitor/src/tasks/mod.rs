//! Threads and callbacks that drive the cycle
//!
//! The engine runs on its own thread; edge handlers run on whatever thread
//! the input adapter dispatches from. Both go through the cycle lock.

pub mod edges;
pub mod engine;

pub use edges::{reset_button_handler, start_switch_handler};
pub use engine::{spawn_engine, EngineExit, EngineHandle, ENGINE_THREAD_NAME};
