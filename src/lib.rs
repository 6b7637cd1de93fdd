//! fov - callback bridge for libfov
//!
//! Lets Rust closures and Lua functions act as the opacity test and lighting
//! callbacks of the libfov shadow-casting engine.
//! The engine only knows two C function pointers and an opaque `void *map`;
//! this crate owns the callables, routes every engine callback to the one
//! bound at that moment, and turns failures inside a callable into an error
//! returned once the scan is over.

// ============================================
// Core Modules (Pure Rust)
// ============================================

/// Callable traits and the callback slot value
pub mod callback;
/// Bridge configuration (replaces hard-coded engine defaults)
pub mod config;
/// libfov enumerations and the exported constant table
pub mod consts;
/// Native engine contract and settings block layout
pub mod engine;
/// Error types
pub mod error;
/// Settings handle (native block + bound callables)
pub mod settings;

mod bridge;
mod scan;

// ============================================
// Host bindings
// ============================================

/// Lua `fov` module
pub mod scripting;

// ============================================
// FFI Layer
// ============================================

/// libfov imports (feature `libfov`)
pub mod ffi;

pub use callback::{ApplyLighting, Callback, OpacityTest};
pub use consts::{CornerPeek, Direction, OpaqueApply, Shape};
pub use engine::{NativeSettings, VisibilityEngine};
pub use error::{CallbackKind, FovError};
pub use settings::SettingsHandle;
