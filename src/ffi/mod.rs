//! FFI (Foreign Function Interface) layer
//!
//! Bindings to the native engine. Everything here is compiled only when the
//! C library is available to link against.

#[cfg(feature = "libfov")]
pub mod libfov;
