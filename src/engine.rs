//! Native engine contract
//!
//! The visibility engine (libfov) is generic over an opaque `void *map` and
//! `void *src`: it never looks at either, it only hands them back to the two
//! callbacks stored in its settings block. [`NativeSettings`] matches
//! `fov_settings_type` field for field so the same block can be passed to
//! the C library unchanged.

use std::os::raw::{c_int, c_uint, c_void};

use crate::consts::{CornerPeek, Direction, OpaqueApply, Shape};

/// `bool (*opaque)(void *map, int x, int y)`
pub type OpacityTestFn = unsafe extern "C" fn(map: *mut c_void, x: c_int, y: c_int) -> bool;

/// `void (*apply)(void *map, int x, int y, int dx, int dy, void *src)`
pub type ApplyLightingFn = unsafe extern "C" fn(
    map: *mut c_void,
    x: c_int,
    y: c_int,
    dx: c_int,
    dy: c_int,
    src: *mut c_void,
);

/// Raw settings block shared with the engine
///
/// This matches the C struct exactly due to #[repr(C)]
#[repr(C)]
#[derive(Debug)]
pub struct NativeSettings {
    pub shape: Shape,
    pub corner_peek: CornerPeek,
    pub opaque_apply: OpaqueApply,
    pub opacity_test: Option<OpacityTestFn>,
    pub apply_lighting: Option<ApplyLightingFn>,
    /// Height tables cached by `SHAPE_CIRCLE_PRECALCULATE`; owned by the engine.
    pub heights: *mut *mut c_uint,
    pub numheights: c_uint,
}

impl Default for NativeSettings {
    /// Same values `fov_settings_init` writes.
    fn default() -> Self {
        Self {
            shape: Shape::CirclePrecalculate,
            corner_peek: CornerPeek::NoPeek,
            opaque_apply: OpaqueApply::Apply,
            opacity_test: None,
            apply_lighting: None,
            heights: std::ptr::null_mut(),
            numheights: 0,
        }
    }
}

/// A beam/circle scanner driven through [`NativeSettings`] callbacks.
///
/// Implementations must call back only through the function pointers in the
/// settings block, forwarding `map` and `src` unmodified, and must return
/// only once the scan is complete. Call order and count are theirs to pick.
pub trait VisibilityEngine {
    /// Reset a settings block to engine defaults.
    fn init(&self, settings: &mut NativeSettings) {
        *settings = NativeSettings::default();
    }

    /// Release anything the engine cached inside the settings block.
    fn free(&self, _settings: &mut NativeSettings) {}

    /// # Safety
    /// `settings` must be valid for the whole call and its callback slots
    /// must accept `map` and `src` as passed.
    #[allow(clippy::too_many_arguments)]
    unsafe fn beam(
        &self,
        settings: *mut NativeSettings,
        map: *mut c_void,
        src: *mut c_void,
        x: c_int,
        y: c_int,
        radius: c_uint,
        direction: Direction,
        angle: f32,
    );

    /// # Safety
    /// Same contract as [`VisibilityEngine::beam`].
    unsafe fn circle(
        &self,
        settings: *mut NativeSettings,
        map: *mut c_void,
        src: *mut c_void,
        x: c_int,
        y: c_int,
        radius: c_uint,
    );
}
