//! FFI imports for libfov
//!
//! `fov.h` declares the settings block and the two scan functions. The
//! settings pointer is non-const on the C side because
//! `FOV_SHAPE_CIRCLE_PRECALCULATE` caches height tables inside it.

use std::os::raw::{c_int, c_uint, c_void};

use crate::consts::Direction;
use crate::engine::{NativeSettings, VisibilityEngine};

#[link(name = "fov")]
extern "C" {
    /// Fill a settings block with library defaults (no callbacks set)
    pub fn fov_settings_init(settings: *mut NativeSettings);

    /// Free the height tables cached by the precalculated circle shape
    pub fn fov_settings_free(settings: *mut NativeSettings);

    pub fn fov_circle(
        settings: *mut NativeSettings,
        map: *mut c_void,
        source: *mut c_void,
        source_x: c_int,
        source_y: c_int,
        radius: c_uint,
    );

    pub fn fov_beam(
        settings: *mut NativeSettings,
        map: *mut c_void,
        source: *mut c_void,
        source_x: c_int,
        source_y: c_int,
        radius: c_uint,
        direction: Direction,
        angle: f32,
    );
}

/// The C shadow-casting engine
#[derive(Debug, Default, Clone, Copy)]
pub struct LibFov;

impl VisibilityEngine for LibFov {
    fn init(&self, settings: &mut NativeSettings) {
        // SAFETY: `settings` is a live, exclusively borrowed block with the
        // `fov_settings_type` layout; init only writes its fields.
        unsafe { fov_settings_init(settings) }
    }

    fn free(&self, settings: &mut NativeSettings) {
        // SAFETY: the block was filled by `fov_settings_init` and no scan can
        // hold it while it is exclusively borrowed here.
        unsafe { fov_settings_free(settings) }
    }

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
    ) {
        fov_beam(settings, map, src, x, y, radius, direction, angle)
    }

    unsafe fn circle(
        &self,
        settings: *mut NativeSettings,
        map: *mut c_void,
        src: *mut c_void,
        x: c_int,
        y: c_int,
        radius: c_uint,
    ) {
        fov_circle(settings, map, src, x, y, radius)
    }
}
