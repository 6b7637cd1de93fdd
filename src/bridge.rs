//! Trampolines wired into the engine's callback slots
//!
//! The engine calls back through plain C function pointers with an untyped
//! `void *map`. Every scan passes a pointer to a stack-allocated
//! [`CallContext`] in place of the caller's map; the trampolines cast it back
//! and route the call to whatever callable is bound *now*.
//!
//! Nothing may unwind into the engine frame. A callable that returns `Err` or
//! panics latches the context as failed and the trampoline answers with the
//! default (`false` / nothing); the scan itself keeps running to completion
//! and the failure is reported once the engine returns.

use std::cell::{Cell, RefCell};
use std::os::raw::{c_int, c_void};
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::error::{BoxError, CallbackKind, FovError};
use crate::settings::SettingsHandle;

/// Per-call state smuggled through the engine's `map` parameter.
///
/// Lives on the stack of exactly one `beam`/`circle` call. A nested scan
/// started from inside a callable gets its own context.
pub(crate) struct CallContext<'a, H: 'static> {
    origin_map: &'a H,
    settings: &'a SettingsHandle<H>,
    failed: Cell<bool>,
    failure: RefCell<Option<FovError>>,
    invocations: Cell<u64>,
}

impl<'a, H: 'static> CallContext<'a, H> {
    pub(crate) fn new(origin_map: &'a H, settings: &'a SettingsHandle<H>) -> Self {
        Self {
            origin_map,
            settings,
            failed: Cell::new(false),
            failure: RefCell::new(None),
            invocations: Cell::new(0),
        }
    }

    /// Erase to the engine's opaque map pointer.
    pub(crate) fn as_map_ptr(&self) -> *mut c_void {
        self as *const Self as *mut c_void
    }

    #[cfg(test)]
    pub(crate) fn has_failed(&self) -> bool {
        self.failed.get()
    }

    pub(crate) fn invocations(&self) -> u64 {
        self.invocations.get()
    }

    /// Consume the context, yielding the first latched failure if any.
    pub(crate) fn into_failure(self) -> Option<FovError> {
        self.failure.into_inner()
    }

    /// One-way: the first failure is kept, later ones are only logged.
    fn latch(&self, kind: CallbackKind, x: i32, y: i32, source: BoxError) {
        if self.failed.replace(true) {
            tracing::debug!("[fov] [callback] suppressed {kind} failure at ({x}, {y}): {source}");
            return;
        }
        tracing::warn!("[fov] [callback] {kind} failed at ({x}, {y}): {source}");
        *self.failure.borrow_mut() = Some(FovError::Callback { kind, x, y, source });
    }
}

/// Convert a caught panic payload into an error value.
fn panic_error(payload: Box<dyn std::any::Any + Send>) -> BoxError {
    let msg = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    format!("callable panicked: {msg}").into()
}

/// Installed as `NativeSettings::opacity_test`.
///
/// # Safety
/// `map` must point at a live `CallContext<H>` for the same `H` this
/// trampoline was instantiated with.
pub(crate) unsafe extern "C" fn opacity_trampoline<H: 'static>(
    map: *mut c_void,
    x: c_int,
    y: c_int,
) -> bool {
    let ctx = &*(map as *const CallContext<'_, H>);
    ctx.invocations.set(ctx.invocations.get() + 1);

    // Short borrow of the slot; the clone keeps the callable alive even if it
    // rebinds the slot while running.
    let Some(test) = ctx.settings.current_opacity_test() else {
        return false;
    };
    tracing::trace!("[fov] [opacity] ({x}, {y})");

    match catch_unwind(AssertUnwindSafe(|| test.is_opaque(ctx.origin_map, x, y))) {
        Ok(Ok(opaque)) => opaque,
        Ok(Err(e)) => {
            ctx.latch(CallbackKind::OpacityTest, x, y, e.into());
            false
        }
        Err(payload) => {
            ctx.latch(CallbackKind::OpacityTest, x, y, panic_error(payload));
            false
        }
    }
}

/// Installed as `NativeSettings::apply_lighting`.
///
/// # Safety
/// `map` must point at a live `CallContext<H>` and `src` at a live `H`.
pub(crate) unsafe extern "C" fn lighting_trampoline<H: 'static>(
    map: *mut c_void,
    x: c_int,
    y: c_int,
    dx: c_int,
    dy: c_int,
    src: *mut c_void,
) {
    let ctx = &*(map as *const CallContext<'_, H>);
    ctx.invocations.set(ctx.invocations.get() + 1);

    let Some(apply) = ctx.settings.current_apply_lighting() else {
        return;
    };
    let source = &*(src as *const H);
    tracing::trace!("[fov] [lighting] ({x}, {y}) delta ({dx}, {dy})");

    match catch_unwind(AssertUnwindSafe(|| apply.apply(ctx.origin_map, x, y, dx, dy, source))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => ctx.latch(CallbackKind::ApplyLighting, x, y, e.into()),
        Err(payload) => ctx.latch(CallbackKind::ApplyLighting, x, y, panic_error(payload)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use crate::callback::{ApplyLighting, Callback, OpacityTest};
    use crate::engine::{NativeSettings, VisibilityEngine};
    use crate::consts::Direction;
    use std::os::raw::c_uint;

    struct NullEngine;

    impl VisibilityEngine for NullEngine {
        unsafe fn beam(
            &self,
            _: *mut NativeSettings,
            _: *mut c_void,
            _: *mut c_void,
            _: c_int,
            _: c_int,
            _: c_uint,
            _: Direction,
            _: f32,
        ) {
        }

        unsafe fn circle(
            &self,
            _: *mut NativeSettings,
            _: *mut c_void,
            _: *mut c_void,
            _: c_int,
            _: c_int,
            _: c_uint,
        ) {
        }
    }

    fn settings() -> SettingsHandle<i32> {
        SettingsHandle::new(Rc::new(NullEngine))
    }

    #[test]
    fn noop_opacity_answers_false_without_latching() {
        let settings = settings();
        let map = 0;
        let ctx = CallContext::new(&map, &settings);

        let opaque = unsafe { opacity_trampoline::<i32>(ctx.as_map_ptr(), 1, 2) };
        assert!(!opaque);
        assert!(!ctx.has_failed());
        assert_eq!(ctx.invocations(), 1);
    }

    #[test]
    fn bound_opacity_sees_origin_map() {
        let settings = settings();
        settings.set_opacity_test(Callback::<dyn OpacityTest<i32>>::opacity(|map, x, y| {
            Ok(*map == x * 10 + y)
        }));
        let map = 12;
        let ctx = CallContext::new(&map, &settings);

        assert!(unsafe { opacity_trampoline::<i32>(ctx.as_map_ptr(), 1, 2) });
        assert!(!unsafe { opacity_trampoline::<i32>(ctx.as_map_ptr(), 2, 1) });
        assert!(!ctx.has_failed());
    }

    #[test]
    fn first_failure_is_kept() {
        let settings = settings();
        settings.set_opacity_test(Callback::<dyn OpacityTest<i32>>::opacity(|_, x, _| {
            anyhow::bail!("bad cell {x}")
        }));
        let map = 0;
        let ctx = CallContext::new(&map, &settings);

        for x in 0..3 {
            assert!(!unsafe { opacity_trampoline::<i32>(ctx.as_map_ptr(), x, 0) });
        }
        assert!(ctx.has_failed());
        assert_eq!(ctx.invocations(), 3);

        match ctx.into_failure() {
            Some(FovError::Callback { kind, x, y, source }) => {
                assert_eq!(kind, CallbackKind::OpacityTest);
                assert_eq!((x, y), (0, 0));
                assert!(source.to_string().contains("bad cell 0"));
            }
            other => panic!("expected callback error, got {other:?}"),
        }
    }

    #[test]
    fn panics_are_latched_not_propagated() {
        let settings = settings();
        settings.set_apply_lighting(Callback::<dyn ApplyLighting<i32>>::lighting(
            |_, _, _, _, _, _| panic!("lighting exploded"),
        ));
        let map = 0;
        let src = 7;
        let ctx = CallContext::new(&map, &settings);

        unsafe {
            lighting_trampoline::<i32>(ctx.as_map_ptr(), 0, 0, 0, 0, &src as *const i32 as *mut c_void);
        }
        assert!(ctx.has_failed());
        let err = ctx.into_failure().unwrap();
        assert!(err.to_string().contains("lighting exploded"));
    }

    #[test]
    fn lighting_receives_source_handle() {
        let settings = settings();
        let seen = Rc::new(Cell::new(0));
        let sink = Rc::clone(&seen);
        settings.set_apply_lighting(Callback::<dyn ApplyLighting<i32>>::lighting(
            move |map, x, y, dx, dy, src| {
                sink.set(map + x + y + dx + dy + src);
                Ok(())
            },
        ));
        let map = 1000;
        let src = 5;
        let ctx = CallContext::new(&map, &settings);

        unsafe {
            lighting_trampoline::<i32>(ctx.as_map_ptr(), 1, 2, 3, 4, &src as *const i32 as *mut c_void);
        }
        assert_eq!(seen.get(), 1015);
        assert!(!ctx.has_failed());
    }
}
