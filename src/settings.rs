//! Settings handle: the native settings block plus two rebindable callables
//!
//! The native callback slots are written once, in [`SettingsHandle::new`],
//! and point at the bridge trampolines for the handle's whole life. Which
//! callable actually runs is decided per invocation by reading the slots
//! below through the call context, so rebinding never touches the engine.

use std::cell::{Cell, RefCell, UnsafeCell};
use std::fmt;
use std::rc::Rc;

use crate::bridge;
use crate::callback::{ApplyLighting, Callback, OpacityTest};
use crate::config::FovConfig;
use crate::consts::{CornerPeek, OpaqueApply, Shape};
use crate::engine::{NativeSettings, VisibilityEngine};
use crate::error::{FovError, Result};

/// Owns one engine settings block and the callables bound to it.
///
/// `H` is the caller's map/source handle type. The engine never interprets
/// handles; they are only handed back to the callables by reference.
///
/// The handle is `!Sync` and `!Send`: every scan and every callable runs on
/// the thread that owns it. Scans may nest (a callable may scan again) and a
/// callable may rebind either slot mid-scan; the next invocation sees the new
/// binding.
pub struct SettingsHandle<H: 'static> {
    native: UnsafeCell<NativeSettings>,
    engine: Rc<dyn VisibilityEngine>,
    opacity_test: RefCell<Callback<dyn OpacityTest<H>>>,
    apply_lighting: RefCell<Callback<dyn ApplyLighting<H>>>,
    /// Number of scans currently running on this handle (nested scans included).
    depth: Cell<u32>,
}

impl<H: 'static> SettingsHandle<H> {
    pub fn new(engine: Rc<dyn VisibilityEngine>) -> Self {
        let mut native = NativeSettings::default();
        engine.init(&mut native);

        // Fixed for the lifetime of the handle.
        native.opacity_test = Some(bridge::opacity_trampoline::<H>);
        native.apply_lighting = Some(bridge::lighting_trampoline::<H>);

        Self {
            native: UnsafeCell::new(native),
            engine,
            opacity_test: RefCell::new(Callback::Noop),
            apply_lighting: RefCell::new(Callback::Noop),
            depth: Cell::new(0),
        }
    }

    /// Create a handle and apply the engine defaults from `config`.
    pub fn with_config(engine: Rc<dyn VisibilityEngine>, config: &FovConfig) -> Result<Self> {
        let settings = Self::new(engine);
        settings.set_shape(config.shape)?;
        settings.set_corner_peek(config.corner_peek)?;
        settings.set_opaque_apply(config.opaque_apply)?;
        Ok(settings)
    }

    // ============================================
    // Callables
    // ============================================

    pub fn opacity_test(&self) -> Callback<dyn OpacityTest<H>> {
        self.opacity_test.borrow().clone()
    }

    /// Bind a new opacity test, returning the previous one.
    ///
    /// Allowed at any time, including from inside a running callable.
    pub fn set_opacity_test(&self, f: Callback<dyn OpacityTest<H>>) -> Callback<dyn OpacityTest<H>> {
        self.opacity_test.replace(f)
    }

    pub fn apply_lighting(&self) -> Callback<dyn ApplyLighting<H>> {
        self.apply_lighting.borrow().clone()
    }

    /// Bind a new lighting handler, returning the previous one.
    pub fn set_apply_lighting(
        &self,
        f: Callback<dyn ApplyLighting<H>>,
    ) -> Callback<dyn ApplyLighting<H>> {
        self.apply_lighting.replace(f)
    }

    // ============================================
    // Engine settings
    // ============================================

    pub fn shape(&self) -> Shape {
        self.native_ref().shape
    }

    pub fn set_shape(&self, shape: Shape) -> Result<()> {
        self.native_mut()?.shape = shape;
        Ok(())
    }

    pub fn corner_peek(&self) -> CornerPeek {
        self.native_ref().corner_peek
    }

    pub fn set_corner_peek(&self, corner_peek: CornerPeek) -> Result<()> {
        self.native_mut()?.corner_peek = corner_peek;
        Ok(())
    }

    pub fn opaque_apply(&self) -> OpaqueApply {
        self.native_ref().opaque_apply
    }

    pub fn set_opaque_apply(&self, opaque_apply: OpaqueApply) -> Result<()> {
        self.native_mut()?.opaque_apply = opaque_apply;
        Ok(())
    }

    /// True while at least one scan on this handle has not returned yet.
    pub fn is_scanning(&self) -> bool {
        self.depth.get() > 0
    }

    // ============================================
    // Crate internals used by the scan entry points and the trampolines
    // ============================================

    pub(crate) fn engine(&self) -> &dyn VisibilityEngine {
        self.engine.as_ref()
    }

    pub(crate) fn native_ptr(&self) -> *mut NativeSettings {
        self.native.get()
    }

    pub(crate) fn current_opacity_test(&self) -> Option<Rc<dyn OpacityTest<H>>> {
        self.opacity_test.borrow().as_bound().cloned()
    }

    pub(crate) fn current_apply_lighting(&self) -> Option<Rc<dyn ApplyLighting<H>>> {
        self.apply_lighting.borrow().as_bound().cloned()
    }

    pub(crate) fn enter_scan(&self) -> ScanGuard<'_, H> {
        self.depth.set(self.depth.get() + 1);
        ScanGuard { settings: self }
    }

    fn native_ref(&self) -> &NativeSettings {
        // SAFETY: the engine only writes the height cache during a scan; the
        // enum fields read here are never written by it.
        unsafe { &*self.native.get() }
    }

    fn native_mut(&self) -> Result<&mut NativeSettings> {
        if self.is_scanning() {
            return Err(FovError::ScanInFlight);
        }
        // SAFETY: no scan is running, so the engine holds no pointer into
        // the block, and the returned borrow ends before any scan can start.
        Ok(unsafe { &mut *self.native.get() })
    }
}

impl<H: 'static> Drop for SettingsHandle<H> {
    fn drop(&mut self) {
        // Native block first; the callables are released with the fields.
        self.engine.free(self.native.get_mut());
    }
}

impl<H: 'static> fmt::Debug for SettingsHandle<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsHandle")
            .field("shape", &self.shape())
            .field("corner_peek", &self.corner_peek())
            .field("opaque_apply", &self.opaque_apply())
            .field("opacity_test", &*self.opacity_test.borrow())
            .field("apply_lighting", &*self.apply_lighting.borrow())
            .field("depth", &self.depth.get())
            .finish()
    }
}

/// Marks a scan as in flight until dropped.
pub(crate) struct ScanGuard<'a, H: 'static> {
    settings: &'a SettingsHandle<H>,
}

impl<H: 'static> Drop for ScanGuard<'_, H> {
    fn drop(&mut self) {
        let depth = &self.settings.depth;
        depth.set(depth.get() - 1);
    }
}
