//! Beam and circle entry points

use std::os::raw::c_void;

use crate::bridge::CallContext;
use crate::consts::Direction;
use crate::error::{FovError, Result};
use crate::settings::SettingsHandle;

impl<H: 'static> SettingsHandle<H> {
    /// Light a cone of `angle` degrees around `direction`, from `(x, y)`.
    ///
    /// `map` is handed to both callables, `source` only to the lighting
    /// callable; neither is inspected here. If a callable fails, the scan
    /// still runs to completion (every remaining cell is answered with the
    /// default) and the first failure is returned as [`FovError::Callback`].
    #[allow(clippy::too_many_arguments)]
    pub fn beam(
        &self,
        map: &H,
        source: &H,
        x: i32,
        y: i32,
        radius: u32,
        direction: Direction,
        angle: f32,
    ) -> Result<()> {
        if !angle.is_finite() {
            return Err(FovError::Argument(format!("beam angle must be finite, got {angle}")));
        }

        self.run_scan(map, "beam", |ctx| unsafe {
            self.engine().beam(
                self.native_ptr(),
                ctx.as_map_ptr(),
                source_ptr(source),
                x,
                y,
                radius,
                direction,
                angle,
            );
        })
    }

    /// Light every visible cell within `radius` of `(x, y)`.
    pub fn circle(&self, map: &H, source: &H, x: i32, y: i32, radius: u32) -> Result<()> {
        self.run_scan(map, "circle", |ctx| unsafe {
            self.engine()
                .circle(self.native_ptr(), ctx.as_map_ptr(), source_ptr(source), x, y, radius);
        })
    }

    fn run_scan<F>(&self, map: &H, what: &str, scan: F) -> Result<()>
    where
        F: FnOnce(&CallContext<'_, H>),
    {
        let ctx = CallContext::new(map, self);
        {
            let _guard = self.enter_scan();
            // SAFETY (inside `scan`): `ctx` and the native block outlive the
            // engine call, and the trampolines in the block were instantiated
            // for this `H`.
            scan(&ctx);
        }

        let invocations = ctx.invocations();
        match ctx.into_failure() {
            Some(err) => {
                tracing::debug!("[fov] [{what}] failed after {invocations} callbacks");
                Err(err)
            }
            None => {
                tracing::debug!("[fov] [{what}] done, {invocations} callbacks");
                Ok(())
            }
        }
    }
}

fn source_ptr<H>(source: &H) -> *mut c_void {
    source as *const H as *mut c_void
}
