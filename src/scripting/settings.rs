//! `fov.Settings` userdata
//!
//! Methods and metamethods receive the userdata itself and only take shared
//! borrows: a scan holds one for its whole duration, and callables running
//! inside it must still be able to rebind properties or start nested scans on
//! the same object.

use mlua::{AnyUserData, MetaMethod, MultiValue, UserData, UserDataMethods, UserDataRef, Value};
use std::os::raw::c_int;
use std::rc::Rc;

use super::callable::{self, ActiveScans, LuaSlot, SlotKeys, APPLY_LIGHTING, OPACITY_TEST};
use crate::callback::{ApplyLighting, Callback, OpacityTest};
use crate::consts::{CornerPeek, Direction, OpaqueApply, Shape};
use crate::error::FovError;
use crate::settings::SettingsHandle;

pub struct LuaSettings {
    handle: SettingsHandle<Value>,
    scans: Rc<ActiveScans>,
}

impl LuaSettings {
    pub fn new(handle: SettingsHandle<Value>) -> Self {
        Self {
            handle,
            scans: Rc::new(ActiveScans::default()),
        }
    }

    fn slot(&self, keys: SlotKeys) -> LuaSlot {
        LuaSlot::new(keys, Rc::clone(&self.scans))
    }
}

/// Conversion failures on scan arguments surface as argument errors.
fn bad_args(what: &str, e: mlua::Error) -> mlua::Error {
    mlua::Error::external(FovError::Argument(format!("{what}: {e}")))
}

fn check_arity(what: &str, args: &MultiValue, expected: usize) -> mlua::Result<()> {
    if args.len() != expected {
        return Err(mlua::Error::external(FovError::Argument(format!(
            "{what} takes {expected} arguments ({} given)",
            args.len()
        ))));
    }
    Ok(())
}

fn settings(ud: &AnyUserData) -> mlua::Result<UserDataRef<LuaSettings>> {
    ud.borrow::<LuaSettings>()
}

impl UserData for LuaSettings {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        // s:beam(map, source, x, y, radius, direction, angle)
        methods.add_function("beam", |lua, (ud, args): (AnyUserData, MultiValue)| {
            check_arity("beam", &args, 7)?;
            let (map, source, x, y, radius, direction, angle): (Value, Value, i32, i32, u32, c_int, f32) =
                lua.unpack_multi(args).map_err(|e| bad_args("beam", e))?;
            let direction = Direction::try_from(direction).map_err(mlua::Error::external)?;

            let this = settings(&ud)?;
            let _scan = this.scans.enter(ud.clone());
            this.handle
                .beam(&map, &source, x, y, radius, direction, angle)
                .map_err(mlua::Error::external)
        });

        // s:circle(map, source, x, y, radius)
        methods.add_function("circle", |lua, (ud, args): (AnyUserData, MultiValue)| {
            check_arity("circle", &args, 5)?;
            let (map, source, x, y, radius): (Value, Value, i32, i32, u32) =
                lua.unpack_multi(args).map_err(|e| bad_args("circle", e))?;

            let this = settings(&ud)?;
            let _scan = this.scans.enter(ud.clone());
            this.handle
                .circle(&map, &source, x, y, radius)
                .map_err(mlua::Error::external)
        });

        methods.add_meta_function(MetaMethod::Index, |_, (ud, key): (AnyUserData, String)| {
            let this = settings(&ud)?;
            let h = &this.handle;
            let v = match key.as_str() {
                "opacity_test_function" => callable::bound_value(&ud, OPACITY_TEST)?,
                "apply_lighting_function" => callable::bound_value(&ud, APPLY_LIGHTING)?,
                "shape" => Value::Integer(h.shape() as c_int as _),
                "corner_peek" => Value::Integer(h.corner_peek() as c_int as _),
                "opaque_apply" => Value::Integer(h.opaque_apply() as c_int as _),
                _ => Value::Nil,
            };
            Ok(v)
        });

        methods.add_meta_function(
            MetaMethod::NewIndex,
            |lua, (ud, key, val): (AnyUserData, String, Value)| {
                let this = settings(&ud)?;
                let h = &this.handle;
                match key.as_str() {
                    "opacity_test_function" => {
                        let cb = if callable::bind(lua, &ud, OPACITY_TEST, val)? {
                            let f: Rc<dyn OpacityTest<Value>> = Rc::new(this.slot(OPACITY_TEST));
                            Callback::Bound(f)
                        } else {
                            Callback::Noop
                        };
                        h.set_opacity_test(cb);
                    }
                    "apply_lighting_function" => {
                        let cb = if callable::bind(lua, &ud, APPLY_LIGHTING, val)? {
                            let f: Rc<dyn ApplyLighting<Value>> = Rc::new(this.slot(APPLY_LIGHTING));
                            Callback::Bound(f)
                        } else {
                            Callback::Noop
                        };
                        h.set_apply_lighting(cb);
                    }
                    "shape" => {
                        let shape = Shape::try_from(lua.unpack::<c_int>(val)?).map_err(mlua::Error::external)?;
                        h.set_shape(shape).map_err(mlua::Error::external)?;
                    }
                    "corner_peek" => {
                        let peek = CornerPeek::try_from(lua.unpack::<c_int>(val)?).map_err(mlua::Error::external)?;
                        h.set_corner_peek(peek).map_err(mlua::Error::external)?;
                    }
                    "opaque_apply" => {
                        let apply = OpaqueApply::try_from(lua.unpack::<c_int>(val)?).map_err(mlua::Error::external)?;
                        h.set_opaque_apply(apply).map_err(mlua::Error::external)?;
                    }
                    other => {
                        return Err(mlua::Error::RuntimeError(format!(
                            "fov.Settings has no field '{other}'"
                        )))
                    }
                }
                Ok(())
            },
        );

        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            Ok(format!("{:?}", this.handle))
        });
    }
}
