//! Lua values bound as opacity tests / lighting handlers.
//!
//! The bound values are stored as named user values of the `fov.Settings`
//! userdata, where the Lua collector can trace them; a callable capturing its
//! own settings object is an ordinary Lua cycle. Rust keeps only a
//! [`LuaSlot`], which knows which user value to call and finds the userdata
//! through the scans running on it.

use std::cell::RefCell;
use std::rc::Rc;

use mlua::{AnyUserData, Function, Lua, Table, Value};

use crate::callback::{ApplyLighting, OpacityTest};

/// User value names backing one callable property.
#[derive(Debug, Clone, Copy)]
pub struct SlotKeys {
    /// The value exactly as assigned, returned by the property getter.
    pub property: &'static str,
    /// The function invoked for it (the value itself, or a wrapper around a
    /// `__call` object).
    call: &'static str,
}

pub const OPACITY_TEST: SlotKeys = SlotKeys {
    property: "opacity_test_function",
    call: "opacity_test_function.call",
};

pub const APPLY_LIGHTING: SlotKeys = SlotKeys {
    property: "apply_lighting_function",
    call: "apply_lighting_function.call",
};

/// Userdata of the scans currently running on one settings object,
/// innermost last. Empty whenever no scan is in progress.
#[derive(Default)]
pub struct ActiveScans(RefCell<Vec<AnyUserData>>);

impl ActiveScans {
    pub fn enter(&self, ud: AnyUserData) -> ActiveScan<'_> {
        self.0.borrow_mut().push(ud);
        ActiveScan { scans: self }
    }

    fn current(&self) -> Option<AnyUserData> {
        self.0.borrow().last().cloned()
    }
}

/// Drops the userdata reference taken by [`ActiveScans::enter`].
pub struct ActiveScan<'a> {
    scans: &'a ActiveScans,
}

impl Drop for ActiveScan<'_> {
    fn drop(&mut self) {
        self.scans.0.borrow_mut().pop();
    }
}

/// Validate `value` and store it on `ud` under `keys`.
///
/// Accepts `nil` (unbinds), functions, and tables or userdata whose
/// metatable has `__call`. Returns whether a callable is now bound. A
/// rejected value leaves the previous binding in place.
pub fn bind(lua: &Lua, ud: &AnyUserData, keys: SlotKeys, value: Value) -> mlua::Result<bool> {
    let func = match &value {
        Value::Nil => None,
        Value::Function(f) => Some(f.clone()),
        Value::Table(t) if table_has_call(t) => Some(wrap_call(lua, &value)?),
        Value::UserData(u) if userdata_has_call(u) => Some(wrap_call(lua, &value)?),
        other => {
            return Err(mlua::Error::RuntimeError(format!(
                "Invalid argument: expected a function or callable object, got {}",
                other.type_name()
            )))
        }
    };
    let bound = func.is_some();
    ud.set_named_user_value(keys.call, func)?;
    ud.set_named_user_value(keys.property, value)?;
    Ok(bound)
}

/// The value assigned to the property, `nil` when unbound.
pub fn bound_value(ud: &AnyUserData, keys: SlotKeys) -> mlua::Result<Value> {
    ud.named_user_value(keys.property)
}

fn table_has_call(t: &Table) -> bool {
    t.metatable()
        .map(|mt| !matches!(mt.raw_get::<Value>("__call"), Ok(Value::Nil) | Err(_)))
        .unwrap_or(false)
}

fn userdata_has_call(u: &AnyUserData) -> bool {
    u.metatable()
        .and_then(|mt| mt.contains("__call"))
        .unwrap_or(false)
}

fn wrap_call(lua: &Lua, obj: &Value) -> mlua::Result<Function> {
    // `obj(...)` goes through __call with obj as first argument.
    lua.load("local obj = ...\nreturn function(...) return obj(...) end")
        .set_name("=fov.callable")
        .call(obj.clone())
}

/// Dispatches to whatever callable is stored under `keys` on the settings
/// object being scanned.
pub struct LuaSlot {
    keys: SlotKeys,
    scans: Rc<ActiveScans>,
}

impl LuaSlot {
    pub fn new(keys: SlotKeys, scans: Rc<ActiveScans>) -> Self {
        Self { keys, scans }
    }

    fn function(&self) -> anyhow::Result<Function> {
        let ud = self
            .scans
            .current()
            .ok_or_else(|| anyhow::anyhow!("{} invoked outside of a scan", self.keys.property))?;
        ud.named_user_value(self.keys.call).map_err(lua_failure)
    }
}

fn lua_failure(e: mlua::Error) -> anyhow::Error {
    anyhow::anyhow!("{e}")
}

impl OpacityTest<Value> for LuaSlot {
    /// Lua truthiness: anything but `nil` and `false` is opaque.
    fn is_opaque(&self, map: &Value, x: i32, y: i32) -> anyhow::Result<bool> {
        // The cloned argument values are released when the call returns,
        // on success and on error alike.
        self.function()?
            .call::<bool>((map.clone(), x, y))
            .map_err(lua_failure)
    }
}

impl ApplyLighting<Value> for LuaSlot {
    fn apply(&self, map: &Value, x: i32, y: i32, dx: i32, dy: i32, source: &Value) -> anyhow::Result<()> {
        self.function()?
            .call::<()>((map.clone(), x, y, dx, dy, source.clone()))
            .map_err(lua_failure)
    }
}
