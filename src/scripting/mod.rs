//! Lua bindings: the `fov` module.
//!
//! ```lua
//! local s = fov.Settings()
//! s.opaque_apply = fov.OPAQUE_NOAPPLY
//! s.opacity_test_function = function(map, x, y)
//!     return x < 0 or x > 5 or y < 0 or y > 5
//! end
//! s:circle(nil, nil, 4, 4, 3)
//! ```
//!
//! Maps and sources are arbitrary Lua values handed back to the callables
//! untouched.

pub mod callable;
pub mod settings;

use mlua::{Lua, Table};
use std::rc::Rc;

use crate::config::FovConfig;
use crate::consts::CONSTANTS;
use crate::engine::VisibilityEngine;
use crate::settings::SettingsHandle;
use settings::LuaSettings;

/// Build the `fov` module table, publish it as the global `fov` and in
/// `package.loaded`, and return it.
///
/// Every `fov.Settings()` created from it scans with `engine` and starts
/// from the engine defaults in `config`.
pub fn register(lua: &Lua, engine: Rc<dyn VisibilityEngine>, config: &FovConfig) -> mlua::Result<Table> {
    let module = lua.create_table()?;

    for (name, value) in CONSTANTS {
        module.set(*name, *value)?;
    }

    let config = config.clone();
    module.set(
        "Settings",
        lua.create_function(move |_, ()| {
            let handle = SettingsHandle::with_config(Rc::clone(&engine), &config)
                .map_err(mlua::Error::external)?;
            Ok(LuaSettings::new(handle))
        })?,
    )?;

    let g = lua.globals();
    g.set("fov", module.clone())?;
    if let Ok(package) = g.get::<Table>("package") {
        package.get::<Table>("loaded")?.set("fov", module.clone())?;
    }

    tracing::debug!("[fov] [scripting] module registered ({} constants)", CONSTANTS.len());
    Ok(module)
}
