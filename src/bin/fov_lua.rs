use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use fov::config::FovConfig;
use fov::ffi::libfov::LibFov;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_ansi(std::io::IsTerminal::is_terminal(&std::io::stderr()))
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut conf_file: Option<String> = None;
    let mut scripts: Vec<String> = Vec::new();

    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "--h" | "--?" | "/?" => {
                println!("Usage: fov_lua [--conf FILE] SCRIPT...");
                return Ok(());
            }
            "--conf" => {
                if i + 1 < args.len() {
                    i += 1;
                    conf_file = Some(args[i].clone());
                } else {
                    eprintln!("Error: --conf requires a FILE argument");
                    return Ok(());
                }
            }
            script => scripts.push(script.to_string()),
        }
        i += 1;
    }

    let config = match &conf_file {
        Some(path) => FovConfig::from_file(path)?,
        None => FovConfig::default(),
    };

    if scripts.is_empty() {
        eprintln!("Error: no SCRIPT given");
        return Ok(());
    }

    let lua = mlua::Lua::new();
    fov::scripting::register(&lua, Rc::new(LibFov), &config)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("Cannot register fov module")?;

    for script in &scripts {
        let path = resolve(&config, script);
        let src = std::fs::read(&path)
            .with_context(|| format!("Cannot read script: {}", path.display()))?;
        let name = path.to_string_lossy();

        tracing::info!("[fov_lua] [run] {}", path.display());
        lua.load(src.as_slice())
            .set_name(name.as_ref())
            .exec()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("Script failed: {}", path.display()))?;
    }

    Ok(())
}

/// Relative script names that don't exist as given are looked up in `script_dir`.
fn resolve(config: &FovConfig, script: &str) -> PathBuf {
    let direct = PathBuf::from(script);
    if direct.is_absolute() || direct.exists() {
        return direct;
    }
    PathBuf::from(&config.script_dir).join(script)
}
