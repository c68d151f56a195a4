//! Config command - create or print the user configuration

use anyhow::Result;
use console::style;
use jreview::config::UserConfig;
use std::path::Path;

pub fn init() -> Result<()> {
    let path = UserConfig::init_user_config()?;
    println!(
        "{} Config file at {}",
        style("✓").green(),
        style(path.display()).cyan()
    );
    Ok(())
}

pub fn show(models_dir: Option<&Path>) -> Result<()> {
    let config = UserConfig::load()?;
    match UserConfig::user_config_path() {
        Some(p) if p.exists() => println!("# loaded from {}", p.display()),
        _ => println!("# no config file; defaults and environment only"),
    }
    println!("# backend: {}", config.backend()?.display_name());
    println!("# models dir: {}\n", config.models_dir(models_dir).display());
    print!("{}", config.to_masked_toml()?);
    Ok(())
}
