use anyhow::Context;
use northfall_core::{config::Config, paths};
use std::path::Path;

/// User id recorded when `--user-id` is not given.
const FALLBACK_USER: &str = "local";

pub fn run(
    root: &Path,
    user_id: Option<&str>,
    contract_id: Option<&str>,
    contract_name: Option<&str>,
) -> anyhow::Result<()> {
    let dir_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "contract".to_string());

    println!("Initializing Northfall in: {}", root.display());

    let user_id = user_id
        .map(str::to_string)
        .or_else(|| std::env::var("USER").ok().filter(|u| !u.is_empty()))
        .unwrap_or_else(|| FALLBACK_USER.to_string());
    let config = Config::new(
        user_id,
        contract_id.unwrap_or(&dir_name),
        contract_name.unwrap_or(&dir_name),
    );

    if config
        .save_if_missing(root)
        .context("failed to write config.yaml")?
    {
        println!("  created: {}", paths::CONFIG_FILE);
    } else {
        println!("  exists:  {}", paths::CONFIG_FILE);
    }

    println!("\nRun `winter` to open the shell, or `winter serve` to start the job server.");
    Ok(())
}
