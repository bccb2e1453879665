use anyhow::Context;
use hotcue_core::config::Config;
use std::path::Path;

pub fn run(path: &Path, force: bool) -> anyhow::Result<()> {
    let config = Config::starter();

    let written = if force {
        config.save(path).context("failed to write config")?;
        true
    } else {
        let yaml = config.to_yaml()?;
        hotcue_core::io::write_if_missing(path, yaml.as_bytes())
            .context("failed to write config")?
    };

    if written {
        println!("Wrote {}", path.display());
    } else {
        println!("{} already exists; pass --force to overwrite", path.display());
    }
    Ok(())
}
