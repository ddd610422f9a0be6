use anyhow::Result;

use super::GlobalOptions;

pub fn print_effective(options: &GlobalOptions) -> Result<()> {
    let (config, paths) = options.load_config()?;
    let output = config.to_toml_string()?;
    println!("{}", output);
    let state_path = options
        .state_path
        .clone()
        .unwrap_or_else(|| config.state_path(&paths));
    println!("# state file: {}", state_path.display());
    Ok(())
}
