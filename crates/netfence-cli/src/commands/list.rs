use anyhow::{Context, Result};

use netfence_core::types::BlockedItem;

use super::GlobalOptions;

pub fn execute(options: &GlobalOptions, json: bool) -> Result<()> {
    let (config, paths) = options.load_config()?;
    let store = options.open_store(&config, &paths)?;

    if json {
        let output = serde_json::to_string_pretty(store.items()).context("render items JSON")?;
        println!("{output}");
        return Ok(());
    }

    if store.is_empty() {
        println!("Nothing is blocked ({}).", store.path().display());
        return Ok(());
    }
    for (index, item) in store.items().iter().enumerate() {
        println!("{}", render_line(index + 1, item));
    }
    Ok(())
}

fn render_line(position: usize, item: &BlockedItem) -> String {
    let icon = if item.is_folder { "📁" } else { "📄" };
    let mut line = format!(
        "{position:>3}. {icon} [{}] {}",
        item.kind_label(),
        item.path.display()
    );
    if let Some(blocked_at) = item.blocked_at {
        line.push_str(&format!("  (since {})", blocked_at.date()));
    }
    line
}
