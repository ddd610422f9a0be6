use anyhow::{Context, Result};

use firewall::{NetshFirewall, RuleSummary};

use super::GlobalOptions;

pub fn execute(options: &GlobalOptions, all: bool, json: bool) -> Result<()> {
    let (config, _paths) = options.load_config()?;
    let firewall = NetshFirewall::from_config(&config.firewall);
    let rules = firewall.list_rules().context("list firewall rules")?;
    let shown = select_rules(rules, &config.firewall.rule_prefix, all);

    if json {
        let output = serde_json::to_string_pretty(&shown).context("render rules JSON")?;
        println!("{output}");
        return Ok(());
    }

    println!("Firewall rules shown: {}", shown.len());
    for rule in &shown {
        let direction = rule
            .direction
            .map(|value| value.to_string())
            .unwrap_or_else(|| "?".to_string());
        let program = rule.program.as_deref().unwrap_or("-");
        println!("- {} [{}] {}", rule.name, direction, program);
    }
    Ok(())
}

fn select_rules(rules: Vec<RuleSummary>, prefix: &str, all: bool) -> Vec<RuleSummary> {
    if all {
        return rules;
    }
    let marker = format!("{prefix}_");
    rules
        .into_iter()
        .filter(|rule| rule.name.starts_with(&marker))
        .collect()
}
