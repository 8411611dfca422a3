use crate::app::App;
use crate::error::{Result, WizardError};
use crate::models::Rule;

pub fn get_rules(app: &App) -> Vec<Rule> {
    app.snapshot().rules.clone()
}

pub fn add_rule(app: &App, rule: Rule) -> Result<Vec<Rule>> {
    let state = app.store().update(|s| s.with_rule(rule))?;
    Ok(state.rules.clone())
}

pub fn toggle_rule(app: &App, name: &str) -> Result<Rule> {
    let state = app.store().update(|s| s.with_rule_toggled(name))?;
    let rule = state
        .rules
        .iter()
        .find(|r| r.name == name)
        .cloned()
        .ok_or_else(|| WizardError::NotFound(format!("rule '{}'", name)))?;
    log::info!(
        "[Rules] '{}' is now {}",
        rule.name,
        if rule.is_active { "active" } else { "inactive" }
    );
    Ok(rule)
}

/// Replaces the whole rule set.
pub fn set_rules(app: &App, rules: Vec<Rule>) -> Vec<Rule> {
    app.store().apply(|s| s.with_rules(rules)).rules.clone()
}
