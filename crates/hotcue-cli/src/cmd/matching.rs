use crate::output::{print_json, print_table};
use anyhow::Context;
use hotcue_core::config::Config;
use hotcue_core::matcher::match_positions;
use hotcue_core::{Dispatcher, HotcueEvent, TriggerSnapshot};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct MatchRow {
    index: usize,
    cue_match_type: String,
    cue_name: String,
    networked: Vec<String>,
    local: Vec<String>,
}

/// Offline dry run: no sends, only which triggers would fire and where their
/// actions would go. Uses the config's networked apps when the file exists.
pub fn run(config_path: &Path, triggers: &Path, event: &str, json: bool) -> anyhow::Result<()> {
    let data = std::fs::read(triggers)
        .with_context(|| format!("failed to read {}", triggers.display()))?;
    let snapshot = TriggerSnapshot::from_json(&data)
        .with_context(|| format!("invalid triggers in {}", triggers.display()))?;
    let event: HotcueEvent = serde_json::from_str(event).context("invalid event json")?;

    let dispatcher = if config_path.exists() {
        Config::load(config_path)
            .context("failed to load config")?
            .dispatcher()
    } else {
        Dispatcher::default()
    };

    let rows: Vec<MatchRow> = match_positions(&event, &snapshot)
        .into_iter()
        .map(|index| {
            let trigger = &snapshot.triggers()[index];
            let dispatch = dispatcher.dispatch(trigger);
            MatchRow {
                index,
                cue_match_type: trigger.match_type().to_string(),
                cue_name: trigger.cue_name.clone(),
                networked: dispatch
                    .networked
                    .iter()
                    .map(|b| format!("{} ({})", b.destination, b.actions.len()))
                    .collect(),
                local: dispatch
                    .local
                    .iter()
                    .map(|a| a.app_id().to_string())
                    .collect(),
            }
        })
        .collect();

    if json {
        return print_json(&serde_json::json!({
            "triggers": snapshot.len(),
            "matched": rows,
        }));
    }

    if rows.is_empty() {
        println!("No trigger matched ({} checked).", snapshot.len());
        return Ok(());
    }

    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.index.to_string(),
                r.cue_match_type.clone(),
                r.cue_name.clone(),
                r.networked.join(", "),
                r.local.join(", "),
            ]
        })
        .collect();
    print_table(&["#", "MATCH", "CUE NAME", "NETWORKED", "LOCAL"], &table);
    Ok(())
}
