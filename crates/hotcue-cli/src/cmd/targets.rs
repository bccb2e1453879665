use crate::output::{print_json, print_table};
use anyhow::Context;
use hotcue_core::config::Config;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct TargetRow<'a> {
    app_id: &'a str,
    protocol: &'static str,
    endpoint: &'a str,
    timeout_ms: u128,
    networked: bool,
}

pub fn run(path: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(path).context("failed to load config")?;
    let router = config.router();
    let dispatcher = config.dispatcher();

    let rows: Vec<TargetRow<'_>> = router
        .targets()
        .map(|(app, target)| TargetRow {
            app_id: app.as_str(),
            protocol: target.protocol().as_str(),
            endpoint: target.endpoint(),
            timeout_ms: target.timeout().as_millis(),
            networked: dispatcher.is_networked(app),
        })
        .collect();

    if json {
        return print_json(&rows);
    }

    if rows.is_empty() {
        println!("No targets configured.");
        return Ok(());
    }

    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.app_id.to_string(),
                r.protocol.to_string(),
                r.endpoint.to_string(),
                format!("{}ms", r.timeout_ms),
                if r.networked { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    print_table(&["APP", "PROTOCOL", "ENDPOINT", "TIMEOUT", "NETWORKED"], &table);
    Ok(())
}
