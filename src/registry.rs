#![forbid(unsafe_code)]

use std::path::Path;

use serde_json::{Map, Value, json};

/// Shared trust/workspace registry consumed by the agent, one JSON document
/// per user.
pub const REGISTRY_FILE: &str = ".claude.json";

/// What a registration attempt did. A failed registration never fails the
/// surrounding operation; tests assert on the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryOutcome {
    Added,
    AlreadyPresent,
    Skipped,
}

/// Adds the workspace to the registry's `projects` map with the trust
/// dialog pre-accepted, iff the entry is missing. Existing entries are never
/// touched or reordered, and unknown keys in the document are preserved.
/// The file is re-read on every call; an absent or malformed registry is an
/// expected steady state and skips silently. The file is never created here.
#[must_use]
pub fn register_workspace(home: &Path, workspace: &Path) -> RegistryOutcome {
    let path = home.join(REGISTRY_FILE);
    let Ok(raw) = std::fs::read_to_string(&path) else {
        return RegistryOutcome::Skipped;
    };
    let Ok(Value::Object(mut doc)) = serde_json::from_str::<Value>(&raw) else {
        return RegistryOutcome::Skipped;
    };

    let projects = match doc
        .entry("projects".to_owned())
        .or_insert_with(|| Value::Object(Map::new()))
    {
        Value::Object(projects) => projects,
        // A non-object `projects` is someone else's data; leave it alone.
        _ => return RegistryOutcome::Skipped,
    };

    let key = workspace.to_string_lossy().into_owned();
    if projects.contains_key(&key) {
        return RegistryOutcome::AlreadyPresent;
    }
    projects.insert(key, json!({ "hasTrustDialogAccepted": true }));

    let Ok(mut out) = serde_json::to_string_pretty(&Value::Object(doc)) else {
        return RegistryOutcome::Skipped;
    };
    out.push('\n');
    match std::fs::write(&path, out) {
        Ok(()) => RegistryOutcome::Added,
        Err(_) => RegistryOutcome::Skipped,
    }
}
