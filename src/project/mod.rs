#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::VibeError;

/// File name of the per-project configuration, written next to the primary
/// repository's working tree.
pub const PROJECT_CONFIG_FILE: &str = ".vibe-project.json";

/// Declarative description of the additional repositories participating in
/// a multi-repository task. Absence of the file means single-repo mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectConfig {
    pub repos: BTreeMap<String, RepoConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RepoConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_command: Option<String>,
}

/// Loads `.vibe-project.json` from `dir`. A missing file is `Ok(None)`; a
/// present but unparsable file is an error the user should see.
pub fn load(dir: &Path) -> Result<Option<ProjectConfig>, VibeError> {
    let path = dir.join(PROJECT_CONFIG_FILE);
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(VibeError::IoPath { path, source: e }),
    };
    let cfg: ProjectConfig = serde_json::from_str(&raw)
        .map_err(|e| VibeError::Config(format!("failed to parse {}: {e}", path.display())))?;
    Ok(Some(cfg))
}

pub fn save(dir: &Path, cfg: &ProjectConfig) -> Result<(), VibeError> {
    let path = dir.join(PROJECT_CONFIG_FILE);
    let mut raw = serde_json::to_string_pretty(cfg)
        .map_err(|e| VibeError::Other(format!("failed to serialize project config: {e}")))?;
    raw.push('\n');
    std::fs::write(&path, raw).map_err(|e| VibeError::IoPath { path, source: e })
}

/// Appends `/name` ignore lines for the given repo names, skipping ones the
/// file already carries.
pub fn update_gitignore(gitignore: &Path, repo_names: &[String]) -> Result<(), VibeError> {
    let existing = match std::fs::read_to_string(gitignore) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(VibeError::IoPath {
                path: gitignore.to_path_buf(),
                source: e,
            });
        }
    };

    let lines_to_add: Vec<String> = repo_names
        .iter()
        .map(|name| format!("/{name}"))
        .filter(|line| !existing.lines().any(|l| l == line))
        .collect();
    if lines_to_add.is_empty() {
        return Ok(());
    }

    let mut out = existing;
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    for line in lines_to_add {
        out.push_str(&line);
        out.push('\n');
    }
    std::fs::write(gitignore, out).map_err(|e| VibeError::IoPath {
        path: gitignore.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_file_is_none() {
        let td = tempfile::tempdir().expect("tempdir");
        assert_eq!(load(td.path()).expect("load"), None);
    }

    #[test]
    fn save_and_load_round_trip_camel_case() {
        let td = tempfile::tempdir().expect("tempdir");

        let mut cfg = ProjectConfig::default();
        cfg.repos.insert(
            "github.com/me/api".to_owned(),
            RepoConfig {
                default_target: Some("develop".to_owned()),
                setup_command: Some("npm install".to_owned()),
            },
        );
        save(td.path(), &cfg).expect("save");

        let raw = std::fs::read_to_string(td.path().join(PROJECT_CONFIG_FILE)).expect("read");
        assert!(raw.contains("\"defaultTarget\": \"develop\""));
        assert!(raw.contains("\"setupCommand\": \"npm install\""));
        assert!(raw.ends_with('\n'));

        assert_eq!(load(td.path()).expect("load"), Some(cfg));
    }

    #[test]
    fn malformed_config_is_an_error() {
        let td = tempfile::tempdir().expect("tempdir");
        std::fs::write(td.path().join(PROJECT_CONFIG_FILE), "{ nope").expect("write");
        assert!(load(td.path()).is_err());
    }

    #[test]
    fn gitignore_appends_only_missing_entries() {
        let td = tempfile::tempdir().expect("tempdir");
        let gitignore = td.path().join(".gitignore");
        std::fs::write(&gitignore, "target\n/api").expect("write");

        update_gitignore(&gitignore, &["api".to_owned(), "web".to_owned()]).expect("update");

        let raw = std::fs::read_to_string(&gitignore).expect("read");
        assert_eq!(raw, "target\n/api\n/web\n");

        // Second run changes nothing.
        update_gitignore(&gitignore, &["api".to_owned(), "web".to_owned()]).expect("update");
        assert_eq!(std::fs::read_to_string(&gitignore).expect("read"), raw);
    }

    #[test]
    fn gitignore_created_when_absent() {
        let td = tempfile::tempdir().expect("tempdir");
        let gitignore = td.path().join(".gitignore");
        update_gitignore(&gitignore, &["api".to_owned()]).expect("update");
        assert_eq!(std::fs::read_to_string(&gitignore).expect("read"), "/api\n");
    }
}
