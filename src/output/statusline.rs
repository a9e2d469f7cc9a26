#![forbid(unsafe_code)]

use serde::Deserialize;

/// Status document the agent pipes to `vibe statusline` on stdin.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusInput {
    #[serde(default)]
    pub model: ModelInfo,
    #[serde(default)]
    pub workspace: WorkspaceInfo,
    #[serde(default)]
    pub context_window: ContextWindowInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkspaceInfo {
    #[serde(default)]
    pub current_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContextWindowInfo {
    #[serde(default)]
    pub used_percentage: Option<f64>,
}

#[must_use]
pub fn format_status(
    model: Option<&str>,
    cwd: &str,
    branch: &str,
    used_percentage: Option<f64>,
) -> String {
    let mut parts = vec![
        format!("🤖 {}", model.unwrap_or_default()),
        format!("📁 {cwd}"),
    ];
    if !branch.is_empty() {
        parts.push(format!("🌿 {branch}"));
    }
    if let Some(pct) = used_percentage {
        parts.push(format!("💭 {}%", pct.round() as i64));
    }
    parts.join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_all_fields() {
        let out = format_status(Some("Opus"), "~/src/vibe", "feature/x", Some(41.6));
        assert_eq!(out, "🤖 Opus | 📁 ~/src/vibe | 🌿 feature/x | 💭 42%");
    }

    #[test]
    fn omits_empty_branch_and_missing_percentage() {
        let out = format_status(Some("Opus"), "~/src/vibe", "", None);
        assert_eq!(out, "🤖 Opus | 📁 ~/src/vibe");
    }

    #[test]
    fn missing_model_keeps_placeholder() {
        let out = format_status(None, "/tmp", "main", None);
        assert_eq!(out, "🤖  | 📁 /tmp | 🌿 main");
    }

    #[test]
    fn parses_partial_input() {
        let input: StatusInput =
            serde_json::from_str(r#"{"workspace":{"current_dir":"/w"}}"#).expect("parse");
        assert_eq!(input.workspace.current_dir.as_deref(), Some("/w"));
        assert_eq!(input.model.display_name, None);
        assert_eq!(input.context_window.used_percentage, None);
    }
}
