//! Core data models shared by the catalog loader, the mirror and the HTTP API.

use serde::{de::IgnoredAny, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One command record, loaded from a `<category>/<name>.json` file.
///
/// Only `name` is interpreted. Every other key in the source object
/// (`aliases`, `help`, `syntax`, `donor_tier`, ...) is carried through
/// `attributes` untouched, so the API returns exactly what the file holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub name: String,
    /// Directory the record was loaded from. Injected by the loader; any
    /// `category` key in the file itself is overwritten.
    #[serde(default, deserialize_with = "discard_file_category")]
    pub category: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Command {
    /// Parse one record from raw JSON and tag it with `category`.
    pub fn from_json(category: &str, raw: &str) -> serde_json::Result<Self> {
        let mut command: Command = serde_json::from_str(raw)?;
        command.category = category.to_string();
        Ok(command)
    }
}

/// Accept any JSON value for the file's own `category` and drop it.
fn discard_file_category<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    IgnoredAny::deserialize(deserializer)?;
    Ok(String::new())
}

/// Result of one check-then-possibly-pull cycle against the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The remote had advanced; the checkout now sits at `revision`.
    Updated { revision: String },
    /// Local and remote revisions already matched.
    Unchanged,
    /// The cycle failed and the checkout was left as it was.
    Failed { message: String },
}

impl SyncOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, SyncOutcome::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_injects_category() {
        let cmd = Command::from_json("donor", r#"{"name":"convert","donor":true}"#).unwrap();
        assert_eq!(cmd.name, "convert");
        assert_eq!(cmd.category, "donor");
        assert_eq!(cmd.attributes.get("donor"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_file_category_is_overwritten() {
        let cmd = Command::from_json("util", r#"{"name":"ping","category":"other"}"#).unwrap();
        assert_eq!(cmd.category, "util");
        assert!(!cmd.attributes.contains_key("category"));
    }

    #[test]
    fn test_non_string_file_category_is_overwritten() {
        for raw in [
            r#"{"name":"ping","category":null}"#,
            r#"{"name":"ping","category":7}"#,
            r#"{"name":"ping","category":{"nested":true}}"#,
        ] {
            let cmd = Command::from_json("util", raw).unwrap();
            assert_eq!(cmd.category, "util", "input: {}", raw);
            assert!(!cmd.attributes.contains_key("category"));
        }
    }

    #[test]
    fn test_unknown_fields_pass_through() {
        let raw = r#"{"name":"x","donor_tier":"gold","custom":{"a":[1,2]}}"#;
        let cmd = Command::from_json("misc", raw).unwrap();
        let out = serde_json::to_value(&cmd).unwrap();
        assert_eq!(out["donor_tier"], "gold");
        assert_eq!(out["custom"]["a"][1], 2);
        assert_eq!(out["category"], "misc");
    }

    #[test]
    fn test_missing_name_is_rejected() {
        assert!(Command::from_json("misc", r#"{"help":"no name"}"#).is_err());
        assert!(Command::from_json("misc", r#"{"name":42}"#).is_err());
        assert!(Command::from_json("misc", r#"["name"]"#).is_err());
    }
}
