//! Resource contract
//!
//! A [`Resource`] is a uniform, read-only view over one fetched API
//! object: identity (id, name, ARN), tags, and an escape hatch to the
//! raw JSON value for type-specific accessors. Resources are immutable
//! value snapshots, constructed fresh on every List/Get and discarded
//! when the view changes.

use serde_json::Value;
use std::collections::BTreeMap;

pub type Tags = BTreeMap<String, String>;

/// Uniform read-only view over an underlying API object.
///
/// Accessors never fail: missing data yields empty-string or empty-map
/// defaults, and `name` falls back to `id` when the underlying object
/// has no separate display name.
pub trait Resource: Send + Sync + std::fmt::Debug {
    fn id(&self) -> &str;

    fn name(&self) -> &str {
        self.id()
    }

    /// ARN, empty for resource types that have none.
    fn arn(&self) -> &str {
        ""
    }

    fn tags(&self) -> Tags {
        Tags::new()
    }

    /// The raw underlying API object.
    fn raw(&self) -> &Value;

    /// Resource-specific command template variables (PRIVATE_IP,
    /// QUEUE_URL, ...). Returns `None` for variables the resource does
    /// not carry; callers must not treat that as an error.
    fn template_var(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Extract a string field from JSON using a dot-notation path.
/// Missing paths and non-scalar values yield an empty string.
pub fn field(value: &Value, path: &str) -> String {
    let mut current = value;
    for part in path.split('.') {
        current = if let Ok(idx) = part.parse::<usize>() {
            match current.get(idx) {
                Some(v) => v,
                None => return String::new(),
            }
        } else {
            match current.get(part) {
                Some(v) => v,
                None => return String::new(),
            }
        };
    }

    match current {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Collect the items at a dot-notation path as a list.
///
/// Normalizes the two shapes the transport produces: JSON arrays stay
/// arrays, and a lone object (an XML list with a single `item` child)
/// becomes a one-element list. A missing path yields an empty list.
pub fn items_at(value: &Value, path: &str) -> Vec<Value> {
    let mut current = value;
    for part in path.split('.') {
        current = match current.get(part) {
            Some(v) => v,
            None => return Vec::new(),
        };
    }

    match current {
        Value::Array(arr) => arr.clone(),
        Value::Null => Vec::new(),
        other => vec![other.clone()],
    }
}

/// Generic [`Resource`] backed by a raw JSON object plus field paths.
///
/// Per-service resource types hold one of these and forward, overriding
/// only what differs (extra template variables, derived names).
#[derive(Debug)]
pub struct JsonResource {
    value: Value,
    id: String,
    name: String,
    arn: String,
    tags: Tags,
}

impl JsonResource {
    pub fn new(value: Value, id_path: &str, name_path: &str, arn_path: &str) -> Self {
        let id = field(&value, id_path);
        let tags = parse_tags(&value);

        // Display name preference: explicit name field, then the Name
        // tag, then the id.
        let mut name = field(&value, name_path);
        if name.is_empty() {
            name = tags.get("Name").cloned().unwrap_or_default();
        }
        if name.is_empty() {
            name = id.clone();
        }

        let arn = field(&value, arn_path);

        Self {
            value,
            id,
            name,
            arn,
            tags,
        }
    }

    pub fn with_arn(mut self, arn: String) -> Self {
        self.arn = arn;
        self
    }
}

impl Resource for JsonResource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn arn(&self) -> &str {
        &self.arn
    }

    fn tags(&self) -> Tags {
        self.tags.clone()
    }

    fn raw(&self) -> &Value {
        &self.value
    }
}

/// Normalize AWS tags into a map. Handles the list-of-pairs shape
/// (`"Tags": [{"Key": .., "Value": ..}]`, also under `tagSet.item`) and
/// the plain-map shape (`"tags": {..}`) some JSON APIs use.
fn parse_tags(value: &Value) -> Tags {
    let mut tags = Tags::new();

    for list_path in ["Tags", "tagSet.item"] {
        for entry in items_at(value, list_path) {
            // JSON APIs capitalize the pair keys; the EC2 XML does not.
            let mut tag_key = field(&entry, "Key");
            let mut tag_value = field(&entry, "Value");
            if tag_key.is_empty() {
                tag_key = field(&entry, "key");
                tag_value = field(&entry, "value");
            }
            if !tag_key.is_empty() {
                tags.insert(tag_key, tag_value);
            }
        }
    }

    if let Some(map) = value.get("tags").and_then(|v| v.as_object()) {
        for (k, v) in map {
            if let Some(s) = v.as_str() {
                tags.insert(k.clone(), s.to_string());
            }
        }
    }

    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_extracts_nested_paths() {
        let value = json!({"a": {"b": {"c": "deep"}}, "n": 7, "flag": true});
        assert_eq!(field(&value, "a.b.c"), "deep");
        assert_eq!(field(&value, "n"), "7");
        assert_eq!(field(&value, "flag"), "true");
        assert_eq!(field(&value, "a.missing"), "");
    }

    #[test]
    fn field_indexes_arrays() {
        let value = json!({"items": ["zero", "one"]});
        assert_eq!(field(&value, "items.1"), "one");
        assert_eq!(field(&value, "items.9"), "");
    }

    #[test]
    fn items_at_normalizes_single_objects() {
        let single = json!({"set": {"item": {"id": "only"}}});
        assert_eq!(items_at(&single, "set.item").len(), 1);

        let many = json!({"set": {"item": [{"id": "a"}, {"id": "b"}]}});
        assert_eq!(items_at(&many, "set.item").len(), 2);

        assert!(items_at(&single, "set.other").is_empty());
    }

    #[test]
    fn name_falls_back_to_id() {
        let r = JsonResource::new(json!({"QueueUrl": "q-1"}), "QueueUrl", "Name", "");
        assert_eq!(r.id(), "q-1");
        assert_eq!(r.name(), "q-1");
        assert_eq!(r.arn(), "");
    }

    #[test]
    fn name_prefers_name_tag_over_id() {
        let value = json!({
            "instanceId": "i-123",
            "tagSet": {"item": [{"Key": "Name", "Value": "web-1"}, {"Key": "env", "Value": "prod"}]}
        });
        let r = JsonResource::new(value, "instanceId", "displayName", "");
        assert_eq!(r.name(), "web-1");
        assert_eq!(r.tags().get("env").map(String::as_str), Some("prod"));
    }

    #[test]
    fn plain_map_tags_are_parsed() {
        let r = JsonResource::new(
            json!({"id": "x", "tags": {"team": "infra"}}),
            "id",
            "",
            "",
        );
        assert_eq!(r.tags().get("team").map(String::as_str), Some("infra"));
    }
}
