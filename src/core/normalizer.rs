//! Reconciles untrusted JSON (persisted blobs, backups, freshly imported
//! sheets) into a well-formed [`ConfigState`].
//!
//! [`normalize`] is total: every field falls back to its default on its own,
//! so a broken `services` list never costs the categories and vice versa.
//! [`diagnose`] reports what that fallback would silently discard.

use crate::core::fields::{is_truthy, scalar_string, slugify, to_int};
use crate::domain::model::{Category, ConfigState, Draft, PrimaryMapping, Service};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

pub fn normalize(raw: &Value) -> ConfigState {
    let mut state = ConfigState::default();
    let Some(obj) = raw.as_object() else {
        tracing::debug!("State blob is not an object, using defaults");
        return state;
    };

    if let Some(list) = obj.get("primaries").and_then(Value::as_array) {
        state.primaries = normalize_categories(list);
    }

    if let Some(buckets) = obj.get("secondariesByPrimary").and_then(Value::as_object) {
        state.secondaries_by_primary = normalize_buckets(buckets);
    }

    state.services = obj
        .get("services")
        .and_then(Value::as_array)
        .map(|list| normalize_services(list))
        .unwrap_or_default();

    if let Some(draft) = obj.get("draft").and_then(Value::as_object) {
        state.draft = Draft(draft.clone());
    }

    state
}

fn normalize_category(raw: &Value) -> Category {
    Category {
        id: slugify(&scalar_string(raw.get("id"))),
        label: scalar_string(raw.get("label")).trim().to_string(),
        order: to_int(raw.get("order"), 0),
    }
}

/// Maps, drops entries with an empty id or label, keeps the first of each id.
fn normalize_categories(list: &[Value]) -> Vec<Category> {
    let mut seen = HashSet::new();
    list.iter()
        .map(normalize_category)
        .filter(|c| !c.id.is_empty() && !c.label.is_empty())
        .filter(|c| seen.insert(c.id.clone()))
        .collect()
}

fn normalize_buckets(raw: &Map<String, Value>) -> BTreeMap<String, Vec<Category>> {
    let mut buckets = BTreeMap::new();
    for (key, list) in raw {
        let primary_id = slugify(key);
        // Non-list values get no bucket at all.
        let Some(list) = list.as_array() else {
            continue;
        };
        if primary_id.is_empty() {
            continue;
        }
        buckets.insert(primary_id, normalize_categories(list));
    }
    buckets
}

fn normalize_mapping(raw: Option<&Value>) -> BTreeMap<String, PrimaryMapping> {
    let Some(map) = raw.and_then(Value::as_object) else {
        return BTreeMap::new();
    };

    map.iter()
        .map(|(primary_id, entry)| {
            let enabled = entry.get("enabled").is_some_and(is_truthy);
            let tags = entry
                .get("tags")
                .and_then(Value::as_array)
                .map(|tags| {
                    tags.iter()
                        .filter(|t| t.is_string() || t.is_number())
                        .map(|t| scalar_string(Some(t)))
                        .collect()
                })
                .unwrap_or_default();
            (primary_id.clone(), PrimaryMapping { enabled, tags })
        })
        .collect()
}

fn trimmed(raw: &Value, key: &str) -> String {
    scalar_string(raw.get(key)).trim().to_string()
}

fn normalize_service(raw: &Value) -> Service {
    Service {
        service_id: trimmed(raw, "service_id"),
        service_name: trimmed(raw, "service_name"),
        description: trimmed(raw, "description"),
        price: trimmed(raw, "price"),
        image_url: trimmed(raw, "image_url"),
        cta_text: trimmed(raw, "cta_text"),
        cta_url: trimmed(raw, "cta_url"),
        mapping: normalize_mapping(raw.get("mapping")),
    }
}

fn normalize_services(list: &[Value]) -> Vec<Service> {
    let mut seen = HashSet::new();
    list.iter()
        .map(normalize_service)
        .filter(|s| !s.service_id.is_empty() && !s.service_name.is_empty())
        .filter(|s| seen.insert(s.service_id.clone()))
        .collect()
}

/// One thing lenient normalization would drop, default or ignore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

fn diagnose_categories(path: &str, list: &[Value], out: &mut Vec<Diagnostic>) {
    let mut seen = HashSet::new();
    for (idx, raw) in list.iter().enumerate() {
        let item_path = format!("{}[{}]", path, idx);
        let category = normalize_category(raw);
        if category.id.is_empty() || category.label.is_empty() {
            out.push(Diagnostic::new(item_path, "dropped: empty id or label"));
            continue;
        }
        if !seen.insert(category.id.clone()) {
            out.push(Diagnostic::new(
                item_path,
                format!("dropped: duplicate id '{}'", category.id),
            ));
            continue;
        }
        let raw_id = scalar_string(raw.get("id"));
        if raw_id != category.id {
            out.push(Diagnostic::new(
                item_path,
                format!("id '{}' normalized to '{}'", raw_id, category.id),
            ));
        }
    }
}

/// Strict counterpart of [`normalize`]: lists everything the lenient pass
/// would silently repair. An empty result means the input is already canonical
/// apart from formatting.
pub fn diagnose(raw: &Value) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    let Some(obj) = raw.as_object() else {
        out.push(Diagnostic::new("$", "not an object: default state used"));
        return out;
    };

    match obj.get("primaries") {
        Some(Value::Array(list)) => diagnose_categories("primaries", list, &mut out),
        _ => out.push(Diagnostic::new(
            "primaries",
            "missing or not a list: default primaries used",
        )),
    }

    match obj.get("secondariesByPrimary") {
        Some(Value::Object(buckets)) => {
            for (key, list) in buckets {
                let path = format!("secondariesByPrimary.{}", key);
                match list.as_array() {
                    Some(list) => diagnose_categories(&path, list, &mut out),
                    None => out.push(Diagnostic::new(path, "not a list: bucket skipped")),
                }
            }
        }
        _ => out.push(Diagnostic::new(
            "secondariesByPrimary",
            "missing or not an object: default secondaries used",
        )),
    }

    let state = normalize(raw);
    let primary_ids: HashSet<&str> = state.primaries.iter().map(|p| p.id.as_str()).collect();
    for key in state.secondaries_by_primary.keys() {
        if !primary_ids.contains(key.as_str()) {
            out.push(Diagnostic::new(
                format!("secondariesByPrimary.{}", key),
                "orphan bucket: no primary with this id",
            ));
        }
    }

    match obj.get("services") {
        Some(Value::Array(list)) => {
            let mut seen = HashSet::new();
            for (idx, raw_service) in list.iter().enumerate() {
                let path = format!("services[{}]", idx);
                let service = normalize_service(raw_service);
                if service.service_id.is_empty() || service.service_name.is_empty() {
                    out.push(Diagnostic::new(path, "dropped: empty service_id or service_name"));
                    continue;
                }
                if !seen.insert(service.service_id.clone()) {
                    out.push(Diagnostic::new(
                        path,
                        format!("dropped: duplicate service_id '{}'", service.service_id),
                    ));
                    continue;
                }
                if raw_service.get("mapping").is_some_and(|m| !m.is_object()) {
                    out.push(Diagnostic::new(
                        format!("{}.mapping", path),
                        "not an object: replaced with empty mapping",
                    ));
                }
                for (primary_id, mapping) in &service.mapping {
                    if !primary_ids.contains(primary_id.as_str()) {
                        out.push(Diagnostic::new(
                            format!("{}.mapping.{}", path, primary_id),
                            "refers to an unknown primary",
                        ));
                        continue;
                    }
                    let known: HashSet<&str> = state
                        .secondaries_by_primary
                        .get(primary_id)
                        .map(|list| list.iter().map(|c| c.id.as_str()).collect())
                        .unwrap_or_default();
                    for tag in mapping.tags.iter().filter(|t| !known.contains(t.as_str())) {
                        out.push(Diagnostic::new(
                            format!("{}.mapping.{}", path, primary_id),
                            format!("tag '{}' is not a secondary of this primary", tag),
                        ));
                    }
                }
            }
        }
        None => {}
        Some(_) => out.push(Diagnostic::new("services", "not a list: no services kept")),
    }

    if obj.get("draft").is_some_and(|d| !d.is_object()) {
        out.push(Diagnostic::new("draft", "not an object: reset"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_object_yields_default_state() {
        for raw in [json!(null), json!("not an object"), json!(42), json!([1, 2])] {
            let state = normalize(&raw);
            assert_eq!(state, ConfigState::default());
            assert_eq!(state.primaries.len(), 3);
            assert!(state.services.is_empty());
        }
    }

    #[test]
    fn test_primaries_are_slugified_and_coerced() {
        let state = normalize(&json!({
            "primaries": [{"id": "Has Space!", "label": "X", "order": "3"}]
        }));
        assert_eq!(state.primaries, vec![Category::new("has_space", "X", 3)]);
        // Untouched fields keep their seeds.
        assert_eq!(state.secondaries_by_primary.len(), 3);
    }

    #[test]
    fn test_primaries_drop_empty_and_duplicate_entries() {
        let state = normalize(&json!({
            "primaries": [
                {"id": "a", "label": "A", "order": 1},
                {"id": "", "label": "Nameless"},
                {"id": "b", "label": "   "},
                "garbage",
                {"id": "A", "label": "Again", "order": 9},
                {"id": "c", "label": " C ", "order": "x"}
            ]
        }));
        assert_eq!(
            state.primaries,
            vec![Category::new("a", "A", 1), Category::new("c", "C", 0)]
        );
    }

    #[test]
    fn test_empty_primary_list_is_kept_empty() {
        let state = normalize(&json!({"primaries": []}));
        assert!(state.primaries.is_empty());
    }

    #[test]
    fn test_wrong_typed_primaries_keep_defaults() {
        let state = normalize(&json!({"primaries": "nope", "secondariesByPrimary": []}));
        assert_eq!(state.primaries, ConfigState::default().primaries);
        assert_eq!(
            state.secondaries_by_primary,
            ConfigState::default().secondaries_by_primary
        );
    }

    #[test]
    fn test_buckets_skip_non_lists_and_slugify_keys() {
        let state = normalize(&json!({
            "secondariesByPrimary": {
                "Yksi Tyinen": [{"id": "Mökki", "label": "Mökki", "order": 1}],
                "broken": "not a list",
                "orphan": []
            }
        }));
        assert_eq!(state.secondaries_by_primary.len(), 2);
        assert_eq!(
            state.secondaries_by_primary["yksi_tyinen"],
            vec![Category::new("mkki", "Mökki", 1)]
        );
        assert!(state.secondaries_by_primary["orphan"].is_empty());
        assert!(!state.secondaries_by_primary.contains_key("broken"));
    }

    #[test]
    fn test_service_fields_are_trimmed_and_defaulted() {
        let state = normalize(&json!({
            "services": [{"service_id": " 5 ", "service_name": "Svc"}]
        }));
        assert_eq!(state.services.len(), 1);
        let svc = &state.services[0];
        assert_eq!(svc.service_id, "5");
        assert_eq!(svc.service_name, "Svc");
        assert_eq!(svc.description, "");
        assert_eq!(svc.price, "");
        assert_eq!(svc.image_url, "");
        assert_eq!(svc.cta_text, "");
        assert_eq!(svc.cta_url, "");
        assert!(svc.mapping.is_empty());
    }

    #[test]
    fn test_services_drop_incomplete_and_duplicates() {
        let state = normalize(&json!({
            "services": [
                {"service_id": 1, "service_name": "One", "price": 120},
                {"service_id": "2"},
                {"service_id": "1", "service_name": "Dup"},
                {"service_name": "No id"}
            ]
        }));
        assert_eq!(state.services.len(), 1);
        assert_eq!(state.services[0].service_id, "1");
        assert_eq!(state.services[0].price, "120");
    }

    #[test]
    fn test_wrong_typed_services_become_empty() {
        let state = normalize(&json!({"services": {"service_id": "1"}}));
        assert!(state.services.is_empty());
    }

    #[test]
    fn test_mapping_is_coerced_and_keeps_unknown_primaries() {
        let state = normalize(&json!({
            "services": [{
                "service_id": "1",
                "service_name": "One",
                "mapping": {
                    "yritys": {"enabled": true, "tags": ["toimisto", "toimisto", 3, null]},
                    "gone": {"enabled": 1},
                    "weird": "x"
                }
            }, {
                "service_id": "2",
                "service_name": "Two",
                "mapping": ["not", "an", "object"]
            }]
        }));
        let mapping = &state.services[0].mapping;
        assert_eq!(
            mapping["yritys"],
            PrimaryMapping {
                enabled: true,
                tags: vec!["toimisto".into(), "toimisto".into(), "3".into()],
            }
        );
        assert!(mapping["gone"].enabled);
        assert_eq!(mapping["weird"], PrimaryMapping::default());
        assert!(state.services[1].mapping.is_empty());
    }

    #[test]
    fn test_draft_passes_through_or_resets() {
        let state = normalize(&json!({"draft": {"editingServiceId": "7", "extra": [1]}}));
        assert_eq!(state.draft.editing_service_id(), Some("7"));
        assert_eq!(state.draft.0["extra"], json!([1]));

        let state = normalize(&json!({"draft": "nope"}));
        assert_eq!(state.draft, Draft::default());
        assert_eq!(state.draft.editing_service_id(), None);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            json!(null),
            json!({}),
            json!({
                "primaries": [{"id": "B Two", "label": " b ", "order": 2.5}, {"id": "a", "label": "A"}],
                "secondariesByPrimary": {"B Two": [{"id": "x", "label": "X", "order": "1"}], "k": 3},
                "services": [{
                    "service_id": " 9 ",
                    "service_name": " Nine ",
                    "mapping": {"b_two": {"enabled": "yes", "tags": ["x", 1]}}
                }],
                "draft": {"editingServiceId": null}
            }),
        ];
        for raw in inputs {
            let once = normalize(&raw);
            let again = normalize(&serde_json::to_value(&once).unwrap());
            assert_eq!(again, once);
        }
    }

    #[test]
    fn test_diagnose_clean_state_is_quiet() {
        let state = ConfigState::default();
        let diagnostics = diagnose(&serde_json::to_value(&state).unwrap());
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    }

    #[test]
    fn test_diagnose_reports_repairs() {
        let diagnostics = diagnose(&json!({
            "primaries": [{"id": "A B", "label": "AB"}, {"id": "a_b", "label": "Dup"}],
            "secondariesByPrimary": {"a_b": [{"id": "x", "label": "X"}], "ghost": [], "bad": 1},
            "services": [
                {"service_id": "1", "service_name": "One",
                 "mapping": {"a_b": {"enabled": true, "tags": ["y"]}, "nope": {}}},
                {"service_id": "", "service_name": "Nameless"}
            ],
            "draft": 5
        }));
        let text: Vec<String> = diagnostics.iter().map(ToString::to_string).collect();
        let has = |needle: &str| text.iter().any(|t| t.contains(needle));
        assert!(has("primaries[0]: id 'A B' normalized to 'a_b'"));
        assert!(has("primaries[1]: dropped: duplicate id 'a_b'"));
        assert!(has("secondariesByPrimary.bad: not a list"));
        assert!(has("secondariesByPrimary.ghost: orphan bucket"));
        assert!(has("services[0].mapping.nope: refers to an unknown primary"));
        assert!(has("tag 'y' is not a secondary"));
        assert!(has("services[1]: dropped"));
        assert!(has("draft: not an object"));
    }

    #[test]
    fn test_diagnose_non_object() {
        let diagnostics = diagnose(&json!("text"));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].path, "$");
    }
}
