use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Primary or secondary category. `id` is a slug, unique within its scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub label: String,
    pub order: i64,
}

impl Category {
    pub fn new(id: &str, label: &str, order: i64) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            order,
        }
    }
}

/// Visibility of a service under one primary category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryMapping {
    pub enabled: bool,
    /// Secondary ids. May contain duplicates; treated as a set.
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub service_id: String,
    pub service_name: String,
    pub description: String,
    pub price: String,
    pub image_url: String,
    pub cta_text: String,
    pub cta_url: String,
    pub mapping: BTreeMap<String, PrimaryMapping>,
}

/// Editing bookkeeping carried along with the state. Kept as an opaque
/// object so that whatever a backup contains round-trips untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Draft(pub Map<String, Value>);

impl Default for Draft {
    fn default() -> Self {
        let mut map = Map::new();
        map.insert("editingServiceId".to_string(), Value::Null);
        map.insert("service".to_string(), Value::Null);
        Self(map)
    }
}

impl Draft {
    pub fn editing_service_id(&self) -> Option<&str> {
        self.0.get("editingServiceId").and_then(Value::as_str)
    }

    pub fn set_editing_service_id(&mut self, id: Option<&str>) {
        let value = id.map_or(Value::Null, |s| Value::String(s.to_string()));
        self.0.insert("editingServiceId".to_string(), value);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigState {
    pub primaries: Vec<Category>,
    #[serde(rename = "secondariesByPrimary")]
    pub secondaries_by_primary: BTreeMap<String, Vec<Category>>,
    pub services: Vec<Service>,
    pub draft: Draft,
}

impl Default for ConfigState {
    fn default() -> Self {
        Self {
            primaries: default_primaries(),
            secondaries_by_primary: default_secondaries(),
            services: Vec::new(),
            draft: Draft::default(),
        }
    }
}

pub fn default_primaries() -> Vec<Category> {
    vec![
        Category::new("yksityinen", "Yksityinen", 1),
        Category::new("taloyhtio", "Taloyhtiö", 2),
        Category::new("yritys", "Yritys", 3),
    ]
}

pub fn default_secondaries() -> BTreeMap<String, Vec<Category>> {
    let mut buckets = BTreeMap::new();
    buckets.insert(
        "yksityinen".to_string(),
        vec![
            Category::new("mokki", "Mökki", 1),
            Category::new("kerrostalo", "Kerrostalo", 2),
            Category::new("omakotitalo", "Omakotitalo", 3),
        ],
    );
    buckets.insert(
        "taloyhtio".to_string(),
        vec![
            Category::new("kerrostalo", "Kerrostalo", 1),
            Category::new("rivitalo", "Rivitalo", 2),
        ],
    );
    buckets.insert(
        "yritys".to_string(),
        vec![
            Category::new("toimisto", "Toimisto", 1),
            Category::new("teollisuus", "Teollisuus", 2),
            Category::new("varasto", "Varasto", 3),
        ],
    );
    buckets
}

/// Remembered published-sheet URLs for the remote import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportPrefs {
    pub services: String,
    pub categories: String,
}

pub const DEFAULT_SERVICES_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vRZ5pDU4abVMjkQ4IweQ6bJGCkXslgfDLFv0rdfyhaFHt3DhFxOKZVymMjVL9I8ZeAHTq_Oyjy7ROBJ/pub?gid=0&single=true&output=csv";
pub const DEFAULT_CATEGORIES_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vRZ5pDU4abVMjkQ4IweQ6bJGCkXslgfDLFv0rdfyhaFHt3DhFxOKZVymMjVL9I8ZeAHTq_Oyjy7ROBJ/pub?gid=1089844985&single=true&output=csv";

impl Default for ImportPrefs {
    fn default() -> Self {
        Self {
            services: DEFAULT_SERVICES_URL.to_string(),
            categories: DEFAULT_CATEGORIES_URL.to_string(),
        }
    }
}

/// One header-keyed CSV row.
pub type Record = BTreeMap<String, String>;
