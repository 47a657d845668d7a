//! Reshapes the two published sheets (categories + services) into state.

use crate::core::csv_codec;
use crate::core::fields::{by_order, slugify, to_int_str};
use crate::core::normalizer::normalize;
use crate::domain::model::{Category, ConfigState, PrimaryMapping, Record, Service};
use crate::utils::error::Result;
use std::collections::BTreeMap;

fn field<'a>(record: &'a Record, key: &str) -> &'a str {
    record.get(key).map(|v| v.trim()).unwrap_or("")
}

fn category_from(record: &Record) -> Category {
    Category {
        id: slugify(field(record, "category_id")),
        label: field(record, "checkbox_label").to_string(),
        order: to_int_str(field(record, "display_order"), 0),
    }
}

fn is_complete(category: &Category) -> bool {
    !category.id.is_empty() && !category.label.is_empty()
}

fn split_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(slugify)
        .filter(|id| !id.is_empty())
        .collect()
}

/// Primaries plus one bucket per primary (orphan buckets are kept too).
pub fn categories_from_records(
    records: &[Record],
) -> (Vec<Category>, BTreeMap<String, Vec<Category>>) {
    let mut primaries: Vec<Category> = records
        .iter()
        .filter(|r| field(r, "category_type") == "primary")
        .map(category_from)
        .filter(is_complete)
        .collect();
    primaries.sort_by(by_order);

    let mut buckets: BTreeMap<String, Vec<Category>> = BTreeMap::new();
    for record in records.iter().filter(|r| field(r, "category_type") == "secondary") {
        let primary_id = slugify(field(record, "primary_category"));
        if primary_id.is_empty() {
            continue;
        }
        buckets.entry(primary_id).or_default().push(category_from(record));
    }
    for bucket in buckets.values_mut() {
        bucket.retain(is_complete);
        bucket.sort_by(by_order);
    }

    for p in &primaries {
        buckets.entry(p.id.clone()).or_default();
    }

    (primaries, buckets)
}

/// One mapping entry per known primary, enabled when listed in
/// `primary_categories`, tags from the `<primary>_tags` column.
pub fn service_from_record(record: &Record, primary_ids: &[String]) -> Service {
    let enabled_ids = split_ids(field(record, "primary_categories"));

    let mapping = primary_ids
        .iter()
        .map(|pid| {
            let raw_tags = field(record, &format!("{}_tags", pid));
            let tags = if raw_tags.is_empty() || raw_tags == "-" {
                Vec::new()
            } else {
                split_ids(raw_tags)
            };
            let entry = PrimaryMapping {
                enabled: enabled_ids.contains(pid),
                tags,
            };
            (pid.clone(), entry)
        })
        .collect();

    Service {
        service_id: field(record, "service_id").to_string(),
        service_name: field(record, "service_name").to_string(),
        description: field(record, "description").to_string(),
        price: field(record, "price").to_string(),
        image_url: field(record, "image_url").to_string(),
        cta_text: field(record, "cta_text").to_string(),
        cta_url: field(record, "cta_url").to_string(),
        mapping,
    }
}

/// Builds a fresh state from the categories and services sheets. The result
/// goes through [`normalize`] like any other external input.
pub fn state_from_csv(categories_csv: &str, services_csv: &str) -> Result<ConfigState> {
    let category_records = csv_codec::parse_to_records(categories_csv);
    let service_records = csv_codec::parse_to_records(services_csv);
    tracing::debug!(
        "Parsed {} category rows and {} service rows",
        category_records.len(),
        service_records.len()
    );

    let (primaries, secondaries_by_primary) = categories_from_records(&category_records);
    let primary_ids: Vec<String> = primaries.iter().map(|p| p.id.clone()).collect();

    let services: Vec<Service> = service_records
        .iter()
        .filter(|r| !field(r, "service_id").is_empty())
        .map(|r| service_from_record(r, &primary_ids))
        .filter(|s| !s.service_name.is_empty())
        .collect();

    let built = ConfigState {
        primaries,
        secondaries_by_primary,
        services,
        ..ConfigState::default()
    };

    Ok(normalize(&serde_json::to_value(&built)?))
}

/// Admits a JSON backup. Unparseable text is an error; anything that parses
/// is normalized.
pub fn import_json(text: &str) -> Result<ConfigState> {
    let raw: serde_json::Value = serde_json::from_str(text)?;
    Ok(normalize(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::export::{build_categories_csv, build_services_csv};

    const CATEGORIES: &str = "category_type,primary_category,category_id,checkbox_label,display_order
primary,-,yritys,Yritys,2
primary,-,Yksi Tyinen,Yksityinen,1
primary,-,,Nameless,3
secondary,yritys,varasto,Varasto,2
secondary,yritys,toimisto,Toimisto,1
secondary,Yksi Tyinen,mokki,Mökki,1
secondary,,lost,Lost,1
secondary,ghost,x,X,1
secondary,yritys,empty,,1
";

    const SERVICES: &str = "service_id,service_name,description,price,primary_categories,yksi_tyinen_tags,yritys_tags,image_url,cta_text,cta_url
1,Tarkastus,\"Laaja, sis. raportin\",120,\"yritys, yksi_tyinen\",-,\"toimisto,Varasto\",img.png,Tilaa,https://x.fi
2,Torjunta,,,yritys,mokki,-,,,
,Ilman id:tä,,,,,,,,
3,,,,,,,,,
";

    #[test]
    fn test_categories_are_sorted_and_bucketed() {
        let records = csv_codec::parse_to_records(CATEGORIES);
        let (primaries, buckets) = categories_from_records(&records);

        let ids: Vec<&str> = primaries.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["yksi_tyinen", "yritys"]);

        let yritys: Vec<&str> = buckets["yritys"].iter().map(|c| c.id.as_str()).collect();
        assert_eq!(yritys, vec!["toimisto", "varasto"]);
        assert_eq!(buckets["yksi_tyinen"].len(), 1);
        assert_eq!(buckets["ghost"].len(), 1);
        assert!(!buckets.contains_key(""));
    }

    #[test]
    fn test_every_primary_gets_a_bucket() {
        let records = csv_codec::parse_to_records(
            "category_type,primary_category,category_id,checkbox_label,display_order\nprimary,-,solo,Solo,1",
        );
        let (_, buckets) = categories_from_records(&records);
        assert_eq!(buckets.get("solo"), Some(&Vec::new()));
    }

    #[test]
    fn test_state_from_csv() {
        let state = state_from_csv(CATEGORIES, SERVICES).unwrap();
        assert_eq!(state.services.len(), 2);

        let first = &state.services[0];
        assert_eq!(first.description, "Laaja, sis. raportin");
        assert!(first.mapping["yritys"].enabled);
        assert_eq!(first.mapping["yritys"].tags, vec!["toimisto", "varasto"]);
        assert!(first.mapping["yksi_tyinen"].enabled);
        assert!(first.mapping["yksi_tyinen"].tags.is_empty());

        let second = &state.services[1];
        assert!(!second.mapping["yksi_tyinen"].enabled);
        // Tags are kept even when the primary is not enabled.
        assert_eq!(second.mapping["yksi_tyinen"].tags, vec!["mokki"]);
        assert_eq!(second.mapping.len(), 2);
    }

    #[test]
    fn test_empty_sheets_give_empty_state() {
        let state = state_from_csv("", "").unwrap();
        assert!(state.primaries.is_empty());
        assert!(state.secondaries_by_primary.is_empty());
        assert!(state.services.is_empty());
    }

    #[test]
    fn test_export_then_import_preserves_catalog() {
        let state = state_from_csv(CATEGORIES, SERVICES).unwrap();
        let reimported =
            state_from_csv(&build_categories_csv(&state), &build_services_csv(&state)).unwrap();

        assert_eq!(reimported.primaries, state.primaries);
        assert_eq!(reimported.services.len(), state.services.len());
        assert_eq!(reimported.services[0], state.services[0]);
        // Orphan buckets are not exported.
        assert!(!reimported.secondaries_by_primary.contains_key("ghost"));
    }

    #[test]
    fn test_import_json() {
        let state = import_json(r#"{"services": [{"service_id": " 5 ", "service_name": "Svc"}]}"#).unwrap();
        assert_eq!(state.services[0].service_id, "5");
        assert_eq!(state.primaries.len(), 3);

        assert!(import_json("{not json").is_err());
        assert_eq!(import_json("\"just a string\"").unwrap(), ConfigState::default());
    }
}
