use crate::core::csv_codec;
use crate::core::fields::{sorted_categories, sorted_services};
use crate::domain::model::{ConfigState, Service};
use crate::utils::error::Result;

pub const CATEGORIES_HEADER: [&str; 5] = [
    "category_type",
    "primary_category",
    "category_id",
    "checkbox_label",
    "display_order",
];

/// Sorted primary ids whose mapping is enabled, joined with `,`.
pub fn primary_categories_of(state: &ConfigState, service: &Service) -> String {
    sorted_categories(&state.primaries)
        .iter()
        .filter(|p| service.mapping.get(&p.id).is_some_and(|m| m.enabled))
        .map(|p| p.id.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

pub fn build_categories_csv(state: &ConfigState) -> String {
    let primaries = sorted_categories(&state.primaries);
    let mut rows: Vec<Vec<String>> = vec![CATEGORIES_HEADER.iter().map(|h| h.to_string()).collect()];

    for p in &primaries {
        rows.push(vec![
            "primary".to_string(),
            "-".to_string(),
            p.id.clone(),
            p.label.clone(),
            p.order.to_string(),
        ]);
    }

    for p in &primaries {
        let Some(bucket) = state.secondaries_by_primary.get(&p.id) else {
            continue;
        };
        for c in sorted_categories(bucket) {
            rows.push(vec![
                "secondary".to_string(),
                p.id.clone(),
                c.id,
                c.label,
                c.order.to_string(),
            ]);
        }
    }

    tracing::debug!("Built categories CSV with {} data rows", rows.len() - 1);
    csv_codec::serialize(&rows)
}

pub fn build_services_csv(state: &ConfigState) -> String {
    let primaries = sorted_categories(&state.primaries);

    let mut header: Vec<String> = ["service_id", "service_name", "description", "price", "primary_categories"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    header.extend(primaries.iter().map(|p| format!("{}_tags", p.id)));
    header.extend(["image_url", "cta_text", "cta_url"].iter().map(|h| h.to_string()));

    let mut rows = vec![header];
    for s in sorted_services(&state.services) {
        let tag_values = primaries.iter().map(|p| match s.mapping.get(&p.id) {
            Some(m) if m.enabled => {
                let tags: Vec<&str> = m
                    .tags
                    .iter()
                    .map(String::as_str)
                    .filter(|t| !t.is_empty())
                    .collect();
                if tags.is_empty() {
                    "-".to_string()
                } else {
                    tags.join(",")
                }
            }
            _ => "-".to_string(),
        });

        let mut row = vec![
            s.service_id.clone(),
            s.service_name.clone(),
            s.description.clone(),
            s.price.clone(),
            primary_categories_of(state, s),
        ];
        row.extend(tag_values);
        row.extend([s.image_url.clone(), s.cta_text.clone(), s.cta_url.clone()]);
        rows.push(row);
    }

    tracing::debug!("Built services CSV with {} data rows", rows.len() - 1);
    csv_codec::serialize(&rows)
}

/// Pretty-printed backup of the whole state.
pub fn export_json(state: &ConfigState) -> Result<String> {
    Ok(serde_json::to_string_pretty(state)?)
}
