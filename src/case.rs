//! Key case conversion between the API (camelCase) and storage columns (snake_case).

use serde_json::{Map, Value};

/// `client_id` -> `clientId`. Underscores are dropped and the next character upper-cased.
pub fn to_camel_case(column: &str) -> String {
    let mut parts = column.split('_');
    let mut wire: String = parts.next().unwrap_or_default().to_string();
    for part in parts {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            wire.extend(first.to_uppercase());
            wire.push_str(chars.as_str());
        }
    }
    wire
}

/// `dateDebut` -> `date_debut`; digits stay attached (`commissionAnnee1` -> `commission_annee1`).
pub fn to_snake_case(field: &str) -> String {
    field.chars().fold(String::with_capacity(field.len() + 4), |mut column, c| {
        if c.is_uppercase() {
            if !column.is_empty() {
                column.push('_');
            }
            column.extend(c.to_lowercase());
        } else {
            column.push(c);
        }
        column
    })
}

/// Rename the top-level keys of a stored row to their wire names.
/// Nested values are stored documents and keep their own keys.
pub fn object_keys_to_camel_case(row: &mut Map<String, Value>) {
    let renamed: Vec<(String, String)> = row
        .keys()
        .filter(|k| k.contains('_'))
        .map(|k| (k.clone(), to_camel_case(k)))
        .collect();
    for (column, wire) in renamed {
        if let Some(v) = row.remove(&column) {
            row.insert(wire, v);
        }
    }
}
