//! HTTP handlers: clients, and the schema-validated resources (contacts, contracts, partners).

pub mod clients;
pub mod records;

use crate::service::ListParams;
use std::collections::HashMap;

/// Split query-string pairs into paging and the filters this resource allows.
/// Unknown keys and unparsable numbers are ignored.
pub(crate) fn list_params(query: HashMap<String, String>, allowed: &[&str]) -> ListParams {
    let mut params = ListParams::default();
    for (k, v) in query {
        if k == "limit" {
            params.limit = v.parse().ok();
        } else if k == "offset" {
            params.offset = v.parse().ok();
        } else if allowed.contains(&k.as_str()) {
            params.filters.push((k, v));
        }
    }
    params.filters.sort();
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_allowed_filters() {
        let query: HashMap<String, String> = [
            ("limit", "20"),
            ("offset", "x"),
            ("clientId", "c1"),
            ("montantAnnuel", "10"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let params = list_params(query, &["clientId"]);
        assert_eq!(params.limit, Some(20));
        assert_eq!(params.offset, None);
        assert_eq!(params.filters, vec![("clientId".to_string(), "c1".to_string())]);
    }
}
