//! Projection of nested listings onto flat CSV columns.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;

use crate::data::Listing;

const PATH_SEPARATOR: &str = "_";

/// Nested fields that get their own column, in output order.
const COLUMN_PATHS: &[&[&str]] = &[
    &["id"],
    &["kind"],
    &["side"],
    &["status"],
    &["tokenSetId"],
    &["tokenSetSchemaHash"],
    &["contract"],
    &["contractKind"],
    &["maker"],
    &["taker"],
    &["price", "currency", "contract"],
    &["price", "currency", "name"],
    &["price", "currency", "symbol"],
    &["price", "currency", "decimals"],
    &["price", "amount", "raw"],
    &["price", "amount", "decimal"],
    &["price", "amount", "usd"],
    &["price", "amount", "native"],
    &["price", "netAmount", "raw"],
    &["price", "netAmount", "decimal"],
    &["price", "netAmount", "usd"],
    &["price", "netAmount", "native"],
    &["validFrom"],
    &["validUntil"],
    &["quantityFilled"],
    &["quantityRemaining"],
    &["dynamicPricing"],
    &["criteria", "kind"],
    &["criteria", "data", "token", "tokenId"],
    &["source", "id"],
    &["source", "domain"],
    &["source", "name"],
    &["source", "icon"],
];

/// One table row keyed by column name. Absent keys are empty cells.
pub type Row = BTreeMap<String, String>;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// Where a column takes its value from.
enum Source {
    Path(&'static [&'static str]),
    TopLevel(String),
}

/// Flatten listings into a table with one row per listing.
pub fn flatten_listings(listings: &[Listing]) -> Table {
    let mut sources: Vec<Source> = COLUMN_PATHS.iter().copied().map(Source::Path).collect();
    let enumerated: HashSet<&str> = COLUMN_PATHS
        .iter()
        .filter(|path| path.len() == 1)
        .map(|path| path[0])
        .collect();

    let mut extra_seen = HashSet::new();
    for object in listings.iter().filter_map(Value::as_object) {
        for (key, value) in object {
            if enumerated.contains(key.as_str()) || value.is_object() || value.is_array() {
                continue;
            }
            if extra_seen.insert(key.clone()) {
                sources.push(Source::TopLevel(key.clone()));
            }
        }
    }

    let mut columns = Vec::with_capacity(sources.len());
    let mut named_sources = Vec::with_capacity(sources.len());
    let mut taken = HashSet::new();
    for source in sources {
        let name = match &source {
            Source::Path(path) => path.join(PATH_SEPARATOR),
            Source::TopLevel(key) => key.clone(),
        };
        let name = name.replace('.', PATH_SEPARATOR);
        if taken.insert(name.clone()) {
            columns.push(name.clone());
            named_sources.push((name, source));
        }
    }

    let rows: Vec<Row> = listings
        .iter()
        .map(|listing| {
            named_sources
                .iter()
                .filter_map(|(name, source)| {
                    let value = match source {
                        Source::Path(path) => lookup(listing, path),
                        Source::TopLevel(key) => listing
                            .get(key)
                            .filter(|value| !value.is_object() && !value.is_array()),
                    }?;
                    render_cell(value).map(|cell| (name.clone(), cell))
                })
                .collect()
        })
        .collect();

    Table { columns, rows }
}

fn lookup<'a>(listing: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(listing, |value, segment| value.get(segment))
}

fn render_cell(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}
