//! schema.org JSON-LD lookup
//!
//! Store markup changes often; the JSON-LD blocks the stores publish for search
//! engines are far more stable, so product data is read from them.

use crate::extract::record::Availability;
use crate::extract::ExtractError;
use scraper::{Html, Selector};
use serde_json::Value;

const JSON_LD_SELECTOR: &str = r#"script[type="application/ld+json"]"#;

/// Parses every JSON-LD block of the document
///
/// Blocks that are not valid JSON are skipped; a page may carry several
/// unrelated blocks and one broken block must not hide the others.
pub fn json_ld_blocks(document: &Html) -> Result<Vec<Value>, ExtractError> {
    let selector = Selector::parse(JSON_LD_SELECTOR).map_err(|e| ExtractError::Selector {
        selector: JSON_LD_SELECTOR.to_string(),
        message: format!("{:?}", e),
    })?;

    let mut blocks = Vec::new();
    for element in document.select(&selector) {
        let text = element.text().collect::<String>();
        match serde_json::from_str::<Value>(text.trim()) {
            Ok(value) => blocks.push(value),
            Err(e) => {
                tracing::debug!("Skipping malformed JSON-LD block: {}", e);
            }
        }
    }

    Ok(blocks)
}

/// Finds the first entity declaring `@type: "Product"`
///
/// Blocks are searched in document order. A block may be a single object, a
/// list of objects, or an object wrapping a `@graph` list.
pub fn find_product(blocks: &[Value]) -> Option<&Value> {
    let mut candidates = Vec::new();
    for block in blocks {
        collect_entities(block, &mut candidates);
    }

    candidates.into_iter().find(|entity| is_product(entity))
}

fn collect_entities<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_entities(item, out);
            }
        }
        Value::Object(map) => {
            out.push(value);
            if let Some(graph) = map.get("@graph") {
                collect_entities(graph, out);
            }
        }
        _ => {}
    }
}

/// `@type` may be a plain string or a list of strings
fn is_product(entity: &Value) -> bool {
    match entity.get("@type") {
        Some(Value::String(t)) => t == "Product",
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("Product")),
        _ => false,
    }
}

/// Normalizes the `image` property to a single URL
///
/// Handles a plain string, a list of strings, an `ImageObject`, and a list of
/// `ImageObject`s. The first usable URL wins.
pub fn product_image(product: &Value) -> Option<String> {
    image_url(product.get("image")?)
}

fn image_url(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(s),
        Value::Array(items) => items.iter().find_map(image_url),
        Value::Object(map) => map
            .get("url")
            .or_else(|| map.get("contentUrl"))
            .and_then(Value::as_str)
            .and_then(non_empty),
        _ => None,
    }
}

/// Returns the product's offer; for a list of offers, the first one
pub fn first_offer(product: &Value) -> Option<&Value> {
    match product.get("offers")? {
        Value::Array(offers) => offers.iter().find(|o| o.is_object()),
        offer @ Value::Object(_) => Some(offer),
        _ => None,
    }
}

/// Offer price as text
///
/// An `AggregateOffer` without `price` falls back to `lowPrice`.
pub fn offer_price(offer: &Value) -> Option<String> {
    offer
        .get("price")
        .and_then(value_as_text)
        .or_else(|| offer.get("lowPrice").and_then(value_as_text))
}

/// Offer currency, e.g. `CZK`
pub fn offer_currency(offer: &Value) -> Option<String> {
    offer
        .get("priceCurrency")
        .and_then(Value::as_str)
        .and_then(non_empty)
}

/// Offer availability mapped to a display status
pub fn offer_availability(offer: &Value) -> Availability {
    offer
        .get("availability")
        .and_then(Value::as_str)
        .map(Availability::from_schema)
        .unwrap_or(Availability::Unknown)
}

/// Renders a JSON scalar as text; whole floats lose their `.0`
fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(s),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                let f = n.as_f64()?;
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    Some(format!("{}", f as i64))
                } else {
                    Some(f.to_string())
                }
            }
        }
        _ => None,
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
