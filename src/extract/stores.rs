//! Built-in extraction strategies for the supported stores

use crate::extract::record::{Availability, ProductRecord, NAME_UNKNOWN, PRICE_NOT_AVAILABLE};
use crate::extract::structured::{
    find_product, first_offer, json_ld_blocks, offer_availability, offer_currency, offer_price,
    product_image,
};
use crate::extract::{ExtractError, ProductExtractor};
use scraper::{Html, Selector};
use std::sync::Arc;

/// How a store prints its prices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceStyle {
    /// Whole crowns with a dash: `29990,-`
    DashSuffix,

    /// Amount followed by the offer currency, or `fallback` when the offer has none
    Currency { fallback: &'static str },
}

impl PriceStyle {
    pub fn format(&self, amount: &str, currency: Option<&str>) -> String {
        match self {
            Self::DashSuffix => format!("{},-", amount),
            Self::Currency { fallback } => {
                format!("{} {}", amount, currency.unwrap_or(fallback))
            }
        }
    }
}

/// Strategy reading product data from schema.org JSON-LD
///
/// The name always comes from the page's `<h1>`, independent of the
/// structured data. Everything else comes from the first `Product` entity;
/// pages without one still produce a record with placeholder values.
#[derive(Debug, Clone)]
pub struct JsonLdStrategy {
    store: String,
    price_style: PriceStyle,
}

impl JsonLdStrategy {
    pub fn new(store: impl Into<String>, price_style: PriceStyle) -> Self {
        Self {
            store: store.into(),
            price_style,
        }
    }

    pub fn alza() -> Self {
        Self::new("alza", PriceStyle::DashSuffix)
    }

    pub fn datart() -> Self {
        Self::new("datart", PriceStyle::DashSuffix)
    }

    pub fn mironet() -> Self {
        Self::new("mironet", PriceStyle::DashSuffix)
    }

    pub fn mall() -> Self {
        Self::new("mall", PriceStyle::Currency { fallback: "Kč" })
    }
}

impl ProductExtractor for JsonLdStrategy {
    fn store(&self) -> &str {
        &self.store
    }

    fn extract(&self, html: &str, url: &str) -> Result<ProductRecord, ExtractError> {
        let document = Html::parse_document(html);

        let name = heading_text(&document)?.unwrap_or_else(|| NAME_UNKNOWN.to_string());

        let blocks = json_ld_blocks(&document)?;
        let product = find_product(&blocks);

        let image = product.and_then(product_image).unwrap_or_default();

        let offer = product.and_then(first_offer);
        let price = offer
            .and_then(|o| {
                offer_price(o).map(|amount| {
                    self.price_style
                        .format(&amount, offer_currency(o).as_deref())
                })
            })
            .unwrap_or_else(|| PRICE_NOT_AVAILABLE.to_string());
        let availability = offer
            .map(offer_availability)
            .unwrap_or(Availability::Unknown);

        Ok(ProductRecord {
            url: url.to_string(),
            name,
            price,
            availability,
            image,
            store: self.store.clone(),
        })
    }
}

/// Text of the first `<h1>`, with whitespace collapsed
pub fn heading_text(document: &Html) -> Result<Option<String>, ExtractError> {
    let selector = Selector::parse("h1").map_err(|e| ExtractError::Selector {
        selector: "h1".to_string(),
        message: format!("{:?}", e),
    })?;

    Ok(document
        .select(&selector)
        .next()
        .map(|element| {
            element
                .text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|s| !s.is_empty()))
}

/// Strategies registered by `StrategyRegistry::with_defaults`
pub fn builtin_strategies() -> Vec<Arc<dyn ProductExtractor>> {
    vec![
        Arc::new(JsonLdStrategy::alza()),
        Arc::new(JsonLdStrategy::datart()),
        Arc::new(JsonLdStrategy::mall()),
        Arc::new(JsonLdStrategy::mironet()),
    ]
}
