use std::fmt;

/// Stock status shown in the output table
///
/// The display strings are the Czech labels used by the stores themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Availability {
    InStock,
    OutOfStock,
    PreOrder,
    Unknown,
}

impl Availability {
    /// Display label written to the output table
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InStock => "Skladem",
            Self::OutOfStock => "Nedostupné",
            Self::PreOrder => "Předobjednávka",
            Self::Unknown => "Neznámá",
        }
    }

    /// Maps a schema.org `ItemAvailability` value to a display status
    ///
    /// Accepts full URLs (`http://schema.org/InStock`, `https://schema.org/InStock`)
    /// as well as bare tokens (`InStock`). Unrecognized values map to `Unknown`.
    pub fn from_schema(value: &str) -> Self {
        let token = value
            .trim()
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();

        match token.to_ascii_lowercase().as_str() {
            "instock" | "limitedavailability" | "instoreonly" | "onlineonly" => Self::InStock,
            "outofstock" | "soldout" | "discontinued" => Self::OutOfStock,
            "preorder" | "presale" | "backorder" => Self::PreOrder,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized product as extracted from one page
///
/// `price` stays free text with the store's own suffix (e.g. `"29990,-"`).
/// Missing data is expressed with sentinels (`"N/A"`, `"Unknown"`, an empty
/// image), never with an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub url: String,
    pub name: String,
    pub price: String,
    pub availability: Availability,
    pub image: String,
    pub store: String,
}

/// Price placeholder for pages without an offer
pub const PRICE_NOT_AVAILABLE: &str = "N/A";

/// Name placeholder for pages without a heading
pub const NAME_UNKNOWN: &str = "Unknown";
