use crate::extract::{Availability, ProductRecord};

/// Column names of the output table, in order
pub const HEADER: [&str; 7] = ["url", "name", "price", "availability", "image", "store", "error"];

/// One line of the output table: a job's product or its error
///
/// `url` and `store` identify the job and are always present. The product
/// fields are all present when `error` is absent and all absent when it is
/// set; the constructors are the only way to build a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    url: String,
    store: String,
    name: Option<String>,
    price: Option<String>,
    availability: Option<Availability>,
    image: Option<String>,
    error: Option<String>,
}

impl ResultRow {
    /// Row for a successfully extracted product
    pub fn success(record: ProductRecord) -> Self {
        Self {
            url: record.url,
            store: record.store,
            name: Some(record.name),
            price: Some(record.price),
            availability: Some(record.availability),
            image: Some(record.image),
            error: None,
        }
    }

    /// Row for a job that failed to fetch or extract
    pub fn failure(url: impl Into<String>, store: impl Into<String>, error: impl ToString) -> Self {
        Self {
            url: url.into(),
            store: store.into(),
            name: None,
            price: None,
            availability: None,
            image: None,
            error: Some(error.to_string()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn store(&self) -> &str {
        &self.store
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn price(&self) -> Option<&str> {
        self.price.as_deref()
    }

    pub fn availability(&self) -> Option<Availability> {
        self.availability
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Field values in `HEADER` order; absent values are empty
    pub fn to_record(&self) -> [&str; 7] {
        [
            self.url.as_str(),
            self.name().unwrap_or_default(),
            self.price().unwrap_or_default(),
            self.availability.map(|a| a.as_str()).unwrap_or_default(),
            self.image().unwrap_or_default(),
            self.store.as_str(),
            self.error().unwrap_or_default(),
        ]
    }
}
