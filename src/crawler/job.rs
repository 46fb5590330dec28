use crate::config::Config;

/// One unit of work: a product page of a given store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub store_type: String,
    pub url: String,
}

impl Job {
    pub fn new(store_type: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            store_type: store_type.into(),
            url: url.into(),
        }
    }
}

/// Expands the configured stores into a flat job list
///
/// Store order and URL order within a store are preserved.
pub fn expand_jobs(config: &Config) -> Vec<Job> {
    config
        .stores
        .iter()
        .flat_map(|store| {
            store
                .urls
                .iter()
                .map(move |url| Job::new(store.store_type.as_str(), url.as_str()))
        })
        .collect()
}
