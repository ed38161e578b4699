//! Blocking client for the Datamuse word-finding API.
//!
//! One request per lookup, no caching. A failed request is returned as an
//! error and aborts whatever poem was being generated.

use log::debug;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::DatamuseConfig;
use crate::error::Result;
use crate::relations::{Relation, WordAssociation};

/// One entry of a Datamuse response. Only the word is used; results
/// already arrive ordered by relevance.
#[derive(Debug, Deserialize)]
struct DatamuseWord {
    word: String,
}

pub struct DatamuseClient {
    client: Client,
    base_url: String,
}

impl std::fmt::Debug for DatamuseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatamuseClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl DatamuseClient {
    pub fn new(config: &DatamuseConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("generative-poetry/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Run a raw query, e.g. `[("rel_rhy", "crime"), ("max", "20")]`.
    pub fn query(&self, params: &[(&str, String)]) -> Result<Vec<String>> {
        debug!("datamuse query {params:?}");
        let body = self
            .client
            .get(&self.base_url)
            .query(params)
            .send()?
            .error_for_status()?
            .text()?;
        parse_words(&body)
    }
}

impl WordAssociation for DatamuseClient {
    fn related(&self, word: &str, relation: Relation, max: Option<usize>) -> Result<Vec<String>> {
        let mut params = vec![(relation.datamuse_param(), word.to_string())];
        if let Some(max) = max {
            params.push(("max", max.to_string()));
        }
        self.query(&params)
    }
}

fn parse_words(body: &str) -> Result<Vec<String>> {
    let entries: Vec<DatamuseWord> = serde_json::from_str(body)?;
    Ok(entries.into_iter().map(|e| e.word).collect())
}
