//! Word storage and index provisioning on Elasticsearch.

mod client;
pub mod naming;
mod provisioner;
mod words_es_repo;

pub use client::{ElasticClient, ElasticError};
pub use provisioner::ElasticIndexProvisioner;
pub use words_es_repo::ElasticWordsRepository;
