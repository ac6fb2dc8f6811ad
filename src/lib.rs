// Library for tests to access modules

pub mod aggregation;
pub mod config;
pub mod error;
pub mod metrics_store;
pub mod models;
pub mod nexus_client;
pub mod poller;
pub mod routes;
