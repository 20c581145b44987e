// Library for tests to access modules

pub mod buffer;
pub mod config;
pub mod encoder;
pub mod error;
pub mod inventory_repo;
pub mod models;
pub mod routes;
pub mod scraper;
pub mod sender;
pub mod stats;
pub mod version;
