// Library for tests to access modules

pub mod aggregator;
pub mod config;
pub mod framer;
pub mod grammar;
pub mod listener;
pub mod models;
pub mod pipeline;
pub mod range;
pub mod refresher;
pub mod routes;
pub mod version;
