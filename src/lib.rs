pub mod analyzers;
pub mod config;
pub mod error;
pub mod expansion;
pub mod fetch;
pub mod infra;
pub mod model;
pub mod normalize;
pub mod output;
pub mod registry;
pub mod services;
pub mod submission;
pub mod tracking;
