mod client;

pub use client::HttpPlanApi;
