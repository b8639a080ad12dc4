pub mod plan_api;
