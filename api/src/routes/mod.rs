pub mod admin;
pub mod api_keys;
pub mod auth;
pub mod dashboard;
pub mod franchise;
pub mod marketplace;
pub mod plans;
pub mod strategies;
pub mod support;
pub mod wallet;
