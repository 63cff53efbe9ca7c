pub mod strategy_repository;
pub mod user_repository;
pub mod wallet_repository;
