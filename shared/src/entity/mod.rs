//! `SeaORM` entities, one module per table

pub mod api_keys;
pub mod charges;
pub mod franchises;
pub mod plan_subscriptions;
pub mod plans;
pub mod strategies;
pub mod strategy_subscriptions;
pub mod support_tickets;
pub mod ticket_replies;
pub mod users;
pub mod wallet_transactions;
pub mod wallets;
