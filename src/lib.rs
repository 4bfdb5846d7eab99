pub mod announce;
pub mod auth;
pub mod certificate;
pub mod clock;
pub mod commands;
pub mod config;
pub mod curriculum;
pub mod db;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod models;
pub mod notify;
pub mod report;
pub mod store;
