pub mod classifier;
pub mod config;
pub mod db;
pub mod dns;
pub mod features;
pub mod fetcher;
pub mod models;
pub mod rate_limiter;
pub mod web;
pub mod whois;
