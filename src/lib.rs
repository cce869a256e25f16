pub mod activity;
pub mod catalog;
pub mod clock;
pub mod command;
pub mod config;
pub mod console;
pub mod engine;
pub mod limits;
pub mod model;
pub mod notify;
pub mod observability;
pub mod reaper;
pub mod schedule;
pub mod store;
pub mod sync;
