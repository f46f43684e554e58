//! quorum poll bot library
//!
//! Core functionality for the quorum poll bot: the poll lifecycle
//! engine (creation, concurrent vote casting, scheduled closing,
//! result rendering), its SQLite-backed stores, the chat channel
//! interface, and one-shot job scheduling.

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod channels;
pub mod config;
pub mod cron;
pub mod logging;
pub mod polls;
pub mod store;
