//! Polling Module
//!
//! Poll lifecycle engine: creation, toggle/switch vote casting,
//! scheduled closing, result aggregation, and message rendering.

pub mod engine;
pub mod render;
pub mod results;
pub mod types;

pub use engine::VotingEngine;
pub use types::{
    CastOutcome, CreatePoll, MessageRef, OptionTally, Poll, PollError, PollResults, VoteReply,
};
