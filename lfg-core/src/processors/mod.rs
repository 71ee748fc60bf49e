//! Processors of the matchmaking cycle.
//!
//! - `watermark`: decides which inbox conversations need fetching
//! - `classifier`: maps message text to a format or to help
//! - `topic_manager`: the active-topic table and single-flight topic creation
//! - `poll_monitor`: per-cycle match/expiry decisions
//! - `notifier`: delivers the one outcome message of a finished topic
//! - `restore`: rebuilds the active-topic table at startup
//! - `engine`: owns all of the above and runs the cycle

pub mod classifier;
pub mod engine;
pub mod notifier;
pub mod poll_monitor;
pub mod restore;
pub mod topic_manager;
pub mod watermark;

pub use classifier::{Trigger, classify};
pub use engine::MatchmakingEngine;
pub use notifier::{Delivery, Notifier, NotifyContext, Outcome};
pub use poll_monitor::{PollDecision, PollMonitor, TopicFate, decide, participants};
pub use restore::restore;
pub use topic_manager::{RequestError, RequestStatus, TopicBook, TopicRequest};
pub use watermark::{ChannelPlan, WatermarkTracker};
