//! Wire objects and HTTP clients for the platforms the LFG matchmaker talks
//! to: a Discourse forum and the Convoke game-room API.

#[cfg(feature = "client")]
pub mod client;
pub mod objects;
