//! Chat completion client for arklife.
//!
//! [`ChatClient`] speaks the OpenAI-compatible `/chat/completions` protocol,
//! which DeepSeek and most hosted models accept.

pub mod chat;

pub use chat::{ChatClient, ChatSettings};
