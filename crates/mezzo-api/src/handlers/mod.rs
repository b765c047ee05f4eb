//! Request handlers.

pub mod health;
pub mod media;
pub mod webhook;

pub use health::{health, ready};
pub use media::{get_media, register_media, start_transcode};
pub use webhook::receive_callback;
