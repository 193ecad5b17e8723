mod app;
mod message;
mod widgets;

pub use app::{DetectApp, run};
pub use message::Message;
