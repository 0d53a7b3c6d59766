//! Outbound notification seam.

use anyhow::Result;
use async_trait::async_trait;

use crate::engine::{ChatId, Keyboard};

/// Delivers text (plus an optional keyboard identifier) to the chat
/// transport. Fire-and-forget from the caller's perspective: the
/// dispatcher logs a failed delivery and moves on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, chat: ChatId, text: &str, keyboard: Option<Keyboard>) -> Result<()>;
}

/// Console stand-in for a real chat transport.
pub struct StdoutNotifier;

#[async_trait]
impl Notifier for StdoutNotifier {
    async fn send(&self, chat: ChatId, text: &str, keyboard: Option<Keyboard>) -> Result<()> {
        match keyboard {
            Some(kb) => println!("[chat {}] {}  (keyboard: {:?})", chat, text, kb),
            None => println!("[chat {}] {}", chat, text),
        }
        Ok(())
    }
}
