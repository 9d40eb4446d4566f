//! Player-facing message output
//!
//! The engine never formats for a particular UI. It hands finished lines to a
//! [`MessageSink`] in the order they happen and moves on.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::actor::Actor;

/// Rough category of a message, for sinks that colour or filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum MsgChannel {
    Plain,
    /// Attack results
    Combat,
    /// Status effects gained or lost
    Status,
    /// Something the player should notice
    Warning,
}

/// Fire-and-forget, ordered output.
pub trait MessageSink: fmt::Debug {
    fn emit(&mut self, channel: MsgChannel, text: &str);
}

/// One delivered message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub channel: MsgChannel,
    pub text: String,
}

/// In-memory sink that keeps everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageLog {
    entries: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle, so a test can keep reading what the session emits.
    pub fn shared() -> Rc<RefCell<MessageLog>> {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn entries(&self) -> &[Message] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if any message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|m| m.text.contains(needle))
    }

    /// Remove and return everything logged so far.
    pub fn take(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.entries)
    }
}

impl MessageSink for MessageLog {
    fn emit(&mut self, channel: MsgChannel, text: &str) {
        self.entries.push(Message {
            channel,
            text: text.to_string(),
        });
    }
}

impl MessageSink for Rc<RefCell<MessageLog>> {
    fn emit(&mut self, channel: MsgChannel, text: &str) {
        self.borrow_mut().emit(channel, text);
    }
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl MessageSink for NullSink {
    fn emit(&mut self, _channel: MsgChannel, _text: &str) {}
}

/// How an actor is referred to in a message: "you" or "the rat".
pub fn the_name(actor: &dyn Actor) -> String {
    if actor.is_player() {
        "you".to_string()
    } else {
        format!("the {}", actor.name())
    }
}

/// Possessive form: "your" or "the rat's".
pub fn possessive(actor: &dyn Actor) -> String {
    if actor.is_player() {
        "your".to_string()
    } else {
        format!("the {}'s", actor.name())
    }
}

/// Uppercase the first letter, for names starting a sentence.
pub fn capitalise(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_keeps_order() {
        let mut log = MessageLog::new();
        log.emit(MsgChannel::Combat, "first");
        log.emit(MsgChannel::Status, "second");
        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[0].text, "first");
        assert_eq!(log.entries()[1].channel, MsgChannel::Status);
        assert!(log.contains("sec"));
    }

    #[test]
    fn test_shared_log_sees_emits() {
        let shared = MessageLog::shared();
        let mut sink: Box<dyn MessageSink> = Box::new(shared.clone());
        sink.emit(MsgChannel::Plain, "hello");
        assert!(shared.borrow().contains("hello"));
        assert_eq!(shared.borrow_mut().take().len(), 1);
        assert!(shared.borrow().is_empty());
    }

    #[test]
    fn test_names_for_messages() {
        let rat = crate::actor::Monster::new(crate::actor::MonsterType::Generic, "rat");
        let hero = crate::actor::Player::new("Hero");
        assert_eq!(capitalise(&the_name(&rat)), "The rat");
        assert_eq!(the_name(&hero), "you");
        assert_eq!(possessive(&rat), "the rat's");
        assert_eq!(capitalise(""), "");
    }
}
