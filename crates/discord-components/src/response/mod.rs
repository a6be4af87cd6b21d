//! Answering an interaction
//!
//! Discord accepts exactly one initial response per interaction, which may be
//! a deferral followed by one edit of the deferred placeholder.  The methods in
//! [`responder`] track where an [`Interaction`](crate::interaction::Interaction)
//! is in that contract and turn repeated responses into no-ops instead of
//! requests Discord would reject.

mod prepare;
pub mod responder;

pub use prepare::Prepare;
use serde_json::Value;

use crate::message::ComponentMessage;

/// The `type` of an interaction callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ResponseType {
    /// Acknowledge a ping
    Pong = 1,
    /// Reply with a new message
    ChannelMessageWithSource = 4,
    /// Acknowledge now and send a new message later
    DeferredChannelMessageWithSource = 5,
    /// Acknowledge now and edit the component's message later
    DeferredUpdateMessage = 6,
    /// Edit the component's message
    UpdateMessage = 7,
}

impl ResponseType {
    /// Whether this response expects a follow-up edit
    #[inline]
    #[must_use]
    pub fn is_deferred(self) -> bool {
        matches!(
            self,
            Self::DeferredChannelMessageWithSource | Self::DeferredUpdateMessage
        )
    }

    /// Whether this response completes the interaction
    #[inline]
    #[must_use]
    pub fn is_final(self) -> bool { !self.is_deferred() }
}

impl From<ResponseType> for u8 {
    #[inline]
    fn from(value: ResponseType) -> Self { value as u8 }
}

/// Where an interaction is in the response contract
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ResponseState {
    /// Nothing has been sent yet
    #[default]
    Fresh,
    /// A deferral was sent and the placeholder can still be edited
    Deferred,
    /// The interaction has been answered for good
    Responded,
}

/// What a call to [`respond`](crate::interaction::Interaction::respond)
/// actually did
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The interaction had already been answered, so nothing was sent
    Skipped,
    /// The initial callback was sent
    Callback,
    /// The deferred placeholder was edited, returning the edited message if
    /// the transport reported it
    Edited(Option<Value>),
}

impl Outcome {
    /// Whether a request was made
    #[inline]
    #[must_use]
    pub fn sent(&self) -> bool { !matches!(self, Self::Skipped) }
}

/// The message produced by [`send`](crate::interaction::Interaction::send)
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    /// A regular message, decoded with its components
    Message(ComponentMessage),
    /// An ephemeral message, which cannot be fetched or edited later and is
    /// only available as raw JSON
    Ephemeral(Value),
}

impl Sent {
    /// The raw JSON of the sent message
    #[must_use]
    pub fn raw(&self) -> &Value {
        match self {
            Self::Message(m) => m.raw(),
            Self::Ephemeral(v) => v,
        }
    }
}
