//! Client-wide defaults

use std::time::Duration;

use serenity::builder::CreateAllowedMentions;

/// Options for a [`ComponentsClient`](crate::ComponentsClient)
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct ClientOptions {
    wait_timeout: Option<Duration>,
    allowed_mentions: Option<CreateAllowedMentions>,
    ephemeral: bool,
}

impl ClientOptions {
    /// Construct the default options: no wait timeout, no default
    /// allowed-mentions, public responses
    #[inline]
    pub fn new() -> Self { Self::default() }

    /// Set the timeout applied to waits that do not specify their own
    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = Some(timeout);
        self
    }

    /// Set the allowed-mentions object used for outgoing messages that do not
    /// provide one
    pub fn allowed_mentions(mut self, allowed_mentions: CreateAllowedMentions) -> Self {
        self.allowed_mentions = Some(allowed_mentions);
        self
    }

    /// Set whether interaction responses are ephemeral unless a body says
    /// otherwise
    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }

    /// The default wait timeout
    #[inline]
    #[must_use]
    pub fn default_wait_timeout(&self) -> Option<Duration> { self.wait_timeout }

    /// The default allowed-mentions object
    #[inline]
    #[must_use]
    pub fn default_allowed_mentions(&self) -> Option<&CreateAllowedMentions> {
        self.allowed_mentions.as_ref()
    }

    /// Whether interaction responses default to ephemeral
    #[inline]
    #[must_use]
    pub fn ephemeral_by_default(&self) -> bool { self.ephemeral }
}
