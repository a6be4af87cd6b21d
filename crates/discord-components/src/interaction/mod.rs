//! Component interactions decoded from gateway events

mod decode;

use std::{fmt, sync::Arc};

#[cfg(test)]
pub(crate) use decode::test as fixtures;
pub use decode::decode;
pub(crate) use decode::{COMPONENT_INTERACTION, INTERACTION_CREATE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serenity::model::id::{
    ApplicationId, ChannelId, GuildId, InteractionId, MessageId, RoleId, UserId,
};
use tokio::sync::Mutex;

use crate::{
    component::{Button, Component, ComponentType, Select, SelectOption},
    config::ClientOptions,
    http::Transport,
    message::ComponentMessage,
    response::ResponseState,
};

/// A Discord user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID
    pub id: UserId,
    /// The user's unique handle
    pub username: String,
    /// The user's display name, if set
    #[serde(default)]
    pub global_name: Option<String>,
    /// Whether the user is a bot account
    #[serde(default)]
    pub bot: bool,
}

/// A user in the context of a guild
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// The underlying user
    pub user: User,
    /// The user's guild nickname, if set
    #[serde(default)]
    pub nick: Option<String>,
    /// The roles held by this member
    #[serde(default)]
    pub roles: Vec<RoleId>,
}

/// The user who triggered an interaction
///
/// Guild interactions carry a member payload, which is preferred since it
/// includes guild-specific data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    /// A guild member
    Member(Member),
    /// A user outside of any guild
    User(User),
}

impl Actor {
    /// The underlying user
    #[must_use]
    pub fn user(&self) -> &User {
        match self {
            Self::Member(m) => &m.user,
            Self::User(u) => u,
        }
    }

    /// The ID of the underlying user
    #[inline]
    #[must_use]
    pub fn id(&self) -> UserId { self.user().id }

    /// The guild member, if the interaction happened in a guild
    #[must_use]
    pub fn member(&self) -> Option<&Member> {
        match self {
            Self::Member(m) => Some(m),
            Self::User(_) => None,
        }
    }

    /// The name to show for this user, preferring a nickname or display name
    #[must_use]
    pub fn display_name(&self) -> &str {
        let user = self.user();
        self.member()
            .and_then(|m| m.nick.as_deref())
            .or(user.global_name.as_deref())
            .unwrap_or(&user.username)
    }
}

/// The message a component interaction came from
#[derive(Debug, Clone, PartialEq)]
pub enum MessageRef {
    /// The message payload included its components and was fully decoded
    Resolved(ComponentMessage),
    /// The message payload could not be decoded into a component tree, as is
    /// the case for some ephemeral messages
    Unresolved(Value),
    /// No message payload was sent
    Missing,
}

impl MessageRef {
    /// The ID of the message, if known
    #[must_use]
    pub fn id(&self) -> Option<MessageId> {
        match self {
            Self::Resolved(m) => Some(m.id()),
            Self::Unresolved(v) => v
                .get("id")
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|&n| n != 0)
                .map(MessageId::new),
            Self::Missing => None,
        }
    }

    /// The decoded message, if it was resolvable
    #[must_use]
    pub fn resolved(&self) -> Option<&ComponentMessage> {
        match self {
            Self::Resolved(m) => Some(m),
            Self::Unresolved(_) | Self::Missing => None,
        }
    }

    /// Whether the message is known to be ephemeral
    #[must_use]
    pub fn is_ephemeral(&self) -> bool {
        match self {
            Self::Resolved(m) => m.is_ephemeral(),
            Self::Unresolved(v) => v
                .get("flags")
                .and_then(Value::as_u64)
                .is_some_and(|f| f & crate::message::EPHEMERAL_FLAG != 0),
            Self::Missing => false,
        }
    }
}

/// A click on a button or a choice from a select menu
pub struct Interaction {
    pub(crate) id: InteractionId,
    pub(crate) application_id: ApplicationId,
    pub(crate) token: String,
    channel_id: ChannelId,
    guild_id: Option<GuildId>,
    custom_id: String,
    component_type: ComponentType,
    values: Vec<String>,
    actor: Actor,
    message: MessageRef,
    component: Component,
    selected: Vec<SelectOption>,
    raw: Value,
    pub(crate) state: Mutex<ResponseState>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) opts: Arc<ClientOptions>,
}

impl fmt::Debug for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interaction")
            .field("id", &self.id)
            .field("application_id", &self.application_id)
            .field("channel_id", &self.channel_id)
            .field("guild_id", &self.guild_id)
            .field("custom_id", &self.custom_id)
            .field("component_type", &self.component_type)
            .field("values", &self.values)
            .field("actor", &self.actor)
            .field("message", &self.message.id())
            .field("component", &self.component)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Interaction {
    /// The ID of this interaction
    #[inline]
    #[must_use]
    pub fn id(&self) -> InteractionId { self.id }

    /// The application that received this interaction
    #[inline]
    #[must_use]
    pub fn application_id(&self) -> ApplicationId { self.application_id }

    /// The continuation token used to respond to this interaction
    #[inline]
    #[must_use]
    pub fn token(&self) -> &str { &self.token }

    /// The channel the interaction happened in
    #[inline]
    #[must_use]
    pub fn channel_id(&self) -> ChannelId { self.channel_id }

    /// The guild the interaction happened in, if any
    #[inline]
    #[must_use]
    pub fn guild_id(&self) -> Option<GuildId> { self.guild_id }

    /// The custom ID of the component that was used
    #[inline]
    #[must_use]
    pub fn custom_id(&self) -> &str { &self.custom_id }

    /// The kind of component that was used
    #[inline]
    #[must_use]
    pub fn component_type(&self) -> ComponentType { self.component_type }

    /// The values chosen from a select menu, in the order Discord sent them
    #[inline]
    #[must_use]
    pub fn values(&self) -> &[String] { &self.values }

    /// The user who triggered this interaction
    #[inline]
    #[must_use]
    pub fn actor(&self) -> &Actor { &self.actor }

    /// The ID of the user who triggered this interaction
    #[inline]
    #[must_use]
    pub fn user_id(&self) -> UserId { self.actor.id() }

    /// The message the component is attached to
    #[inline]
    #[must_use]
    pub fn message(&self) -> &MessageRef { &self.message }

    /// The component that was used
    ///
    /// If the message could not be searched, this is rebuilt from what the
    /// interaction payload says about it.
    #[inline]
    #[must_use]
    pub fn component(&self) -> &Component { &self.component }

    /// The button that was clicked, if this was a button click
    #[inline]
    #[must_use]
    pub fn button(&self) -> Option<&Button> { self.component.as_button() }

    /// The select menu that was used, if this was a selection
    #[inline]
    #[must_use]
    pub fn select(&self) -> Option<&Select> { self.component.as_select() }

    /// The options chosen from a select menu, in the order of
    /// [`values`](Self::values)
    #[inline]
    #[must_use]
    pub fn selected_options(&self) -> &[SelectOption] { &self.selected }

    /// The `d` object of the gateway event this was decoded from
    #[inline]
    #[must_use]
    pub fn raw(&self) -> &Value { &self.raw }

    /// Where this interaction is in the response contract
    pub async fn state(&self) -> ResponseState { *self.state.lock().await }

    /// Whether a final response has been sent
    pub async fn responded(&self) -> bool { self.state().await == ResponseState::Responded }

    /// Whether a deferral has been sent and not yet followed up
    pub async fn deferred(&self) -> bool { self.state().await == ResponseState::Deferred }
}
