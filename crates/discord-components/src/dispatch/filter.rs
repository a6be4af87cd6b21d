use std::{fmt, sync::Arc};

use serenity::model::id::{ChannelId, GuildId, MessageId, UserId};

use crate::{component::AsCustomId, interaction::Interaction, ArgumentError};

type Predicate = Arc<dyn Fn(&Interaction) -> bool + Send + Sync>;

/// A conjunction of conditions an interaction must meet
///
/// Every condition is optional; an empty filter matches everything.  Setting
/// the same condition twice requires both values to match.
#[derive(Clone, Default)]
#[must_use]
pub struct Filter {
    messages: Vec<MessageId>,
    exclude_ephemeral: bool,
    components: Vec<String>,
    guilds: Vec<GuildId>,
    channels: Vec<ChannelId>,
    users: Vec<UserId>,
    predicates: Vec<Predicate>,
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("messages", &self.messages)
            .field("exclude_ephemeral", &self.exclude_ephemeral)
            .field("components", &self.components)
            .field("guilds", &self.guilds)
            .field("channels", &self.channels)
            .field("users", &self.users)
            .field("predicates", &self.predicates.len())
            .finish()
    }
}

impl Filter {
    /// Construct a filter that matches everything
    #[inline]
    pub fn new() -> Self { Self::default() }

    /// Require the interaction to come from the given message
    pub fn message(mut self, id: MessageId) -> Self {
        self.messages.push(id);
        self
    }

    /// Require the interaction's message to be resolvable and not ephemeral
    pub fn exclude_ephemeral(mut self, exclude: bool) -> Self {
        self.exclude_ephemeral = exclude;
        self
    }

    /// Require the interaction to target the given component
    ///
    /// # Errors
    /// This method returns an error if the component has no custom ID.
    pub fn component<C: AsCustomId + ?Sized>(
        mut self,
        component: &C,
    ) -> Result<Self, ArgumentError> {
        self.components.push(
            component
                .as_custom_id()
                .ok_or(ArgumentError::NoCustomId)?
                .to_owned(),
        );
        Ok(self)
    }

    /// Require the interaction to happen in the given guild
    pub fn guild(mut self, id: GuildId) -> Self {
        self.guilds.push(id);
        self
    }

    /// Require the interaction to happen in the given channel
    pub fn channel(mut self, id: ChannelId) -> Self {
        self.channels.push(id);
        self
    }

    /// Require the interaction to be triggered by the given user
    pub fn user(mut self, id: UserId) -> Self {
        self.users.push(id);
        self
    }

    /// Require an arbitrary condition to hold
    pub fn predicate(mut self, f: impl Fn(&Interaction) -> bool + Send + Sync + 'static) -> Self {
        self.predicates.push(Arc::new(f));
        self
    }

    /// Combine two filters, requiring both to match
    pub fn and(mut self, other: Self) -> Self {
        let Self {
            messages,
            exclude_ephemeral,
            components,
            guilds,
            channels,
            users,
            predicates,
        } = other;

        self.messages.extend(messages);
        self.exclude_ephemeral |= exclude_ephemeral;
        self.components.extend(components);
        self.guilds.extend(guilds);
        self.channels.extend(channels);
        self.users.extend(users);
        self.predicates.extend(predicates);
        self
    }

    /// Test an interaction against this filter
    #[must_use]
    pub fn matches(&self, int: &Interaction) -> bool {
        let msg = int.message();

        self.messages.iter().all(|&id| msg.id() == Some(id))
            && !(self.exclude_ephemeral && (msg.resolved().is_none() || msg.is_ephemeral()))
            && self.components.iter().all(|id| int.custom_id() == id.as_str())
            && self.guilds.iter().all(|&id| int.guild_id() == Some(id))
            && self.channels.iter().all(|&id| int.channel_id() == id)
            && self.users.iter().all(|&id| int.user_id() == id)
            && self.predicates.iter().all(|p| p(int))
    }
}

/// Match interactions from the given message, optionally rejecting ephemeral
/// or unresolvable messages
pub fn message_filter(id: MessageId, exclude_ephemeral: bool) -> Filter {
    Filter::new().message(id).exclude_ephemeral(exclude_ephemeral)
}

/// Match interactions targeting the given component
///
/// # Errors
/// This function returns an error if the component has no custom ID.
pub fn component_filter<C: AsCustomId + ?Sized>(component: &C) -> Result<Filter, ArgumentError> {
    Filter::new().component(component)
}

/// Match interactions in the given guild
pub fn guild_filter(id: GuildId) -> Filter { Filter::new().guild(id) }

/// Match interactions in the given channel
pub fn channel_filter(id: ChannelId) -> Filter { Filter::new().channel(id) }

/// Match interactions triggered by the given user
pub fn user_filter(id: UserId) -> Filter { Filter::new().user(id) }

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use serde_json::json;
    use serenity::model::id::{ChannelId, GuildId, MessageId, UserId};

    use super::{
        channel_filter, component_filter, guild_filter, message_filter, user_filter, Filter,
    };
    use crate::{
        component::{Button, ButtonStyle, Wire},
        http::mock::MockTransport,
        interaction::{fixtures, Interaction},
        ArgumentError,
    };

    fn resolved_click() -> Interaction {
        let button = Button::new(ButtonStyle::Primary, "ok", "OK").unwrap();
        fixtures::decode_with(
            &fixtures::envelope(
                json!({ "custom_id": "ok", "component_type": 2 }),
                Some(fixtures::message_with(json!([
                    { "type": 1, "components": [button.to_wire()] },
                ]))),
            ),
            Arc::new(MockTransport::new()),
        )
        .unwrap()
    }

    fn ephemeral_click() -> Interaction {
        fixtures::decode_with(
            &fixtures::envelope(
                json!({ "custom_id": "ok", "component_type": 2 }),
                Some(json!({ "id": "700", "flags": 64 })),
            ),
            Arc::new(MockTransport::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_single_filters() {
        let int = resolved_click();

        assert!(Filter::new().matches(&int));
        assert!(message_filter(MessageId::new(700), true).matches(&int));
        assert!(!message_filter(MessageId::new(701), false).matches(&int));
        assert!(component_filter("ok").unwrap().matches(&int));
        assert!(!component_filter("nope").unwrap().matches(&int));
        assert!(guild_filter(GuildId::new(400)).matches(&int));
        assert!(!guild_filter(GuildId::new(401)).matches(&int));
        assert!(channel_filter(ChannelId::new(300)).matches(&int));
        assert!(user_filter(UserId::new(500)).matches(&int));
        assert!(!user_filter(UserId::new(501)).matches(&int));
    }

    #[test]
    fn test_exclude_ephemeral() {
        let int = ephemeral_click();

        assert!(message_filter(MessageId::new(700), false).matches(&int));
        assert!(!message_filter(MessageId::new(700), true).matches(&int));
    }

    #[test]
    fn test_conjunction() {
        let int = resolved_click();

        let filter = user_filter(UserId::new(500)).and(channel_filter(ChannelId::new(300)));
        assert!(filter.matches(&int));

        let filter = filter.and(Filter::new().predicate(|i| i.values().len() == 1));
        assert!(!filter.matches(&int));
    }

    #[test]
    fn test_conflicting_conditions() {
        let int = resolved_click();

        assert!(!user_filter(UserId::new(999))
            .and(user_filter(UserId::new(500)))
            .matches(&int));
        assert!(!user_filter(UserId::new(500))
            .and(user_filter(UserId::new(999)))
            .matches(&int));
        assert!(!component_filter("ok")
            .unwrap()
            .and(component_filter("nope").unwrap())
            .matches(&int));
        assert!(user_filter(UserId::new(500))
            .and(user_filter(UserId::new(500)))
            .matches(&int));
    }

    #[test]
    fn test_link_button_filter() {
        let link = Button::link("https://example.com", "Site").unwrap();
        assert!(matches!(
            component_filter(&link),
            Err(ArgumentError::NoCustomId)
        ));
    }
}
