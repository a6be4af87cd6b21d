//! Messages that carry components, in both directions
//!
//! [`ComponentMessage`] is a sent or fetched message decoded together with its
//! typed rows, and [`MessageBody`] describes a message about to be sent.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serenity::{
    builder::{CreateAllowedMentions, CreateAttachment, CreateEmbed},
    model::id::{ChannelId, GuildId, MessageId},
};

use crate::{
    component::{normalize_layout, ActionRow, Component, LayoutItem, Wire},
    config::ClientOptions,
    http::{Method, Request, Route},
    response::Prepare,
    ArgumentError, ProtocolError,
};

/// The message flag marking a message visible only to one user
pub const EPHEMERAL_FLAG: u64 = 1 << 6;

/// The largest number of embeds Discord accepts on one message
pub const MAX_EMBEDS: usize = 10;

/// The largest number of files Discord accepts on one message
pub const MAX_FILES: usize = 10;

/// A pointer from one message to another, used for replies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReference {
    /// The referenced message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<MessageId>,
    /// The channel of the referenced message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<ChannelId>,
    /// The guild of the referenced message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<GuildId>,
    /// Whether sending should fail if the referenced message is gone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_if_not_exists: Option<bool>,
}

impl MessageReference {
    /// Construct a reference to the given message
    #[must_use]
    pub fn to(channel_id: ChannelId, message_id: MessageId) -> Self {
        Self {
            message_id: Some(message_id),
            channel_id: Some(channel_id),
            guild_id: None,
            fail_if_not_exists: None,
        }
    }
}

#[derive(Deserialize)]
struct RawMessage {
    id: MessageId,
    channel_id: ChannelId,
    #[serde(default)]
    guild_id: Option<GuildId>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    flags: Option<u64>,
    #[serde(default)]
    message_reference: Option<MessageReference>,
    #[serde(default)]
    components: Option<Vec<Value>>,
}

/// A message decorated with the components it carries
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentMessage {
    id: MessageId,
    channel_id: ChannelId,
    guild_id: Option<GuildId>,
    content: String,
    flags: u64,
    reference: Option<MessageReference>,
    rows: Vec<ActionRow>,
    raw: Value,
}

impl ComponentMessage {
    /// Decode a message object, including its `components` array
    ///
    /// # Errors
    /// This function returns an error if the message is malformed or carries
    /// an invalid component.
    pub fn from_wire(value: Value) -> Result<Self, ProtocolError> {
        let RawMessage {
            id,
            channel_id,
            guild_id,
            content,
            flags,
            message_reference,
            components,
        } = RawMessage::deserialize(&value)?;

        let rows = components
            .unwrap_or_default()
            .into_iter()
            .map(ActionRow::from_wire)
            .collect::<Result<_, _>>()?;

        Ok(Self {
            id,
            channel_id,
            guild_id,
            content: content.unwrap_or_default(),
            flags: flags.unwrap_or_default(),
            reference: message_reference,
            rows,
            raw: value,
        })
    }

    /// The ID of this message
    #[inline]
    #[must_use]
    pub fn id(&self) -> MessageId { self.id }

    /// The channel this message was sent in
    #[inline]
    #[must_use]
    pub fn channel_id(&self) -> ChannelId { self.channel_id }

    /// The guild this message was sent in, if any
    #[inline]
    #[must_use]
    pub fn guild_id(&self) -> Option<GuildId> { self.guild_id }

    /// The text content of this message
    #[inline]
    #[must_use]
    pub fn content(&self) -> &str { &self.content }

    /// The raw message flags
    #[inline]
    #[must_use]
    pub fn flags(&self) -> u64 { self.flags }

    /// Whether this message is only visible to one user
    #[inline]
    #[must_use]
    pub fn is_ephemeral(&self) -> bool { self.flags & EPHEMERAL_FLAG != 0 }

    /// The message this one replies to or references, if any
    #[inline]
    #[must_use]
    pub fn reference(&self) -> Option<&MessageReference> { self.reference.as_ref() }

    /// The component rows of this message, top to bottom
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[ActionRow] { &self.rows }

    /// Iterate over every component on this message in reading order
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.rows.iter().flat_map(ActionRow::iter)
    }

    /// Find the first component with the given custom ID
    ///
    /// Custom IDs are expected to be unique within a message, but this is not
    /// enforced.
    #[must_use]
    pub fn get_component(&self, custom_id: &str) -> Option<&Component> {
        self.components().find(|c| c.custom_id() == Some(custom_id))
    }

    /// The message object this was decoded from
    #[inline]
    #[must_use]
    pub fn raw(&self) -> &Value { &self.raw }
}

/// The contents of a message to send or an edit to apply
///
/// Argument errors from the builder methods are held until
/// [`prepare`](Prepare::prepare) is called, so no request is made with an
/// invalid body.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct MessageBody {
    content: Option<String>,
    embed: Option<CreateEmbed>,
    embeds: Option<Vec<CreateEmbed>>,
    allowed_mentions: Option<CreateAllowedMentions>,
    mention_author: Option<bool>,
    components: Option<Result<Vec<ActionRow>, ArgumentError>>,
    files: Vec<CreateAttachment>,
    tts: bool,
    ephemeral: Option<bool>,
    flags: u64,
    reference: Option<MessageReference>,
}

impl MessageBody {
    /// Construct an empty body
    #[inline]
    pub fn new() -> Self { Self::default() }

    /// Construct a body with the given text content
    #[inline]
    pub fn plain(content: impl Into<String>) -> Self { Self::new().content(content) }

    /// Set the text content
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set a single embed
    ///
    /// This cannot be combined with [`embeds`](Self::embeds).
    pub fn embed(mut self, embed: CreateEmbed) -> Self {
        self.embed = Some(embed);
        self
    }

    /// Set a list of up to [`MAX_EMBEDS`] embeds
    pub fn embeds(mut self, embeds: impl IntoIterator<Item = CreateEmbed>) -> Self {
        self.embeds = Some(embeds.into_iter().collect());
        self
    }

    /// Set which mentions are allowed to ping
    ///
    /// Lists and flags left empty here fall back to the client's default
    /// allowed-mentions.
    pub fn allowed_mentions(mut self, allowed_mentions: CreateAllowedMentions) -> Self {
        self.allowed_mentions = Some(allowed_mentions);
        self
    }

    /// Set whether a reply pings the author of the message it replies to
    pub fn mention_author(mut self, mention_author: bool) -> Self {
        self.mention_author = Some(mention_author);
        self
    }

    /// Attach up to [`MAX_FILES`] files
    pub fn attach(mut self, files: impl IntoIterator<Item = CreateAttachment>) -> Self {
        self.files.extend(files);
        self
    }

    /// Set the component layout, one row per item
    ///
    /// An empty layout removes all components from an edited message.
    pub fn components<I: IntoIterator>(mut self, layout: I) -> Self
    where I::Item: Into<LayoutItem> {
        self.components = Some(normalize_layout(layout));
        self
    }

    /// Set whether this message is read aloud
    pub fn tts(mut self, tts: bool) -> Self {
        self.tts = tts;
        self
    }

    /// Set whether an interaction response is only visible to the user who
    /// triggered it
    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = Some(ephemeral);
        self
    }

    /// Set additional raw message flags
    pub fn flags(mut self, flags: u64) -> Self {
        self.flags = flags;
        self
    }

    /// Make this message a reply to the given message
    pub fn reference(mut self, reference: MessageReference) -> Self {
        self.reference = Some(reference);
        self
    }
}

/// A validated [`MessageBody`], ready to be serialized
#[derive(Debug, Clone, Default, Serialize)]
pub struct PreparedMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    embeds: Option<Vec<CreateEmbed>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    components: Option<Vec<ActionRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    allowed_mentions: Option<Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    tts: bool,
    #[serde(skip_serializing_if = "is_zero")]
    flags: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_reference: Option<MessageReference>,
    #[serde(skip)]
    ephemeral: Option<bool>,
    #[serde(skip)]
    mention_author: Option<bool>,
    #[serde(skip)]
    files: Vec<CreateAttachment>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(n: &u64) -> bool { *n == 0 }

fn to_value(value: &impl Serialize) -> Value {
    serde_json::to_value(value)
        .unwrap_or_else(|e| unreachable!("Error serializing message body: {e}"))
}

fn is_set(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Array(a)) => !a.is_empty(),
        Some(_) => true,
    }
}

/// Lay an allowed-mentions object over a default one
///
/// Empty lists and absent flags in `over` keep the default.  An explicit
/// `users` or `roles` list replaces the matching blanket `parse` entry and
/// vice versa, since Discord rejects both at once.
fn merge_mentions(base: Value, over: Value) -> Value {
    match (base, over) {
        (Value::Object(mut merged), Value::Object(over)) => {
            for kind in ["users", "roles"] {
                if is_set(over.get(kind)) {
                    if let Some(Value::Array(parse)) = merged.get_mut("parse") {
                        parse.retain(|p| *p != kind);
                    }
                } else if over
                    .get("parse")
                    .and_then(Value::as_array)
                    .is_some_and(|p| p.iter().any(|p| *p == kind))
                {
                    merged.insert(kind.into(), Value::Array(vec![]));
                }
            }

            for (key, val) in over {
                if is_set(Some(&val)) {
                    merged.insert(key, val);
                }
            }

            Value::Object(merged)
        },
        (_, over) => over,
    }
}

impl PreparedMessage {
    /// Fill in anything left unset from the client-wide defaults
    ///
    /// `interaction` selects whether the ephemeral default applies, since
    /// only interaction responses can be ephemeral.
    pub(crate) fn apply_defaults(&mut self, opts: &ClientOptions, interaction: bool) {
        let base = opts.default_allowed_mentions().map(to_value);
        self.allowed_mentions = match (base, self.allowed_mentions.take()) {
            (Some(base), Some(over)) => Some(merge_mentions(base, over)),
            (base, over) => over.or(base),
        };

        if let Some(mention) = self.mention_author {
            let mentions = self.allowed_mentions.get_or_insert_with(|| {
                to_value(
                    &CreateAllowedMentions::new()
                        .everyone(true)
                        .all_users(true)
                        .all_roles(true),
                )
            });

            if let Value::Object(m) = mentions {
                m.insert("replied_user".into(), mention.into());
            }
        }

        if interaction && self.ephemeral.unwrap_or(opts.ephemeral_by_default()) {
            self.flags |= EPHEMERAL_FLAG;
        }
    }

    /// A body carrying only the flags of this one, used for the deferral that
    /// precedes it
    pub(crate) fn placeholder(&self) -> Self {
        Self {
            flags: self.flags & EPHEMERAL_FLAG,
            ..Self::default()
        }
    }

    /// Whether this message will be sent as ephemeral
    #[inline]
    #[must_use]
    pub fn is_ephemeral(&self) -> bool { self.flags & EPHEMERAL_FLAG != 0 }

    /// The files uploaded with this message
    #[inline]
    #[must_use]
    pub fn files(&self) -> &[CreateAttachment] { &self.files }

    /// Serialize this message into a JSON object, without its files
    #[must_use]
    pub fn to_json(&self) -> Value { to_value(self) }

    /// Build a request sending this message as its body
    pub(crate) fn into_request(mut self, method: Method, route: Route) -> Request {
        let files = std::mem::take(&mut self.files);
        Request::new(method, route).json(self.to_json()).files(files)
    }
}

impl Prepare for MessageBody {
    type Error = ArgumentError;
    type Output = PreparedMessage;

    fn prepare(self) -> Result<Self::Output, Self::Error> {
        let Self {
            content,
            embed,
            embeds,
            allowed_mentions,
            mention_author,
            components,
            files,
            tts,
            ephemeral,
            mut flags,
            reference,
        } = self;

        if files.len() > MAX_FILES {
            return Err(ArgumentError::TooManyFiles(files.len()));
        }

        let embeds = match (embed, embeds) {
            (Some(_), Some(_)) => return Err(ArgumentError::EmbedAndEmbeds),
            (Some(e), None) => Some(vec![e]),
            (None, Some(e)) if e.len() > MAX_EMBEDS => {
                return Err(ArgumentError::TooManyEmbeds(e.len()));
            },
            (None, e) => e,
        };

        if ephemeral == Some(true) {
            flags |= EPHEMERAL_FLAG;
        }

        Ok(PreparedMessage {
            content,
            embeds,
            components: components.transpose()?,
            allowed_mentions: allowed_mentions.as_ref().map(to_value),
            tts,
            flags,
            message_reference: reference,
            ephemeral,
            mention_author,
            files,
        })
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;
    use serenity::{
        builder::{CreateAllowedMentions, CreateAttachment, CreateEmbed},
        model::id::{MessageId, RoleId, UserId},
    };

    use super::{ComponentMessage, MessageBody, MAX_FILES};
    use crate::{
        component::{Button, ButtonStyle, Component, Wire},
        response::Prepare,
        ArgumentError, ClientOptions,
    };

    fn btn(id: &str) -> Button { Button::new(ButtonStyle::Success, id, id).unwrap() }

    #[test]
    fn test_get_component() {
        let msg = ComponentMessage::from_wire(json!({
            "id": "10",
            "channel_id": "20",
            "content": "hello",
            "components": [
                { "type": 1, "components": [btn("a").to_wire(), btn("b").to_wire()] },
                { "type": 1, "components": [btn("b").to_wire()] },
            ],
        }))
        .unwrap();

        assert_eq!(msg.id(), MessageId::new(10));
        assert_eq!(msg.rows().len(), 2);
        assert_eq!(msg.components().count(), 3);
        assert_eq!(
            msg.get_component("b"),
            Some(&Component::from(btn("b")))
        );
        assert!(std::ptr::eq(
            msg.get_component("b").unwrap(),
            &msg.rows()[0].components()[1]
        ));
        assert_eq!(msg.get_component("c"), None);
        assert!(!msg.is_ephemeral());
    }

    #[test]
    fn test_missing_components() {
        let msg = ComponentMessage::from_wire(json!({
            "id": "10",
            "channel_id": "20",
            "flags": 64,
        }))
        .unwrap();

        assert!(msg.rows().is_empty());
        assert!(msg.is_ephemeral());
    }

    #[test]
    fn test_embed_limits() {
        let many = (0..11).map(|i| CreateEmbed::new().title(i.to_string()));
        assert!(matches!(
            MessageBody::new().embeds(many).prepare(),
            Err(ArgumentError::TooManyEmbeds(11))
        ));

        assert!(matches!(
            MessageBody::new()
                .embed(CreateEmbed::new())
                .embeds([CreateEmbed::new()])
                .prepare(),
            Err(ArgumentError::EmbedAndEmbeds)
        ));

        let ok = MessageBody::new()
            .embeds((0..10).map(|_| CreateEmbed::new()))
            .prepare()
            .unwrap();
        assert_eq!(ok.to_json()["embeds"].as_array().map(Vec::len), Some(10));
    }

    #[test]
    fn test_layout_error_is_latent() {
        let body = MessageBody::plain("hi").components([(0..6)
            .map(|i| Component::from(btn(&i.to_string())))
            .collect::<Vec<_>>()]);
        assert!(matches!(body.prepare(), Err(ArgumentError::RowFull)));
    }

    #[test]
    fn test_body_json() {
        let mut prepared = MessageBody::plain("hi")
            .components([btn("a")])
            .prepare()
            .unwrap();
        prepared.apply_defaults(&ClientOptions::new().ephemeral(true), true);

        assert_eq!(
            prepared.to_json(),
            json!({
                "content": "hi",
                "components": [{ "type": 1, "components": [btn("a").to_wire()] }],
                "flags": 64,
            })
        );

        let mut prepared = MessageBody::plain("hi").ephemeral(false).prepare().unwrap();
        prepared.apply_defaults(&ClientOptions::new().ephemeral(true), true);
        assert!(!prepared.is_ephemeral());
    }

    #[test]
    fn test_file_limit() {
        let file = |i: usize| CreateAttachment::bytes(vec![0_u8; 4], format!("{i}.bin"));

        assert!(matches!(
            MessageBody::new().attach((0..=MAX_FILES).map(file)).prepare(),
            Err(ArgumentError::TooManyFiles(11))
        ));

        let prepared = MessageBody::plain("hi")
            .attach((0..2).map(file))
            .prepare()
            .unwrap();
        assert_eq!(prepared.files().len(), 2);
        assert_eq!(prepared.files()[1].filename, "1.bin");
        assert_eq!(prepared.to_json(), json!({ "content": "hi" }));
        assert!(prepared.placeholder().files().is_empty());
    }

    #[test]
    fn test_allowed_mentions_merge() {
        let opts = ClientOptions::new().allowed_mentions(
            CreateAllowedMentions::new()
                .all_users(true)
                .roles([RoleId::new(1)])
                .replied_user(true),
        );

        let mut prepared = MessageBody::plain("hi").prepare().unwrap();
        prepared.apply_defaults(&opts, false);
        assert_eq!(
            prepared.to_json()["allowed_mentions"],
            json!({ "parse": ["users"], "users": [], "roles": ["1"], "replied_user": true })
        );

        let mut prepared = MessageBody::plain("hi")
            .allowed_mentions(CreateAllowedMentions::new().users([UserId::new(5)]))
            .mention_author(false)
            .prepare()
            .unwrap();
        prepared.apply_defaults(&opts, false);
        assert_eq!(
            prepared.to_json()["allowed_mentions"],
            json!({ "parse": [], "users": ["5"], "roles": ["1"], "replied_user": false })
        );

        let mut prepared = MessageBody::plain("hi")
            .mention_author(false)
            .prepare()
            .unwrap();
        prepared.apply_defaults(&ClientOptions::new(), false);
        assert_eq!(
            prepared.to_json()["allowed_mentions"],
            json!({
                "parse": ["everyone", "users", "roles"],
                "users": [],
                "roles": [],
                "replied_user": false,
            })
        );
    }
}
