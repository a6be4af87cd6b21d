use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use serenity::model::id::{ApplicationId, ChannelId, GuildId, InteractionId};
use tokio::sync::Mutex;
use tracing::debug;

use super::{Actor, Interaction, Member, MessageRef, User};
use crate::{
    component::{Button, Component, ComponentType, Select, SelectOption},
    config::ClientOptions,
    http::Transport,
    message::ComponentMessage,
    response::ResponseState,
    ProtocolError,
};

/// The gateway dispatch name for interactions
pub(crate) const INTERACTION_CREATE: &str = "INTERACTION_CREATE";
/// The interaction `type` of a message component interaction
pub(crate) const COMPONENT_INTERACTION: u64 = 3;

#[derive(Deserialize)]
struct RawData {
    custom_id: String,
    component_type: u64,
    #[serde(default)]
    values: Vec<String>,
}

#[derive(Deserialize)]
struct RawInteraction {
    id: InteractionId,
    application_id: ApplicationId,
    token: String,
    #[serde(default)]
    channel_id: Option<ChannelId>,
    #[serde(default)]
    guild_id: Option<GuildId>,
    #[serde(default)]
    data: Option<RawData>,
    #[serde(default)]
    member: Option<Member>,
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    message: Option<Value>,
}

fn resolve_message(
    message: Option<Value>,
    channel_id: ChannelId,
) -> Result<MessageRef, ProtocolError> {
    let Some(mut message) = message else {
        return Ok(MessageRef::Missing);
    };

    if let Some(reference) = message
        .get_mut("message_reference")
        .and_then(Value::as_object_mut)
    {
        if reference.get("channel_id").map_or(true, Value::is_null) {
            reference.insert("channel_id".into(), channel_id.to_string().into());
        }
    }

    if message.get("components").is_some() {
        ComponentMessage::from_wire(message).map(MessageRef::Resolved)
    } else {
        Ok(MessageRef::Unresolved(message))
    }
}

fn rebuild(
    kind: ComponentType,
    custom_id: &str,
    values: &[String],
) -> Result<Component, ProtocolError> {
    let component = match kind {
        ComponentType::Button => Button::bare(custom_id).map(Into::into),
        ComponentType::Select if values.is_empty() => {
            return Err(ProtocolError::EmptySelection(custom_id.into()));
        },
        ComponentType::Select => Select::bare(custom_id, values).map(Into::into),
        ComponentType::ActionRow => unreachable!("Action rows cannot be interacted with"),
    };

    component.map_err(ProtocolError::InvalidComponent)
}

/// Decode a gateway event into a component interaction
///
/// `event` is a full gateway dispatch envelope of the form
/// `{"t": ..., "d": ...}`.  Events other than `INTERACTION_CREATE`, and
/// interactions other than component interactions, are ignored.
///
/// # Errors
/// This function returns an error if the event is a component interaction but
/// its payload is missing required fields or describes an unknown or invalid
/// component.
#[tracing::instrument(level = "debug", skip_all)]
pub fn decode(
    event: &Value,
    transport: Arc<dyn Transport>,
    opts: Arc<ClientOptions>,
) -> Result<Option<Interaction>, ProtocolError> {
    if event.get("t").and_then(Value::as_str) != Some(INTERACTION_CREATE) {
        return Ok(None);
    }

    let raw = event.get("d").ok_or(ProtocolError::MissingField("d"))?;
    let ty = raw
        .get("type")
        .and_then(Value::as_u64)
        .ok_or(ProtocolError::MissingField("type"))?;

    if ty != COMPONENT_INTERACTION {
        debug!(ty, "Ignoring non-component interaction");
        return Ok(None);
    }

    let RawInteraction {
        id,
        application_id,
        token,
        channel_id,
        guild_id,
        data,
        member,
        user,
        message,
    } = RawInteraction::deserialize(raw)?;

    let RawData {
        custom_id,
        component_type,
        values,
    } = data.ok_or(ProtocolError::MissingField("data"))?;

    let component_type = match ComponentType::try_from(component_type)? {
        ComponentType::ActionRow => {
            return Err(ProtocolError::WrongComponentType {
                expected: ComponentType::Button,
                found: component_type,
            });
        },
        t => t,
    };

    let actor = member
        .map(Actor::Member)
        .or_else(|| user.map(Actor::User))
        .ok_or(ProtocolError::MissingField("user"))?;

    let channel_id = channel_id
        .or_else(|| {
            message
                .as_ref()
                .and_then(|m| ChannelId::deserialize(m.get("channel_id")?).ok())
        })
        .ok_or(ProtocolError::MissingField("channel_id"))?;

    let message = resolve_message(message, channel_id)?;

    let component = match message.resolved() {
        Some(msg) => match msg.get_component(&custom_id) {
            Some(c) if c.kind() == component_type => c.clone(),
            Some(_) | None => {
                debug!(
                    %custom_id,
                    message = %msg.id(),
                    "Component not found on message, rebuilding"
                );
                rebuild(component_type, &custom_id, &values)?
            },
        },
        None => rebuild(component_type, &custom_id, &values)?,
    };

    let selected: Vec<SelectOption> = component.as_select().map_or_else(Vec::new, |s| {
        values.iter().filter_map(|v| s.option(v).cloned()).collect()
    });

    debug!(
        %id,
        %custom_id,
        ?component_type,
        user = %actor.id(),
        resolved = message.resolved().is_some(),
        "Decoded component interaction"
    );

    Ok(Some(Interaction {
        id,
        application_id,
        token,
        channel_id,
        guild_id,
        custom_id,
        component_type,
        values,
        actor,
        message,
        component,
        selected,
        raw: raw.clone(),
        state: Mutex::new(ResponseState::Fresh),
        transport,
        opts,
    }))
}
