//! Typed message components and their wire representation
//!
//! Buttons and select menus are the [`Component`]s a user can interact with.
//! They are laid out in [`ActionRow`]s, and a [`Select`] holds its
//! [`SelectOption`]s.  Every one of these types converts to and from the JSON
//! Discord uses through the [`Wire`] trait.

mod button;
mod emoji;
mod row;
mod select;

pub use button::{Button, ButtonBuilder, ButtonStyle};
pub use emoji::PartialEmoji;
pub use row::{normalize_layout, ActionRow, LayoutItem, MAX_ROW_LEN};
pub use select::{Select, SelectBuilder, SelectOption, MAX_OPTIONS};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ArgumentError, ProtocolError};

/// The `type` discriminant of a component object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ComponentType {
    /// A container row
    ActionRow = 1,
    /// A button
    Button = 2,
    /// A text select menu
    Select = 3,
}

impl TryFrom<u64> for ComponentType {
    type Error = ProtocolError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => Self::ActionRow,
            2 => Self::Button,
            3 => Self::Select,
            t => return Err(ProtocolError::UnknownComponentType(t)),
        })
    }
}

impl From<ComponentType> for u8 {
    #[inline]
    fn from(value: ComponentType) -> Self { value as u8 }
}

/// Conversion to and from Discord's JSON representation
pub trait Wire: Sized {
    /// Serialize `self` into a JSON object
    fn to_wire(&self) -> Value;

    /// Deserialize and validate a JSON object
    ///
    /// # Errors
    /// This function returns an error if the object is malformed or describes
    /// an invalid component.
    fn from_wire(value: Value) -> Result<Self, ProtocolError>;
}

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| unreachable!("Error serializing component: {e}"))
}

fn expect_type(expected: ComponentType, found: u8) -> Result<(), ProtocolError> {
    if found == u8::from(expected) {
        Ok(())
    } else {
        Err(ProtocolError::WrongComponentType {
            expected,
            found: found.into(),
        })
    }
}

impl Wire for Button {
    fn to_wire(&self) -> Value { to_value(self) }

    fn from_wire(value: Value) -> Result<Self, ProtocolError> {
        let raw: button::RawButton = serde_json::from_value(value)?;
        expect_type(ComponentType::Button, raw.ty())?;
        raw.try_into().map_err(ProtocolError::InvalidComponent)
    }
}

impl Wire for Select {
    fn to_wire(&self) -> Value { to_value(self) }

    fn from_wire(value: Value) -> Result<Self, ProtocolError> {
        let raw: select::RawSelect = serde_json::from_value(value)?;
        expect_type(ComponentType::Select, raw.ty())?;
        raw.try_into().map_err(ProtocolError::InvalidComponent)
    }
}

impl Wire for SelectOption {
    fn to_wire(&self) -> Value { to_value(self) }

    fn from_wire(value: Value) -> Result<Self, ProtocolError> {
        let raw: select::RawSelectOption = serde_json::from_value(value)?;
        raw.try_into().map_err(ProtocolError::InvalidComponent)
    }
}

#[derive(Deserialize)]
struct RawRow {
    #[serde(rename = "type")]
    ty: u8,
    #[serde(default)]
    components: Vec<Value>,
}

impl Wire for ActionRow {
    fn to_wire(&self) -> Value { to_value(self) }

    fn from_wire(value: Value) -> Result<Self, ProtocolError> {
        let RawRow { ty, components } = serde_json::from_value(value)?;
        expect_type(ComponentType::ActionRow, ty)?;
        let components = components
            .into_iter()
            .map(Component::from_wire)
            .collect::<Result<Vec<_>, _>>()?;
        ActionRow::from_parts(components).map_err(ProtocolError::InvalidComponent)
    }
}

/// A component that can be placed in an [`ActionRow`] and interacted with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Component {
    /// A button
    Button(Button),
    /// A select menu
    Select(Select),
}

impl Component {
    /// The `type` discriminant of this component
    #[must_use]
    pub fn kind(&self) -> ComponentType {
        match self {
            Self::Button(_) => ComponentType::Button,
            Self::Select(_) => ComponentType::Select,
        }
    }

    /// The custom ID of this component, absent only for link buttons
    #[must_use]
    pub fn custom_id(&self) -> Option<&str> {
        match self {
            Self::Button(b) => b.custom_id(),
            Self::Select(s) => Some(s.custom_id()),
        }
    }

    /// Borrow this component as a button
    #[must_use]
    pub fn as_button(&self) -> Option<&Button> {
        match self {
            Self::Button(b) => Some(b),
            Self::Select(_) => None,
        }
    }

    /// Borrow this component as a select menu
    #[must_use]
    pub fn as_select(&self) -> Option<&Select> {
        match self {
            Self::Select(s) => Some(s),
            Self::Button(_) => None,
        }
    }
}

impl From<Button> for Component {
    fn from(value: Button) -> Self { Self::Button(value) }
}

impl From<Select> for Component {
    fn from(value: Select) -> Self { Self::Select(value) }
}

impl Wire for Component {
    fn to_wire(&self) -> Value {
        match self {
            Self::Button(b) => b.to_wire(),
            Self::Select(s) => s.to_wire(),
        }
    }

    fn from_wire(value: Value) -> Result<Self, ProtocolError> {
        let ty = value
            .get("type")
            .and_then(Value::as_u64)
            .ok_or(ProtocolError::MissingField("type"))?;

        match ComponentType::try_from(ty)? {
            ComponentType::ActionRow => Err(ProtocolError::InvalidComponent(
                ArgumentError::NestedRow,
            )),
            ComponentType::Button => Button::from_wire(value).map(Self::Button),
            ComponentType::Select => Select::from_wire(value).map(Self::Select),
        }
    }
}

/// Anything that identifies a component by its custom ID
pub trait AsCustomId {
    /// The custom ID, if there is one
    fn as_custom_id(&self) -> Option<&str>;
}

impl AsCustomId for str {
    fn as_custom_id(&self) -> Option<&str> { Some(self) }
}

impl AsCustomId for String {
    fn as_custom_id(&self) -> Option<&str> { Some(self) }
}

impl AsCustomId for Button {
    fn as_custom_id(&self) -> Option<&str> { self.custom_id() }
}

impl AsCustomId for Select {
    fn as_custom_id(&self) -> Option<&str> { Some(self.custom_id()) }
}

impl AsCustomId for Component {
    fn as_custom_id(&self) -> Option<&str> { self.custom_id() }
}

impl<T: AsCustomId + ?Sized> AsCustomId for &T {
    fn as_custom_id(&self) -> Option<&str> { (**self).as_custom_id() }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;
    use serde_json::json;
    use serenity::model::id::EmojiId;

    use super::{
        ActionRow, Button, ButtonStyle, Component, PartialEmoji, Select, SelectOption, Wire,
    };
    use crate::ProtocolError;

    fn emoji_strategy() -> impl Strategy<Value = Option<PartialEmoji>> {
        prop_oneof![
            Just(None),
            "[a-z]{1,8}".prop_map(|n| Some(PartialEmoji::unicode(n))),
            (1..u64::MAX, "[a-z]{1,8}", any::<bool>())
                .prop_map(|(id, n, a)| Some(PartialEmoji::custom(EmojiId::new(id), n, a))),
        ]
    }

    fn button_strategy() -> impl Strategy<Value = Button> {
        (
            1..=5_u8,
            "[a-z0-9]{1,16}",
            proptest::option::of("[A-Za-z ]{1,16}"),
            any::<bool>(),
            emoji_strategy(),
        )
            .prop_filter_map("button needs a label or emoji", |(s, id, l, d, e)| {
                let style = ButtonStyle::try_from(s).ok()?;
                let b = Button::builder(style);
                let b = if style == ButtonStyle::Link {
                    b.url(format!("https://example.com/{id}"))
                } else {
                    b.custom_id(id)
                };
                let b = if let Some(l) = l { b.label(l) } else { b };
                let b = if let Some(e) = e { b.emoji(e) } else { b };
                b.disabled(d).build().ok()
            })
    }

    fn option_strategy() -> impl Strategy<Value = SelectOption> {
        (
            "[A-Za-z]{1,12}",
            "[a-z0-9]{1,12}",
            proptest::option::of("[a-z ]{0,20}"),
            any::<bool>(),
            emoji_strategy(),
        )
            .prop_map(|(l, v, d, def, e)| {
                let mut o = SelectOption::new(l, v).unwrap().with_default(def);
                o.set_description(d);
                o.set_emoji(e);
                o
            })
    }

    fn select_strategy() -> impl Strategy<Value = Select> {
        (
            "[a-z]{1,12}",
            proptest::collection::vec(option_strategy(), 1..=25),
            proptest::option::of("[A-Za-z ]{1,20}"),
            any::<bool>(),
        )
            .prop_map(|(id, opts, ph, dis)| {
                let max = u8::try_from(opts.len()).unwrap();
                let b = Select::builder(id).options(opts).values(1, max).disabled(dis);
                let b = if let Some(ph) = ph { b.placeholder(ph) } else { b };
                b.build().unwrap()
            })
    }

    proptest! {
        #[test]
        fn test_roundtrip_button(b in button_strategy()) {
            prop_assert_eq!(Button::from_wire(b.to_wire()).unwrap(), b);
        }

        #[test]
        fn test_roundtrip_select(s in select_strategy()) {
            prop_assert_eq!(Select::from_wire(s.to_wire()).unwrap(), s);
        }

        #[test]
        fn test_roundtrip_row(bs in proptest::collection::vec(button_strategy(), 0..=5)) {
            let row = ActionRow::from_components(bs).unwrap();
            prop_assert_eq!(ActionRow::from_wire(row.to_wire()).unwrap(), row);
        }
    }

    #[test]
    fn test_decode_table() {
        let c = Component::from_wire(json!({
            "type": 2,
            "style": 1,
            "label": "hi",
            "custom_id": "hi",
        }))
        .unwrap();
        assert_eq!(c.custom_id(), Some("hi"));
        assert!(c.as_button().is_some());

        assert!(matches!(
            Component::from_wire(json!({ "type": 4, "custom_id": "txt" })),
            Err(ProtocolError::UnknownComponentType(4))
        ));
        assert!(matches!(
            Component::from_wire(json!({ "custom_id": "txt" })),
            Err(ProtocolError::MissingField("type"))
        ));
        assert!(matches!(
            Button::from_wire(json!({
                "type": 3,
                "custom_id": "m",
                "options": [{ "label": "a", "value": "a" }],
            })),
            Err(ProtocolError::Json(_) | ProtocolError::WrongComponentType { .. })
        ));
    }
}
