use serde::{Deserialize, Serialize};
use serenity::model::{channel::ReactionType, id::EmojiId};

/// An emoji as it appears on a button or select option
///
/// Unicode emoji carry only a [`name`](Self::name); custom guild emoji also
/// carry an ID and may be animated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartialEmoji {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<EmojiId>,
    #[serde(default)]
    name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    animated: bool,
}

impl PartialEmoji {
    /// Construct a Unicode emoji
    #[inline]
    #[must_use]
    pub fn unicode(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            animated: false,
        }
    }

    /// Construct a custom guild emoji
    #[inline]
    #[must_use]
    pub fn custom(id: EmojiId, name: impl Into<String>, animated: bool) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
            animated,
        }
    }

    /// The ID of this emoji, if it is a custom emoji
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<EmojiId> { self.id }

    /// The name of this emoji, or the emoji itself if it is a Unicode emoji
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str { &self.name }

    /// Whether this emoji is animated
    #[inline]
    #[must_use]
    pub fn animated(&self) -> bool { self.animated }
}

impl From<&str> for PartialEmoji {
    fn from(name: &str) -> Self { Self::unicode(name) }
}

impl From<String> for PartialEmoji {
    fn from(name: String) -> Self { Self::unicode(name) }
}

impl From<char> for PartialEmoji {
    fn from(c: char) -> Self { Self::unicode(c) }
}

impl TryFrom<ReactionType> for PartialEmoji {
    type Error = ReactionType;

    fn try_from(value: ReactionType) -> Result<Self, Self::Error> {
        match value {
            ReactionType::Custom { animated, id, name } => Ok(Self {
                id: Some(id),
                name: name.unwrap_or_default(),
                animated,
            }),
            ReactionType::Unicode(s) => Ok(Self::unicode(s)),
            r => Err(r),
        }
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;
    use serenity::model::id::EmojiId;

    use super::PartialEmoji;

    #[test]
    fn test_wire_shape() {
        assert_eq!(
            serde_json::to_value(PartialEmoji::from("🎲")).unwrap(),
            json!({ "name": "🎲" })
        );
        assert_eq!(
            serde_json::to_value(PartialEmoji::custom(EmojiId::new(42), "party", true)).unwrap(),
            json!({ "id": "42", "name": "party", "animated": true })
        );

        let parsed: PartialEmoji =
            serde_json::from_value(json!({ "id": "42", "name": "party" })).unwrap();
        assert_eq!(parsed.id(), Some(EmojiId::new(42)));
        assert!(!parsed.animated());
    }
}
