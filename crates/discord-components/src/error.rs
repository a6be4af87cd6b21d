use crate::{component::ComponentType, http::TransportError};

/// A caller-supplied value was rejected before any request was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    /// A link-style button was given no URL
    #[error("You must provide a URL when the button style is set to link")]
    MissingUrl,
    /// A link-style button was given a custom ID
    #[error("Both custom ID and URL are set")]
    LinkWithCustomId,
    /// A non-link button was given a URL
    #[error("Button style is not link, a URL should not be provided")]
    UrlWithoutLink,
    /// A non-link button was given no custom ID
    #[error("A custom ID is required unless the button style is link")]
    MissingCustomId,
    /// A raw button style fell outside the known range
    #[error("Button style must be between 1 and 5, got {0}")]
    InvalidStyle(u8),
    /// A button has neither label text nor an emoji
    #[error("Label or emoji must be given")]
    EmptyLabel,
    /// A select option label was empty
    #[error("Select option label must not be empty")]
    EmptyOptionLabel,
    /// A select menu has too few or too many options
    #[error("Options length should be between 1 and 25, got {0}")]
    OptionCount(usize),
    /// A select menu value range is out of bounds or inverted
    #[error("Select value range {min}..={max} is invalid (both must be within 1..=25)")]
    ValueRange {
        /// The requested minimum
        min: u8,
        /// The requested maximum
        max: u8,
    },
    /// A select menu allows picking more options than it has
    #[error("Select allows up to {max} values but only has {options} options")]
    MaxValuesExceedOptions {
        /// The requested maximum
        max: u8,
        /// The number of options
        options: usize,
    },
    /// An action row is already full
    #[error("Action rows hold at most 5 components")]
    RowFull,
    /// An action row was placed inside another row
    #[error("Action rows cannot contain other action rows")]
    NestedRow,
    /// A response carried more embeds than Discord accepts
    #[error("Do not provide more than 10 embeds, got {0}")]
    TooManyEmbeds(usize),
    /// A message carried more attachments than Discord accepts
    #[error("Do not provide more than 10 files, got {0}")]
    TooManyFiles(usize),
    /// Both the single-embed and multi-embed parameters were set
    #[error("Cannot provide both embed and embeds")]
    EmbedAndEmbeds,
    /// A component without a custom ID was used where one is required
    #[error("Component has no custom ID (link buttons cannot receive interactions)")]
    NoCustomId,
}

/// A gateway or REST payload did not have the expected shape
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A required field was absent
    #[error("Missing field {0:?} in payload")]
    MissingField(&'static str),
    /// A component `type` discriminant was not recognized
    #[error("Unknown component type {0}")]
    UnknownComponentType(u64),
    /// A component object had a different `type` than expected
    #[error("Expected a component of type {expected:?}, found type {found}")]
    WrongComponentType {
        /// The type that was expected
        expected: ComponentType,
        /// The type that was present
        found: u64,
    },
    /// A component embedded in a payload failed validation
    #[error("Invalid component in payload")]
    InvalidComponent(#[source] ArgumentError),
    /// A select interaction could not be rebuilt because it selected nothing
    #[error("Select interaction {0:?} carried no values and its message is unavailable")]
    EmptySelection(String),
    /// The payload could not be deserialized
    #[error("Error parsing payload")]
    Json(#[from] serde_json::Error),
}

/// Top-level error type for this crate
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// See [`ArgumentError`]
    #[error("Invalid argument")]
    Argument(#[from] ArgumentError),
    /// See [`ProtocolError`]
    #[error("Unexpected payload from Discord")]
    Protocol(#[from] ProtocolError),
    /// Discord did not recognize the interaction on a response route
    #[error(
        "Interaction is unknown: it was either already responded to, or the response was sent \
         after the interaction expired"
    )]
    InteractionExpiredOrConsumed(#[source] TransportError),
    /// The HTTP collaborator reported a failure
    #[error("Error sending request")]
    Transport(#[from] TransportError),
    /// A wait elapsed before a matching interaction arrived
    #[error("Timed out waiting for an interaction")]
    TimedOut,
    /// The dispatcher was dropped while a wait was pending
    #[error("Interaction dispatcher closed")]
    Closed,
}

impl Error {
    /// Translate a transport failure on an interaction route, singling out the
    /// unknown-interaction case
    #[must_use]
    pub fn from_interaction_route(err: TransportError) -> Self {
        if err.is_unknown_interaction() {
            Self::InteractionExpiredOrConsumed(err)
        } else {
            Self::Transport(err)
        }
    }
}

#[cfg(test)]
mod test {
    use super::{Error, TransportError};

    #[test]
    fn test_unknown_interaction_translation() {
        let err = Error::from_interaction_route(TransportError::Status {
            status: 404,
            code: Some(10062),
            message: "Unknown interaction".into(),
        });
        assert!(matches!(err, Error::InteractionExpiredOrConsumed(_)));
        assert!(err.to_string().contains("already responded"));
        assert!(err.to_string().contains("expired"));

        let err = Error::from_interaction_route(TransportError::Status {
            status: 400,
            code: Some(40060),
            message: "Interaction has already been acknowledged.".into(),
        });
        assert!(matches!(err, Error::InteractionExpiredOrConsumed(_)));

        let err = Error::from_interaction_route(TransportError::Status {
            status: 500,
            code: None,
            message: "oops".into(),
        });
        assert!(matches!(err, Error::Transport(_)));
    }
}
