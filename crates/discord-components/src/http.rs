//! The seam between this crate and whatever actually talks to Discord's REST
//! API
//!
//! Everything this crate sends goes through a [`Transport`] as a [`Request`]
//! naming one of a handful of [`Route`]s.  [`serenity::http::Http`] implements
//! the trait, and tests substitute a recording mock.

use std::fmt;

use serde_json::Value;
use serenity::{
    builder::CreateAttachment,
    http::{Http, HttpError},
    model::id::{ApplicationId, ChannelId, InteractionId, MessageId},
};

/// HTTP verb of a [`Request`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PATCH`
    Patch,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
        })
    }
}

/// A REST endpoint used by this crate
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    /// `/interactions/{id}/{token}/callback`
    InteractionCallback {
        /// The interaction being answered
        interaction_id: InteractionId,
        /// The interaction's continuation token
        token: String,
    },
    /// `/webhooks/{app_id}/{token}/messages/@original`
    OriginalResponse {
        /// The application that received the interaction
        application_id: ApplicationId,
        /// The interaction's continuation token
        token: String,
    },
    /// `/channels/{id}/messages`
    ChannelMessages {
        /// The target channel
        channel_id: ChannelId,
    },
    /// `/channels/{id}/messages/{id}`
    ChannelMessage {
        /// The channel holding the message
        channel_id: ChannelId,
        /// The target message
        message_id: MessageId,
    },
}

impl Route {
    /// Whether Discord reports unknown-interaction errors on this route
    #[must_use]
    pub fn is_interaction_route(&self) -> bool {
        matches!(
            self,
            Self::InteractionCallback { .. } | Self::OriginalResponse { .. }
        )
    }

    /// The path of this route relative to the API base
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::InteractionCallback {
                interaction_id,
                token,
            } => format!("/interactions/{interaction_id}/{token}/callback"),
            Self::OriginalResponse {
                application_id,
                token,
            } => format!("/webhooks/{application_id}/{token}/messages/@original"),
            Self::ChannelMessages { channel_id } => format!("/channels/{channel_id}/messages"),
            Self::ChannelMessage {
                channel_id,
                message_id,
            } => format!("/channels/{channel_id}/messages/{message_id}"),
        }
    }
}

/// A single REST call
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// The HTTP verb
    pub method: Method,
    /// The endpoint
    pub route: Route,
    /// The JSON body, if any
    pub body: Option<Value>,
    /// Files to upload alongside the body, sent as a multipart form
    pub files: Vec<CreateAttachment>,
}

impl Request {
    /// Construct a request without a body
    #[inline]
    #[must_use]
    pub fn new(method: Method, route: Route) -> Self {
        Self {
            method,
            route,
            body: None,
            files: vec![],
        }
    }

    /// Return this request with the given JSON body
    #[inline]
    #[must_use]
    pub fn json(self, body: Value) -> Self {
        Self {
            body: Some(body),
            ..self
        }
    }

    /// Return this request with the given files attached
    #[inline]
    #[must_use]
    pub fn files(self, files: Vec<CreateAttachment>) -> Self { Self { files, ..self } }
}

/// Discord's JSON error code for an unknown interaction
pub const UNKNOWN_INTERACTION: i64 = 10062;
/// Discord's JSON error code for an interaction that was already acknowledged
pub const ALREADY_ACKNOWLEDGED: i64 = 40060;

/// A failure reported by a [`Transport`]
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Discord answered with a non-success status
    #[error("Discord returned status {status}: {message}")]
    Status {
        /// The HTTP status code
        status: u16,
        /// Discord's JSON error code, if one was returned
        code: Option<i64>,
        /// Discord's error message
        message: String,
    },
    /// The serenity HTTP client failed before or after the request
    #[error("Serenity HTTP error")]
    Serenity(#[source] serenity::Error),
    /// A response body could not be converted to JSON
    #[error("Error converting response body")]
    Decode(#[from] serde_json::Error),
    /// The transport cannot perform this combination of method and route
    #[error("Unsupported request {method} {path}")]
    Unsupported {
        /// The requested verb
        method: Method,
        /// The requested path
        path: String,
    },
}

impl TransportError {
    /// Whether this error means the interaction token is no longer usable,
    /// either because it expired or because it was already consumed
    #[must_use]
    pub fn is_unknown_interaction(&self) -> bool {
        match self {
            Self::Status { status, code, .. } => {
                *status == 404
                    || matches!(code, Some(UNKNOWN_INTERACTION | ALREADY_ACKNOWLEDGED))
            },
            Self::Serenity(_) | Self::Decode(_) | Self::Unsupported { .. } => false,
        }
    }
}

impl From<serenity::Error> for TransportError {
    fn from(err: serenity::Error) -> Self {
        match err {
            serenity::Error::Http(HttpError::UnsuccessfulRequest(res)) => Self::Status {
                status: res.status_code.as_u16(),
                code: i64::try_from(res.error.code).ok(),
                message: res.error.message,
            },
            e => Self::Serenity(e),
        }
    }
}

/// The HTTP collaborator used to answer interactions and send, edit or fetch
/// messages
#[async_trait::async_trait]
pub trait Transport: fmt::Debug + Send + Sync {
    /// Perform a request, returning the response body if there was one
    ///
    /// # Errors
    /// This method should return an error if the request could not be sent or
    /// Discord rejected it.
    async fn request(&self, req: Request) -> Result<Option<Value>, TransportError>;
}

fn message_json(msg: &serenity::model::channel::Message) -> Result<Option<Value>, TransportError> {
    Ok(Some(serde_json::to_value(msg)?))
}

#[async_trait::async_trait]
impl Transport for Http {
    #[tracing::instrument(
        level = "trace",
        skip(self, req),
        fields(method = %req.method, path = %req.route.path(), files = req.files.len()),
    )]
    async fn request(&self, req: Request) -> Result<Option<Value>, TransportError> {
        let Request {
            method,
            route,
            body,
            files,
        } = req;
        let body = body.unwrap_or(Value::Null);

        match (method, route) {
            (
                Method::Post,
                Route::InteractionCallback {
                    interaction_id,
                    token,
                },
            ) => {
                self.create_interaction_response(interaction_id, &token, &body, files)
                    .await?;
                Ok(None)
            },
            (Method::Patch, Route::OriginalResponse { token, .. }) => {
                message_json(
                    &self
                        .edit_original_interaction_response(&token, &body, files)
                        .await?,
                )
            },
            (Method::Post, Route::ChannelMessages { channel_id }) => {
                message_json(&self.send_message(channel_id, files, &body).await?)
            },
            (
                Method::Patch,
                Route::ChannelMessage {
                    channel_id,
                    message_id,
                },
            ) => message_json(
                &self
                    .edit_message(channel_id, message_id, &body, files)
                    .await?,
            ),
            (
                Method::Get,
                Route::ChannelMessage {
                    channel_id,
                    message_id,
                },
            ) => message_json(&self.get_message(channel_id, message_id).await?),
            (method, route) => Err(TransportError::Unsupported {
                method,
                path: route.path(),
            }),
        }
    }
}
