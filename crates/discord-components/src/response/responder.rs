//! Response logic for component interactions
//!
//! # Notes
//!
//! An interaction token is good for one initial callback, sent within a few
//! seconds of the interaction arriving.  The callback may be a deferral, in
//! which case the placeholder it creates can be edited afterwards through the
//! `@original` webhook route:
//!
//! | State      | Final type (`1`, `4`, `7`) | Deferred type (`5`, `6`) |
//! |-----------:|----------------------------|--------------------------|
//! | `Fresh`    | POST callback, `Responded` | POST callback, `Deferred`|
//! | `Deferred` | PATCH `@original`, `Responded` | nothing              |
//! | `Responded`| nothing                    | nothing                  |
//!
//! A failed request leaves the state where it was.  Failed requests are never
//! retried, since the token may already have been consumed.

use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::{Outcome, Prepare, ResponseState, ResponseType, Sent};
use crate::{
    http::{Method, Request, Route},
    interaction::Interaction,
    message::{ComponentMessage, MessageBody, PreparedMessage},
    Error, ProtocolError,
};

impl Interaction {
    fn callback_route(&self) -> Route {
        Route::InteractionCallback {
            interaction_id: self.id,
            token: self.token.clone(),
        }
    }

    fn original_route(&self) -> Route {
        Route::OriginalResponse {
            application_id: self.application_id,
            token: self.token.clone(),
        }
    }

    fn prepare_body(&self, body: MessageBody) -> Result<PreparedMessage, Error> {
        let mut prepared = body.prepare()?;
        prepared.apply_defaults(&self.opts, true);
        Ok(prepared)
    }

    async fn respond_locked(
        &self,
        state: &mut ResponseState,
        ty: ResponseType,
        body: &PreparedMessage,
    ) -> Result<Outcome, Error> {
        match (*state, ty.is_final()) {
            (ResponseState::Responded, _) => {
                debug!(?ty, "Interaction already responded to, skipping");
                Ok(Outcome::Skipped)
            },
            (ResponseState::Deferred, false) => {
                debug!(?ty, "Interaction already deferred, skipping");
                Ok(Outcome::Skipped)
            },
            (ResponseState::Deferred, true) => {
                let req = Request::new(Method::Patch, self.original_route())
                    .json(body.to_json())
                    .files(body.files().to_vec());
                let res = self
                    .transport
                    .request(req)
                    .await
                    .map_err(Error::from_interaction_route)?;

                *state = ResponseState::Responded;
                Ok(Outcome::Edited(res))
            },
            (ResponseState::Fresh, fin) => {
                let mut payload = json!({ "type": u8::from(ty) });
                let data = body.to_json();
                if ty != ResponseType::Pong
                    && data.as_object().is_some_and(|o| !o.is_empty())
                {
                    payload["data"] = data;
                }

                let req = Request::new(Method::Post, self.callback_route())
                    .json(payload)
                    .files(body.files().to_vec());
                self.transport
                    .request(req)
                    .await
                    .map_err(Error::from_interaction_route)?;

                *state = if fin {
                    ResponseState::Responded
                } else {
                    ResponseState::Deferred
                };
                Ok(Outcome::Callback)
            },
        }
    }

    /// Send a response of the given type
    ///
    /// The first call sends the interaction callback.  If that callback was a
    /// deferral, a later call with a final type edits the deferred
    /// placeholder instead.  Any other call does nothing and returns
    /// [`Outcome::Skipped`].
    ///
    /// # Errors
    /// This method returns an error if `body` is invalid, or if the request
    /// fails.  A token that has expired or was already used produces
    /// [`Error::InteractionExpiredOrConsumed`].
    #[instrument(level = "debug", skip(self, body), fields(interaction = %self.id))]
    pub async fn respond(&self, ty: ResponseType, body: MessageBody) -> Result<Outcome, Error> {
        let body = self.prepare_body(body)?;
        let mut state = self.state.lock().await;
        self.respond_locked(&mut state, ty, &body).await
    }

    /// Acknowledge this interaction now and respond to it later
    ///
    /// With `edit_origin` set the eventual response edits the component's
    /// message, otherwise it is a new message, visible only to the user if
    /// `ephemeral` is set.
    ///
    /// # Errors
    /// This method returns an error if the request fails.
    pub async fn defer(&self, ephemeral: bool, edit_origin: bool) -> Result<Outcome, Error> {
        let ty = if edit_origin {
            ResponseType::DeferredUpdateMessage
        } else {
            ResponseType::DeferredChannelMessageWithSource
        };

        self.respond(ty, MessageBody::new().ephemeral(ephemeral)).await
    }

    async fn defer_then_edit(
        &self,
        edit_origin: bool,
        body: MessageBody,
    ) -> Result<Option<Value>, Error> {
        let body = self.prepare_body(body)?;
        let mut state = self.state.lock().await;

        if *state == ResponseState::Responded {
            debug!("Interaction already responded to, skipping");
            return Ok(None);
        }

        let (deferred, fin) = if edit_origin {
            (
                ResponseType::DeferredUpdateMessage,
                ResponseType::UpdateMessage,
            )
        } else {
            (
                ResponseType::DeferredChannelMessageWithSource,
                ResponseType::ChannelMessageWithSource,
            )
        };

        let placeholder = body.placeholder();
        self.respond_locked(&mut state, deferred, &placeholder).await?;

        match self.respond_locked(&mut state, fin, &body).await? {
            Outcome::Edited(Some(msg)) => Ok(Some(msg)),
            Outcome::Edited(None) => Err(ProtocolError::MissingField("message").into()),
            Outcome::Skipped | Outcome::Callback => {
                unreachable!("Deferred interaction was not edited")
            },
        }
    }

    /// Respond with a new message
    ///
    /// The interaction is deferred first if it has not been already, and the
    /// deferred placeholder is then replaced with `body`.  Returns `None` if
    /// the interaction had already been responded to.
    ///
    /// # Errors
    /// This method returns an error if `body` is invalid, if either request
    /// fails, or if the sent message cannot be decoded.
    #[instrument(level = "debug", skip(self, body), fields(interaction = %self.id))]
    pub async fn send(&self, body: MessageBody) -> Result<Option<Sent>, Error> {
        let Some(msg) = self.defer_then_edit(false, body).await? else {
            return Ok(None);
        };

        let ephemeral = msg
            .get("flags")
            .and_then(Value::as_u64)
            .is_some_and(|f| f & crate::message::EPHEMERAL_FLAG != 0);

        Ok(Some(if ephemeral {
            Sent::Ephemeral(msg)
        } else {
            Sent::Message(ComponentMessage::from_wire(msg)?)
        }))
    }

    /// Respond by editing the message the component is attached to
    ///
    /// Returns the edited message, or `None` if the interaction had already
    /// been responded to.
    ///
    /// # Errors
    /// This method returns an error if `body` is invalid, if either request
    /// fails, or if the edited message cannot be decoded.
    #[instrument(level = "debug", skip(self, body), fields(interaction = %self.id))]
    pub async fn edit_origin(&self, body: MessageBody) -> Result<Option<ComponentMessage>, Error> {
        let Some(msg) = self.defer_then_edit(true, body).await? else {
            return Ok(None);
        };

        Ok(Some(ComponentMessage::from_wire(msg)?))
    }
}
