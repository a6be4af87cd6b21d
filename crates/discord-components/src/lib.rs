//! Message components (buttons and select menus) for bots built on
//! [`serenity`], and the interactions users trigger with them
//!
//! The crate is split along the life of a component:
//! - [`component`] describes what gets attached to a message
//! - [`message`] binds a sent message to the components it carries
//! - [`interaction`] turns a raw gateway event back into typed data
//! - [`response`] answers an interaction exactly once
//! - [`dispatch`] routes interactions to waiters, callbacks and listeners
//!
//! All network access goes through the [`http::Transport`] trait, which is
//! implemented for [`serenity::http::Http`].

#![deny(
    clippy::disallowed_methods,
    clippy::suspicious,
    clippy::style,
    clippy::clone_on_ref_ptr,
    missing_debug_implementations,
    missing_copy_implementations
)]
#![warn(clippy::pedantic, missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod component;
pub mod config;
pub mod dispatch;
mod error;
pub mod http;
pub mod interaction;
pub mod message;
pub mod response;

pub use config::ClientOptions;
pub use dispatch::ComponentsClient;
pub use error::*;

/// Common imports for working with components and interactions
pub mod prelude {
    pub use super::{
        component::{
            ActionRow, Button, ButtonStyle, Component, LayoutItem, PartialEmoji, Select,
            SelectOption, Wire as _,
        },
        dispatch::{ComponentsClient, EventKind, Filter},
        interaction::Interaction,
        message::{ComponentMessage, MessageBody},
        response::{Prepare as _, ResponseType},
        ArgumentError, Error, ProtocolError,
    };
}
