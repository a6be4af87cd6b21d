use serde::{Deserialize, Serialize};

use super::{ComponentType, PartialEmoji};
use crate::ArgumentError;

/// The visual style of a button
///
/// The original names used by Discord's client are noted on each variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ButtonStyle {
    /// Blurple (`blue`)
    Primary = 1,
    /// Grey (`gray`)
    Secondary = 2,
    /// Green (`green`)
    Success = 3,
    /// Red (`red`)
    Danger = 4,
    /// Grey, navigates to a URL instead of sending an interaction (`URL`)
    Link = 5,
}

impl TryFrom<u8> for ButtonStyle {
    type Error = ArgumentError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => Self::Primary,
            2 => Self::Secondary,
            3 => Self::Success,
            4 => Self::Danger,
            5 => Self::Link,
            s => return Err(ArgumentError::InvalidStyle(s)),
        })
    }
}

impl From<ButtonStyle> for u8 {
    #[inline]
    fn from(value: ButtonStyle) -> Self { value as u8 }
}

/// A clickable button
///
/// Non-link buttons carry a custom ID and produce an interaction when
/// clicked; link buttons carry a URL instead.  Exactly one of the two is
/// present, and every button has a label, an emoji, or both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "RawButton")]
pub struct Button {
    style: ButtonStyle,
    label: Option<String>,
    custom_id: Option<String>,
    url: Option<String>,
    disabled: bool,
    emoji: Option<PartialEmoji>,
}

fn non_empty(s: Option<String>) -> Option<String> { s.filter(|s| !s.is_empty()) }

impl Button {
    /// Begin building a button with the given style
    #[inline]
    pub fn builder(style: ButtonStyle) -> ButtonBuilder {
        ButtonBuilder(Self {
            style,
            label: None,
            custom_id: None,
            url: None,
            disabled: false,
            emoji: None,
        })
    }

    /// Construct a labelled non-link button
    ///
    /// # Errors
    /// This function returns an error if `style` is [`ButtonStyle::Link`] or
    /// if the custom ID or label is empty.
    #[inline]
    pub fn new(
        style: ButtonStyle,
        custom_id: impl Into<String>,
        label: impl Into<String>,
    ) -> Result<Self, ArgumentError> {
        Self::builder(style)
            .custom_id(custom_id)
            .label(label)
            .build()
    }

    /// Construct a labelled link button
    ///
    /// # Errors
    /// This function returns an error if the URL or label is empty.
    #[inline]
    pub fn link(url: impl Into<String>, label: impl Into<String>) -> Result<Self, ArgumentError> {
        Self::builder(ButtonStyle::Link).url(url).label(label).build()
    }

    /// Rebuild a button about which only the custom ID is known
    pub(crate) fn bare(custom_id: &str) -> Result<Self, ArgumentError> {
        Self::new(ButtonStyle::Secondary, custom_id, custom_id)
    }

    fn validate(&self) -> Result<(), ArgumentError> {
        if self.style == ButtonStyle::Link {
            if self.url.is_none() {
                return Err(ArgumentError::MissingUrl);
            }

            if self.custom_id.is_some() {
                return Err(ArgumentError::LinkWithCustomId);
            }
        } else {
            if self.url.is_some() {
                return Err(ArgumentError::UrlWithoutLink);
            }

            if self.custom_id.is_none() {
                return Err(ArgumentError::MissingCustomId);
            }
        }

        if self.label.is_none() && self.emoji.is_none() {
            return Err(ArgumentError::EmptyLabel);
        }

        Ok(())
    }

    fn update(&mut self, f: impl FnOnce(&mut Self)) -> Result<(), ArgumentError> {
        let mut next = self.clone();
        f(&mut next);
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// The style of this button
    #[inline]
    #[must_use]
    pub fn style(&self) -> ButtonStyle { self.style }

    /// The text label of this button
    #[inline]
    #[must_use]
    pub fn label(&self) -> Option<&str> { self.label.as_deref() }

    /// The custom ID of this button, absent for link buttons
    #[inline]
    #[must_use]
    pub fn custom_id(&self) -> Option<&str> { self.custom_id.as_deref() }

    /// The target URL of this button, present only for link buttons
    #[inline]
    #[must_use]
    pub fn url(&self) -> Option<&str> { self.url.as_deref() }

    /// Whether this button is greyed out
    #[inline]
    #[must_use]
    pub fn disabled(&self) -> bool { self.disabled }

    /// The emoji shown on this button
    #[inline]
    #[must_use]
    pub fn emoji(&self) -> Option<&PartialEmoji> { self.emoji.as_ref() }

    /// Change the style of this button
    ///
    /// # Errors
    /// This method returns an error, leaving the button unchanged, if the new
    /// style conflicts with the button's custom ID or URL.
    pub fn set_style(&mut self, style: ButtonStyle) -> Result<(), ArgumentError> {
        self.update(|b| b.style = style)
    }

    /// Change the label of this button
    ///
    /// # Errors
    /// This method returns an error if the label would be empty and the
    /// button has no emoji.
    pub fn set_label(&mut self, label: Option<String>) -> Result<(), ArgumentError> {
        self.update(|b| b.label = non_empty(label))
    }

    /// Change the custom ID of this button
    ///
    /// # Errors
    /// This method returns an error if this is a link button.
    pub fn set_custom_id(&mut self, custom_id: impl Into<String>) -> Result<(), ArgumentError> {
        if self.style == ButtonStyle::Link {
            return Err(ArgumentError::LinkWithCustomId);
        }

        let custom_id = custom_id.into();
        self.update(|b| b.custom_id = non_empty(Some(custom_id)))
    }

    /// Change the URL of this button
    ///
    /// # Errors
    /// This method returns an error if this is not a link button.
    pub fn set_url(&mut self, url: impl Into<String>) -> Result<(), ArgumentError> {
        let url = url.into();
        self.update(|b| b.url = non_empty(Some(url)))
    }

    /// Turn this into a link button pointing at `url`, dropping its custom ID
    ///
    /// # Errors
    /// This method returns an error, leaving the button unchanged, if the URL
    /// is empty.
    pub fn set_link(&mut self, url: impl Into<String>) -> Result<(), ArgumentError> {
        let url = url.into();
        self.update(|b| {
            b.style = ButtonStyle::Link;
            b.url = non_empty(Some(url));
            b.custom_id = None;
        })
    }

    /// Turn this into an interactive button with the given style and custom
    /// ID, dropping its URL
    ///
    /// # Errors
    /// This method returns an error, leaving the button unchanged, if `style`
    /// is [`ButtonStyle::Link`] or the custom ID is empty.
    pub fn set_action(
        &mut self,
        style: ButtonStyle,
        custom_id: impl Into<String>,
    ) -> Result<(), ArgumentError> {
        if style == ButtonStyle::Link {
            return Err(ArgumentError::MissingUrl);
        }

        let custom_id = custom_id.into();
        self.update(|b| {
            b.style = style;
            b.custom_id = non_empty(Some(custom_id));
            b.url = None;
        })
    }

    /// Enable or disable this button
    pub fn set_disabled(&mut self, disabled: bool) { self.disabled = disabled; }

    /// Change the emoji of this button
    ///
    /// # Errors
    /// This method returns an error if the emoji is removed and the button
    /// has no label.
    pub fn set_emoji(&mut self, emoji: Option<PartialEmoji>) -> Result<(), ArgumentError> {
        self.update(|b| b.emoji = emoji)
    }
}

/// Builder for a [`Button`], validated by [`build`](Self::build)
#[derive(Debug, Clone)]
#[must_use]
pub struct ButtonBuilder(Button);

impl ButtonBuilder {
    /// Set the text label
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.0.label = non_empty(Some(label.into()));
        self
    }

    /// Set the custom ID
    pub fn custom_id(mut self, custom_id: impl Into<String>) -> Self {
        self.0.custom_id = non_empty(Some(custom_id.into()));
        self
    }

    /// Set the target URL
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.0.url = non_empty(Some(url.into()));
        self
    }

    /// Set whether the button is greyed out
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.0.disabled = disabled;
        self
    }

    /// Set the emoji
    pub fn emoji(mut self, emoji: impl Into<PartialEmoji>) -> Self {
        self.0.emoji = Some(emoji.into());
        self
    }

    /// Validate and return the button
    ///
    /// # Errors
    /// This method returns an error if the button's custom ID and URL do not
    /// agree with its style, or if it has neither a label nor an emoji.
    pub fn build(self) -> Result<Button, ArgumentError> {
        self.0.validate()?;
        Ok(self.0)
    }
}

#[derive(Serialize, Deserialize)]
pub(super) struct RawButton {
    #[serde(rename = "type")]
    ty: u8,
    style: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    custom_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default)]
    disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    emoji: Option<PartialEmoji>,
}

impl RawButton {
    pub(super) fn ty(&self) -> u8 { self.ty }
}

impl From<Button> for RawButton {
    fn from(value: Button) -> Self {
        let Button {
            style,
            label,
            custom_id,
            url,
            disabled,
            emoji,
        } = value;
        Self {
            ty: ComponentType::Button.into(),
            style: style.into(),
            label,
            custom_id,
            url,
            disabled,
            emoji,
        }
    }
}

impl TryFrom<RawButton> for Button {
    type Error = ArgumentError;

    fn try_from(value: RawButton) -> Result<Self, Self::Error> {
        let RawButton {
            ty: _,
            style,
            label,
            custom_id,
            url,
            disabled,
            emoji,
        } = value;
        let button = Self {
            style: style.try_into()?,
            label: non_empty(label),
            custom_id: non_empty(custom_id),
            url: non_empty(url),
            disabled,
            emoji,
        };
        button.validate()?;
        Ok(button)
    }
}
