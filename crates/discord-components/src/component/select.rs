use serde::{Deserialize, Serialize};

use super::{ComponentType, PartialEmoji};
use crate::ArgumentError;

/// The largest number of options, and of selected values, Discord allows
pub const MAX_OPTIONS: usize = 25;

const MAX_VALUES: u8 = 25;

/// A single entry in a [`Select`] menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "RawSelectOption")]
pub struct SelectOption {
    label: String,
    value: String,
    description: Option<String>,
    emoji: Option<PartialEmoji>,
    default: bool,
}

impl SelectOption {
    /// Construct a new option
    ///
    /// # Errors
    /// This function returns an error if `label` is empty.
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Result<Self, ArgumentError> {
        let label = label.into();
        if label.is_empty() {
            return Err(ArgumentError::EmptyOptionLabel);
        }

        Ok(Self {
            label,
            value: value.into(),
            description: None,
            emoji: None,
            default: false,
        })
    }

    /// Return this option with the given description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Return this option with the given emoji
    #[must_use]
    pub fn with_emoji(mut self, emoji: impl Into<PartialEmoji>) -> Self {
        self.emoji = Some(emoji.into());
        self
    }

    /// Return this option with its pre-selected flag set to `default`
    #[must_use]
    pub fn with_default(mut self, default: bool) -> Self {
        self.default = default;
        self
    }

    /// The user-facing label
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str { &self.label }

    /// The value reported back when this option is selected
    #[inline]
    #[must_use]
    pub fn value(&self) -> &str { &self.value }

    /// Additional text shown under the label
    #[inline]
    #[must_use]
    pub fn description(&self) -> Option<&str> { self.description.as_deref() }

    /// The emoji shown beside the label
    #[inline]
    #[must_use]
    pub fn emoji(&self) -> Option<&PartialEmoji> { self.emoji.as_ref() }

    /// Whether this option is selected when the menu is first shown
    #[inline]
    #[must_use]
    pub fn default(&self) -> bool { self.default }

    /// Change the label of this option
    ///
    /// # Errors
    /// This method returns an error if `label` is empty.
    pub fn set_label(&mut self, label: impl Into<String>) -> Result<(), ArgumentError> {
        let label = label.into();
        if label.is_empty() {
            return Err(ArgumentError::EmptyOptionLabel);
        }

        self.label = label;
        Ok(())
    }

    /// Change the value of this option
    pub fn set_value(&mut self, value: impl Into<String>) { self.value = value.into(); }

    /// Change the description of this option
    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    /// Change the emoji of this option
    pub fn set_emoji(&mut self, emoji: Option<PartialEmoji>) { self.emoji = emoji; }

    /// Change whether this option is pre-selected
    pub fn set_default(&mut self, default: bool) { self.default = default; }
}

/// A dropdown menu of text options
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "RawSelect")]
pub struct Select {
    custom_id: String,
    options: Vec<SelectOption>,
    placeholder: Option<String>,
    min_values: u8,
    max_values: u8,
    disabled: bool,
}

fn check_options(options: &[SelectOption]) -> Result<(), ArgumentError> {
    if options.is_empty() || options.len() > MAX_OPTIONS {
        return Err(ArgumentError::OptionCount(options.len()));
    }

    Ok(())
}

fn check_values(min: u8, max: u8, options: usize) -> Result<(), ArgumentError> {
    if min < 1 || max > MAX_VALUES || min > max {
        return Err(ArgumentError::ValueRange { min, max });
    }

    if usize::from(max) > options {
        return Err(ArgumentError::MaxValuesExceedOptions { max, options });
    }

    Ok(())
}

impl Select {
    /// Begin building a select menu with the given custom ID
    #[inline]
    pub fn builder(custom_id: impl Into<String>) -> SelectBuilder {
        SelectBuilder(Self {
            custom_id: custom_id.into(),
            options: vec![],
            placeholder: None,
            min_values: 1,
            max_values: 1,
            disabled: false,
        })
    }

    /// Construct a single-choice select menu with the given options
    ///
    /// # Errors
    /// This function returns an error if there are no options or more than
    /// [`MAX_OPTIONS`] options.
    #[inline]
    pub fn new(
        custom_id: impl Into<String>,
        options: impl IntoIterator<Item = SelectOption>,
    ) -> Result<Self, ArgumentError> {
        Self::builder(custom_id).options(options).build()
    }

    /// Rebuild a select menu about which only the custom ID and the selected
    /// values are known
    pub(crate) fn bare(custom_id: &str, values: &[String]) -> Result<Self, ArgumentError> {
        let options = values
            .iter()
            .map(|v| SelectOption::new(v.as_str(), v.as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        let max = u8::try_from(options.len())
            .map_err(|_| ArgumentError::OptionCount(options.len()))?;

        Self::builder(custom_id)
            .options(options)
            .values(1, max.max(1))
            .build()
    }

    fn validate(&self) -> Result<(), ArgumentError> {
        check_options(&self.options)?;
        check_values(self.min_values, self.max_values, self.options.len())
    }

    /// The custom ID of this menu
    #[inline]
    #[must_use]
    pub fn custom_id(&self) -> &str { &self.custom_id }

    /// The options of this menu, in display order
    #[inline]
    #[must_use]
    pub fn options(&self) -> &[SelectOption] { &self.options }

    /// Find the option with the given value
    #[must_use]
    pub fn option(&self, value: &str) -> Option<&SelectOption> {
        self.options.iter().find(|o| o.value == value)
    }

    /// The text shown when nothing is selected
    #[inline]
    #[must_use]
    pub fn placeholder(&self) -> Option<&str> { self.placeholder.as_deref() }

    /// The minimum number of options a user must pick
    #[inline]
    #[must_use]
    pub fn min_values(&self) -> u8 { self.min_values }

    /// The maximum number of options a user may pick
    #[inline]
    #[must_use]
    pub fn max_values(&self) -> u8 { self.max_values }

    /// Whether this menu is greyed out
    #[inline]
    #[must_use]
    pub fn disabled(&self) -> bool { self.disabled }

    /// Change the custom ID of this menu
    pub fn set_custom_id(&mut self, custom_id: impl Into<String>) {
        self.custom_id = custom_id.into();
    }

    /// Replace the options of this menu
    ///
    /// # Errors
    /// This method returns an error, leaving the menu unchanged, if there are
    /// no options, more than [`MAX_OPTIONS`] options, or fewer options than
    /// [`max_values`](Self::max_values).
    pub fn set_options(
        &mut self,
        options: impl IntoIterator<Item = SelectOption>,
    ) -> Result<(), ArgumentError> {
        let options: Vec<_> = options.into_iter().collect();
        check_options(&options)?;
        check_values(self.min_values, self.max_values, options.len())?;
        self.options = options;
        Ok(())
    }

    /// Change the placeholder text of this menu
    pub fn set_placeholder(&mut self, placeholder: Option<String>) {
        self.placeholder = placeholder;
    }

    /// Change how many options a user must and may pick
    ///
    /// # Errors
    /// This method returns an error if either bound is outside `1..=25`,
    /// `min > max`, or `max` is more than the number of options.
    pub fn set_values(&mut self, min: u8, max: u8) -> Result<(), ArgumentError> {
        check_values(min, max, self.options.len())?;
        self.min_values = min;
        self.max_values = max;
        Ok(())
    }

    /// Enable or disable this menu
    pub fn set_disabled(&mut self, disabled: bool) { self.disabled = disabled; }
}

/// Builder for a [`Select`], validated by [`build`](Self::build)
#[derive(Debug, Clone)]
#[must_use]
pub struct SelectBuilder(Select);

impl SelectBuilder {
    /// Append an option
    pub fn option(mut self, option: SelectOption) -> Self {
        self.0.options.push(option);
        self
    }

    /// Append several options
    pub fn options(mut self, options: impl IntoIterator<Item = SelectOption>) -> Self {
        self.0.options.extend(options);
        self
    }

    /// Set the placeholder text
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.0.placeholder = Some(placeholder.into());
        self
    }

    /// Set how many options a user must and may pick
    pub fn values(mut self, min: u8, max: u8) -> Self {
        self.0.min_values = min;
        self.0.max_values = max;
        self
    }

    /// Set whether the menu is greyed out
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.0.disabled = disabled;
        self
    }

    /// Validate and return the menu
    ///
    /// # Errors
    /// This method returns an error if the option count or value range is out
    /// of bounds.
    pub fn build(self) -> Result<Select, ArgumentError> {
        self.0.validate()?;
        Ok(self.0)
    }
}

#[derive(Serialize, Deserialize)]
pub(super) struct RawSelectOption {
    label: String,
    value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    emoji: Option<PartialEmoji>,
}

impl From<SelectOption> for RawSelectOption {
    fn from(value: SelectOption) -> Self {
        let SelectOption {
            label,
            value,
            description,
            emoji,
            default,
        } = value;
        Self {
            label,
            value,
            description,
            default,
            emoji,
        }
    }
}

impl TryFrom<RawSelectOption> for SelectOption {
    type Error = ArgumentError;

    fn try_from(value: RawSelectOption) -> Result<Self, Self::Error> {
        let RawSelectOption {
            label,
            value,
            description,
            default,
            emoji,
        } = value;
        let mut opt = SelectOption::new(label, value)?.with_default(default);
        opt.description = description;
        opt.emoji = emoji;
        Ok(opt)
    }
}

#[derive(Serialize, Deserialize)]
pub(super) struct RawSelect {
    #[serde(rename = "type")]
    ty: u8,
    custom_id: String,
    options: Vec<RawSelectOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    placeholder: Option<String>,
    #[serde(default)]
    min_values: Option<u8>,
    #[serde(default)]
    max_values: Option<u8>,
    #[serde(default)]
    disabled: bool,
}

impl RawSelect {
    pub(super) fn ty(&self) -> u8 { self.ty }
}

impl From<Select> for RawSelect {
    fn from(value: Select) -> Self {
        let Select {
            custom_id,
            options,
            placeholder,
            min_values,
            max_values,
            disabled,
        } = value;
        Self {
            ty: ComponentType::Select.into(),
            custom_id,
            options: options.into_iter().map(Into::into).collect(),
            placeholder,
            min_values: Some(min_values),
            max_values: Some(max_values),
            disabled,
        }
    }
}

impl TryFrom<RawSelect> for Select {
    type Error = ArgumentError;

    fn try_from(value: RawSelect) -> Result<Self, Self::Error> {
        let RawSelect {
            ty: _,
            custom_id,
            options,
            placeholder,
            min_values,
            max_values,
            disabled,
        } = value;
        let select = Self {
            custom_id,
            options: options
                .into_iter()
                .map(TryInto::try_into)
                .collect::<Result<_, _>>()?,
            placeholder,
            min_values: min_values.unwrap_or(1),
            max_values: max_values.unwrap_or(1),
            disabled,
        };
        select.validate()?;
        Ok(select)
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;
    use serde_json::json;

    use super::{Select, SelectOption, MAX_OPTIONS};
    use crate::{component::Wire, ArgumentError};

    fn opts(n: usize) -> Vec<SelectOption> {
        (0..n)
            .map(|i| SelectOption::new(format!("Option {i}"), i.to_string()).unwrap())
            .collect()
    }

    proptest! {
        #[test]
        fn test_option_count(n in 0..=(MAX_OPTIONS + 5)) {
            let res = Select::new("menu", opts(n));
            if (1..=MAX_OPTIONS).contains(&n) {
                prop_assert!(res.is_ok());
            } else {
                prop_assert_eq!(res, Err(ArgumentError::OptionCount(n)));
            }
        }
    }

    #[test]
    fn test_option_count_bounds() {
        assert_eq!(Select::new("menu", []), Err(ArgumentError::OptionCount(0)));
        assert_eq!(
            Select::new("menu", opts(26)),
            Err(ArgumentError::OptionCount(26))
        );

        let mut select = Select::new("menu", opts(25)).unwrap();
        assert_eq!(select.set_options([]), Err(ArgumentError::OptionCount(0)));
        assert_eq!(select.options().len(), 25);
    }

    #[test]
    fn test_value_range() {
        let mut select = Select::new("menu", opts(3)).unwrap();
        assert_eq!(
            select.set_values(0, 2),
            Err(ArgumentError::ValueRange { min: 0, max: 2 })
        );
        assert_eq!(
            select.set_values(3, 2),
            Err(ArgumentError::ValueRange { min: 3, max: 2 })
        );
        assert_eq!(
            select.set_values(1, 26),
            Err(ArgumentError::ValueRange { min: 1, max: 26 })
        );
        select.set_values(1, 3).unwrap();
        assert_eq!((select.min_values(), select.max_values()), (1, 3));
    }

    #[test]
    fn test_max_values_within_options() {
        let mut select = Select::new("menu", opts(3)).unwrap();
        assert_eq!(
            select.set_values(1, 4),
            Err(ArgumentError::MaxValuesExceedOptions { max: 4, options: 3 })
        );

        select.set_values(2, 3).unwrap();
        assert_eq!(
            select.set_options(opts(2)),
            Err(ArgumentError::MaxValuesExceedOptions { max: 3, options: 2 })
        );
        assert_eq!(select.options().len(), 3);

        assert_eq!(
            Select::builder("menu").options(opts(2)).values(1, 5).build(),
            Err(ArgumentError::MaxValuesExceedOptions { max: 5, options: 2 })
        );
    }

    #[test]
    fn test_wire_shape() {
        let select = Select::builder("color")
            .option(SelectOption::new("Red", "r").unwrap().with_emoji('🟥'))
            .option(
                SelectOption::new("Blue", "b")
                    .unwrap()
                    .with_description("Like the sky")
                    .with_default(true),
            )
            .placeholder("Pick one")
            .build()
            .unwrap();

        assert_eq!(
            select.to_wire(),
            json!({
                "type": 3,
                "custom_id": "color",
                "options": [
                    { "label": "Red", "value": "r", "default": false, "emoji": { "name": "🟥" } },
                    { "label": "Blue", "value": "b", "description": "Like the sky", "default": true },
                ],
                "placeholder": "Pick one",
                "min_values": 1,
                "max_values": 1,
                "disabled": false,
            })
        );
    }

    #[test]
    fn test_decode_defaults() {
        let select = Select::from_wire(json!({
            "type": 3,
            "custom_id": "color",
            "options": [{ "label": "Red", "value": "r" }],
            "min_values": null,
        }))
        .unwrap();

        assert_eq!((select.min_values(), select.max_values()), (1, 1));
        assert!(!select.options()[0].default());
        assert!(Select::from_wire(json!({
            "type": 3,
            "custom_id": "color",
            "options": [],
        }))
        .is_err());
    }

    #[test]
    fn test_bare() {
        let select = Select::bare("color", &["b".into(), "r".into()]).unwrap();
        assert_eq!(select.options()[0].label(), "b");
        assert_eq!(select.max_values(), 2);
        assert_eq!(
            Select::bare("color", &[]),
            Err(ArgumentError::OptionCount(0))
        );
    }
}
