use serde::{ser::SerializeStruct, Serialize};

use super::{Button, Component, ComponentType, Select};
use crate::ArgumentError;

/// The largest number of components Discord renders in one row
pub const MAX_ROW_LEN: usize = 5;

/// A horizontal row of up to [`MAX_ROW_LEN`] components
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionRow(Vec<Component>);

impl ActionRow {
    /// Construct an empty row
    #[inline]
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Construct a row containing the given components
    ///
    /// # Errors
    /// This function returns an error if more than [`MAX_ROW_LEN`] components
    /// are given.
    pub fn from_components<C: Into<Component>>(
        components: impl IntoIterator<Item = C>,
    ) -> Result<Self, ArgumentError> {
        components
            .into_iter()
            .try_fold(Self::new(), |mut row, c| {
                row.push(c)?;
                Ok(row)
            })
    }

    /// Append a component to the end of this row
    ///
    /// # Errors
    /// This method returns an error if the row is already full.
    pub fn push(&mut self, component: impl Into<Component>) -> Result<(), ArgumentError> {
        if self.0.len() >= MAX_ROW_LEN {
            return Err(ArgumentError::RowFull);
        }

        self.0.push(component.into());
        Ok(())
    }

    /// Remove and return the component at `idx`, if any
    pub fn remove(&mut self, idx: usize) -> Option<Component> {
        (idx < self.0.len()).then(|| self.0.remove(idx))
    }

    /// The components in this row, left to right
    #[inline]
    #[must_use]
    pub fn components(&self) -> &[Component] { &self.0 }

    /// Get the component at `idx`
    #[inline]
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&Component> { self.0.get(idx) }

    /// Get the component at `idx` for modification
    #[inline]
    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Component> { self.0.get_mut(idx) }

    /// Iterate over the components in this row
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Component> { self.0.iter() }

    /// The number of components in this row
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize { self.0.len() }

    /// Whether this row has no components
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub(super) fn from_parts(components: Vec<Component>) -> Result<Self, ArgumentError> {
        if components.len() > MAX_ROW_LEN {
            return Err(ArgumentError::RowFull);
        }

        Ok(Self(components))
    }
}

impl<'a> IntoIterator for &'a ActionRow {
    type IntoIter = std::slice::Iter<'a, Component>;
    type Item = &'a Component;

    #[inline]
    fn into_iter(self) -> Self::IntoIter { self.0.iter() }
}

impl IntoIterator for ActionRow {
    type IntoIter = std::vec::IntoIter<Component>;
    type Item = Component;

    #[inline]
    fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

impl Serialize for ActionRow {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ActionRow", 2)?;
        s.serialize_field("type", &u8::from(ComponentType::ActionRow))?;
        s.serialize_field("components", &self.0)?;
        s.end()
    }
}

/// One entry of a message layout, normalized into exactly one [`ActionRow`] by
/// [`normalize_layout`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutItem {
    /// An explicit row, used as-is
    Row(ActionRow),
    /// A lone component, given a row of its own
    Component(Component),
    /// Several components sharing one row
    Group(Vec<Component>),
}

impl From<ActionRow> for LayoutItem {
    fn from(value: ActionRow) -> Self { Self::Row(value) }
}

impl From<Component> for LayoutItem {
    fn from(value: Component) -> Self { Self::Component(value) }
}

impl From<Button> for LayoutItem {
    fn from(value: Button) -> Self { Self::Component(value.into()) }
}

impl From<Select> for LayoutItem {
    fn from(value: Select) -> Self { Self::Component(value.into()) }
}

impl From<Vec<Component>> for LayoutItem {
    fn from(value: Vec<Component>) -> Self { Self::Group(value) }
}

impl From<Vec<Button>> for LayoutItem {
    fn from(value: Vec<Button>) -> Self { Self::Group(value.into_iter().map(Into::into).collect()) }
}

/// Turn a flat layout into a list of rows
///
/// Each item becomes exactly one row, in order: rows pass through, a lone
/// component is wrapped in its own row, and a group of components shares a
/// row.
///
/// # Errors
/// This function returns an error if a group holds more than
/// [`MAX_ROW_LEN`] components.
pub fn normalize_layout<I: IntoIterator>(items: I) -> Result<Vec<ActionRow>, ArgumentError>
where I::Item: Into<LayoutItem> {
    items
        .into_iter()
        .map(|item| match item.into() {
            LayoutItem::Row(row) => Ok(row),
            LayoutItem::Component(c) => ActionRow::from_components([c]),
            LayoutItem::Group(g) => ActionRow::from_components(g),
        })
        .collect()
}
