//! Shopping Item Entity
//!
//! A line on the shopping list: name, quantity, selection state and a
//! swipe-reveal color.

use serde::{Deserialize, Serialize};

use super::color::SwipeColor;
use super::entity::{DomainError, DomainResult, Entity};

/// Quantity used when the input is empty, non-numeric or zero
pub const DEFAULT_QUANTITY: u32 = 1;

/// A shopping list item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingItem {
    /// Store-assigned key (None until persisted)
    pub id: Option<String>,
    /// Display label
    pub name: String,
    /// Positive count
    pub quantity: u32,
    /// Visual marker changed by swiping
    pub swipe_color: SwipeColor,
    /// Checked off by the user
    pub is_selected: bool,
}

impl ShoppingItem {
    /// Create an unpersisted, unselected item with the default color
    pub fn new(name: impl Into<String>, quantity: u32) -> Self {
        Self {
            id: None,
            name: name.into(),
            quantity,
            swipe_color: SwipeColor::default(),
            is_selected: false,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Copy with `is_selected` flipped
    pub fn toggled(&self) -> Self {
        Self {
            is_selected: !self.is_selected,
            ..self.clone()
        }
    }

    /// Copy with a new swipe color
    pub fn recolored(&self, color: SwipeColor) -> Self {
        Self {
            swipe_color: color,
            ..self.clone()
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Same list entry: by id once persisted, by value before that
    pub fn same_entry(&self, other: &ShoppingItem) -> bool {
        match (&self.id, &other.id) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self == other,
            _ => false,
        }
    }
}

impl Entity for ShoppingItem {
    type Id = String;

    fn id(&self) -> Option<&Self::Id> {
        self.id.as_ref()
    }
}

/// Validated user input for a new item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDraft {
    pub name: String,
    pub quantity: u32,
}

impl ItemDraft {
    /// Name must be non-blank; quantity falls back to 1
    pub fn new(name: &str, quantity_input: &str) -> DomainResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::InvalidInput("item name must not be blank".to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            quantity: parse_quantity(quantity_input),
        })
    }

    pub fn into_item(self) -> ShoppingItem {
        ShoppingItem::new(self.name, self.quantity)
    }
}

/// Digits-only positive count, otherwise `DEFAULT_QUANTITY`
pub fn parse_quantity(input: &str) -> u32 {
    let input = input.trim();
    if input.is_empty() || !input.chars().all(|c| c.is_ascii_digit()) {
        return DEFAULT_QUANTITY;
    }
    match input.parse::<u32>() {
        Ok(0) | Err(_) => DEFAULT_QUANTITY,
        Ok(n) => n,
    }
}
