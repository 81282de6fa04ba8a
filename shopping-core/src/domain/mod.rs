//! Domain Layer
//!
//! Contains the shopping item entity and its rules.
//! This layer has NO external dependencies (except serde and thiserror).

mod entity;
mod item;
mod color;

pub use entity::{Entity, DomainError, DomainResult};
pub use item::{ShoppingItem, ItemDraft, parse_quantity, DEFAULT_QUANTITY};
pub use color::{SwipeColor, SwipeGesture, DEFAULT_SWIPE_THRESHOLD};
