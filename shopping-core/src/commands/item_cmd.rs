//! Item Commands
//!
//! Exposes list intents to the UI. Inputs arrive raw (text fields, ids,
//! drag offsets); errors come back as display strings.

use crate::domain::{ItemDraft, ShoppingItem, SwipeColor, SwipeGesture};
use crate::state::ShoppingList;

fn find_item(list: &ShoppingList, id: &str) -> Result<ShoppingItem, String> {
    list.state()
        .find(id)
        .cloned()
        .ok_or_else(|| format!("Item {} not found", id))
}

/// Validate the add-item dialog input and submit it
pub fn add_item(list: &ShoppingList, name: &str, quantity: &str) -> Result<ItemDraft, String> {
    let draft = ItemDraft::new(name, quantity).map_err(|e| e.to_string())?;
    list.add_item(draft.clone()).map_err(|e| e.to_string())?;
    Ok(draft)
}

/// Items in display order
pub fn list_items(list: &ShoppingList) -> Vec<ShoppingItem> {
    list.state().items
}

pub fn is_loading(list: &ShoppingList) -> bool {
    list.state().loading
}

/// Delete an item by id
pub fn remove_item(list: &ShoppingList, id: &str) -> Result<(), String> {
    let item = find_item(list, id)?;
    list.remove_item(item).map_err(|e| e.to_string())
}

/// Toggle selection; returns the optimistic copy as of the published state
pub fn toggle_item(list: &ShoppingList, id: &str) -> Result<ShoppingItem, String> {
    let item = find_item(list, id)?;
    let toggled = item.toggled();
    list.toggle_selection(item).map_err(|e| e.to_string())?;
    Ok(toggled)
}

/// Finish a horizontal drag. Only a drag past `threshold` recolors.
pub fn swipe_item(
    list: &ShoppingList,
    id: &str,
    offset: f32,
    threshold: f32,
) -> Result<Option<SwipeColor>, String> {
    let item = find_item(list, id)?;
    let Some(gesture) = SwipeGesture::from_offset(offset, threshold) else {
        return Ok(None);
    };

    let color = gesture.color();
    list.update_swipe_color(item, color.clone())
        .map_err(|e| e.to_string())?;
    Ok(Some(color))
}

/// Clear the error banner
pub fn dismiss_error(list: &ShoppingList) -> Result<(), String> {
    list.dismiss_error().map_err(|e| e.to_string())
}
