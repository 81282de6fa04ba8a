//! Commands Layer
//!
//! Intent handlers that bridge the UI surface to the list state holder.

mod item_cmd;

pub use item_cmd::*;
