//! Result selection for phase 6

use serde_json::Value;

use crate::expr::{resolve_index, slice_positions};

use super::planner::ItemSelector;

/// Shapes the projected rows into the node's result.
///
/// An out-of-range index yields `null`; slices clamp and never fail.
pub fn select(rows: Vec<Value>, item: Option<ItemSelector>) -> Value {
    match item {
        None => Value::Array(rows),
        Some(ItemSelector::Index(index)) => match resolve_index(rows.len(), index) {
            Some(position) => rows.into_iter().nth(position).unwrap_or(Value::Null),
            None => Value::Null,
        },
        Some(ItemSelector::Slice { start, stop, step }) => {
            let Some(positions) = slice_positions(rows.len(), start, stop, step) else {
                return Value::Null;
            };
            let mut slots: Vec<Option<Value>> = rows.into_iter().map(Some).collect();
            Value::Array(
                positions
                    .into_iter()
                    .filter_map(|position| slots[position].take())
                    .collect(),
            )
        }
    }
}
