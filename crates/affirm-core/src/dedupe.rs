//! Case-insensitive deduplication
//!
//! Items whose lines are equal after lowercasing collapse into one. The
//! survivor is the most popular variant; on a tie the first one seen wins.
//! The survivor keeps its original casing.

use std::collections::HashMap;

use crate::types::AffirmationItem;

/// Collapse duplicate lines, keeping the highest-popularity variant
///
/// Output order follows the first appearance of each unique line.
pub fn dedupe(items: Vec<AffirmationItem>) -> Vec<AffirmationItem> {
    let mut slots: HashMap<String, usize> = HashMap::with_capacity(items.len());
    let mut unique: Vec<AffirmationItem> = Vec::with_capacity(items.len());

    for item in items {
        let key = item.dedupe_key();
        match slots.get(&key) {
            Some(&slot) => {
                if item.popularity > unique[slot].popularity {
                    unique[slot] = item;
                }
            }
            None => {
                slots.insert(key, unique.len());
                unique.push(item);
            }
        }
    }

    unique
}
