//! Grouping helpers for blind spots and action items.
//!
//! Blind spots are ranked by how many share a reason, while action items keep
//! the fixed High/Medium/Low order. The two policies stay separate.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{ActionItem, BlindSpot, Criticality};

/// Group `items` by `key`, largest group first.
///
/// Groups of equal size keep the order in which their key first appeared.
pub fn group_by_size<T, K, F>(items: &[T], key: F) -> Vec<(K, Vec<T>)>
where
    T: Clone,
    K: PartialEq,
    F: Fn(&T) -> K,
{
    let mut groups: Vec<(K, Vec<T>)> = Vec::new();
    for item in items {
        let item_key = key(item);
        match groups.iter_mut().find(|(existing, _)| *existing == item_key) {
            Some((_, members)) => members.push(item.clone()),
            None => groups.push((item_key, vec![item.clone()])),
        }
    }
    // `sort_by` is stable, so ties keep first-occurrence order.
    groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
    groups
}

/// Blind spots sharing one reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlindSpotGroup {
    /// The shared reason text.
    pub reason: String,
    /// Blind spots with this reason, in input order.
    pub spots: Vec<BlindSpot>,
}

/// Group blind spots by exact reason text, most common reason first.
pub fn group_blind_spots(spots: &[BlindSpot]) -> Vec<BlindSpotGroup> {
    group_by_size(spots, |spot| spot.reason.clone())
        .into_iter()
        .map(|(reason, spots)| BlindSpotGroup { reason, spots })
        .collect()
}

/// Action items in the fixed High, Medium, Low order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionGroups {
    /// High criticality items.
    pub high: Vec<ActionItem>,
    /// Medium criticality items.
    pub medium: Vec<ActionItem>,
    /// Low criticality items.
    pub low: Vec<ActionItem>,
}

impl ActionGroups {
    /// Tiers paired with their items, always High, Medium, Low.
    pub fn tiers(&self) -> [(Criticality, &[ActionItem]); 3] {
        [
            (Criticality::High, self.high.as_slice()),
            (Criticality::Medium, self.medium.as_slice()),
            (Criticality::Low, self.low.as_slice()),
        ]
    }

    /// Number of grouped items.
    pub fn len(&self) -> usize {
        self.high.len() + self.medium.len() + self.low.len()
    }

    /// Whether no item was grouped.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split action items into the three criticality tiers.
///
/// Items with an unrecognized criticality are left out.
pub fn group_by_criticality(items: &[ActionItem]) -> ActionGroups {
    let mut groups = ActionGroups::default();
    for item in items {
        match item.criticality {
            Criticality::High => groups.high.push(item.clone()),
            Criticality::Medium => groups.medium.push(item.clone()),
            Criticality::Low => groups.low.push(item.clone()),
            Criticality::Unrecognized(_) => {}
        }
    }
    groups
}
