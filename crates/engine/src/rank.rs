use crate::aggregate::{Aggregation, SeriesKey};
use crate::spec::SortMode;
use std::collections::HashMap;

/// Marker appended to truncated labels
pub const ELLIPSIS: &str = "...";

/// Cut a label to `width` characters plus [`ELLIPSIS`]; shorter labels pass through
pub fn truncate_label(label: &str, width: usize) -> String {
    match label.char_indices().nth(width) {
        Some((cut, _)) => format!("{}{}", &label[..cut], ELLIPSIS),
        None => label.to_string(),
    }
}

/// Order `(key, total)` pairs by total descending; the sort is stable so
/// ties keep their input order.
pub fn order_by_total_desc<K>(mut items: Vec<(K, u64)>) -> Vec<K> {
    items.sort_by(|a, b| b.1.cmp(&a.1));
    items.into_iter().map(|(key, _)| key).collect()
}

/// Sorted keys of an aggregation
pub fn rank_keys(aggregation: &Aggregation, mode: SortMode) -> Vec<SeriesKey> {
    match mode {
        SortMode::TotalDesc => order_by_total_desc(aggregation.totals().to_vec()),
        SortMode::Alpha => {
            let mut keys: Vec<(String, SeriesKey)> = aggregation
                .keys()
                .map(|key| (key.display(), key.clone()))
                .collect();
            keys.sort();
            keys.into_iter().map(|(_, key)| key).collect()
        }
    }
}

/// Category order plus display labels for a bar chart axis
#[derive(Debug, Clone)]
pub struct RankedLabeling {
    /// Sorted keys, highest rank first
    order: Vec<SeriesKey>,
    labels: HashMap<SeriesKey, String>,
    truncated: HashMap<SeriesKey, String>,
}

impl RankedLabeling {
    pub fn new(aggregation: &Aggregation, mode: SortMode, label_width: usize) -> Self {
        let order = rank_keys(aggregation, mode);

        let mut labels = HashMap::with_capacity(order.len());
        let mut truncated = HashMap::with_capacity(order.len());
        for key in &order {
            let label = key.display();
            truncated.insert(key.clone(), truncate_label(&label, label_width));
            labels.insert(key.clone(), label);
        }

        let ranked = Self {
            order,
            labels,
            truncated,
        };
        if ranked.has_label_collisions() {
            log::debug!("Truncated labels collide; categories stay keyed by their full value");
        }
        ranked
    }

    /// Keys in rank order
    pub fn order(&self) -> &[SeriesKey] {
        &self.order
    }

    /// Keys in axis order: the reverse of rank order, so that the first
    /// ranked key is drawn at the top of a horizontal bar chart
    pub fn axis_order(&self) -> Vec<&SeriesKey> {
        self.order.iter().rev().collect()
    }

    /// Full, untruncated display string of a key
    pub fn label(&self, key: &SeriesKey) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn truncated_label(&self, key: &SeriesKey) -> Option<&str> {
        self.truncated.get(key).map(String::as_str)
    }

    /// Every key displayed under `label`, in rank order
    pub fn keys_for_label(&self, label: &str) -> Vec<&SeriesKey> {
        self.order
            .iter()
            .filter(|key| self.truncated_label(key) == Some(label))
            .collect()
    }

    pub fn has_label_collisions(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.order
            .iter()
            .filter_map(|key| self.truncated_label(key))
            .any(|label| !seen.insert(label))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
