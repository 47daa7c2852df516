use crate::types::Cell;
use std::collections::HashMap;

/// Result of deduplicating a header row.
#[derive(Debug, Clone)]
pub struct NormalizedSchema {
    /// Unique labels, same length and order as the input.
    pub labels: Vec<String>,
    /// `(position, original, renamed)` for every label that had to change.
    /// Non-empty means the caller should surface a warning; never fatal.
    pub renames: Vec<(usize, String, String)>,
}

/// Turn a raw header row into a unique label set.
///
/// Labels are stringified first (numeric headers are common in exports), then
/// the i-th duplicate occurrence of `L` becomes `L.i`, first occurrence
/// unchanged. Already-unique input passes through untouched.
pub fn normalize_labels(raw: &[Cell]) -> NormalizedSchema {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut labels = Vec::with_capacity(raw.len());
    let mut renames = Vec::new();

    for (pos, cell) in raw.iter().enumerate() {
        let original = cell.as_text();
        let count = seen.entry(original.clone()).or_insert(0);
        let label = if *count == 0 {
            original.clone()
        } else {
            let renamed = format!("{}.{}", original, count);
            renames.push((pos, original.clone(), renamed.clone()));
            renamed
        };
        *count += 1;
        labels.push(label);
    }

    NormalizedSchema { labels, renames }
}
