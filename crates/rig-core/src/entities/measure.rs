use serde::{Deserialize, Serialize};

/// A numeric metric computed for one component.
///
/// `value == None` means the server reported no (or an ambiguous) measure,
/// which is distinct from a measure of zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasureRecord {
    pub component_key: String,
    pub metric_key: String,
    pub value: Option<i64>,
}
