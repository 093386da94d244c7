use std::collections::BTreeSet;

use rig_core::entities::IssueRecord;

/// The issues the server reported for one target, in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueSet {
    issues: Vec<IssueRecord>,
}

impl IssueSet {
    #[must_use]
    pub const fn new(issues: Vec<IssueRecord>) -> Self {
        Self { issues }
    }

    #[must_use]
    pub fn rule_keys(&self) -> BTreeSet<String> {
        self.issues.iter().map(|i| i.rule_key.clone()).collect()
    }

    /// Every issue's rule key, sorted, duplicates kept.
    #[must_use]
    pub fn sorted_rule_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.issues.iter().map(|i| i.rule_key.clone()).collect();
        keys.sort();
        keys
    }

    #[must_use]
    pub fn contains_rule(&self, rule_key: &str) -> bool {
        self.issues.iter().any(|i| i.rule_key == rule_key)
    }

    #[must_use]
    pub fn on_component(&self, component_key: &str) -> Vec<&IssueRecord> {
        self.issues
            .iter()
            .filter(|i| i.component_key == component_key)
            .collect()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.issues.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IssueRecord> {
        self.issues.iter()
    }
}

impl From<Vec<IssueRecord>> for IssueSet {
    fn from(issues: Vec<IssueRecord>) -> Self {
        Self::new(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_count_but_collapse_in_key_set() {
        let set = IssueSet::new(vec![
            IssueRecord::new("vbnet:S112", "my.project:Module1.vb"),
            IssueRecord::new("vbnet:S112", "my.project:Module2.vb"),
            IssueRecord::new("vbnet:S3385", "my.project:Module1.vb"),
        ]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.rule_keys().len(), 2);
        assert_eq!(set.sorted_rule_keys(), vec!["vbnet:S112", "vbnet:S112", "vbnet:S3385"]);
        assert_eq!(set.on_component("my.project:Module1.vb").len(), 2);
        assert!(set.contains_rule("vbnet:S3385"));
    }
}
