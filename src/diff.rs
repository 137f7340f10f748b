//! Add/remove sets for resources whose rules can only be changed
//! incrementally on the platform side.

use serde_json::{Map, Value};

pub type Rule = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleDiff {
    pub added: Vec<Rule>,
    pub deleted: Vec<Rule>,
    /// `(old, new)` pairs whose keys matched.
    pub unchanged: Vec<(Rule, Rule)>,
}

impl RuleDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty()
    }
}

/// Partitions `old` and `new` by the value of the `key` field.
///
/// Each new rule pairs with the first still-unpaired old rule carrying an
/// equal key. With duplicate keys inside one list the pairing follows list
/// order, which can pair rules that differ in their other fields.
pub fn diff_by_arg(old: &[Rule], new: &[Rule], key: &str) -> RuleDiff {
    let mut paired = vec![false; old.len()];
    let mut diff = RuleDiff::default();

    for new_rule in new {
        let wanted = new_rule.get(key);
        let matched = old
            .iter()
            .enumerate()
            .find(|(i, old_rule)| !paired[*i] && old_rule.get(key) == wanted)
            .map(|(i, _)| i);

        match matched {
            Some(i) => {
                paired[i] = true;
                diff.unchanged.push((old[i].clone(), new_rule.clone()));
            }
            None => diff.added.push(new_rule.clone()),
        }
    }

    diff.deleted = old
        .iter()
        .zip(&paired)
        .filter(|(_, paired)| !**paired)
        .map(|(rule, _)| rule.clone())
        .collect();

    diff
}
