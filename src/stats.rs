use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Per-class item counts of one store, ordered by class label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub what: String,
    pub per_class: BTreeMap<String, usize>,
}

impl Statistics {
    pub fn new(what: impl Into<String>) -> Statistics {
        Statistics {
            what: what.into(),
            per_class: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, class: impl Into<String>, count: usize) {
        self.per_class.insert(class.into(), count);
    }

    /// Count for `class`, zero when the class is unknown.
    pub fn get(&self, class: &str) -> usize {
        self.per_class.get(class).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.per_class.values().sum()
    }

    /// Classes whose count differs from `other`, with both counts.
    pub fn differences<'a>(&'a self, other: &'a Statistics) -> Vec<(&'a str, usize, usize)> {
        let mut classes: Vec<&str> = self
            .per_class
            .keys()
            .chain(other.per_class.keys())
            .map(String::as_str)
            .collect();
        classes.sort_unstable();
        classes.dedup();
        classes
            .into_iter()
            .filter_map(|c| {
                let (a, b) = (self.get(c), other.get(c));
                (a != b).then_some((c, a, b))
            })
            .collect()
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} per pose class:", self.what)?;
        for (class, count) in &self.per_class {
            writeln!(f, "  {}: {}", class, count)?;
        }
        write!(f, "  total: {}", self.total())
    }
}
