//! Named counters for tracking bridge events

use std::collections::HashMap;

#[derive(Debug)]
pub struct Counter {
    counters: HashMap<String, usize>,
}

impl Counter {
    pub fn new() -> Self {
        Self {
            counters: HashMap::new(),
        }
    }

    pub fn increment(&mut self, name: &str, value: usize) {
        *self.counters.entry(name.to_string()).or_insert(0) += value;
    }

    pub fn get(&self, name: &str) -> usize {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &usize)> {
        self.counters.iter()
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_accumulates_per_name() {
        let mut counter = Counter::new();
        counter.increment("finalize", 1);
        counter.increment("finalize", 2);
        counter.increment("wrap.function", 1);

        assert_eq!(counter.get("finalize"), 3);
        assert_eq!(counter.get("wrap.function"), 1);
        assert_eq!(counter.get("missing"), 0);

        let mut names: Vec<_> = counter.iter().map(|(name, _)| name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, ["finalize", "wrap.function"]);
    }
}
