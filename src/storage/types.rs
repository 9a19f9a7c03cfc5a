// Value types held by the store

use bytes::Bytes;
use indexmap::IndexSet;
use rand::Rng;

/// An unordered collection of unique members.
///
/// Backed by an `IndexSet` so membership stays O(1) while every member is
/// also reachable by position, which is what makes uniform random selection
/// and random removal O(1). Positions are an implementation detail: removal
/// swaps the last member into the hole, so no ordering is ever stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetValue {
    members: IndexSet<Bytes>,
}

impl SetValue {
    pub fn new() -> Self {
        Self {
            members: IndexSet::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            members: IndexSet::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, member: &[u8]) -> bool {
        self.members.contains(member)
    }

    /// Returns true if the member was not already present.
    pub fn insert(&mut self, member: Bytes) -> bool {
        self.members.insert(member)
    }

    /// Returns true if the member was present.
    pub fn remove(&mut self, member: &[u8]) -> bool {
        self.members.swap_remove(member)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bytes> {
        self.members.iter()
    }

    /// Keep only the members for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&Bytes) -> bool) {
        self.members.retain(|m| keep(m));
    }

    pub fn into_vec(self) -> Vec<Bytes> {
        self.members.into_iter().collect()
    }

    pub fn random_member<R: Rng>(&self, rng: &mut R) -> Option<&Bytes> {
        if self.members.is_empty() {
            return None;
        }
        self.members.get_index(rng.gen_range(0..self.members.len()))
    }

    /// Up to `count` distinct members, chosen uniformly. Returns every member
    /// when `count` reaches the cardinality.
    pub fn random_distinct<R: Rng>(&self, rng: &mut R, count: usize) -> Vec<Bytes> {
        if count >= self.members.len() {
            return self.members.iter().cloned().collect();
        }
        rand::seq::index::sample(rng, self.members.len(), count)
            .into_iter()
            .filter_map(|i| self.members.get_index(i).cloned())
            .collect()
    }

    /// Exactly `count` independent draws; members may repeat.
    pub fn random_with_repetition<R: Rng>(&self, rng: &mut R, count: usize) -> Vec<Bytes> {
        if self.members.is_empty() {
            return Vec::new();
        }
        (0..count)
            .filter_map(|_| self.random_member(rng).cloned())
            .collect()
    }

    pub fn pop_random<R: Rng>(&mut self, rng: &mut R) -> Option<Bytes> {
        if self.members.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.members.len());
        self.members.swap_remove_index(index)
    }

    /// Remove up to `count` distinct members chosen uniformly.
    pub fn pop_many<R: Rng>(&mut self, rng: &mut R, count: usize) -> Vec<Bytes> {
        if count >= self.members.len() {
            return self.members.drain(..).collect();
        }
        let mut popped = Vec::with_capacity(count);
        for _ in 0..count {
            match self.pop_random(rng) {
                Some(member) => popped.push(member),
                None => break,
            }
        }
        popped
    }
}

impl FromIterator<Bytes> for SetValue {
    fn from_iter<I: IntoIterator<Item = Bytes>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}

impl Extend<Bytes> for SetValue {
    fn extend<I: IntoIterator<Item = Bytes>>(&mut self, iter: I) {
        self.members.extend(iter);
    }
}

/// A value stored under a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Placed by an embedding server; set operations reject it.
    String(Bytes),
    Set(SetValue),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Set(_) => "set",
        }
    }

    pub fn as_set(&self) -> Option<&SetValue> {
        match self {
            Value::Set(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::{HashMap, HashSet};

    fn set_of(members: &[&'static str]) -> SetValue {
        members.iter().map(|m| Bytes::from(*m)).collect()
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut set = SetValue::new();
        assert!(set.insert(Bytes::from("a")));
        assert!(!set.insert(Bytes::from("a")));
        assert_eq!(set.len(), 1);
        assert!(set.contains(b"a"));
    }

    #[test]
    fn test_remove() {
        let mut set = set_of(&["a", "b", "c"]);
        assert!(set.remove(b"a"));
        assert!(!set.remove(b"a"));
        assert!(!set.contains(b"a"));
        assert!(set.contains(b"c"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_equality_ignores_order() {
        assert_eq!(set_of(&["a", "b", "c"]), set_of(&["c", "a", "b"]));
        assert_ne!(set_of(&["a", "b"]), set_of(&["a", "b", "c"]));
    }

    #[test]
    fn test_random_distinct_is_capped_and_unique() {
        let mut rng = StdRng::seed_from_u64(7);
        let set = set_of(&["a", "b", "c", "d", "e"]);

        let picked = set.random_distinct(&mut rng, 3);
        assert_eq!(picked.len(), 3);
        let unique: HashSet<_> = picked.iter().collect();
        assert_eq!(unique.len(), 3);
        assert!(picked.iter().all(|m| set.contains(m)));

        assert_eq!(set.random_distinct(&mut rng, 50).len(), 5);
        assert!(set.random_distinct(&mut rng, 0).is_empty());
    }

    #[test]
    fn test_random_with_repetition_returns_exact_count() {
        let mut rng = StdRng::seed_from_u64(11);
        let set = set_of(&["only"]);
        let picked = set.random_with_repetition(&mut rng, 4);
        assert_eq!(picked, vec![Bytes::from("only"); 4]);
        assert!(SetValue::new().random_with_repetition(&mut rng, 4).is_empty());
    }

    #[test]
    fn test_random_member_covers_all_members() {
        let mut rng = StdRng::seed_from_u64(3);
        let set = set_of(&["a", "b", "c"]);
        let seen: HashSet<_> = (0..200)
            .filter_map(|_| set.random_member(&mut rng).cloned())
            .collect();
        assert_eq!(seen.len(), 3);
        assert!(SetValue::new().random_member(&mut rng).is_none());
    }

    #[test]
    fn test_pop_many() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut set = set_of(&["a", "b", "c", "d"]);

        let popped = set.pop_many(&mut rng, 3);
        assert_eq!(popped.len(), 3);
        assert_eq!(set.len(), 1);
        assert!(popped.iter().all(|m| !set.contains(m)));

        let rest = set.pop_many(&mut rng, 10);
        assert_eq!(rest.len(), 1);
        assert!(set.is_empty());
        assert!(set.pop_random(&mut rng).is_none());
    }

    #[test]
    fn test_value_type_name() {
        assert_eq!(Value::String(Bytes::from("x")).type_name(), "string");
        assert_eq!(Value::Set(SetValue::new()).type_name(), "set");
        assert!(Value::String(Bytes::from("x")).as_set().is_none());
        assert_eq!(Value::Set(set_of(&["a"])).as_set().map(SetValue::len), Some(1));
    }

    fn assert_near(counts: &HashMap<Bytes, usize>, expected: usize) {
        let band = expected / 10;
        for (member, &seen) in counts {
            assert!(
                seen.abs_diff(expected) <= band,
                "member {:?} seen {} times, expected about {}",
                member,
                seen,
                expected
            );
        }
    }

    #[test]
    fn test_random_distinct_is_uniform() {
        let mut rng = StdRng::seed_from_u64(2024);
        let set = set_of(&["a", "b", "c", "d"]);
        let mut counts: HashMap<Bytes, usize> = HashMap::new();

        for _ in 0..8000 {
            for m in set.random_distinct(&mut rng, 1) {
                *counts.entry(m).or_default() += 1;
            }
        }
        assert_eq!(counts.len(), 4);
        assert_near(&counts, 2000);
    }

    #[test]
    fn test_pop_many_is_uniform() {
        let mut rng = StdRng::seed_from_u64(99);
        let template = set_of(&["a", "b", "c", "d"]);
        let mut counts: HashMap<Bytes, usize> = HashMap::new();

        // Two of four popped per trial: each member should come out half the time.
        for _ in 0..8000 {
            let mut set = template.clone();
            for m in set.pop_many(&mut rng, 2) {
                *counts.entry(m).or_default() += 1;
            }
        }
        assert_eq!(counts.len(), 4);
        assert_near(&counts, 4000);
    }

    #[test]
    fn test_pop_random_is_uniform() {
        let mut rng = StdRng::seed_from_u64(5);
        let template = set_of(&["a", "b", "c"]);
        let mut counts: HashMap<Bytes, usize> = HashMap::new();

        for _ in 0..6000 {
            let mut set = template.clone();
            if let Some(m) = set.pop_random(&mut rng) {
                *counts.entry(m).or_default() += 1;
            }
        }
        assert_eq!(counts.len(), 3);
        assert_near(&counts, 2000);
    }
}
