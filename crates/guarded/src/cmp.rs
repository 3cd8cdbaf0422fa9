// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Equality, ordering and hashing by wrapped value.
//!
//! Both sides are read inside one critical section spanning the two guards,
//! so a comparison never mixes a stale read of one side with a fresh read of
//! the other. Capacities play no part.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use crate::guarded::GuardedValue;

impl<V: PartialEq> PartialEq for GuardedValue<V> {
    fn eq(&self, other: &Self) -> bool {
        self.access_both(other, |a, b| a == b)
    }
}

impl<V: Eq> Eq for GuardedValue<V> {}

impl<V: PartialOrd> PartialOrd for GuardedValue<V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.access_both(other, |a, b| a.partial_cmp(b))
    }
}

impl<V: Ord> Ord for GuardedValue<V> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.access_both(other, |a, b| a.cmp(b))
    }
}

impl<V: Hash> Hash for GuardedValue<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.access(|value| value.hash(state));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::sync::Arc;
    use std::thread;

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn equal_values_ignore_capacity() {
        let a = GuardedValue::new("Oh Hai!");
        let b = GuardedValue::with_capacity("Oh Hai!", 4);
        assert_eq!(a, b);
        assert_ne!(a, GuardedValue::new("There"));
    }

    #[test]
    #[allow(clippy::eq_op)]
    fn self_comparison_does_not_deadlock() {
        let a = GuardedValue::new(1);
        assert!(a == a);
        assert_eq!(a.cmp(&a), Ordering::Equal);

        let nan = GuardedValue::new(f64::NAN);
        assert!(nan != nan);
    }

    #[test]
    fn ordering_follows_value() {
        let low = GuardedValue::new(1);
        let high = GuardedValue::with_capacity(2, 3);
        assert!(low < high);
        assert!(high > low);
        assert_eq!(low.partial_cmp(&high), Some(Ordering::Less));

        let mut guards = vec![
            GuardedValue::new(3),
            GuardedValue::new(1),
            GuardedValue::new(2),
        ];
        guards.sort();
        let sorted: Vec<i32> = guards.iter().map(GuardedValue::get).collect();
        assert_eq!(sorted, vec![1, 2, 3]);
    }

    #[test]
    fn hash_matches_value() {
        let g = GuardedValue::with_capacity(String::from("key"), 2);
        assert_eq!(hash_of(&g), hash_of(&String::from("key")));
    }

    #[test]
    fn crossed_comparisons_finish() {
        let a = Arc::new(GuardedValue::new(0));
        let b = Arc::new(GuardedValue::new(0));

        let forward = {
            let (a, b) = (a.clone(), b.clone());
            thread::spawn(move || (0..1000).filter(|_| *a == *b).count())
        };
        let backward = {
            let (a, b) = (a.clone(), b.clone());
            thread::spawn(move || (0..1000).filter(|_| *b == *a).count())
        };

        assert_eq!(forward.join().unwrap(), 1000);
        assert_eq!(backward.join().unwrap(), 1000);
    }
}
