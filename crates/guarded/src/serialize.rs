// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Serde support: a guard serializes as the value it holds.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::guarded::GuardedValue;

impl<V: Serialize> Serialize for GuardedValue<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.access(|value| value.serialize(serializer))
    }
}

/// Deserialized guards use the default capacity of 1.
impl<'de, V: Deserialize<'de>> Deserialize<'de> for GuardedValue<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        V::deserialize(deserializer).map(GuardedValue::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Settings {
        name: String,
        retries: u32,
    }

    #[test]
    fn serializes_transparently() {
        let g = GuardedValue::with_capacity(vec![1, 2, 3], 2);
        assert_eq!(serde_json::to_string(&g).unwrap(), "[1,2,3]");
    }

    #[test]
    fn deserializes_with_default_capacity() {
        let g: GuardedValue<Settings> =
            serde_json::from_str(r#"{"name":"db","retries":3}"#).unwrap();
        assert_eq!(g.capacity(), 1);
        assert_eq!(
            g.get(),
            Settings {
                name: "db".into(),
                retries: 3,
            }
        );
    }

    #[test]
    fn guard_as_struct_field() {
        #[derive(Serialize, Deserialize)]
        struct Holder {
            counter: GuardedValue<u64>,
        }

        let holder = Holder {
            counter: GuardedValue::new(41),
        };
        holder.counter.mutate(|n| n + 1);

        let json = serde_json::to_string(&holder).unwrap();
        assert_eq!(json, r#"{"counter":42}"#);

        let back: Holder = serde_json::from_str(&json).unwrap();
        assert_eq!(back.counter.get(), 42);
    }
}
