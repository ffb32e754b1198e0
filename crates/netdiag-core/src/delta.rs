//! Interval deltas between consecutive snapshots.
//!
//! [`DeltaEngine`] keeps exactly one previous snapshot. Each call to
//! [`DeltaEngine::update`] walks the new snapshot, pairs every leaf with the
//! leaf at the same path in the previous one, and emits a flat
//! `path -> value` map. Branches that appear or disappear between ticks are
//! tolerated: they simply do not show up in the result.

use std::collections::BTreeMap;

use tracing::trace;

use crate::value::Value;

/// Flat mapping of dot-joined metric path to its interval value.
pub type Delta = BTreeMap<String, Value>;

/// Integer delta with reset correction.
///
/// A decrease means the counter restarted from a lower baseline, so the
/// whole current reading is the best estimate of the interval's increase.
pub fn counter_delta(curr: i64, prev: i64) -> i64 {
    match curr.checked_sub(prev) {
        Some(d) if d >= 0 => d,
        _ => curr,
    }
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

/// Stateful snapshot differ.
#[derive(Debug, Default)]
pub struct DeltaEngine {
    prev: Option<Value>,
}

impl DeltaEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a snapshot has been stored.
    pub fn is_active(&self) -> bool {
        self.prev.is_some()
    }

    /// The snapshot the next update will be measured against.
    pub fn previous(&self) -> Option<&Value> {
        self.prev.as_ref()
    }

    /// Forgets the stored snapshot. The next update returns an empty delta.
    pub fn reset(&mut self) {
        self.prev = None;
    }

    /// Diffs `snapshot` against the stored one and stores `snapshot`.
    ///
    /// The first call only primes the engine and returns an empty delta.
    pub fn update(&mut self, snapshot: Value) -> Delta {
        let mut out = Delta::new();
        if let Some(prev) = self.prev.as_ref() {
            diff("", prev, &snapshot, &mut out);
            trace!(entries = out.len(), "delta computed");
        }
        self.prev = Some(snapshot);
        out
    }
}

fn diff(path: &str, prev: &Value, curr: &Value, out: &mut Delta) {
    match (prev, curr) {
        (Value::Map(p), Value::Map(c)) => {
            for (key, c_child) in c {
                // Branch only in the current snapshot: nothing to compare with.
                let Some(p_child) = p.get(key) else {
                    continue;
                };
                diff(&join_path(path, key), p_child, c_child, out);
            }
        }
        (Value::Integer(p), Value::Integer(c)) => {
            out.insert(path.to_string(), Value::Integer(counter_delta(*c, *p)));
        }
        (Value::Float(p), Value::Float(c)) => {
            out.insert(path.to_string(), Value::Float(c - p));
        }
        _ => {
            if prev != curr {
                out.insert(path.to_string(), curr.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(json: &str) -> Value {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_first_update_is_empty() {
        let mut engine = DeltaEngine::new();
        assert!(!engine.is_active());
        let delta = engine.update(tree(r#"{"softnet": {"dropped": 10}}"#));
        assert!(delta.is_empty());
        assert!(engine.is_active());
    }

    #[test]
    fn test_integer_counter_increase() {
        let mut engine = DeltaEngine::new();
        engine.update(tree(r#"{"sys_net": {"statistics": {"rx_dropped": 100}}}"#));
        let delta = engine.update(tree(r#"{"sys_net": {"statistics": {"rx_dropped": 142}}}"#));
        assert_eq!(
            delta.get("sys_net.statistics.rx_dropped"),
            Some(&Value::Integer(42))
        );
    }

    #[test]
    fn test_integer_counter_reset_emits_current() {
        let mut engine = DeltaEngine::new();
        engine.update(tree(r#"{"c": 500}"#));
        let delta = engine.update(tree(r#"{"c": 3}"#));
        assert_eq!(delta.get("c"), Some(&Value::Integer(3)));
    }

    #[test]
    fn test_softnet_reset_scenario() {
        let mut engine = DeltaEngine::new();
        engine.update(tree(r#"{"softnet": {"dropped": 10}}"#));
        let delta = engine.update(tree(r#"{"softnet": {"dropped": 7}}"#));
        assert_eq!(delta.len(), 1);
        assert_eq!(delta.get("softnet.dropped"), Some(&Value::Integer(7)));
    }

    #[test]
    fn test_float_delta_may_be_negative() {
        let mut engine = DeltaEngine::new();
        engine.update(tree(r#"{"load": 10.5}"#));
        let delta = engine.update(tree(r#"{"load": 9.0}"#));
        assert_eq!(delta.get("load"), Some(&Value::Float(-1.5)));
    }

    #[test]
    fn test_unchanged_counter_emits_zero() {
        let mut engine = DeltaEngine::new();
        engine.update(tree(r#"{"c": 5}"#));
        let delta = engine.update(tree(r#"{"c": 5}"#));
        assert_eq!(delta.get("c"), Some(&Value::Integer(0)));
    }

    #[test]
    fn test_new_and_vanished_branches_are_skipped() {
        let mut engine = DeltaEngine::new();
        engine.update(tree(r#"{"a": 1, "gone": {"x": 1}}"#));
        let delta = engine.update(tree(r#"{"a": 2, "fresh": {"y": 9}, "b": 4}"#));
        assert_eq!(delta.len(), 1);
        assert_eq!(delta.get("a"), Some(&Value::Integer(1)));
        assert!(!delta.contains_key("fresh.y"));
        assert!(!delta.contains_key("b"));
    }

    #[test]
    fn test_type_mismatch_emits_raw_current_when_different() {
        let mut engine = DeltaEngine::new();
        engine.update(tree(r#"{"n": 4, "s": "up", "t": "up", "m": {"k": 1}}"#));
        let delta = engine.update(tree(r#"{"n": 4.5, "s": "down", "t": "up", "m": 3}"#));
        assert_eq!(delta.get("n"), Some(&Value::Float(4.5)));
        assert_eq!(delta.get("s"), Some(&Value::Text("down".into())));
        assert!(!delta.contains_key("t"));
        assert_eq!(delta.get("m"), Some(&Value::Integer(3)));
    }

    #[test]
    fn test_previous_is_replaced_every_tick() {
        let mut engine = DeltaEngine::new();
        engine.update(tree(r#"{"c": 10}"#));
        engine.update(tree(r#"{"c": 4}"#));
        let delta = engine.update(tree(r#"{"c": 6}"#));
        assert_eq!(delta.get("c"), Some(&Value::Integer(2)));
        assert_eq!(engine.previous(), Some(&tree(r#"{"c": 6}"#)));
    }

    #[test]
    fn test_reset_returns_to_uninitialized() {
        let mut engine = DeltaEngine::new();
        engine.update(tree(r#"{"c": 1}"#));
        engine.reset();
        assert!(engine.update(tree(r#"{"c": 2}"#)).is_empty());
    }

    #[test]
    fn test_counter_delta_handles_overflow() {
        assert_eq!(counter_delta(5, i64::MIN), 5);
        assert_eq!(counter_delta(i64::MAX, 0), i64::MAX);
    }
}
