//! The State Manager (§4.3) — owns the mutable `state` bag for one run and
//! resolves `"$.path"` template references in node config.
//!
//! Stateless across runs: every function here is a pure transform over the
//! state/inputs it is given, so a single `StateManager`-less module can be
//! shared freely by concurrent executions (§5).

use nodes::StateMap;
use serde_json::Value;

const TEMPLATE_PREFIX: &str = "$.";

/// Build the initial state for a run: `initialState` deep-cloned, then the
/// caller-supplied overrides layered on top (§4.3).
pub fn init_state(
    initial_state: &serde_json::Map<String, Value>,
    overrides: Option<&serde_json::Map<String, Value>>,
) -> StateMap {
    let mut state = initial_state.clone();
    if let Some(overrides) = overrides {
        for (k, v) in overrides {
            state.insert(k.clone(), v.clone());
        }
    }
    state
}

/// Resolve every `"$.path"` template string found (recursively) inside
/// `config`, against `state` first and `inputs` second. Non-template
/// values pass through unchanged. Always produces a fresh `Value` — this
/// is also how the engine satisfies "deep-clone config before passing to
/// a node" (§4.3).
pub fn resolve_config(config: &Value, state: &Value, inputs: &Value) -> Value {
    match config {
        Value::String(s) if s.starts_with(TEMPLATE_PREFIX) => {
            let path = &s[TEMPLATE_PREFIX.len()..];
            lookup_dotted(state, path)
                .or_else(|| lookup_dotted(inputs, path))
                .unwrap_or(Value::Null)
        }
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), resolve_config(v, state, inputs)))
                .collect(),
        ),
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| resolve_config(v, state, inputs)).collect())
        }
        other => other.clone(),
    }
}

/// Walk a dot-delimited path of plain object keys. Template resolution is
/// deliberately not an expression language (§9): no array indices, no
/// wildcards, nothing beyond nested-object field access.
fn lookup_dotted(root: &Value, path: &str) -> Option<Value> {
    let mut current = root;
    for part in path.split('.') {
        current = current.as_object()?.get(part)?;
    }
    Some(current.clone())
}

/// Strip engine-reserved (leading-underscore) keys before handing state
/// back to a caller (§4.3 "scope reserved keys").
pub fn public_state(state: &StateMap) -> StateMap {
    state
        .iter()
        .filter(|(k, _)| !k.starts_with('_'))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_against_state_before_inputs() {
        let state = json!({ "userName": "ada", "nested": { "theme": "dark" } });
        let inputs = json!({ "userName": "grace" });

        assert_eq!(
            resolve_config(&json!("$.userName"), &state, &inputs),
            json!("ada")
        );
        assert_eq!(
            resolve_config(&json!("$.nested.theme"), &state, &inputs),
            json!("dark")
        );
    }

    #[test]
    fn falls_back_to_inputs_when_absent_from_state() {
        let state = json!({});
        let inputs = json!({ "fromPrevious": 42 });
        assert_eq!(
            resolve_config(&json!("$.fromPrevious"), &state, &inputs),
            json!(42)
        );
    }

    #[test]
    fn missing_reference_resolves_to_null() {
        let state = json!({});
        let inputs = json!({});
        assert_eq!(resolve_config(&json!("$.nope"), &state, &inputs), Value::Null);
    }

    #[test]
    fn non_template_strings_pass_through() {
        let state = json!({});
        let inputs = json!({});
        assert_eq!(
            resolve_config(&json!("literal"), &state, &inputs),
            json!("literal")
        );
    }

    #[test]
    fn recurses_into_nested_config_objects_and_arrays() {
        let state = json!({ "x": 1, "y": 2 });
        let inputs = json!({});
        let config = json!({ "a": "$.x", "list": ["$.y", "literal"] });
        assert_eq!(
            resolve_config(&config, &state, &inputs),
            json!({ "a": 1, "list": [2, "literal"] })
        );
    }

    #[test]
    fn public_state_strips_reserved_keys() {
        let mut state = serde_json::Map::new();
        state.insert("visible".into(), json!(1));
        state.insert("_loop_n1".into(), json!(3));
        let public = public_state(&state);
        assert!(public.contains_key("visible"));
        assert!(!public.contains_key("_loop_n1"));
    }

    #[test]
    fn init_state_layers_overrides_over_initial() {
        let mut initial = serde_json::Map::new();
        initial.insert("a".into(), json!(1));
        initial.insert("b".into(), json!(2));
        let mut overrides = serde_json::Map::new();
        overrides.insert("b".into(), json!(99));

        let state = init_state(&initial, Some(&overrides));
        assert_eq!(state["a"], json!(1));
        assert_eq!(state["b"], json!(99));
    }
}
