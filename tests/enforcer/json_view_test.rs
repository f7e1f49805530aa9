/*!
 * JSON View Tests
 * Field filtering over both index strategies
 */

use super::helpers::*;
use policy_enforcer::model::{permissions, READ, WRITE};
use policy_enforcer::{JsonObject, Permissions, Policy, PolicyEntry, ResourceKey};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Value};

fn entity() -> JsonObject {
    json!({
        "thingId": "org.example:sensor",
        "attributes": {
            "location": "hall",
            "owner": { "name": "ops", "phone": "555-0100" }
        },
        "features": {
            "temperature": { "properties": { "value": 21.5, "unit": "C" } },
            "battery": { "properties": { "level": 80 } }
        }
    })
    .as_object()
    .cloned()
    .unwrap()
}

fn root() -> ResourceKey {
    thing("/")
}

#[test]
fn test_unrestricted_view_returns_everything() {
    let policy = Policy::new("test:p", 1).with_entry(entry("all", "A").grant("thing:/", [READ]).unwrap());
    for (strategy, enforcer) in enforcers(&policy) {
        let view = enforcer.build_json_view(&root(), &entity(), &ctx(&["A"]), &permissions([READ]));
        assert_eq!(view, entity(), "{strategy}");
    }
}

#[test]
fn test_partial_view_keeps_only_visible_fields() {
    let policy = Policy::new("test:p", 1).with_entry(
        entry("viewer", "V")
            .grant("thing:/attributes", [READ])
            .unwrap()
            .revoke("thing:/attributes/owner/phone", [READ])
            .unwrap()
            .grant("thing:/features/temperature/properties/value", [READ])
            .unwrap(),
    );
    let expected = json!({
        "attributes": {
            "location": "hall",
            "owner": { "name": "ops" }
        },
        "features": {
            "temperature": { "properties": { "value": 21.5 } }
        }
    });
    for (strategy, enforcer) in enforcers(&policy) {
        let view = enforcer.build_json_view(&root(), &entity(), &ctx(&["V"]), &permissions([READ]));
        assert_eq!(Value::Object(view), expected, "{strategy}");
    }
}

#[test]
fn test_view_at_nested_key() {
    let policy = Policy::new("test:p", 1).with_entry(
        entry("viewer", "V")
            .grant("thing:/attributes/owner/name", [READ])
            .unwrap(),
    );
    let owner = json!({ "name": "ops", "phone": "555-0100" }).as_object().cloned().unwrap();
    for (_, enforcer) in enforcers(&policy) {
        let view = enforcer.build_json_view(
            &thing("/attributes/owner"),
            &owner,
            &ctx(&["V"]),
            &permissions([READ]),
        );
        assert_eq!(Value::Object(view), json!({ "name": "ops" }));
    }
}

#[test]
fn test_view_requires_every_permission() {
    let policy = Policy::new("test:p", 1).with_entry(
        entry("viewer", "V")
            .grant("thing:/attributes", [READ, WRITE])
            .unwrap()
            .grant("thing:/features", [READ])
            .unwrap(),
    );
    for (_, enforcer) in enforcers(&policy) {
        let view = enforcer.build_json_view(&root(), &entity(), &ctx(&["V"]), &permissions([READ, WRITE]));
        assert_eq!(Value::Object(view), json!({ "attributes": entity()["attributes"].clone() }));
    }
}

#[test]
fn test_view_for_unknown_subject_is_empty() {
    let policy = Policy::new("test:p", 1).with_entry(entry("all", "A").grant("thing:/", [READ]).unwrap());
    for (_, enforcer) in enforcers(&policy) {
        let view = enforcer.build_json_view(&root(), &entity(), &ctx(&["nobody"]), &permissions([READ]));
        assert!(view.is_empty());
        let view = enforcer.build_json_view(&root(), &entity(), &ctx(&["A"]), &Permissions::new());
        assert!(view.is_empty());
    }
}

#[test]
fn test_partially_visible_leaf_is_dropped() {
    // A grant below a scalar can never reveal the scalar itself
    let policy = Policy::new("test:p", 1)
        .with_entry(entry("viewer", "V").grant("thing:/thingId/deeper", [READ]).unwrap());
    for (_, enforcer) in enforcers(&policy) {
        let view = enforcer.build_json_view(&root(), &entity(), &ctx(&["V"]), &permissions([READ]));
        assert!(view.is_empty());
    }
}

const VIEW_SUBJECTS: &[&str] = &["A", "B"];

const VIEW_PATHS: &[&str] = &[
    "/",
    "/thingId",
    "/attributes",
    "/attributes/owner",
    "/attributes/owner/phone",
    "/features",
    "/features/temperature/properties/value",
    "/features/battery",
];

fn arb_view_policy() -> impl Strategy<Value = Policy> {
    prop::collection::vec(
        (
            prop::sample::select(VIEW_PATHS),
            prop::sample::select(VIEW_SUBJECTS),
            any::<bool>(),
        ),
        1..8,
    )
    .prop_map(|rules| {
        rules
            .into_iter()
            .enumerate()
            .fold(Policy::new("test:view", 1), |policy, (i, (path, name, grant))| {
                let key = format!("thing:{}", path);
                let e: PolicyEntry = entry(&format!("rule-{}", i), name);
                let e = if grant {
                    e.grant(&key, [READ]).unwrap()
                } else {
                    e.revoke(&key, [READ]).unwrap()
                };
                policy.with_entry(e)
            })
    })
}

/// Every value in `view` appears at the same place in `source`
fn is_sub_object(view: &JsonObject, source: &JsonObject) -> bool {
    view.iter().all(|(field, value)| match (value, source.get(field)) {
        (Value::Object(inner), Some(Value::Object(original))) => is_sub_object(inner, original),
        (value, Some(original)) => value == original,
        (_, None) => false,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_view_is_idempotent_and_agrees(policy in arb_view_policy()) {
        let context = ctx(&["A"]);
        let perms = permissions([READ]);
        let views: Vec<JsonObject> = enforcers(&policy)
            .into_iter()
            .map(|(_, enforcer)| {
                let view = enforcer.build_json_view(&root(), &entity(), &context, &perms);
                let again = enforcer.build_json_view(&root(), &view, &context, &perms);
                assert_eq!(&again, &view);
                view
            })
            .collect();

        prop_assert_eq!(&views[0], &views[1]);
        prop_assert!(is_sub_object(&views[0], &entity()));
    }
}
