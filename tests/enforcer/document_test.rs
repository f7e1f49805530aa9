/*!
 * Document Tests
 * Enforcers built end to end from JSON policies and legacy ACLs
 */

use super::helpers::*;
use policy_enforcer::model::{permissions, ADMINISTRATE, READ, WRITE};
use policy_enforcer::{
    build_enforcer, AccessControlList, AuthorizationContext, Enforcer, EnforcerConfig,
    IndexStrategy, LegacyEnforcer, Policy, PolicyEnforcer, PolicyError, TrieIndex,
};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const DOCUMENT: &str = r#"{
    "policyId": "org.example:sensor-policy",
    "revision": 7,
    "entries": {
        "owner": {
            "subjects": {
                "test:owner": { "type": "user" }
            },
            "resources": {
                "thing:/": { "grant": ["READ", "WRITE"] },
                "policy:/": { "grant": ["READ", "WRITE"] }
            }
        },
        "observer": {
            "subjects": {
                "test:observer": { "type": "user" },
                "test:contractor": { "type": "user", "expiry": 1000 }
            },
            "resources": {
                "thing:/features": { "grant": ["READ"] },
                "thing:/features/firmware": { "revoke": ["READ"] }
            }
        }
    }
}"#;

#[test]
fn test_enforcer_from_document() {
    let policy = Policy::from_json(DOCUMENT).unwrap();
    for (strategy, enforcer) in enforcers(&policy) {
        let owner = ctx(&["owner"]);
        let observer = ctx(&["observer"]);

        assert!(
            enforcer.has_unrestricted_permissions(&thing("/"), &owner, &permissions([READ, WRITE])),
            "{strategy}"
        );
        assert!(!enforcer.has_unrestricted_permissions(&thing("/"), &owner, &permissions([ADMINISTRATE])));
        assert!(enforcer.has_partial_permissions(&thing("/"), &observer, &permissions([READ])));
        assert!(enforcer.has_unrestricted_permissions(
            &thing("/features/temperature"),
            &observer,
            &permissions([READ])
        ));
        assert!(!enforcer.has_partial_permissions(
            &thing("/features/firmware/version"),
            &observer,
            &permissions([READ])
        ));
    }
}

#[test]
fn test_expired_subjects_are_dropped_at_build() {
    let policy = Policy::from_json(DOCUMENT).unwrap();
    for (_, enforcer) in enforcers(&policy) {
        let contractor = ctx(&["contractor"]);
        assert!(!enforcer.has_partial_permissions(&thing("/"), &contractor, &permissions([READ])));

        let ids = enforcer.subject_ids_with_permission(&thing("/features"), &permissions([READ]));
        assert!(!ids.all().contains(&subject("contractor")));
        assert!(ids.granted.contains(&subject("observer")));
    }
}

#[test]
fn test_expired_subjects_kept_when_configured() {
    let policy = Policy::from_json(DOCUMENT).unwrap();
    let config = EnforcerConfig::default().keep_expired_subjects();
    let enforcer = build_enforcer(&policy, &config).unwrap();
    assert!(enforcer.has_unrestricted_permissions(
        &thing("/features/temperature"),
        &ctx(&["contractor"]),
        &permissions([READ])
    ));
}

#[test]
fn test_expiry_is_relative_to_build_instant() {
    let expiry = UNIX_EPOCH + Duration::from_secs(2_000);
    let policy = Policy::new("test:p", 1).with_entry(
        entry("temp", "T")
            .with_subject(policy_enforcer::Subject::new(subject("U"), "user").with_expiry(expiry))
            .grant("thing:/", [READ])
            .unwrap(),
    );
    let config = EnforcerConfig::default();

    let before = PolicyEnforcer::<TrieIndex>::build_at(&policy, &config, expiry - Duration::from_secs(1)).unwrap();
    assert!(before.has_unrestricted_permissions(&thing("/"), &ctx(&["U"]), &permissions([READ])));

    let after = PolicyEnforcer::<TrieIndex>::build_at(&policy, &config, SystemTime::now()).unwrap();
    assert!(!after.has_unrestricted_permissions(&thing("/"), &ctx(&["U"]), &permissions([READ])));
    assert!(after.has_unrestricted_permissions(&thing("/"), &ctx(&["T"]), &permissions([READ])));
    assert_eq!(after.cache_key().revision, 1);
}

#[test]
fn test_policy_resources_are_typed() {
    let policy = Policy::from_json(DOCUMENT).unwrap();
    for (_, enforcer) in enforcers(&policy) {
        let policy_root = policy_enforcer::ResourceKey::root("policy").unwrap();
        assert!(enforcer.has_unrestricted_permissions(&policy_root, &ctx(&["owner"]), &permissions([WRITE])));
        assert!(!enforcer.has_partial_permissions(&policy_root, &ctx(&["observer"]), &permissions([READ])));
    }
}

#[test]
fn test_config_rejects_unknown_types_and_permissions() {
    let policy = Policy::from_json(DOCUMENT).unwrap();

    let only_things = EnforcerConfig::default().with_resource_types(["thing"]);
    assert!(matches!(
        build_enforcer(&policy, &only_things).err(),
        Some(PolicyError::UnknownResourceType(t)) if t.as_str() == "policy"
    ));

    let read_only = EnforcerConfig::default().with_permissions([READ]);
    assert!(matches!(
        build_enforcer(&policy, &read_only).err(),
        Some(PolicyError::UnknownPermission(p)) if p.as_str() == "WRITE"
    ));

    let strict = EnforcerConfig::default()
        .with_strategy(IndexStrategy::Tree)
        .with_permissions([READ, WRITE]);
    assert!(build_enforcer(&policy, &strict).is_ok());
}

#[test]
fn test_legacy_acl_end_to_end() {
    let acl = AccessControlList::from_json(
        r#"{
            "test:owner": { "READ": true, "WRITE": true },
            "test:observer": { "READ": true, "WRITE": false }
        }"#,
    )
    .unwrap();
    let enforcer = LegacyEnforcer::build(acl, &EnforcerConfig::default()).unwrap();
    let key = thing("/features/firmware");

    assert!(enforcer.has_unrestricted_permissions(&key, &ctx(&["observer"]), &permissions([READ])));
    assert!(!enforcer.has_partial_permissions(&key, &ctx(&["observer"]), &permissions([WRITE])));
    assert!(enforcer.has_unrestricted_permissions(
        &key,
        &AuthorizationContext::new(["test:observer", "test:owner"]),
        &permissions([READ, WRITE])
    ));

    let ids = enforcer.subject_ids_with_permission(&key, &permissions([WRITE]));
    assert_eq!(ids.granted, [subject("owner")].into_iter().collect());
    assert_eq!(ids.revoked, [subject("observer")].into_iter().collect());
}

#[test]
fn test_legacy_acl_rejects_malformed_json() {
    assert!(matches!(
        AccessControlList::from_json(r#"{ "test:owner": ["READ"] }"#),
        Err(PolicyError::MalformedDocument(_))
    ));
}
