/*!
 * Differential Tests
 * Trie and tree strategies must agree on every query over random policies
 */

use super::helpers::*;
use policy_enforcer::model::{permissions, EffectedPermissions, Permission, ADMINISTRATE, READ, WRITE};
use policy_enforcer::{
    AuthorizationContext, Permissions, PermissionResolver, Policy, PolicyEntry, ResourceKey,
    Subject,
};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SEGMENTS: &[&str] = &["a", "b", "c"];
const PERMISSIONS: &[&str] = &[READ, WRITE, ADMINISTRATE];
const SUBJECTS: &[&str] = &["s0", "s1", "s2", "s3"];
const TYPES: &[&str] = &["thing", "policy"];

/// Every path over `SEGMENTS` up to `depth` segments, root included
fn all_paths(depth: usize) -> Vec<String> {
    let mut paths = vec!["/".to_string()];
    let mut frontier = vec![String::new()];
    for _ in 0..depth {
        let mut next = Vec::new();
        for prefix in &frontier {
            for segment in SEGMENTS {
                let path = format!("{}/{}", prefix, segment);
                paths.push(path.clone());
                next.push(path);
            }
        }
        frontier = next;
    }
    paths
}

/// Compare every resolver operation of both strategies over all small paths
fn assert_equivalent(policy: &Policy) {
    let resolvers = resolvers(policy);
    let (trie, tree): (&dyn PermissionResolver, &dyn PermissionResolver) =
        (resolvers[0].as_ref(), resolvers[1].as_ref());

    for resource_type in TYPES {
        for path in all_paths(4) {
            let key = ResourceKey::new(resource_type, &path).unwrap();
            for name in SUBJECTS {
                let s = subject(name);
                for permission in PERMISSIONS {
                    let p = Permission::from(*permission);
                    assert_eq!(trie.resolve(&s, &key, &p), tree.resolve(&s, &key, &p), "resolve {key} {s} {p}");
                    assert_eq!(
                        trie.is_unrestricted(&s, &key, &p),
                        tree.is_unrestricted(&s, &key, &p),
                        "unrestricted {key} {s} {p}"
                    );
                    assert_eq!(
                        trie.is_partially_granted(&s, &key, &p),
                        tree.is_partially_granted(&s, &key, &p),
                        "partial {key} {s} {p}"
                    );
                }
            }
        }
        assert_eq!(
            trie.declared_subjects(resource_type),
            tree.declared_subjects(resource_type)
        );
    }
}

fn arb_path() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(SEGMENTS), 0..=4)
        .prop_map(|segments| format!("/{}", segments.join("/")))
}

fn arb_permissions() -> impl Strategy<Value = Permissions> {
    prop::collection::vec(prop::sample::select(PERMISSIONS), 0..=3).prop_map(|names| permissions(names))
}

fn arb_resource() -> impl Strategy<Value = (ResourceKey, EffectedPermissions)> {
    (prop::sample::select(TYPES), arb_path(), arb_permissions(), arb_permissions()).prop_map(
        |(resource_type, path, grant, revoke)| {
            (
                ResourceKey::new(resource_type, &path).unwrap(),
                EffectedPermissions::new(grant, revoke),
            )
        },
    )
}

fn arb_policy() -> impl Strategy<Value = Policy> {
    let arb_entry = (
        prop::collection::vec(prop::sample::select(SUBJECTS), 1..=2),
        prop::collection::vec(arb_resource(), 1..6),
    );
    prop::collection::vec(arb_entry, 1..12).prop_map(|entries| {
        entries
            .into_iter()
            .enumerate()
            .fold(Policy::new("test:random", 1), |policy, (i, (subjects, resources))| {
                let mut entry = PolicyEntry::new(format!("entry-{}", i).as_str());
                for name in subjects {
                    entry = entry.with_subject(Subject::new(subject(name), "user"));
                }
                for (key, effected) in resources {
                    entry = entry.with_resource(key, effected);
                }
                policy.with_entry(entry)
            })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_strategies_agree(policy in arb_policy()) {
        assert_equivalent(&policy);
    }

    #[test]
    fn test_effected_subject_ids_partition(policy in arb_policy(), path in arb_path(), perms in arb_permissions()) {
        for (_, enforcer) in enforcers(&policy) {
            let key = thing(&path);
            let ids = enforcer.subject_ids_with_permission(&key, &perms);
            prop_assert!(ids.granted.is_disjoint(&ids.revoked));

            let declared: Vec<_> = policy
                .entries()
                .filter(|e| e.resources().any(|r| r.key.resource_type() == "thing"))
                .flat_map(|e| e.subject_ids().cloned().collect::<Vec<_>>())
                .collect::<std::collections::BTreeSet<_>>()
                .into_iter()
                .collect();
            prop_assert_eq!(ids.all().into_iter().collect::<Vec<_>>(), declared);
        }
    }

    #[test]
    fn test_unrestricted_implies_partial(policy in arb_policy(), path in arb_path()) {
        for resolver in resolvers(&policy) {
            let key = thing(&path);
            for name in SUBJECTS {
                for permission in PERMISSIONS {
                    let p = Permission::from(*permission);
                    if resolver.is_unrestricted(&subject(name), &key, &p) {
                        prop_assert!(resolver.is_partially_granted(&subject(name), &key, &p));
                    }
                }
            }
        }
    }
}

#[test]
fn test_large_random_policy_equivalence() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut policy = Policy::new("test:large", 1);
    for i in 0..400 {
        let mut entry = PolicyEntry::new(format!("entry-{}", i).as_str())
            .with_subject(Subject::new(subject(SUBJECTS[rng.gen_range(0..SUBJECTS.len())]), "user"));
        for _ in 0..rng.gen_range(1..5) {
            let depth = rng.gen_range(0..=4);
            let path: String = (0..depth)
                .map(|_| format!("/{}", SEGMENTS[rng.gen_range(0..SEGMENTS.len())]))
                .collect();
            let permission = PERMISSIONS[rng.gen_range(0..PERMISSIONS.len())];
            let effected = if rng.gen_bool(0.3) {
                EffectedPermissions::revoking([permission])
            } else {
                EffectedPermissions::granting([permission])
            };
            entry = entry.with_resource(ResourceKey::new("thing", &path).unwrap(), effected);
        }
        policy = policy.with_entry(entry);
    }

    assert_equivalent(&policy);

    let enforcers = enforcers(&policy);
    let ctx = AuthorizationContext::new(SUBJECTS.iter().take(2).map(|n| subject(n)));
    for path in all_paths(3) {
        let key = thing(&path);
        let perms = permissions([READ, WRITE]);
        let trie = &enforcers[0].1;
        let tree = &enforcers[1].1;
        assert_eq!(
            trie.has_unrestricted_permissions(&key, &ctx, &perms),
            tree.has_unrestricted_permissions(&key, &ctx, &perms)
        );
        assert_eq!(
            trie.subject_ids_with_permission(&key, &perms),
            tree.subject_ids_with_permission(&key, &perms)
        );
        assert_eq!(
            trie.subject_ids_with_partial_permission(&key, &perms),
            tree.subject_ids_with_partial_permission(&key, &perms)
        );
    }
}
