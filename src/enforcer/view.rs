/*!
 * JSON View Builder
 * Filters an entity's JSON down to the fields a caller may see
 */

use super::{Enforcer, JsonObject};
use crate::model::{AuthorizationContext, Permissions, ResourceKey};
use serde_json::Value;
use tracing::trace;

/// Filter `fields` located at `key` for the given context and permissions
///
/// Unrestricted access returns `fields` unchanged. Otherwise each field is
/// kept when unrestricted at its child key, recursed into when it is an
/// object with partial access, and dropped in every other case. Objects that
/// end up empty after filtering are dropped as well.
pub fn build_json_view<E: Enforcer + ?Sized>(
    enforcer: &E,
    key: &ResourceKey,
    fields: &JsonObject,
    context: &AuthorizationContext,
    permissions: &Permissions,
) -> JsonObject {
    if enforcer.has_unrestricted_permissions(key, context, permissions) {
        return fields.clone();
    }
    if !enforcer.has_partial_permissions(key, context, permissions) {
        trace!(resource = %key, "no visible fields");
        return JsonObject::new();
    }
    filter_object(enforcer, key, fields, context, permissions)
}

fn filter_object<E: Enforcer + ?Sized>(
    enforcer: &E,
    key: &ResourceKey,
    fields: &JsonObject,
    context: &AuthorizationContext,
    permissions: &Permissions,
) -> JsonObject {
    let mut view = JsonObject::new();
    for (field, value) in fields {
        let child = key.child(field);
        if enforcer.has_unrestricted_permissions(&child, context, permissions) {
            view.insert(field.clone(), value.clone());
        } else if !enforcer.has_partial_permissions(&child, context, permissions) {
            trace!(resource = %child, "field dropped");
        } else if let Value::Object(nested) = value {
            let filtered = filter_object(enforcer, &child, nested, context, permissions);
            if !filtered.is_empty() {
                view.insert(field.clone(), Value::Object(filtered));
            }
        } else {
            trace!(resource = %child, "partially visible leaf dropped");
        }
    }
    view
}
