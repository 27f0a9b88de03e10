use serde_json::Value;

use super::{
    json_utils::{array_member, f32_member, node_name, string_member, usize_member, vec3_array},
    types::{Collider, ColliderGroup, ColliderGroupEntry, SpringBone, SpringChain},
};
use crate::scene::LegacyMetadata;

// ─── Revised schema ───────────────────────────────────────────────────────────

/// Build one collider entry per `VRMC_springBone.colliders` element.
///
/// A shape declaring both `sphere` and `capsule` yields the capsule.
pub(super) fn build_revised_colliders(json: &Value) -> Vec<ColliderGroupEntry> {
    json.pointer("/extensions/VRMC_springBone/colliders")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
        .iter()
        .map(|collider| {
            let bone = usize_member(collider, "node");
            let bone_name = bone
                .and_then(|node| node_name(json, node))
                .unwrap_or_default()
                .to_string();

            let shape = collider.get("shape");
            let mut resolved = None;

            if let Some(sphere) = shape.and_then(|shape| shape.get("sphere")) {
                resolved = Some(Collider::sphere(
                    vec3_array(sphere.get("offset")),
                    f32_member(sphere, "radius", 0.0),
                ));
            }

            if let Some(capsule) = shape.and_then(|shape| shape.get("capsule")) {
                resolved = Some(Collider::capsule(
                    vec3_array(capsule.get("offset")),
                    f32_member(capsule, "radius", 0.0),
                    vec3_array(capsule.get("tail")),
                ));
            }

            if resolved.is_none() {
                log::debug!("collider on node {bone:?} declares no supported shape");
            }

            ColliderGroupEntry {
                bone,
                bone_name,
                colliders: resolved.into_iter().collect(),
            }
        })
        .collect()
}

/// Build the named collider groups from `VRMC_springBone.colliderGroups`.
pub(super) fn build_revised_collider_groups(json: &Value) -> Vec<ColliderGroup> {
    let collider_count = json
        .pointer("/extensions/VRMC_springBone/colliders")
        .and_then(Value::as_array)
        .map(Vec::len)
        .unwrap_or(0);

    json.pointer("/extensions/VRMC_springBone/colliderGroups")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
        .iter()
        .map(|group| {
            let colliders: Vec<usize> = array_member(group, "colliders")
                .iter()
                .filter_map(|index| index.as_u64().map(|index| index as usize))
                .collect();

            if colliders.iter().any(|index| *index >= collider_count) {
                log::warn!(
                    "collider group {:?} refers to colliders outside the collider list",
                    group.get("name")
                );
            }

            ColliderGroup {
                name: string_member(group, "name"),
                colliders,
            }
        })
        .collect()
}

// ─── Legacy schema ────────────────────────────────────────────────────────────

/// Copy the importer's spring entries into spring chains.
pub(super) fn build_legacy_springs(meta: &LegacyMetadata) -> Vec<SpringChain> {
    meta.springs
        .iter()
        .map(|spring| {
            if spring.bones.len() != spring.bone_names.len() {
                log::warn!(
                    "spring bone list mismatch: {} indices, {} names",
                    spring.bones.len(),
                    spring.bone_names.len()
                );
            }

            SpringChain {
                stiffness: spring.stiffness,
                gravity_power: spring.gravity_power,
                gravity_dir: spring.gravity_dir,
                drag_force: spring.drag_force,
                hit_radius: spring.hit_radius,
                bones: spring
                    .bones
                    .iter()
                    .enumerate()
                    .map(|(slot, node)| SpringBone {
                        node: *node,
                        name: spring.bone_names.get(slot).cloned().unwrap_or_default(),
                    })
                    .collect(),
                collider_groups: spring.collider_groups.clone(),
            }
        })
        .collect()
}

/// Copy the importer's collider groups; legacy colliders are always spheres.
pub(super) fn build_legacy_colliders(meta: &LegacyMetadata) -> Vec<ColliderGroupEntry> {
    meta.collider_groups
        .iter()
        .map(|group| ColliderGroupEntry {
            bone: Some(group.node),
            bone_name: group.node_name.clone(),
            colliders: group
                .colliders
                .iter()
                .map(|collider| Collider::sphere(collider.offset, collider.radius))
                .collect(),
        })
        .collect()
}
