use serde_json::Value;

use super::{
    json_utils::{array_member, node_name},
    schema::SchemaVersion,
    types::{HumanoidBoneTable, is_canonical_bone},
};
use crate::scene::LegacyMetadata;

/// Map revised-schema humanoid bones to the declared names of their nodes.
///
/// A node index outside `[0, nodeCount)` binds the bone to an empty name.
pub(super) fn map_revised_bones(json: &Value) -> HumanoidBoneTable {
    let mut table = HumanoidBoneTable::new();

    let Some(human_bones) = json
        .pointer("/extensions/VRMC_vrm/humanoid/humanBones")
        .and_then(Value::as_object)
    else {
        return table;
    };

    let node_count = array_member(json, "nodes").len();

    for (bone, entry) in human_bones {
        if !is_canonical_bone(SchemaVersion::Revised, bone) {
            log::warn!("ignoring unknown humanoid bone: {bone}");
            continue;
        }

        let node_index = entry
            .get("node")
            .and_then(Value::as_i64)
            .filter(|index| *index >= 0 && (*index as usize) < node_count);

        let mapped = match node_index {
            Some(index) => node_name(json, index as usize).unwrap_or_default(),
            None => {
                log::debug!("humanoid bone {bone} refers to a node outside the node list");
                ""
            }
        };

        table.insert(bone.clone(), mapped.to_string());
    }

    table
}

/// Copy the importer's resolved humanoid bones.
pub(super) fn map_legacy_bones(meta: &LegacyMetadata) -> HumanoidBoneTable {
    meta.humanoid_bones
        .iter()
        .filter(|bone| {
            let known = is_canonical_bone(SchemaVersion::Legacy, &bone.bone);
            if !known {
                log::warn!("ignoring unknown humanoid bone: {}", bone.bone);
            }
            known
        })
        .map(|bone| (bone.bone.clone(), bone.node_name.clone()))
        .collect()
}
