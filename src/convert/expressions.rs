use serde_json::Value;

use super::{
    json_utils::{
        array_member, bool_member, f32_member, logical_mesh_index, mesh_count, mesh_name,
        morph_target_name, node_mesh, node_name, normalize_file_name, rgba_array, string_member,
        usize_member,
    },
    types::{
        AssetContext, ExpressionGroup, MATERIAL_PROPERTY_RENAMES, MaterialColorOverride,
        MorphTargetBinding,
    },
};
use crate::scene::LegacyMetadata;

/// Expression maps read from `VRMC_vrm.expressions`, in output order.
const REVISED_EXPRESSION_SETS: [&str; 2] = ["preset", "custom"];

// ─── Revised schema ───────────────────────────────────────────────────────────

/// Build expression groups from `VRMC_vrm.expressions`, presets first and
/// custom expressions after them, each in document order.
pub(super) fn bind_revised_expressions(json: &Value, strict_names: bool) -> Vec<ExpressionGroup> {
    let Some(expressions) = json.pointer("/extensions/VRMC_vrm/expressions") else {
        return Vec::new();
    };

    REVISED_EXPRESSION_SETS
        .iter()
        .filter_map(|set| expressions.get(*set).and_then(Value::as_object))
        .flat_map(|set| set.iter())
        .map(|(name, expression)| ExpressionGroup {
            name: name.clone(),
            is_binary: bool_member(expression, "isBinary"),
            override_blink: string_member(expression, "overrideBlink"),
            override_look_at: string_member(expression, "overrideLookAt"),
            override_mouth: string_member(expression, "overrideMouth"),
            bindings: array_member(expression, "morphTargetBinds")
                .iter()
                .map(|bind| bind_revised_morph_target(json, bind, strict_names))
                .collect(),
            material_overrides: Vec::new(),
        })
        .collect()
}

/// Resolve one `morphTargetBinds` entry against the document's nodes/meshes.
///
/// Unresolvable indices leave the affected name fields empty.
fn bind_revised_morph_target(json: &Value, bind: &Value, strict_names: bool) -> MorphTargetBinding {
    let node_index = usize_member(bind, "node");
    let shape_index = usize_member(bind, "index");

    let mut binding = MorphTargetBinding {
        shape_index: shape_index.unwrap_or_default(),
        node_name: node_index
            .and_then(|node| node_name(json, node))
            .unwrap_or_default()
            .to_string(),
        weight: f32_member(bind, "weight", 0.0),
        ..MorphTargetBinding::default()
    };

    let Some(declared_mesh) = node_index.and_then(|node| node_mesh(json, node)) else {
        log::debug!("morph target bind node {node_index:?} does not reference a mesh");
        return binding;
    };

    let Some(mesh_index) = logical_mesh_index(json, declared_mesh) else {
        log::warn!("morph target bind mesh {declared_mesh} cannot be mapped to a logical mesh");
        return binding;
    };
    binding.mesh_index = Some(mesh_index);

    if mesh_index >= mesh_count(json) {
        log::debug!("morph target bind mesh {mesh_index} is outside the mesh list");
        return binding;
    }

    if let Some(name) = shape_index.and_then(|shape| morph_target_name(json, mesh_index, shape)) {
        binding.morph_target_name = apply_name_policy(name, strict_names);
    }
    binding.mesh_name = mesh_name(json, mesh_index).unwrap_or_default().to_string();

    binding
}

// ─── Legacy schema ────────────────────────────────────────────────────────────

/// Copy the importer's blend shape groups and, when the document and asset
/// lookups are available, attach their material color overrides.
pub(super) fn bind_legacy_expressions(
    meta: &LegacyMetadata,
    json: Option<&Value>,
    assets: Option<&AssetContext>,
    strict_names: bool,
) -> Vec<ExpressionGroup> {
    let mut groups: Vec<ExpressionGroup> = meta
        .blend_shape_groups
        .iter()
        .map(|group| ExpressionGroup {
            name: group.name.clone(),
            is_binary: group.is_binary,
            bindings: group
                .binds
                .iter()
                .map(|bind| MorphTargetBinding {
                    mesh_index: Some(bind.mesh_index),
                    shape_index: bind.shape_index,
                    morph_target_name: apply_name_policy(&bind.morph_target_name, strict_names),
                    mesh_name: bind.mesh_name.clone(),
                    node_name: bind.node_name.clone(),
                    weight: bind.weight,
                })
                .collect(),
            ..ExpressionGroup::default()
        })
        .collect();

    if let (Some(json), Some(assets)) = (json, assets) {
        attach_material_overrides(&mut groups, json, assets);
    }

    groups
}

/// Attach `materialValues` of each legacy blend shape group to the group at
/// the same position.
fn attach_material_overrides(groups: &mut [ExpressionGroup], json: &Value, assets: &AssetContext) {
    let source_groups = json
        .pointer("/extensions/VRM/blendShapeMaster/blendShapeGroups")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    if source_groups.len() != groups.len() {
        log::warn!(
            "blend shape group count mismatch: document {}, importer {}",
            source_groups.len(),
            groups.len()
        );
    }

    for (group, source) in groups.iter_mut().zip(source_groups) {
        group.material_overrides = array_member(source, "materialValues")
            .iter()
            .filter_map(|value| resolve_material_override(value, assets))
            .collect();
    }
}

/// Resolve one `materialValues` entry; `None` when the material was not
/// registered as an asset.
fn resolve_material_override(value: &Value, assets: &AssetContext) -> Option<MaterialColorOverride> {
    let original_name = string_member(value, "materialName");
    let Some(material_name) = assets
        .material_names
        .get(&normalize_file_name(&original_name))
    else {
        log::debug!("dropping material override for unregistered material: {original_name}");
        return None;
    };

    let property_name = string_member(value, "propertyName");
    let property_name = MATERIAL_PROPERTY_RENAMES
        .iter()
        .find(|(source, _)| *source == property_name)
        .map(|(_, target)| target.to_string())
        .unwrap_or(property_name);

    Some(MaterialColorOverride {
        material_name: material_name.clone(),
        property_name,
        color: rgba_array(value.get("targetValue")),
    })
}

fn apply_name_policy(name: &str, strict_names: bool) -> String {
    if strict_names {
        normalize_file_name(name)
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::scene::{LegacyBlendShapeBind, LegacyBlendShapeGroup};

    fn revised_document() -> Value {
        serde_json::json!({
            "nodes": [
                {"name": "Body", "mesh": 0},
                {"name": "Hair", "mesh": 1},
                {"name": "Face", "mesh": 2},
                {"name": "Empty"}
            ],
            "meshes": [
                {"name": "BodyA", "primitives": [{}, {}]},
                {"name": "BodyB", "primitives": [{}]},
                {"name": "HairMesh", "primitives": [{}, {}, {}]},
                {
                    "name": "Face Mesh",
                    "extras": {"targetNames": ["Fcl.Smile", "Fcl.Blink"]},
                    "primitives": [{}]
                }
            ],
            "extensions": {"VRMC_vrm": {"expressions": {
                "preset": {
                    "happy": {
                        "isBinary": true,
                        "overrideBlink": "block",
                        "overrideLookAt": "none",
                        "overrideMouth": "blend",
                        "morphTargetBinds": [
                            {"node": 1, "index": 0, "weight": 1.0},
                            {"node": 3, "index": 0, "weight": 1.0},
                            {"node": 2, "index": 0, "weight": 0.5}
                        ]
                    },
                    "blink": {"morphTargetBinds": [{"node": 9, "index": 1}]}
                },
                "custom": {
                    "wink": {"morphTargetBinds": []}
                }
            }}}
        })
    }

    #[test]
    fn given_presets_and_custom_when_binding_then_document_order_is_kept() {
        let groups = bind_revised_expressions(&revised_document(), false);
        let names: Vec<&str> = groups.iter().map(|group| group.name.as_str()).collect();
        assert_eq!(names, vec!["happy", "blink", "wink"]);

        let happy = &groups[0];
        assert!(happy.is_binary);
        assert_eq!(happy.override_blink, "block");
        assert_eq!(happy.override_look_at, "none");
        assert_eq!(happy.override_mouth, "blend");
        assert_eq!(happy.bindings.len(), 3);
        assert!(happy.material_overrides.is_empty());
    }

    #[test]
    fn given_split_primitives_when_binding_then_logical_mesh_index_is_used() {
        let groups = bind_revised_expressions(&revised_document(), false);
        let bind = &groups[0].bindings[0];

        // Hair declares mesh 1; mesh 0 has two primitives.
        assert_eq!(bind.mesh_index, Some(2));
        assert_eq!(bind.mesh_name, "HairMesh");
        assert_eq!(bind.node_name, "Hair");
        assert_eq!(bind.weight, 1.0);
    }

    #[test]
    fn given_logical_index_past_mesh_list_when_binding_then_names_stay_empty() {
        let groups = bind_revised_expressions(&revised_document(), false);
        let bind = &groups[0].bindings[2];

        // Face declares mesh 2 -> 2 + 1 + 0 = 3, within range, resolves the face mesh.
        assert_eq!(bind.mesh_index, Some(3));
        assert_eq!(bind.morph_target_name, "Fcl.Smile");

        let json = serde_json::json!({
            "nodes": [{"name": "Face", "mesh": 1}],
            "meshes": [
                {"primitives": [{}, {}, {}]},
                {"name": "Face", "extras": {"targetNames": ["Smile"]}}
            ],
            "extensions": {"VRMC_vrm": {"expressions": {"preset": {
                "happy": {"morphTargetBinds": [{"node": 0, "index": 0}]}
            }}}}
        });
        let groups = bind_revised_expressions(&json, false);
        let bind = &groups[0].bindings[0];
        assert_eq!(bind.mesh_index, Some(3));
        assert_eq!(bind.shape_index, 0);
        assert!(bind.morph_target_name.is_empty());
        assert!(bind.mesh_name.is_empty());
    }

    #[test]
    fn given_huge_declared_mesh_when_binding_then_binding_is_unresolved() {
        let json = serde_json::json!({
            "nodes": [{"name": "Face", "mesh": u64::MAX}],
            "meshes": [{"primitives": [{}, {}]}],
            "extensions": {"VRMC_vrm": {"expressions": {"preset": {
                "happy": {"morphTargetBinds": [{"node": 0, "index": 0}]}
            }}}}
        });

        let groups = bind_revised_expressions(&json, false);
        let bind = &groups[0].bindings[0];
        assert_eq!(bind.mesh_index, None);
        assert_eq!(bind.node_name, "Face");
        assert!(bind.morph_target_name.is_empty());
        assert!(bind.mesh_name.is_empty());
    }

    #[test]
    fn given_node_without_mesh_when_binding_then_mesh_index_is_absent() {
        let groups = bind_revised_expressions(&revised_document(), false);

        let no_mesh = &groups[0].bindings[1];
        assert_eq!(no_mesh.mesh_index, None);
        assert_eq!(no_mesh.node_name, "Empty");

        let out_of_range = &groups[1].bindings[0];
        assert_eq!(out_of_range.mesh_index, None);
        assert_eq!(out_of_range.shape_index, 1);
        assert!(out_of_range.node_name.is_empty());
    }

    #[test]
    fn given_strict_mode_when_binding_then_target_names_are_normalized() {
        let json = serde_json::json!({
            "nodes": [{"name": "Face", "mesh": 0}],
            "meshes": [{
                "name": "Face",
                "primitives": [{"extras": {"targetNames": ["Fcl.ALL Joy"]}}]
            }],
            "extensions": {"VRMC_vrm": {"expressions": {"preset": {
                "happy": {"morphTargetBinds": [{"node": 0, "index": 0}]}
            }}}}
        });

        let relaxed = bind_revised_expressions(&json, false);
        assert_eq!(relaxed[0].bindings[0].morph_target_name, "Fcl.ALL Joy");

        let strict = bind_revised_expressions(&json, true);
        assert_eq!(strict[0].bindings[0].morph_target_name, "Fcl_ALL_Joy");
    }

    fn legacy_meta() -> LegacyMetadata {
        LegacyMetadata {
            blend_shape_groups: vec![
                LegacyBlendShapeGroup {
                    name: "Joy".to_string(),
                    is_binary: false,
                    binds: vec![LegacyBlendShapeBind {
                        mesh_index: 4,
                        shape_index: 7,
                        node_name: "Face".to_string(),
                        mesh_name: "Face.baked".to_string(),
                        morph_target_name: "Fcl.ALL_Joy".to_string(),
                        weight: 100.0,
                    }],
                },
                LegacyBlendShapeGroup {
                    name: "Angry".to_string(),
                    ..LegacyBlendShapeGroup::default()
                },
            ],
            ..LegacyMetadata::default()
        }
    }

    #[test]
    fn given_importer_groups_when_binding_legacy_then_binds_are_copied() {
        let groups = bind_legacy_expressions(&legacy_meta(), None, None, true);

        assert_eq!(groups.len(), 2);
        let bind = &groups[0].bindings[0];
        assert_eq!(bind.mesh_index, Some(4));
        assert_eq!(bind.shape_index, 7);
        assert_eq!(bind.mesh_name, "Face.baked");
        assert_eq!(bind.node_name, "Face");
        assert_eq!(bind.morph_target_name, "Fcl_ALL_Joy");
        assert_eq!(bind.weight, 100.0);
        assert!(groups[1].bindings.is_empty());
    }

    #[test]
    fn given_unregistered_materials_when_binding_legacy_then_their_overrides_are_dropped() {
        let json = serde_json::json!({
            "extensions": {"VRM": {"blendShapeMaster": {"blendShapeGroups": [
                {
                    "name": "Joy",
                    "materialValues": [
                        {"materialName": "Face.Skin", "propertyName": "_Color", "targetValue": [1, 0.5, 0.25, 1]},
                        {"materialName": "Removed", "propertyName": "_Color", "targetValue": [0, 0, 0, 1]},
                        {"materialName": "Face.Skin", "propertyName": "_ShadeColor", "targetValue": [0.1, 0.2, 0.3, 0.4]},
                        {"materialName": "Face.Skin", "propertyName": "_EmisionColor", "targetValue": [1, 1, 1, 1]}
                    ]
                },
                {"name": "Angry"}
            ]}}}
        });
        let assets = AssetContext {
            material_names: HashMap::from([(
                "Face_Skin".to_string(),
                "MI_Face_Skin".to_string(),
            )]),
            textures: Vec::new(),
        };

        let groups = bind_legacy_expressions(&legacy_meta(), Some(&json), Some(&assets), false);
        let overrides = &groups[0].material_overrides;

        assert_eq!(overrides.len(), 3);
        assert!(overrides.iter().all(|o| o.material_name == "MI_Face_Skin"));
        assert_eq!(overrides[0].property_name, "mtoon_Color");
        assert_eq!(overrides[0].color, [1.0, 0.5, 0.25, 1.0]);
        assert_eq!(overrides[1].property_name, "_ShadeColor");
        assert_eq!(overrides[2].property_name, "mtoon_EmissionColor");
        assert!(groups[1].material_overrides.is_empty());
    }

    #[test]
    fn given_no_asset_lookup_when_binding_legacy_then_overrides_are_skipped() {
        let json = serde_json::json!({
            "extensions": {"VRM": {"blendShapeMaster": {"blendShapeGroups": [
                {"materialValues": [{"materialName": "Face", "propertyName": "_Color", "targetValue": [1, 1, 1, 1]}]}
            ]}}}
        });

        let groups = bind_legacy_expressions(&legacy_meta(), Some(&json), None, false);
        assert!(groups[0].material_overrides.is_empty());
    }
}
