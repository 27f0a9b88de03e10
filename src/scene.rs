//! Pre-resolved avatar metadata attached to an imported scene.
//!
//! The scene importer hands this structure over next to the resolved scene
//! graph. [`LegacyMetadata::from_gltf_json`] builds the same structure straight
//! from a glTF JSON document for command-line use and tests.

use std::{collections::HashMap, fs, path::Path};

use gltf::binary::Glb;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    convert::{
        AssetContext,
        json_utils::{
            array_member, bool_member, f32_member, first_node_name_using_mesh,
            logical_mesh_index, mesh_name, morph_target_name, node_name, string_member,
            usize_member, vec3_object,
        },
        normalize_file_name,
    },
    error::MetaError,
};

/// Leading bytes of a binary glTF container.
const GLB_MAGIC: &[u8; 4] = b"glTF";

/// Revised-schema meta members and the license keys they are reported under.
const REVISED_META_KEYS: [(&str, &str); 11] = [
    ("name", "title"),
    ("version", "version"),
    ("authors", "author"),
    ("contactInformation", "contactInformation"),
    ("references", "reference"),
    ("avatarPermission", "allowedUserName"),
    ("allowExcessivelyViolentUsage", "violentUsageName"),
    ("allowExcessivelySexualUsage", "sexualUsageName"),
    ("commercialUsage", "commercialUsageName"),
    ("licenseUrl", "licenseName"),
    ("otherLicenseUrl", "otherLicenseUrl"),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyHumanoidBone {
    pub bone: String,
    pub node_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyBlendShapeBind {
    pub mesh_index: usize,
    pub shape_index: usize,
    pub node_name: String,
    pub mesh_name: String,
    pub morph_target_name: String,
    pub weight: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyBlendShapeGroup {
    pub name: String,
    pub is_binary: bool,
    pub binds: Vec<LegacyBlendShapeBind>,
}

/// Spring entry; `bones` and `bone_names` are parallel arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacySpring {
    pub stiffness: f32,
    pub gravity_power: f32,
    pub gravity_dir: Vector3<f32>,
    pub drag_force: f32,
    pub hit_radius: f32,
    pub bones: Vec<usize>,
    pub bone_names: Vec<String>,
    pub collider_groups: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyCollider {
    pub offset: Vector3<f32>,
    pub radius: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyColliderGroup {
    pub node: usize,
    pub node_name: String,
    pub colliders: Vec<LegacyCollider>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicensePair {
    pub key: String,
    pub value: String,
}

impl LicensePair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Importer-resolved metadata. Every index is already valid against the
/// imported scene graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyMetadata {
    pub humanoid_bones: Vec<LegacyHumanoidBone>,
    pub blend_shape_groups: Vec<LegacyBlendShapeGroup>,
    pub springs: Vec<LegacySpring>,
    pub collider_groups: Vec<LegacyColliderGroup>,
    pub license: Vec<LicensePair>,
}

impl LegacyMetadata {
    /// Build the importer metadata from a glTF JSON document.
    ///
    /// Returns `None` when the document carries neither avatar extension.
    pub fn from_gltf_json(json: &Value) -> Option<Self> {
        if let Some(vrm) = json.pointer("/extensions/VRM") {
            return Some(Self {
                humanoid_bones: import_humanoid_bones(json, vrm),
                blend_shape_groups: import_blend_shape_groups(json, vrm),
                springs: import_springs(json, vrm),
                collider_groups: import_collider_groups(json, vrm),
                license: vrm
                    .get("meta")
                    .map(import_legacy_license)
                    .unwrap_or_default(),
            });
        }

        let meta = json.pointer("/extensions/VRMC_vrm")?;
        Some(Self {
            license: meta
                .get("meta")
                .map(|meta| import_revised_license(json, meta))
                .unwrap_or_default(),
            ..Self::default()
        })
    }
}

impl AssetContext {
    /// Derive the material and texture asset names the registration stage
    /// would produce for `json`.
    pub fn from_gltf_json(json: &Value) -> Self {
        let material_names: HashMap<String, String> = array_member(json, "materials")
            .iter()
            .enumerate()
            .map(|(index, material)| {
                let name = material
                    .get("name")
                    .and_then(Value::as_str)
                    .map(normalize_file_name)
                    .unwrap_or_else(|| format!("material_{index}"));
                (name.clone(), format!("MI_{name}"))
            })
            .collect();

        let images = array_member(json, "images");
        let textures = array_member(json, "textures")
            .iter()
            .enumerate()
            .map(|(index, texture)| {
                let image_name = usize_member(texture, "source")
                    .and_then(|source| images.get(source))
                    .and_then(|image| image.get("name"))
                    .and_then(Value::as_str)
                    .map(normalize_file_name);
                match image_name {
                    Some(name) => format!("T_{name}"),
                    None => format!("T_texture_{index}"),
                }
            })
            .collect();

        Self {
            material_names,
            textures,
        }
    }
}

/// Read the glTF JSON document from a `.vrm`/`.glb` container or a plain
/// `.gltf` file.
pub fn read_gltf_json(input_path: &Path) -> Result<Value, MetaError> {
    let bytes = fs::read(input_path)?;
    if bytes.starts_with(GLB_MAGIC) {
        let glb = Glb::from_slice(&bytes)?;
        Ok(serde_json::from_slice(glb.json.as_ref())?)
    } else {
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn import_humanoid_bones(json: &Value, vrm: &Value) -> Vec<LegacyHumanoidBone> {
    vrm.pointer("/humanoid/humanBones")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
        .iter()
        .filter_map(|entry| {
            let bone = entry.get("bone")?.as_str()?.to_string();
            let node_name = usize_member(entry, "node")
                .and_then(|node| node_name(json, node))
                .unwrap_or_default()
                .to_string();
            Some(LegacyHumanoidBone { bone, node_name })
        })
        .collect()
}

fn import_blend_shape_groups(json: &Value, vrm: &Value) -> Vec<LegacyBlendShapeGroup> {
    vrm.pointer("/blendShapeMaster/blendShapeGroups")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
        .iter()
        .map(|group| LegacyBlendShapeGroup {
            name: string_member(group, "name"),
            is_binary: bool_member(group, "isBinary"),
            binds: array_member(group, "binds")
                .iter()
                .map(|bind| import_blend_shape_bind(json, bind))
                .collect(),
        })
        .collect()
}

fn import_blend_shape_bind(json: &Value, bind: &Value) -> LegacyBlendShapeBind {
    let declared_mesh = usize_member(bind, "mesh").unwrap_or(0);
    let shape_index = usize_member(bind, "index").unwrap_or(0);

    LegacyBlendShapeBind {
        mesh_index: logical_mesh_index(json, declared_mesh).unwrap_or(declared_mesh),
        shape_index,
        node_name: first_node_name_using_mesh(json, declared_mesh)
            .unwrap_or_default()
            .to_string(),
        mesh_name: mesh_name(json, declared_mesh)
            .unwrap_or_default()
            .to_string(),
        morph_target_name: morph_target_name(json, declared_mesh, shape_index)
            .unwrap_or_default()
            .to_string(),
        weight: f32_member(bind, "weight", 0.0),
    }
}

fn import_springs(json: &Value, vrm: &Value) -> Vec<LegacySpring> {
    vrm.pointer("/secondaryAnimation/boneGroups")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
        .iter()
        .map(|group| {
            let bones: Vec<usize> = array_member(group, "bones")
                .iter()
                .filter_map(|bone| bone.as_u64().map(|node| node as usize))
                .collect();
            let bone_names = bones
                .iter()
                .map(|node| node_name(json, *node).unwrap_or_default().to_string())
                .collect();

            // The legacy format spells the member "stiffiness".
            let stiffness = group
                .get("stiffiness")
                .or_else(|| group.get("stiffness"))
                .and_then(Value::as_f64)
                .unwrap_or(0.0) as f32;

            LegacySpring {
                stiffness,
                gravity_power: f32_member(group, "gravityPower", 0.0),
                gravity_dir: vec3_object(group.get("gravityDir")),
                drag_force: f32_member(group, "dragForce", 0.0),
                hit_radius: f32_member(group, "hitRadius", 0.0),
                bones,
                bone_names,
                collider_groups: array_member(group, "colliderGroups")
                    .iter()
                    .filter_map(|index| index.as_u64().map(|index| index as usize))
                    .collect(),
            }
        })
        .collect()
}

fn import_collider_groups(json: &Value, vrm: &Value) -> Vec<LegacyColliderGroup> {
    vrm.pointer("/secondaryAnimation/colliderGroups")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
        .iter()
        .map(|group| {
            let node = usize_member(group, "node").unwrap_or(0);
            LegacyColliderGroup {
                node,
                node_name: node_name(json, node).unwrap_or_default().to_string(),
                colliders: array_member(group, "colliders")
                    .iter()
                    .map(|collider| LegacyCollider {
                        offset: vec3_object(collider.get("offset")),
                        radius: f32_member(collider, "radius", 0.0),
                    })
                    .collect(),
            }
        })
        .collect()
}

fn import_legacy_license(meta: &Value) -> Vec<LicensePair> {
    meta.as_object()
        .map(|members| {
            members
                .iter()
                .filter_map(|(key, value)| Some(LicensePair::new(key, scalar_to_string(value)?)))
                .collect()
        })
        .unwrap_or_default()
}

fn import_revised_license(json: &Value, meta: &Value) -> Vec<LicensePair> {
    let mut pairs: Vec<LicensePair> = REVISED_META_KEYS
        .iter()
        .filter_map(|(member, key)| {
            let value = meta.get(*member)?;
            // `authors` and `references` are arrays; the first entry is reported.
            let value = match value {
                Value::Array(entries) => entries.first()?,
                other => other,
            };
            Some(LicensePair::new(*key, scalar_to_string(value)?))
        })
        .collect();

    if let Some(image) = usize_member(meta, "thumbnailImage") {
        match thumbnail_texture_index(json, image) {
            Some(texture) => pairs.push(LicensePair::new("texture", texture.to_string())),
            None => log::debug!("thumbnail image {image} is not used by any texture"),
        }
    }

    pairs
}

/// `thumbnailImage` indexes `images`; the license record resolves textures.
fn thumbnail_texture_index(json: &Value, image: usize) -> Option<usize> {
    array_member(json, "textures")
        .iter()
        .position(|texture| usize_member(texture, "source") == Some(image))
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::extract_license;

    fn legacy_document() -> Value {
        serde_json::json!({
            "nodes": [
                {"name": "Hips"},
                {"name": "Face", "mesh": 1},
                {"name": "HairRoot"},
                {"name": "HairTip"}
            ],
            "meshes": [
                {"name": "Body", "primitives": [{}, {}]},
                {"name": "FaceMesh", "primitives": [{"extras": {"targetNames": ["Fcl_Smile"]}}]}
            ],
            "extensions": {
                "VRM": {
                    "humanoid": {"humanBones": [{"bone": "hips", "node": 0}]},
                    "blendShapeMaster": {"blendShapeGroups": [{
                        "name": "Joy",
                        "binds": [{"mesh": 1, "index": 0, "weight": 100}]
                    }]},
                    "secondaryAnimation": {
                        "boneGroups": [{
                            "stiffiness": 0.75,
                            "gravityPower": 0.1,
                            "gravityDir": {"x": 0, "y": -1, "z": 0},
                            "dragForce": 0.4,
                            "hitRadius": 0.02,
                            "bones": [2, 3],
                            "colliderGroups": [0]
                        }],
                        "colliderGroups": [{
                            "node": 0,
                            "colliders": [{"offset": {"x": 0, "y": 0.1, "z": 0}, "radius": 0.05}]
                        }]
                    },
                    "meta": {"title": "Sample", "texture": 1, "violentUssageName": "Disallow"}
                }
            }
        })
    }

    #[test]
    fn given_legacy_document_when_importing_then_indices_are_resolved_to_names() {
        let meta = LegacyMetadata::from_gltf_json(&legacy_document()).expect("legacy meta");

        assert_eq!(meta.humanoid_bones[0].node_name, "Hips");

        let bind = &meta.blend_shape_groups[0].binds[0];
        assert_eq!(bind.mesh_index, 2);
        assert_eq!(bind.node_name, "Face");
        assert_eq!(bind.mesh_name, "FaceMesh");
        assert_eq!(bind.morph_target_name, "Fcl_Smile");
        assert_eq!(bind.weight, 100.0);

        let spring = &meta.springs[0];
        assert_eq!(spring.stiffness, 0.75);
        assert_eq!(spring.gravity_dir, Vector3::new(0.0, -1.0, 0.0));
        assert_eq!(spring.bone_names, vec!["HairRoot", "HairTip"]);
        assert_eq!(spring.collider_groups, vec![0]);

        assert_eq!(meta.collider_groups[0].node_name, "Hips");
        assert_eq!(meta.collider_groups[0].colliders[0].radius, 0.05);

        assert!(meta.license.contains(&LicensePair::new("texture", "1")));
        assert!(
            meta.license
                .contains(&LicensePair::new("violentUssageName", "Disallow"))
        );
    }

    #[test]
    fn given_revised_meta_when_importing_then_license_keys_are_translated() {
        let json = serde_json::json!({
            "extensions": {
                "VRMC_vrm": {
                    "meta": {
                        "name": "Avatar",
                        "authors": ["Alice", "Bob"],
                        "allowExcessivelyViolentUsage": false,
                        "thumbnailImage": 0
                    }
                }
            },
            "images": [{"name": "thumb"}],
            "textures": [{"source": 0}]
        });

        let meta = LegacyMetadata::from_gltf_json(&json).expect("revised meta");
        assert!(meta.humanoid_bones.is_empty());
        assert!(meta.license.contains(&LicensePair::new("title", "Avatar")));
        assert!(meta.license.contains(&LicensePair::new("author", "Alice")));
        assert!(
            meta.license
                .contains(&LicensePair::new("violentUsageName", "false"))
        );
        assert!(meta.license.contains(&LicensePair::new("texture", "0")));
    }

    #[test]
    fn given_textures_out_of_image_order_when_importing_revised_then_thumbnail_follows_image() {
        let json = serde_json::json!({
            "extensions": {"VRMC_vrm": {"meta": {"name": "Avatar", "thumbnailImage": 1}}},
            "images": [{"name": "body"}, {"name": "thumb"}],
            "textures": [{"source": 1}, {"source": 0}]
        });

        let meta = LegacyMetadata::from_gltf_json(&json).expect("revised meta");
        assert!(meta.license.contains(&LicensePair::new("texture", "0")));

        let context = AssetContext::from_gltf_json(&json);
        let license = extract_license(&meta.license, Some(context.textures.as_slice()));
        assert_eq!(license.thumbnail.as_deref(), Some("T_thumb"));
    }

    #[test]
    fn given_thumbnail_image_without_texture_when_importing_revised_then_no_texture_key() {
        let json = serde_json::json!({
            "extensions": {"VRMC_vrm": {"meta": {"name": "Avatar", "thumbnailImage": 0}}},
            "images": [{"name": "thumb"}]
        });

        let meta = LegacyMetadata::from_gltf_json(&json).expect("revised meta");
        assert!(meta.license.iter().all(|pair| pair.key != "texture"));
    }

    #[test]
    fn given_plain_gltf_when_importing_then_no_metadata_is_reported() {
        let json = serde_json::json!({"nodes": []});
        assert!(LegacyMetadata::from_gltf_json(&json).is_none());
    }

    #[test]
    fn given_materials_and_textures_when_building_context_then_asset_names_are_derived() {
        let json = serde_json::json!({
            "materials": [{"name": "Face.Skin"}, {}],
            "images": [{"name": "thumb"}],
            "textures": [{"source": 0}, {}]
        });

        let context = AssetContext::from_gltf_json(&json);
        assert_eq!(
            context.material_names.get("Face_Skin"),
            Some(&"MI_Face_Skin".to_string())
        );
        assert_eq!(
            context.material_names.get("material_1"),
            Some(&"MI_material_1".to_string())
        );
        assert_eq!(context.textures, vec!["T_thumb", "T_texture_1"]);
    }
}
