use std::collections::{BTreeMap, HashMap};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::schema::SchemaVersion;

// ─── Canonical humanoid bone sets ─────────────────────────────────────────────

/// Humanoid bones shared by both schema generations (body, limbs, face).
const BODY_BONES: [&str; 25] = [
    "hips",
    "spine",
    "chest",
    "upperChest",
    "neck",
    "head",
    "leftEye",
    "rightEye",
    "jaw",
    "leftShoulder",
    "leftUpperArm",
    "leftLowerArm",
    "leftHand",
    "rightShoulder",
    "rightUpperArm",
    "rightLowerArm",
    "rightHand",
    "leftUpperLeg",
    "leftLowerLeg",
    "leftFoot",
    "leftToes",
    "rightUpperLeg",
    "rightLowerLeg",
    "rightFoot",
    "rightToes",
];

/// Non-thumb finger bones, identical in both schema generations.
const FINGER_BONES: [&str; 24] = [
    "leftIndexProximal",
    "leftIndexIntermediate",
    "leftIndexDistal",
    "leftMiddleProximal",
    "leftMiddleIntermediate",
    "leftMiddleDistal",
    "leftRingProximal",
    "leftRingIntermediate",
    "leftRingDistal",
    "leftLittleProximal",
    "leftLittleIntermediate",
    "leftLittleDistal",
    "rightIndexProximal",
    "rightIndexIntermediate",
    "rightIndexDistal",
    "rightMiddleProximal",
    "rightMiddleIntermediate",
    "rightMiddleDistal",
    "rightRingProximal",
    "rightRingIntermediate",
    "rightRingDistal",
    "rightLittleProximal",
    "rightLittleIntermediate",
    "rightLittleDistal",
];

/// Legacy (`VRM`) thumb chain.
const LEGACY_THUMB_BONES: [&str; 6] = [
    "leftThumbProximal",
    "leftThumbIntermediate",
    "leftThumbDistal",
    "rightThumbProximal",
    "rightThumbIntermediate",
    "rightThumbDistal",
];

/// Revised (`VRMC_vrm`) thumb chain. The revised schema renamed the thumb
/// joints one step towards the wrist.
const REVISED_THUMB_BONES: [&str; 6] = [
    "leftThumbMetacarpal",
    "leftThumbProximal",
    "leftThumbDistal",
    "rightThumbMetacarpal",
    "rightThumbProximal",
    "rightThumbDistal",
];

/// Return whether `bone` is a canonical humanoid bone of `schema`.
pub(super) fn is_canonical_bone(schema: SchemaVersion, bone: &str) -> bool {
    let thumbs: &[&str] = match schema {
        SchemaVersion::Legacy => &LEGACY_THUMB_BONES,
        SchemaVersion::Revised => &REVISED_THUMB_BONES,
    };

    BODY_BONES
        .iter()
        .chain(FINGER_BONES.iter())
        .chain(thumbs.iter())
        .any(|candidate| *candidate == bone)
}

// ─── Rename tables ─────────────────────────────────────────────────────────────

/// Legacy MToon material property names to the names used by the target
/// material instances.
pub(super) const MATERIAL_PROPERTY_RENAMES: [(&str, &str); 4] = [
    ("_Color", "mtoon_Color"),
    ("_RimColor", "mtoon_RimColor"),
    ("_EmisionColor", "mtoon_EmissionColor"),
    ("_OutlineColor", "mtoon_OutColor"),
];

/// Canonical humanoid bone to UE4 mannequin skeleton names.
///
/// Thumb entries follow the legacy naming (`Proximal` is the first joint).
pub(super) const UE4_MANNEQUIN_BONE_MAP: [(&str, &str); 52] = [
    ("hips", "pelvis"),
    ("spine", "spine_01"),
    ("chest", "spine_02"),
    ("upperChest", "spine_03"),
    ("neck", "neck_01"),
    ("head", "head"),
    ("leftShoulder", "clavicle_l"),
    ("leftUpperArm", "upperarm_l"),
    ("leftLowerArm", "lowerarm_l"),
    ("leftHand", "hand_l"),
    ("rightShoulder", "clavicle_r"),
    ("rightUpperArm", "upperarm_r"),
    ("rightLowerArm", "lowerarm_r"),
    ("rightHand", "hand_r"),
    ("leftUpperLeg", "thigh_l"),
    ("leftLowerLeg", "calf_l"),
    ("leftFoot", "foot_l"),
    ("leftToes", "ball_l"),
    ("rightUpperLeg", "thigh_r"),
    ("rightLowerLeg", "calf_r"),
    ("rightFoot", "foot_r"),
    ("rightToes", "ball_r"),
    ("leftThumbProximal", "thumb_01_l"),
    ("leftThumbIntermediate", "thumb_02_l"),
    ("leftThumbDistal", "thumb_03_l"),
    ("leftIndexProximal", "index_01_l"),
    ("leftIndexIntermediate", "index_02_l"),
    ("leftIndexDistal", "index_03_l"),
    ("leftMiddleProximal", "middle_01_l"),
    ("leftMiddleIntermediate", "middle_02_l"),
    ("leftMiddleDistal", "middle_03_l"),
    ("leftRingProximal", "ring_01_l"),
    ("leftRingIntermediate", "ring_02_l"),
    ("leftRingDistal", "ring_03_l"),
    ("leftLittleProximal", "pinky_01_l"),
    ("leftLittleIntermediate", "pinky_02_l"),
    ("leftLittleDistal", "pinky_03_l"),
    ("rightThumbProximal", "thumb_01_r"),
    ("rightThumbIntermediate", "thumb_02_r"),
    ("rightThumbDistal", "thumb_03_r"),
    ("rightIndexProximal", "index_01_r"),
    ("rightIndexIntermediate", "index_02_r"),
    ("rightIndexDistal", "index_03_r"),
    ("rightMiddleProximal", "middle_01_r"),
    ("rightMiddleIntermediate", "middle_02_r"),
    ("rightMiddleDistal", "middle_03_r"),
    ("rightRingProximal", "ring_01_r"),
    ("rightRingIntermediate", "ring_02_r"),
    ("rightRingDistal", "ring_03_r"),
    ("rightLittleProximal", "pinky_01_r"),
    ("rightLittleIntermediate", "pinky_02_r"),
    ("rightLittleDistal", "pinky_03_r"),
];

// ─── Public types ─────────────────────────────────────────────────────────────

/// Canonical humanoid bone name to scene node name. An empty value marks a
/// bone the document declares but does not bind to a node.
pub type HumanoidBoneTable = BTreeMap<String, String>;

/// Call-scoped configuration flags, read-only for the duration of a conversion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Schema generation consulted by every conversion step.
    pub schema: SchemaVersion,
    /// Normalize resolved morph target names like asset file names.
    pub strict_morph_target_names: bool,
    /// Produce the two bone-renamed metadata variants.
    pub generate_renamed_variants: bool,
}

impl ConvertOptions {
    pub fn is_revised_schema(&self) -> bool {
        self.schema.is_revised()
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            schema: SchemaVersion::Legacy,
            strict_morph_target_names: false,
            generate_renamed_variants: false,
        }
    }
}

/// Lookups supplied by the asset registration stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetContext {
    /// Normalized original material name to registered material asset name.
    pub material_names: HashMap<String, String>,
    /// Registered texture assets, indexed like the document's textures.
    pub textures: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MorphTargetBinding {
    /// Logical mesh index after primitive-split correction. `None` when the
    /// binding's node does not resolve to a mesh.
    pub mesh_index: Option<usize>,
    pub shape_index: usize,
    pub morph_target_name: String,
    pub mesh_name: String,
    pub node_name: String,
    pub weight: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialColorOverride {
    pub material_name: String,
    pub property_name: String,
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpressionGroup {
    pub name: String,
    pub is_binary: bool,
    pub override_blink: String,
    pub override_look_at: String,
    pub override_mouth: String,
    pub bindings: Vec<MorphTargetBinding>,
    pub material_overrides: Vec<MaterialColorOverride>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpringBone {
    pub node: usize,
    pub name: String,
}

/// One simulated chain of bones with shared spring parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpringChain {
    pub stiffness: f32,
    pub gravity_power: f32,
    pub gravity_dir: Vector3<f32>,
    pub drag_force: f32,
    pub hit_radius: f32,
    pub bones: Vec<SpringBone>,
    /// Indices into the collider table.
    pub collider_groups: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColliderShape {
    Sphere,
    Capsule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub shape: ColliderShape,
    pub offset: Vector3<f32>,
    pub radius: f32,
    /// Capsule end point; zero for spheres.
    pub tail: Vector3<f32>,
}

impl Collider {
    pub fn sphere(offset: Vector3<f32>, radius: f32) -> Self {
        Self {
            shape: ColliderShape::Sphere,
            offset,
            radius,
            tail: Vector3::zeros(),
        }
    }

    pub fn capsule(offset: Vector3<f32>, radius: f32, tail: Vector3<f32>) -> Self {
        Self {
            shape: ColliderShape::Capsule,
            offset,
            radius,
            tail,
        }
    }
}

/// Colliders attached to one scene node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColliderGroupEntry {
    pub bone: Option<usize>,
    pub bone_name: String,
    pub colliders: Vec<Collider>,
}

/// Named set of collider entries (revised schema only).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColliderGroup {
    pub name: String,
    pub colliders: Vec<usize>,
}

/// Normalized avatar metadata for one imported asset.
///
/// `Clone` is a deep copy; renamed variants never share state with the
/// canonical object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VrmMeta {
    pub humanoid_bone_table: HumanoidBoneTable,
    pub expression_groups: Vec<ExpressionGroup>,
    pub springs: Vec<SpringChain>,
    pub collider_entries: Vec<ColliderGroupEntry>,
    pub collider_groups: Vec<ColliderGroup>,
}

/// License and usage-permission record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    pub version: String,
    pub author: String,
    pub contact_information: String,
    pub reference: String,
    pub title: String,
    pub allowed_user_name: String,
    pub violent_usage_name: String,
    pub sexual_usage_name: String,
    pub commercial_usage_name: String,
    pub other_permission_url: String,
    pub license_name: String,
    pub other_license_url: String,
    /// Registered texture asset used as the avatar thumbnail.
    pub thumbnail: Option<String>,
}

/// Canonical output set of one conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionOutput {
    pub meta: VrmMeta,
    pub license: LicenseRecord,
}

/// Bone-renamed copies of a canonical [`VrmMeta`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenamedVariants {
    /// Bones renamed to the UE4 mannequin convention.
    pub mannequin: VrmMeta,
    /// Bones renamed to their canonical humanoid names.
    pub humanoid: VrmMeta,
}
