mod bones;
mod expressions;
pub(crate) mod json_utils;
mod license;
mod physics;
mod rename;
mod schema;
mod types;

use serde_json::Value;

use crate::{error::MetaError, scene::LegacyMetadata};

// Re-export public types for callers of this module.
pub use json_utils::normalize_file_name;
pub use license::extract_license;
pub use rename::{BoneNameTable, rename_bones};
pub use schema::{LegacyAdapter, RevisedAdapter, SchemaAdapter, SchemaVersion};
pub use types::{
    AssetContext, Collider, ColliderGroup, ColliderGroupEntry, ColliderShape, ConversionOutput,
    ConvertOptions, ExpressionGroup, HumanoidBoneTable, LicenseRecord, MaterialColorOverride,
    MorphTargetBinding, RenamedVariants, SpringBone, SpringChain, VrmMeta,
};

// ─── Public API ───────────────────────────────────────────────────────────────

/// Normalize the avatar metadata of one imported asset.
///
/// `json` is the parsed glTF document and `scene_meta` the metadata the
/// importer attached to the scene. The revised schema reads bones,
/// expressions and colliders from `json`, so it must be present. Material
/// overrides and the license thumbnail are only resolved when `assets` is
/// given.
///
/// Returns [`MetaError::MissingMetadata`] when the scene carries no avatar
/// metadata; every other anomaly is absorbed and the output is best-effort.
pub fn convert_vrm_meta(
    json: Option<&Value>,
    scene_meta: Option<&LegacyMetadata>,
    assets: Option<&AssetContext>,
    options: &ConvertOptions,
) -> Result<ConversionOutput, MetaError> {
    let Some(scene_meta) = scene_meta else {
        log::info!("scene carries no avatar metadata");
        return Err(MetaError::MissingMetadata);
    };

    let output = if options.is_revised_schema() {
        let json = json.ok_or(MetaError::MissingDocument)?;
        convert_with(&RevisedAdapter::new(json, scene_meta, assets, options))
    } else {
        convert_with(&LegacyAdapter::new(json, scene_meta, assets, options))
    };

    log::debug!(
        "converted avatar metadata: {} bones, {} expressions, {} springs, {} colliders",
        output.meta.humanoid_bone_table.len(),
        output.meta.expression_groups.len(),
        output.meta.springs.len(),
        output.meta.collider_entries.len()
    );

    Ok(output)
}

/// Run every extraction step of `adapter` once.
pub fn convert_with(adapter: &dyn SchemaAdapter) -> ConversionOutput {
    let humanoid_bone_table = adapter.humanoid_bones();
    let expression_groups = adapter.expression_groups();
    let springs = adapter.springs();
    let (collider_entries, collider_groups) = adapter.colliders();
    let license = adapter.license();

    ConversionOutput {
        meta: VrmMeta {
            humanoid_bone_table,
            expression_groups,
            springs,
            collider_entries,
            collider_groups,
        },
        license,
    }
}

/// Derive the UE4-mannequin and canonical-humanoid renamed copies of `meta`
/// when `options` requests them.
pub fn generate_renamed_variants(
    meta: &VrmMeta,
    options: &ConvertOptions,
) -> Option<RenamedVariants> {
    if !options.generate_renamed_variants {
        return None;
    }

    Some(RenamedVariants {
        mannequin: rename_bones(meta, &BoneNameTable::ue4_mannequin()),
        humanoid: rename_bones(meta, &BoneNameTable::canonical()),
    })
}
