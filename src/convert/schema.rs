use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    bones::{map_legacy_bones, map_revised_bones},
    expressions::{bind_legacy_expressions, bind_revised_expressions},
    license::extract_license,
    physics::{
        build_legacy_colliders, build_legacy_springs, build_revised_collider_groups,
        build_revised_colliders,
    },
    types::{
        AssetContext, ColliderGroup, ColliderGroupEntry, ConvertOptions, ExpressionGroup,
        HumanoidBoneTable, LicenseRecord, SpringChain,
    },
};
use crate::scene::LegacyMetadata;

// ─── Version gate ─────────────────────────────────────────────────────────────

/// Avatar schema generation of the imported document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    /// `VRM` extension (0.x).
    #[default]
    Legacy,
    /// `VRMC_vrm` / `VRMC_springBone` extensions (1.0).
    Revised,
}

impl SchemaVersion {
    pub fn is_revised(self) -> bool {
        self == SchemaVersion::Revised
    }

    /// Pick the schema from the document's top-level extensions.
    pub fn detect(json: &Value) -> Self {
        if json.pointer("/extensions/VRMC_vrm").is_some() {
            SchemaVersion::Revised
        } else {
            SchemaVersion::Legacy
        }
    }
}

// ─── Adapters ─────────────────────────────────────────────────────────────────

/// Schema-specific extraction of the normalized output tables.
pub trait SchemaAdapter {
    fn humanoid_bones(&self) -> HumanoidBoneTable;
    fn expression_groups(&self) -> Vec<ExpressionGroup>;
    fn springs(&self) -> Vec<SpringChain>;
    /// Per-node collider entries and the named groups referencing them.
    fn colliders(&self) -> (Vec<ColliderGroupEntry>, Vec<ColliderGroup>);
    fn license(&self) -> LicenseRecord;
}

/// Reads the importer's metadata for `VRM` 0.x documents.
#[derive(Debug, Clone, Copy)]
pub struct LegacyAdapter<'a> {
    json: Option<&'a Value>,
    meta: &'a LegacyMetadata,
    assets: Option<&'a AssetContext>,
    options: &'a ConvertOptions,
}

impl<'a> LegacyAdapter<'a> {
    pub fn new(
        json: Option<&'a Value>,
        meta: &'a LegacyMetadata,
        assets: Option<&'a AssetContext>,
        options: &'a ConvertOptions,
    ) -> Self {
        Self {
            json,
            meta,
            assets,
            options,
        }
    }
}

impl SchemaAdapter for LegacyAdapter<'_> {
    fn humanoid_bones(&self) -> HumanoidBoneTable {
        map_legacy_bones(self.meta)
    }

    fn expression_groups(&self) -> Vec<ExpressionGroup> {
        bind_legacy_expressions(
            self.meta,
            self.json,
            self.assets,
            self.options.strict_morph_target_names,
        )
    }

    fn springs(&self) -> Vec<SpringChain> {
        build_legacy_springs(self.meta)
    }

    fn colliders(&self) -> (Vec<ColliderGroupEntry>, Vec<ColliderGroup>) {
        (build_legacy_colliders(self.meta), Vec::new())
    }

    fn license(&self) -> LicenseRecord {
        extract_license(&self.meta.license, self.assets.map(|a| a.textures.as_slice()))
    }
}

/// Reads `VRMC_vrm` 1.0 documents directly from the JSON tree.
#[derive(Debug, Clone, Copy)]
pub struct RevisedAdapter<'a> {
    json: &'a Value,
    meta: &'a LegacyMetadata,
    assets: Option<&'a AssetContext>,
    options: &'a ConvertOptions,
}

impl<'a> RevisedAdapter<'a> {
    pub fn new(
        json: &'a Value,
        meta: &'a LegacyMetadata,
        assets: Option<&'a AssetContext>,
        options: &'a ConvertOptions,
    ) -> Self {
        Self {
            json,
            meta,
            assets,
            options,
        }
    }
}

impl SchemaAdapter for RevisedAdapter<'_> {
    fn humanoid_bones(&self) -> HumanoidBoneTable {
        map_revised_bones(self.json)
    }

    fn expression_groups(&self) -> Vec<ExpressionGroup> {
        bind_revised_expressions(self.json, self.options.strict_morph_target_names)
    }

    fn springs(&self) -> Vec<SpringChain> {
        // Spring chains are not assembled for the revised schema yet.
        log::debug!("revised schema: spring chain assembly is not supported, skipping");
        Vec::new()
    }

    fn colliders(&self) -> (Vec<ColliderGroupEntry>, Vec<ColliderGroup>) {
        (
            build_revised_colliders(self.json),
            build_revised_collider_groups(self.json),
        )
    }

    fn license(&self) -> LicenseRecord {
        extract_license(&self.meta.license, self.assets.map(|a| a.textures.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_vrmc_extension_when_detecting_then_revised_schema_is_selected() {
        let revised = serde_json::json!({"extensions": {"VRMC_vrm": {}}});
        let legacy = serde_json::json!({"extensions": {"VRM": {}}});

        assert_eq!(SchemaVersion::detect(&revised), SchemaVersion::Revised);
        assert_eq!(SchemaVersion::detect(&legacy), SchemaVersion::Legacy);
        assert!(SchemaVersion::Revised.is_revised());
        assert!(!SchemaVersion::Legacy.is_revised());
    }

    #[test]
    fn given_revised_document_when_reading_springs_then_chain_list_is_empty() {
        let json = serde_json::json!({
            "extensions": {"VRMC_springBone": {"springs": [{"joints": [{"node": 0}]}]}}
        });
        let meta = LegacyMetadata::default();
        let options = ConvertOptions::default();

        let adapter = RevisedAdapter::new(&json, &meta, None, &options);
        assert!(adapter.springs().is_empty());
    }
}
