use std::collections::HashMap;

use super::types::{UE4_MANNEQUIN_BONE_MAP, VrmMeta};

/// Translation from canonical humanoid bone names to another skeleton's
/// naming convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoneNameTable {
    /// Explicit canonical → external name pairs, matched case-insensitively.
    Mapped(Vec<(String, String)>),
    /// Every bound bone takes its canonical humanoid name.
    Canonical,
}

impl BoneNameTable {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Mapped(
            pairs
                .into_iter()
                .map(|(canonical, external)| (canonical.into(), external.into()))
                .collect(),
        )
    }

    pub fn ue4_mannequin() -> Self {
        Self::from_pairs(UE4_MANNEQUIN_BONE_MAP)
    }

    pub fn canonical() -> Self {
        Self::Canonical
    }

    /// Look up the external name for `canonical_bone`.
    pub fn translate(&self, canonical_bone: &str) -> Option<String> {
        match self {
            Self::Mapped(pairs) => pairs
                .iter()
                .find(|(canonical, _)| canonical.eq_ignore_ascii_case(canonical_bone))
                .map(|(_, external)| external.clone()),
            Self::Canonical => Some(canonical_bone.to_string()),
        }
    }
}

/// Return a deep copy of `meta` whose bones follow `table`.
///
/// Humanoid bone values are replaced first; the original node name → new
/// name pairs collected there are then applied to collider owners and spring
/// chain bones. Names without a translation are kept.
pub fn rename_bones(meta: &VrmMeta, table: &BoneNameTable) -> VrmMeta {
    let mut renamed = meta.clone();
    let mut node_renames = HashMap::<String, String>::new();

    for (bone, node_name) in renamed.humanoid_bone_table.iter_mut() {
        if node_name.is_empty() {
            continue;
        }
        if let Some(new_name) = table.translate(bone) {
            node_renames.insert(node_name.clone(), new_name.clone());
            *node_name = new_name;
        }
    }

    for entry in &mut renamed.collider_entries {
        if let Some(new_name) = node_renames.get(&entry.bone_name) {
            entry.bone_name = new_name.clone();
        }
    }

    for bone in renamed
        .springs
        .iter_mut()
        .flat_map(|spring| spring.bones.iter_mut())
    {
        if let Some(new_name) = node_renames.get(&bone.name) {
            bone.name = new_name.clone();
        }
    }

    renamed
}
