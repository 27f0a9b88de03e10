use nalgebra::Vector3;
use serde_json::Value;

/// Characters that cannot appear in a registered asset name.
const INVALID_ASSET_NAME_CHARACTERS: &str = "\"' ,/.:|&!~\n\r\t@#(){}[]=;^%$`+";

// ─── Scalar readers ───────────────────────────────────────────────────────────

/// Return the array stored under `key`, or an empty slice.
pub(crate) fn array_member<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

pub(crate) fn usize_member(value: &Value, key: &str) -> Option<usize> {
    value
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|number| usize::try_from(number).ok())
}

pub(crate) fn f32_member(value: &Value, key: &str, default: f32) -> f32 {
    value
        .get(key)
        .and_then(Value::as_f64)
        .map(|number| number as f32)
        .unwrap_or(default)
}

pub(crate) fn bool_member(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

pub(crate) fn string_member(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Read a `[x, y, z]` array; missing lanes read as zero.
pub(crate) fn vec3_array(value: Option<&Value>) -> Vector3<f32> {
    let lanes = value
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    let lane = |index: usize| {
        lanes
            .get(index)
            .and_then(Value::as_f64)
            .map(|number| number as f32)
            .unwrap_or(0.0)
    };
    Vector3::new(lane(0), lane(1), lane(2))
}

/// Read a `{ "x": .., "y": .., "z": .. }` object; missing members read as zero.
pub(crate) fn vec3_object(value: Option<&Value>) -> Vector3<f32> {
    match value {
        Some(object) => Vector3::new(
            f32_member(object, "x", 0.0),
            f32_member(object, "y", 0.0),
            f32_member(object, "z", 0.0),
        ),
        None => Vector3::zeros(),
    }
}

/// Read a 4-lane float array as RGBA; missing lanes read as zero.
pub(crate) fn rgba_array(value: Option<&Value>) -> [f32; 4] {
    let mut color = [0.0f32; 4];
    if let Some(lanes) = value.and_then(Value::as_array) {
        for (slot, lane) in color.iter_mut().zip(lanes) {
            *slot = lane.as_f64().unwrap_or(0.0) as f32;
        }
    }
    color
}

// ─── Scene tree lookups ──────────────────────────────────────────────────────

pub(crate) fn node_name(json: &Value, node_index: usize) -> Option<&str> {
    array_member(json, "nodes")
        .get(node_index)?
        .get("name")?
        .as_str()
}

/// Mesh index declared by a node.
pub(crate) fn node_mesh(json: &Value, node_index: usize) -> Option<usize> {
    usize_member(array_member(json, "nodes").get(node_index)?, "mesh")
}

/// Name of the first node that instantiates `mesh_index`.
pub(crate) fn first_node_name_using_mesh(json: &Value, mesh_index: usize) -> Option<&str> {
    array_member(json, "nodes")
        .iter()
        .find(|node| usize_member(node, "mesh") == Some(mesh_index))
        .and_then(|node| node.get("name"))
        .and_then(Value::as_str)
}

pub(crate) fn mesh_count(json: &Value) -> usize {
    array_member(json, "meshes").len()
}

pub(crate) fn mesh_name(json: &Value, mesh_index: usize) -> Option<&str> {
    array_member(json, "meshes")
        .get(mesh_index)?
        .get("name")?
        .as_str()
}

/// Map a declared glTF mesh index to the importer's logical mesh index.
///
/// The importer emits one logical mesh per primitive, so every earlier mesh
/// with a `primitives` array shifts the index by `primitive count - 1`.
/// Returns `None` when the shifted index does not fit in `usize`.
pub(crate) fn logical_mesh_index(json: &Value, declared_mesh_index: usize) -> Option<usize> {
    let offset: usize = array_member(json, "meshes")
        .iter()
        .take(declared_mesh_index)
        .filter_map(|mesh| mesh.get("primitives").and_then(Value::as_array))
        .map(|primitives| primitives.len().saturating_sub(1))
        .sum();
    declared_mesh_index.checked_add(offset)
}

/// Resolve a morph target name for `shape_index` on `mesh_index`.
///
/// Mesh-level `extras.targetNames` is read first; a primitive-level
/// `extras.targetNames` overrides it when present.
pub(crate) fn morph_target_name(
    json: &Value,
    mesh_index: usize,
    shape_index: usize,
) -> Option<&str> {
    let mesh = array_member(json, "meshes").get(mesh_index)?;

    let mesh_level = target_name_at(mesh, shape_index);
    let primitive_level = array_member(mesh, "primitives")
        .iter()
        .find(|primitive| primitive.pointer("/extras/targetNames").is_some())
        .and_then(|primitive| target_name_at(primitive, shape_index));

    primitive_level.or(mesh_level)
}

fn target_name_at(owner: &Value, shape_index: usize) -> Option<&str> {
    owner
        .pointer("/extras/targetNames")?
        .as_array()?
        .get(shape_index)?
        .as_str()
}

// ─── Names ────────────────────────────────────────────────────────────────────

/// Replace characters that are invalid in asset names with `_`.
pub fn normalize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if INVALID_ASSET_NAME_CHARACTERS.contains(c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_split_meshes_when_computing_logical_index_then_earlier_primitives_are_counted() {
        let json = serde_json::json!({
            "meshes": [
                {"primitives": [{}, {}]},
                {"primitives": [{}]},
                {"primitives": [{}, {}, {}]}
            ]
        });

        assert_eq!(logical_mesh_index(&json, 0), Some(0));
        assert_eq!(logical_mesh_index(&json, 1), Some(2));
        assert_eq!(logical_mesh_index(&json, 2), Some(3));
    }

    #[test]
    fn given_huge_declared_mesh_when_computing_logical_index_then_it_is_unresolvable() {
        let json = serde_json::json!({
            "meshes": [{"primitives": [{}, {}]}]
        });

        assert_eq!(logical_mesh_index(&json, usize::MAX), None);
    }

    #[test]
    fn given_mesh_without_primitives_when_computing_logical_index_then_it_adds_no_offset() {
        let json = serde_json::json!({
            "meshes": [
                {"name": "bare"},
                {"primitives": [{}, {}]},
                {"primitives": [{}]}
            ]
        });

        assert_eq!(logical_mesh_index(&json, 2), Some(3));
    }

    #[test]
    fn given_mesh_and_primitive_target_names_when_resolving_then_primitive_level_wins() {
        let json = serde_json::json!({
            "meshes": [{
                "extras": {"targetNames": ["MeshSmile", "MeshBlink"]},
                "primitives": [
                    {"extras": {"targetNames": ["PrimSmile"]}}
                ]
            }]
        });

        assert_eq!(morph_target_name(&json, 0, 0), Some("PrimSmile"));
        assert_eq!(morph_target_name(&json, 0, 1), Some("MeshBlink"));
        assert_eq!(morph_target_name(&json, 0, 2), None);
        assert_eq!(morph_target_name(&json, 1, 0), None);
    }

    #[test]
    fn given_name_with_separators_when_normalizing_then_invalid_characters_become_underscores() {
        assert_eq!(normalize_file_name("Face.M_00 (Smile)"), "Face_M_00__Smile_");
        assert_eq!(normalize_file_name("Body_Skin"), "Body_Skin");
    }

    #[test]
    fn given_short_arrays_when_reading_vectors_then_missing_lanes_are_zero() {
        let value = serde_json::json!([1.0, 2.0]);
        assert_eq!(vec3_array(Some(&value)), Vector3::new(1.0, 2.0, 0.0));
        assert_eq!(rgba_array(Some(&value)), [1.0, 2.0, 0.0, 0.0]);
        assert_eq!(vec3_array(None), Vector3::zeros());
    }
}
