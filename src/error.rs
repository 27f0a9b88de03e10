use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetaError {
    #[error("no avatar metadata is attached to the scene")]
    MissingMetadata,

    #[error("the revised schema requires the glTF JSON document")]
    MissingDocument,

    #[error("input is not a GLB container: {0}")]
    Glb(#[from] gltf::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Filesystem error: {0}")]
    Io(#[from] std::io::Error),
}
