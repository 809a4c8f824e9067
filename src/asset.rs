pub mod gltf_file;
mod types;

// Re-exports
pub use types::{
    AssetAnimation, AssetChannel, AssetModel, AssetNode, AssetSkin,
    ImportError, TargetPath,
};
