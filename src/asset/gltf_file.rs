// Some code inspired by
// https://github.com/KhronosGroup/glTF-Tutorials/

use super::types::{
    AssetAnimation, AssetChannel, AssetModel, AssetNode, AssetSkin,
    ImportError, TargetPath,
};
use crate::mn_error::MnError;
use gltf::{
    animation::{util::ReadOutputs, Interpolation},
    buffer::Data,
    scene::Transform,
    Document, Gltf,
};
use log::{debug, info, warn};
use std::{fs, io, path::Path};

fn load_impl<P>(path: P) -> Result<(Document, Vec<Data>), MnError>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let base = path.parent().unwrap_or_else(|| Path::new("./"));
    let file = fs::File::open(path)?;
    let reader = io::BufReader::new(file);
    let gltf = Gltf::from_reader(reader)?;
    let buffers = gltf::import_buffers(&gltf.document, Some(base), gltf.blob)?;

    // Some info
    info!(
        "{:?}, base path={:?}, buffer count={}",
        path,
        base,
        buffers.len(),
    );

    Ok((gltf.document, buffers))
}

/// Loads the parts of a glTF file (binary `.glb` or `.gltf` with external
/// buffers) needed for skeletal animation. Images are never decoded.
///
/// # Errors
/// May return `MnError`
pub fn load(path: &Path) -> Result<AssetModel, MnError> {
    let (document, buffers) = load_impl(path)?;
    convert(&document, &buffers)
}

/// Same as `load` but for a file already in memory. External buffers are
/// not supported here, so this is mainly useful for `.glb` data.
///
/// # Errors
/// May return `MnError`
pub fn load_slice(data: &[u8]) -> Result<AssetModel, MnError> {
    let gltf = Gltf::from_slice(data)?;
    let buffers = gltf::import_buffers(&gltf.document, None, gltf.blob)?;
    convert(&gltf.document, &buffers)
}

fn convert(document: &Document, buffers: &[Data]) -> Result<AssetModel, MnError> {
    let model = AssetModel {
        nodes: load_nodes(document),
        skins: load_skins(document, buffers),
        animations: load_animations(document, buffers)?,
    };
    info!(
        "nodes={}, skins={}, animations={}",
        model.nodes.len(),
        model.skins.len(),
        model.animations.len()
    );
    Ok(model)
}

fn load_nodes(document: &Document) -> Vec<AssetNode> {
    document
        .nodes()
        .map(|node| {
            let children = node.children().map(|c| c.index()).collect();
            let name = node.name().map(ToString::to_string);
            match node.transform() {
                Transform::Matrix { matrix } => AssetNode {
                    name,
                    matrix: Some(bytemuck::cast(matrix)),
                    children,
                    ..Default::default()
                },
                Transform::Decomposed {
                    translation,
                    rotation,
                    scale,
                } => AssetNode {
                    name,
                    matrix: None,
                    translation: Some(translation),
                    rotation: Some(rotation),
                    scale: Some(scale),
                    children,
                },
            }
        })
        .collect()
}

fn load_skins(document: &Document, buffers: &[Data]) -> Vec<AssetSkin> {
    document
        .skins()
        .map(|skin| {
            let reader = skin.reader(|x| Some(&buffers[x.index()]));
            let inverse_bind_matrices =
                reader.read_inverse_bind_matrices().map(|iter| {
                    iter.flat_map(|m| bytemuck::cast::<_, [f32; 16]>(m))
                        .collect::<Vec<f32>>()
                });
            if inverse_bind_matrices.is_none() {
                warn!("skin {} has no inverse bind matrices", skin.index());
            }
            let joints: Vec<usize> = skin.joints().map(|n| n.index()).collect();
            debug!("skin={} joints={:?}", skin.index(), joints);
            AssetSkin {
                name: skin.name().map(ToString::to_string),
                joints,
                inverse_bind_matrices,
            }
        })
        .collect()
}

/// Output values with one element per key. Cubic spline samplers store an
/// in-tangent, the value and an out-tangent for each key; only the value is
/// kept. `None` when the count doesn't fit the key count.
fn key_values(
    values: Vec<f32>,
    keys: usize,
    stride: usize,
    interpolation: Interpolation,
) -> Option<Vec<f32>> {
    if stride == 0 {
        return Some(values);
    }
    match interpolation {
        Interpolation::CubicSpline if values.len() == keys * stride * 3 => Some(
            values
                .chunks_exact(stride * 3)
                .flat_map(|k| k[stride..2 * stride].iter().copied())
                .collect(),
        ),
        Interpolation::Linear | Interpolation::Step
            if values.len() == keys * stride =>
        {
            Some(values)
        }
        _ => None,
    }
}

fn load_animations(
    document: &Document,
    buffers: &[Data],
) -> Result<Vec<AssetAnimation>, MnError> {
    let mut ret = Vec::new();
    for animation in document.animations() {
        debug!("animation name={:?}", animation.name());
        let mut channels = Vec::new();

        for (channel_index, channel) in animation.channels().enumerate() {
            let target = channel.target();
            let reader = channel.reader(|x| Some(&buffers[x.index()]));
            let times: Vec<f32> = reader
                .read_inputs()
                .ok_or_else(|| ImportError::NoSampler(animation.index()))?
                .collect();
            let outputs = reader
                .read_outputs()
                .ok_or_else(|| ImportError::NoSampler(animation.index()))?;

            let (path, values, stride): (_, Vec<f32>, usize) = match outputs {
                ReadOutputs::Translations(x) => {
                    (TargetPath::Translation, x.flatten().collect(), 3)
                }
                ReadOutputs::Rotations(x) => {
                    (TargetPath::Rotation, x.into_f32().flatten().collect(), 4)
                }
                ReadOutputs::Scales(x) => {
                    (TargetPath::Scale, x.flatten().collect(), 3)
                }
                ReadOutputs::MorphTargetWeights(x) => {
                    // Keyed by target count rather than by time, so no
                    // stride check is possible without the mesh
                    (TargetPath::MorphTargetWeights, x.into_f32().collect(), 0)
                }
            };
            let interpolation = channel.sampler().interpolation();
            let Some(values) = key_values(values, times.len(), stride, interpolation)
            else {
                warn!(
                    "animation {} channel {} has {} keys that don't match its {:?} values, skipped",
                    animation.index(),
                    channel_index,
                    times.len(),
                    interpolation
                );
                continue;
            };

            channels.push(AssetChannel {
                target_node: target.node().index(),
                path,
                times,
                values,
            });
        }

        // Store
        let name = animation.name().map_or_else(
            || format!("animation.{}", animation.index()),
            ToString::to_string,
        );
        ret.push(AssetAnimation { name, channels });
    }
    Ok(ret)
}
