use super::types::{AnimationClip, ChannelValues, Skeleton};
use nalgebra_glm as glm;

/// Helper to calculate the parameter used for interpolation
fn weight(start: f32, end: f32, current: f32) -> f32 {
    const EPSILON: f32 = 0.000_001;
    ((current - start) / (end - start).max(EPSILON)).clamp(0.0f32, 1.0f32)
}

/// Samples keyframes at `time`. Times must be strictly increasing. Outside
/// the key range the nearest end key is held. No keys gives `neutral`.
fn sample<T, F>(times: &[f32], values: &[T], time: f32, neutral: T, mix: F) -> T
where
    T: Copy,
    F: Fn(&T, &T, f32) -> T,
{
    let count = times.len().min(values.len());
    if count == 0 {
        return neutral;
    }
    if count == 1 || time <= times[0] {
        return values[0];
    }
    if time >= times[count - 1] {
        return values[count - 1];
    }

    // First key strictly after `time`, which is in 1..count here
    let next = times[..count].partition_point(|&t| t <= time);
    let prev = next - 1;
    let t = weight(times[prev], times[next], time);
    if t == 0.0 {
        return values[prev];
    }
    mix(&values[prev], &values[next], t)
}

/// Component-wise linear interpolation
#[must_use]
pub fn lerp(a: &glm::Vec3, b: &glm::Vec3, t: f32) -> glm::Vec3 {
    a * (1.0 - t) + b * t
}

/// Spherical interpolation along the shorter arc. Nearly parallel inputs
/// use a normalized lerp instead.
#[must_use]
pub fn slerp(a: &glm::Quat, b: &glm::Quat, t: f32) -> glm::Quat {
    const EPSILON: f32 = 0.0005;
    let mut cos_theta = glm::quat_dot(a, b);
    let b = if cos_theta < 0.0 {
        cos_theta = -cos_theta;
        -*b
    } else {
        *b
    };

    if cos_theta > 1.0 - EPSILON {
        return glm::quat_normalize(&(*a * (1.0 - t) + b * t));
    }

    let theta = cos_theta.acos();
    let sin_theta = theta.sin();
    let wa = ((1.0 - t) * theta).sin() / sin_theta;
    let wb = (t * theta).sin() / sin_theta;
    *a * wa + b * wb
}

#[must_use]
pub fn sample_vec3(
    times: &[f32],
    values: &[glm::Vec3],
    time: f32,
    neutral: glm::Vec3,
) -> glm::Vec3 {
    sample(times, values, time, neutral, lerp)
}

#[must_use]
pub fn sample_quat(times: &[f32], values: &[glm::Quat], time: f32) -> glm::Quat {
    sample(times, values, time, glm::Quat::identity(), slerp)
}

/// Local translation, rotation and scale for every joint of a skeleton
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pose {
    pub translations: Vec<glm::Vec3>,
    pub rotations: Vec<glm::Quat>,
    pub scales: Vec<glm::Vec3>,
}

impl Pose {
    /// The bind pose components of every joint
    #[must_use]
    pub fn bind(skeleton: &Skeleton) -> Self {
        Self {
            translations: skeleton.joints.iter().map(|j| j.base_translation).collect(),
            rotations: skeleton.joints.iter().map(|j| j.base_rotation).collect(),
            scales: skeleton.joints.iter().map(|j| j.base_scale).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.translations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }

    /// Local transform of one joint, translation then rotation then scale
    #[must_use]
    pub fn local_transform(&self, joint: usize) -> glm::Mat4 {
        glm::translation(&self.translations[joint])
            * glm::quat_to_mat4(&self.rotations[joint])
            * glm::scaling(&self.scales[joint])
    }

    #[must_use]
    pub fn local_transforms(&self) -> Vec<glm::Mat4> {
        (0..self.len()).map(|j| self.local_transform(j)).collect()
    }
}

/// Evaluates a clip at `time`. Components the clip doesn't animate keep
/// their bind pose value.
#[must_use]
pub fn sample_pose(skeleton: &Skeleton, clip: &AnimationClip, time: f32) -> Pose {
    let mut pose = Pose::bind(skeleton);
    for channel in &clip.channels {
        let joint = channel.joint;
        if joint >= pose.len() || channel.times.is_empty() {
            continue;
        }
        let times = &channel.times;
        match &channel.values {
            ChannelValues::Translation(v) => {
                pose.translations[joint] =
                    sample_vec3(times, v, time, glm::Vec3::zeros());
            }
            ChannelValues::Rotation(q) => {
                pose.rotations[joint] = sample_quat(times, q, time);
            }
            ChannelValues::Scale(v) => {
                pose.scales[joint] =
                    sample_vec3(times, v, time, glm::vec3(1.0, 1.0, 1.0));
            }
        }
    }
    pose
}

/// Poses the skeleton from a clip at an arbitrary timestamp and updates its
/// global transforms and palette
pub fn animate(skeleton: &mut Skeleton, clip: &AnimationClip, time: f32) {
    let pose = sample_pose(skeleton, clip, time);
    skeleton.set_local_transforms(&pose.local_transforms());
    skeleton.resolve();
}
