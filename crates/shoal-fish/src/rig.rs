//! Bone chain and skin outline for one fish.
//!
//! Bones live in an arena and refer to their parent by index. A bone is
//! always pushed after its parent, so one forward pass over the arena
//! recomputes every global transform.

use anyhow::{bail, Result};
use shoal_config::RigConfig;
use shoal_core::easing::quad_ease_out;
use shoal_core::geometry::{lerp, rotate_around, Vec2};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoneTransform {
    pub x: f64,
    pub y: f64,
    /// Radians.
    pub rotation: f64,
}

impl BoneTransform {
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

#[derive(Debug, Clone)]
pub struct Bone {
    pub local: BoneTransform,
    pub global: BoneTransform,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl Bone {
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }
}

#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    bones: Vec<Bone>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bone at `(x, y)` in its parent's space and return its index.
    pub fn add_bone(&mut self, parent: Option<usize>, x: f64, y: f64) -> Result<usize> {
        let index = self.bones.len();
        if let Some(p) = parent {
            let Some(parent_bone) = self.bones.get_mut(p) else {
                bail!("unknown parent bone: {}", p);
            };
            parent_bone.children.push(index);
        }
        let local = BoneTransform { x, y, rotation: 0.0 };
        self.bones.push(Bone {
            local,
            global: local,
            parent,
            children: Vec::new(),
        });
        Ok(index)
    }

    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Set a bone's local rotation. Out of range indices are ignored.
    pub fn set_local_rotation(&mut self, index: usize, radians: f64) {
        if let Some(bone) = self.bones.get_mut(index) {
            bone.local.rotation = radians;
        }
    }

    /// Recompute every global transform from the roots down.
    pub fn update_transforms(&mut self) {
        for i in 0..self.bones.len() {
            let local = self.bones[i].local;
            let global = match self.bones[i].parent {
                Some(p) => {
                    let parent = self.bones[p].global;
                    let offset = rotate_around(local.position(), Vec2::ZERO, parent.rotation);
                    BoneTransform {
                        x: parent.x + offset.x,
                        y: parent.y + offset.y,
                        rotation: parent.rotation + local.rotation,
                    }
                }
                None => local,
            };
            self.bones[i].global = global;
        }
    }
}

/// The fish body: a spine running from the head along -y, each joint
/// carrying a left and right skin bone, ending in a single tip.
#[derive(Debug, Clone)]
pub struct Rig {
    skeleton: Skeleton,
    /// Articulated spine bones, head first. The tip is not included.
    spine: Vec<usize>,
    tip: usize,
    /// Outline order: tip, left side tail to head, right side head to tail.
    skin: Vec<usize>,
}

impl Rig {
    pub fn new(config: &RigConfig) -> Result<Self> {
        let count = config.spine_bones;
        if count == 0 {
            bail!("rig needs at least one spine bone");
        }
        let mut skeleton = Skeleton::new();
        let mut spine = Vec::with_capacity(count);
        let mut left = Vec::with_capacity(count);
        let mut right = Vec::with_capacity(count);
        let mut previous_scale = 0.0;
        let mut parent = None;
        let mut tip = 0;

        for i in 0..=count {
            let scale = quad_ease_out(i as f64 / count as f64);
            let segment = (scale - previous_scale) * config.fish_height;
            previous_scale = scale;
            let half_width = (1.0 - scale) * config.fish_width * 0.5;

            let bone = skeleton.add_bone(parent, 0.0, -segment)?;
            if i < count {
                left.push(skeleton.add_bone(Some(bone), -half_width, 0.0)?);
                right.push(skeleton.add_bone(Some(bone), half_width, 0.0)?);
                spine.push(bone);
            } else {
                tip = bone;
            }
            parent = Some(bone);
        }

        let mut skin = Vec::with_capacity(2 * count + 1);
        skin.push(tip);
        skin.extend(left.iter().rev());
        skin.extend(right.iter());

        let mut rig = Self {
            skeleton,
            spine,
            tip,
            skin,
        };
        rig.skeleton.update_transforms();
        Ok(rig)
    }

    pub fn spine_bone_count(&self) -> usize {
        self.spine.len()
    }

    pub fn skin_point_count(&self) -> usize {
        self.skin.len()
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn tip(&self) -> usize {
        self.tip
    }

    /// Local rotation in radians of spine bone `i`.
    pub fn spine_rotation(&self, i: usize) -> Option<f64> {
        let index = *self.spine.get(i)?;
        self.skeleton.bone(index).map(|b| b.local.rotation)
    }

    /// Pose every spine bone as `lerp(swing[i], turn, blend)` degrees, then
    /// refresh the global transforms.
    pub fn pose(&mut self, swing_degrees: &[f64], turn_degrees: f64, blend: f64) {
        for (i, &bone) in self.spine.iter().enumerate() {
            let swing = swing_degrees.get(i).copied().unwrap_or(0.0);
            let degrees = lerp(swing, turn_degrees, blend);
            self.skeleton.set_local_rotation(bone, degrees.to_radians());
        }
        self.skeleton.update_transforms();
    }

    /// Outline points in rig space, ready to be drawn as one closed path.
    pub fn skin_points(&self) -> Vec<Vec2> {
        self.skin
            .iter()
            .filter_map(|&i| self.skeleton.bone(i))
            .map(|b| b.global.position())
            .collect()
    }
}
