//! 骨骼管理器

use glam::{Mat4, Quat};
use std::collections::HashMap;

use super::{Bone, TargetSkeleton};

/// 骨骼管理器
///
/// 外部模型加载器按顺序 `add_bone`，然后调用一次 `build_hierarchy`。
pub struct BoneManager {
    bones: Vec<Bone>,
    name_to_index: HashMap<String, usize>,
    /// 按层级深度排序（父骨骼在前）
    sorted_indices: Vec<usize>,
    skinning_matrices: Vec<Mat4>,
}

impl BoneManager {
    pub fn new() -> Self {
        Self {
            bones: Vec::new(),
            name_to_index: HashMap::new(),
            sorted_indices: Vec::new(),
            skinning_matrices: Vec::new(),
        }
    }

    /// 添加骨骼，返回其索引
    pub fn add_bone(&mut self, bone: Bone) -> usize {
        let index = self.bones.len();
        self.name_to_index.insert(bone.name.clone(), index);
        self.bones.push(bone);
        index
    }

    /// 构建骨骼层级并计算逆绑定矩阵
    pub fn build_hierarchy(&mut self) {
        let bone_count = self.bones.len();
        if bone_count == 0 {
            return;
        }

        // 父索引越界的骨骼按根骨骼处理
        for i in 0..bone_count {
            let parent = self.bones[i].parent_index;
            if parent >= bone_count as i32 || parent == i as i32 {
                log::warn!("[骨骼] '{}' 的父索引 {} 无效，按根骨骼处理", self.bones[i].name, parent);
                self.bones[i].parent_index = -1;
            }
        }

        let depths: Vec<usize> = (0..bone_count).map(|i| self.depth_of(i)).collect();
        self.sorted_indices = (0..bone_count).collect();
        self.sorted_indices.sort_by_key(|&i| depths[i]);

        // 绑定姿态：全局 = 父全局 * 静止本地
        for &idx in &self.sorted_indices.clone() {
            let rest = self.bones[idx].rest_transform();
            let global = match self.parent_of(idx) {
                Some(parent) => self.bones[parent].global_transform * rest,
                None => rest,
            };
            let bone = &mut self.bones[idx];
            bone.local_transform = rest;
            bone.global_transform = global;
            bone.inverse_bind_matrix = global.inverse();
        }

        // 初始状态下：skinning_matrix = global * inverse_bind = I
        self.skinning_matrices = self.bones.iter().map(Bone::get_skinning_matrix).collect();
    }

    /// 沿父链计算深度；出现环时截断
    fn depth_of(&self, index: usize) -> usize {
        let mut depth = 0;
        let mut current = index;
        while let Some(parent) = self.parent_of(current) {
            depth += 1;
            if depth > self.bones.len() {
                log::warn!("[骨骼] '{}' 的父链存在环", self.bones[index].name);
                break;
            }
            current = parent;
        }
        depth
    }

    fn parent_of(&self, index: usize) -> Option<usize> {
        let parent = self.bones[index].parent_index;
        if parent >= 0 && (parent as usize) < self.bones.len() {
            Some(parent as usize)
        } else {
            None
        }
    }

    /// 通过名称查找骨骼
    pub fn find_bone_by_name(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// 获取骨骼数量
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// 获取骨骼
    pub fn get_bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    /// 获取可变骨骼引用
    pub fn get_bone_mut(&mut self, index: usize) -> Option<&mut Bone> {
        self.bones.get_mut(index)
    }

    /// 设置骨骼旋转（相对静止姿态）
    pub fn set_bone_rotation(&mut self, index: usize, rotation: Quat) {
        if let Some(bone) = self.bones.get_mut(index) {
            bone.set_rotation_relative(rotation);
        }
    }

    /// 所有骨骼回到静止姿态
    pub fn reset_all_rotations(&mut self) {
        for bone in &mut self.bones {
            bone.local_rotation = Quat::IDENTITY;
        }
    }

    /// 更新骨骼变换：先本地变换，再按层级顺序累乘全局变换
    pub fn update_transforms(&mut self) {
        if self.sorted_indices.len() != self.bones.len() {
            self.build_hierarchy();
        }

        for bone in &mut self.bones {
            bone.update_local_transform();
        }

        for i in 0..self.sorted_indices.len() {
            let idx = self.sorted_indices[i];
            let local = self.bones[idx].local_transform;
            self.bones[idx].global_transform = match self.parent_of(idx) {
                Some(parent) => self.bones[parent].global_transform * local,
                None => local,
            };
        }

        for (i, bone) in self.bones.iter().enumerate() {
            self.skinning_matrices[i] = bone.get_skinning_matrix();
        }
    }

    /// 获取全局变换
    pub fn get_global_transform(&self, index: usize) -> Mat4 {
        self.bones.get(index).map(|b| b.global_transform).unwrap_or(Mat4::IDENTITY)
    }

    /// 获取蒙皮矩阵数组
    pub fn get_skinning_matrices(&self) -> &[Mat4] {
        &self.skinning_matrices
    }
}

impl Default for BoneManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetSkeleton for BoneManager {
    fn set_local_rotation(&mut self, name: &str, rotation: Quat) -> bool {
        match self.find_bone_by_name(name) {
            Some(index) => {
                self.set_bone_rotation(index, rotation);
                true
            }
            None => false,
        }
    }

    fn local_rotation(&self, name: &str) -> Option<Quat> {
        self.find_bone_by_name(name)
            .and_then(|index| self.bones.get(index))
            .map(Bone::rotation)
    }

    fn skinning_transform(&self, name: &str) -> Option<Mat4> {
        self.find_bone_by_name(name)
            .and_then(|index| self.skinning_matrices.get(index))
            .copied()
    }

    fn update(&mut self) {
        self.update_transforms();
    }
}
