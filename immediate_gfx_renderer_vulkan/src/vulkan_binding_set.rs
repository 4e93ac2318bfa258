/// Binding sets - descriptor set layouts, pools and allocated sets
///
/// The three scope layouts are fixed, so one unified pipeline layout serves
/// every pipeline and every set stays compatible with every pipeline.

use ash::vk;
use immediate_gfx::igfx::device::NativeBindingSet;
use immediate_gfx::igfx::resource::{BindingScope, IMAGE_SAMPLER_SLOT, UNIFORM_BUFFER_SLOT};
use immediate_gfx::igfx::{Error, Result};
use immediate_gfx::{igfx_err, igfx_info};
use std::any::Any;

/// An allocated descriptor set; freed with its pool
pub struct BindingSet {
    pub(crate) descriptor_set: vk::DescriptorSet,
    pub(crate) scope: BindingScope,
}

impl NativeBindingSet for BindingSet {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Descriptor bindings of one scope's set layout
pub(crate) fn scope_bindings(scope: BindingScope) -> Vec<vk::DescriptorSetLayoutBinding<'static>> {
    let mut bindings = vec![vk::DescriptorSetLayoutBinding::default()
        .binding(UNIFORM_BUFFER_SLOT)
        .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
        .descriptor_count(1)
        .stage_flags(vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT)];

    if scope.has_image_sampler() {
        bindings.push(
            vk::DescriptorSetLayoutBinding::default()
                .binding(IMAGE_SAMPLER_SLOT)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .descriptor_count(1)
                .stage_flags(vk::ShaderStageFlags::FRAGMENT),
        );
    }
    bindings
}

/// The three set layouts and the pipeline layout built from them
pub(crate) struct BindingLayouts {
    /// Indexed by `BindingScope::set_index()`
    pub set_layouts: [vk::DescriptorSetLayout; 3],
    pub pipeline_layout: vk::PipelineLayout,
}

impl BindingLayouts {
    pub fn new(device: &ash::Device) -> Result<Self> {
        let mut set_layouts = [vk::DescriptorSetLayout::null(); 3];
        for scope in BindingScope::ALL {
            let bindings = scope_bindings(scope);
            let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
            let layout = unsafe { device.create_descriptor_set_layout(&create_info, None) };
            match layout {
                Ok(layout) => set_layouts[scope.set_index() as usize] = layout,
                Err(e) => {
                    Self::destroy_set_layouts(device, &set_layouts);
                    return Err(igfx_err!(
                        "igfx::vulkan",
                        "Failed to create {:?} descriptor set layout: {:?}",
                        scope, e
                    ));
                }
            }
        }

        let layout_create_info = vk::PipelineLayoutCreateInfo::default().set_layouts(&set_layouts);
        let pipeline_layout = match unsafe { device.create_pipeline_layout(&layout_create_info, None) } {
            Ok(layout) => layout,
            Err(e) => {
                Self::destroy_set_layouts(device, &set_layouts);
                return Err(igfx_err!("igfx::vulkan", "Failed to create pipeline layout: {:?}", e));
            }
        };

        Ok(Self { set_layouts, pipeline_layout })
    }

    pub fn set_layout(&self, scope: BindingScope) -> vk::DescriptorSetLayout {
        self.set_layouts[scope.set_index() as usize]
    }

    fn destroy_set_layouts(device: &ash::Device, set_layouts: &[vk::DescriptorSetLayout]) {
        for &layout in set_layouts {
            if layout != vk::DescriptorSetLayout::null() {
                unsafe { device.destroy_descriptor_set_layout(layout, None) };
            }
        }
    }

    /// Must run while the device is alive
    pub fn destroy(&mut self, device: &ash::Device) {
        unsafe { device.destroy_pipeline_layout(self.pipeline_layout, None) };
        Self::destroy_set_layouts(device, &self.set_layouts);
        self.pipeline_layout = vk::PipelineLayout::null();
        self.set_layouts = [vk::DescriptorSetLayout::null(); 3];
    }
}

/// Descriptor pools; a new pool is added when the current one is exhausted
pub(crate) struct DescriptorPools {
    pools: Vec<vk::DescriptorPool>,
    sets_per_pool: u32,
}

impl DescriptorPools {
    pub fn new(device: &ash::Device, sets_per_pool: u32) -> Result<Self> {
        if sets_per_pool == 0 {
            return Err(Error::InitializationFailed("descriptor pool size must be non-zero".to_string()));
        }
        let pool = Self::create_pool(device, sets_per_pool)?;
        Ok(Self { pools: vec![pool], sets_per_pool })
    }

    fn create_pool(device: &ash::Device, sets_per_pool: u32) -> Result<vk::DescriptorPool> {
        let pool_sizes = [
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::UNIFORM_BUFFER,
                descriptor_count: sets_per_pool,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                descriptor_count: sets_per_pool,
            },
        ];
        let info = vk::DescriptorPoolCreateInfo::default()
            .pool_sizes(&pool_sizes)
            .max_sets(sets_per_pool);

        unsafe {
            device
                .create_descriptor_pool(&info, None)
                .map_err(|e| igfx_err!("igfx::vulkan", "Failed to create descriptor pool: {:?}", e))
        }
    }

    pub fn allocate(&mut self, device: &ash::Device, layout: vk::DescriptorSetLayout) -> Result<vk::DescriptorSet> {
        let layouts = [layout];
        let current = *self
            .pools
            .last()
            .ok_or_else(|| Error::InvalidState("descriptor pools already destroyed".to_string()))?;
        let allocate_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(current)
            .set_layouts(&layouts);

        let sets = match unsafe { device.allocate_descriptor_sets(&allocate_info) } {
            Ok(sets) => sets,
            Err(vk::Result::ERROR_OUT_OF_POOL_MEMORY) | Err(vk::Result::ERROR_FRAGMENTED_POOL) => {
                let pool = Self::create_pool(device, self.sets_per_pool)?;
                self.pools.push(pool);
                igfx_info!(
                    "igfx::vulkan",
                    "Descriptor pool exhausted, created new pool (total: {})",
                    self.pools.len()
                );
                let retry_info = vk::DescriptorSetAllocateInfo::default()
                    .descriptor_pool(pool)
                    .set_layouts(&layouts);
                unsafe { device.allocate_descriptor_sets(&retry_info) }.map_err(|e| {
                    igfx_err!(
                        "igfx::vulkan",
                        "Failed to allocate descriptor set after pool growth: {:?}",
                        e
                    )
                })?
            }
            Err(e) => {
                return Err(igfx_err!("igfx::vulkan", "Failed to allocate descriptor set: {:?}", e))
            }
        };

        sets.into_iter()
            .next()
            .ok_or_else(|| igfx_err!("igfx::vulkan", "vkAllocateDescriptorSets returned no set"))
    }

    pub fn destroy(&mut self, device: &ash::Device) {
        for pool in self.pools.drain(..) {
            unsafe { device.destroy_descriptor_pool(pool, None) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_and_view_sets_hold_one_uniform() {
        for scope in [BindingScope::Frame, BindingScope::View] {
            let bindings = scope_bindings(scope);
            assert_eq!(bindings.len(), 1);
            assert_eq!(bindings[0].binding, UNIFORM_BUFFER_SLOT);
            assert_eq!(bindings[0].descriptor_type, vk::DescriptorType::UNIFORM_BUFFER);
        }
    }

    #[test]
    fn test_object_set_adds_image_sampler() {
        let bindings = scope_bindings(BindingScope::Object);
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[1].binding, IMAGE_SAMPLER_SLOT);
        assert_eq!(bindings[1].descriptor_type, vk::DescriptorType::COMBINED_IMAGE_SAMPLER);
        assert_eq!(bindings[1].stage_flags, vk::ShaderStageFlags::FRAGMENT);
    }
}
