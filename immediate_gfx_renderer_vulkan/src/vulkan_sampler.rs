/// SamplerCache - VkSampler per SamplerType, created on first use

use ash::vk;
use immediate_gfx::igfx::resource::SamplerType;
use immediate_gfx::igfx::Result;
use immediate_gfx::igfx_err;
use std::collections::HashMap;

pub(crate) struct SamplerCache {
    cache: HashMap<SamplerType, vk::Sampler>,
}

pub(crate) fn sampler_create_info(sampler_type: SamplerType) -> vk::SamplerCreateInfo<'static> {
    let (filter, mipmap, address) = match sampler_type {
        SamplerType::LinearRepeat => (
            vk::Filter::LINEAR,
            vk::SamplerMipmapMode::LINEAR,
            vk::SamplerAddressMode::REPEAT,
        ),
        SamplerType::NearestClamp => (
            vk::Filter::NEAREST,
            vk::SamplerMipmapMode::NEAREST,
            vk::SamplerAddressMode::CLAMP_TO_EDGE,
        ),
    };

    vk::SamplerCreateInfo::default()
        .mag_filter(filter)
        .min_filter(filter)
        .mipmap_mode(mipmap)
        .address_mode_u(address)
        .address_mode_v(address)
        .address_mode_w(address)
        .mip_lod_bias(0.0)
        .min_lod(0.0)
        .max_lod(vk::LOD_CLAMP_NONE)
        .anisotropy_enable(false)
        .max_anisotropy(1.0)
        .compare_enable(false)
        .compare_op(vk::CompareOp::ALWAYS)
        .border_color(vk::BorderColor::FLOAT_OPAQUE_BLACK)
        .unnormalized_coordinates(false)
}

impl SamplerCache {
    pub fn new() -> Self {
        Self { cache: HashMap::new() }
    }

    pub fn get(&mut self, device: &ash::Device, sampler_type: SamplerType) -> Result<vk::Sampler> {
        if let Some(&sampler) = self.cache.get(&sampler_type) {
            return Ok(sampler);
        }

        let sampler = unsafe {
            device
                .create_sampler(&sampler_create_info(sampler_type), None)
                .map_err(|e| {
                    igfx_err!("igfx::vulkan", "Failed to create {:?} sampler: {:?}", sampler_type, e)
                })?
        };
        self.cache.insert(sampler_type, sampler);
        Ok(sampler)
    }

    /// Destroy every cached sampler; must run while the device is alive
    pub fn destroy(&mut self, device: &ash::Device) {
        for (_, sampler) in self.cache.drain() {
            unsafe { device.destroy_sampler(sampler, None) };
        }
    }
}
