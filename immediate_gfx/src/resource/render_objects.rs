/// Resource tables, structural caches and the device that backs them
///
/// `RenderObjects` is the single owner of everything the command context
/// reads or creates. The context borrows it mutably for each call, so there is
/// exactly one writer for caches and tracked layouts.

use std::sync::Arc;
use slotmap::SlotMap;
use crate::cache::{FramebufferDesc, ObjectCaches, PipelineDesc, RenderPassDesc};
use crate::error::{Error, Result};
use crate::graphics_device::{
    BufferDesc, FramebufferCreateInfo, GraphicsDevice, ImageDesc, NativeFramebuffer,
    NativePipeline, NativeRenderPass, PipelineCreateInfo, ShaderDesc,
};
use crate::resource::{
    BindingScope, BindingSet, BindingSetKey, Buffer, BufferKey, BufferUsage, Image, ImageFormat,
    ImageKey, ImageSurface, ImageUsage, Mesh, MeshKey, SamplerType, ShaderBinaries, ShaderKey,
    ShaderProgram, Vertex, ViewId, IMAGE_SAMPLER_SLOT, UNIFORM_BUFFER_SLOT,
};
use crate::{igfx_debug, igfx_error};

fn stale(kind: &str) -> Error {
    Error::InvalidResource(format!("stale {} handle", kind))
}

pub struct RenderObjects {
    images: SlotMap<ImageKey, Image>,
    buffers: SlotMap<BufferKey, Buffer>,
    meshes: SlotMap<MeshKey, Mesh>,
    shaders: SlotMap<ShaderKey, ShaderProgram>,
    binding_sets: SlotMap<BindingSetKey, BindingSet>,
    caches: ObjectCaches,
    next_view_id: u32,
    // Declared last: native objects above are released before the device
    device: Box<dyn GraphicsDevice>,
}

impl RenderObjects {
    pub fn new(device: Box<dyn GraphicsDevice>) -> Self {
        Self {
            images: SlotMap::with_key(),
            buffers: SlotMap::with_key(),
            meshes: SlotMap::with_key(),
            shaders: SlotMap::with_key(),
            binding_sets: SlotMap::with_key(),
            caches: ObjectCaches::new(),
            next_view_id: 0,
            device,
        }
    }

    pub fn device(&self) -> &dyn GraphicsDevice {
        self.device.as_ref()
    }

    pub fn device_mut(&mut self) -> &mut dyn GraphicsDevice {
        self.device.as_mut()
    }

    pub fn caches(&self) -> &ObjectCaches {
        &self.caches
    }

    fn allocate_view_id(&mut self) -> ViewId {
        let id = ViewId(self.next_view_id);
        self.next_view_id += 1;
        id
    }

    // ===== IMAGES =====

    /// Create a device-local image in layout Undefined
    pub fn create_image(
        &mut self,
        width: u32,
        height: u32,
        format: ImageFormat,
        usage: ImageUsage,
    ) -> Result<ImageKey> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidResource(format!(
                "image size must be non-zero, got {}x{}",
                width, height
            )));
        }
        if usage.is_empty() {
            return Err(Error::InvalidResource("image usage is empty".to_string()));
        }

        let native = self.device.create_image(&ImageDesc { width, height, format, usage })?;
        let view = self.allocate_view_id();
        let key = self
            .images
            .insert(Image::new(width, height, format, usage, ImageSurface { view, native }));
        igfx_debug!(
            "igfx::RenderObjects",
            "Created image {}x{} {:?} {:?} ({:?})",
            width, height, format, usage, view
        );
        Ok(key)
    }

    /// Wrap the swapchain's images into one presentable image
    pub fn create_presentable_image(&mut self) -> Result<ImageKey> {
        let presentable = self.device.presentable_images()?;
        let surfaces = presentable
            .images
            .into_iter()
            .map(|native| ImageSurface { view: self.allocate_view_id(), native })
            .collect::<Vec<_>>();
        let slot_count = surfaces.len();
        let image = Image::new_presentable(
            presentable.width,
            presentable.height,
            presentable.format,
            surfaces,
        )?;
        igfx_debug!(
            "igfx::RenderObjects",
            "Created presentable image {}x{} with {} slots",
            presentable.width, presentable.height, slot_count
        );
        Ok(self.images.insert(image))
    }

    pub fn image(&self, key: ImageKey) -> Result<&Image> {
        self.images.get(key).ok_or_else(|| stale("image"))
    }

    pub fn image_mut(&mut self, key: ImageKey) -> Result<&mut Image> {
        self.images.get_mut(key).ok_or_else(|| stale("image"))
    }

    // ===== BUFFERS =====

    pub fn create_buffer(&mut self, usage: BufferUsage, size: u64) -> Result<BufferKey> {
        if size == 0 {
            return Err(Error::InvalidResource("buffer size must be non-zero".to_string()));
        }
        let native = self.device.create_buffer(&BufferDesc { size, usage })?;
        Ok(self.buffers.insert(Buffer::new(usage, native)))
    }

    /// Create a buffer sized for `data` and fill it
    pub fn create_buffer_with_data(&mut self, usage: BufferUsage, data: &[u8]) -> Result<BufferKey> {
        let key = self.create_buffer(usage, data.len() as u64)?;
        self.buffer(key)?.write(0, data)?;
        Ok(key)
    }

    pub fn write_buffer(&self, key: BufferKey, offset: u64, data: &[u8]) -> Result<()> {
        self.buffer(key)?.write(offset, data)
    }

    pub fn buffer(&self, key: BufferKey) -> Result<&Buffer> {
        self.buffers.get(key).ok_or_else(|| stale("buffer"))
    }

    // ===== MESHES =====

    pub fn create_mesh(&mut self, vertices: &[Vertex], indices: &[u16]) -> Result<MeshKey> {
        if vertices.is_empty() || indices.is_empty() {
            return Err(Error::InvalidResource("mesh needs vertices and indices".to_string()));
        }
        if let Some(bad) = indices.iter().find(|&&i| usize::from(i) >= vertices.len()) {
            return Err(Error::InvalidResource(format!(
                "index {} out of range ({} vertices)",
                bad,
                vertices.len()
            )));
        }

        let vertex_buffer =
            self.create_buffer_with_data(BufferUsage::Vertex, bytemuck::cast_slice(vertices))?;
        let index_buffer =
            self.create_buffer_with_data(BufferUsage::Index, bytemuck::cast_slice(indices))?;
        Ok(self.meshes.insert(Mesh {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }))
    }

    pub fn mesh(&self, key: MeshKey) -> Result<&Mesh> {
        self.meshes.get(key).ok_or_else(|| stale("mesh"))
    }

    // ===== SHADERS =====

    pub fn create_shader_program(&mut self, name: &str, binaries: &ShaderBinaries) -> Result<ShaderKey> {
        let native = self.device.create_shader(&ShaderDesc {
            name,
            vertex_code: &binaries.vertex,
            fragment_code: &binaries.fragment,
        })?;
        Ok(self.shaders.insert(ShaderProgram::new(name.to_string(), native)))
    }

    pub fn shader(&self, key: ShaderKey) -> Result<&ShaderProgram> {
        self.shaders.get(key).ok_or_else(|| stale("shader"))
    }

    // ===== BINDING SETS =====

    pub fn allocate_binding_set(&mut self, scope: BindingScope) -> Result<BindingSetKey> {
        let native = self.device.allocate_binding_set(scope)?;
        Ok(self.binding_sets.insert(BindingSet::new(scope, native)))
    }

    pub fn binding_set(&self, key: BindingSetKey) -> Result<&BindingSet> {
        self.binding_sets.get(key).ok_or_else(|| stale("binding set"))
    }

    /// Point the uniform slot of `set` at `buffer`
    pub fn set_uniform_buffer(&mut self, set: BindingSetKey, slot: u32, buffer: BufferKey) -> Result<()> {
        if slot != UNIFORM_BUFFER_SLOT {
            return Err(Error::InvalidResource(format!("slot {} is not a uniform slot", slot)));
        }
        let native_set = self.binding_set(set)?.native().clone();
        let buffer = self.buffer(buffer)?;
        if buffer.usage() != BufferUsage::Uniform {
            return Err(Error::InvalidResource(format!(
                "{:?} buffer bound to a uniform slot",
                buffer.usage()
            )));
        }
        let native_buffer = buffer.native().clone();
        self.device.write_uniform_buffer(&native_set, slot, &native_buffer)
    }

    /// Point the image-sampler slot of an Object-scope set at `image`
    pub fn set_image_sampler(
        &mut self,
        set: BindingSetKey,
        slot: u32,
        sampler: SamplerType,
        image: ImageKey,
    ) -> Result<()> {
        let binding_set = self.binding_set(set)?;
        if slot != IMAGE_SAMPLER_SLOT || !binding_set.scope().has_image_sampler() {
            return Err(Error::InvalidResource(format!(
                "slot {} of a {:?} set is not an image sampler",
                slot,
                binding_set.scope()
            )));
        }
        let native_set = binding_set.native().clone();
        let image = self.image(image)?;
        if !image.usage().contains(ImageUsage::SHADER) {
            return Err(Error::InvalidResource("sampled image lacks SHADER usage".to_string()));
        }
        let native_image = image.native().clone();
        self.device.write_image_sampler(&native_set, slot, sampler, &native_image)
    }

    // ===== STRUCTURAL CACHES =====

    pub(crate) fn find_or_create_render_pass(
        &mut self,
        desc: &RenderPassDesc,
    ) -> Result<Arc<dyn NativeRenderPass>> {
        let device = &mut self.device;
        self.caches
            .render_passes
            .find_or_create(desc, |desc| device.create_render_pass(desc))
    }

    pub(crate) fn find_or_create_framebuffer(
        &mut self,
        desc: &FramebufferDesc,
        render_pass: &Arc<dyn NativeRenderPass>,
        color: Option<ImageKey>,
        depth: Option<ImageKey>,
    ) -> Result<Arc<dyn NativeFramebuffer>> {
        let color = color
            .map(|key| self.images.get(key).map(|image| image.native()).ok_or_else(|| stale("image")))
            .transpose()?;
        let depth = depth
            .map(|key| self.images.get(key).map(|image| image.native()).ok_or_else(|| stale("image")))
            .transpose()?;
        let device = &mut self.device;
        self.caches.framebuffers.find_or_create(desc, |desc| {
            device.create_framebuffer(&FramebufferCreateInfo { desc, render_pass, color, depth })
        })
    }

    pub(crate) fn find_or_create_pipeline(
        &mut self,
        desc: &PipelineDesc,
        render_pass: &Arc<dyn NativeRenderPass>,
    ) -> Result<Arc<dyn NativePipeline>> {
        let shader = self.shaders.get(desc.shader).ok_or_else(|| stale("shader"))?.native();
        let device = &mut self.device;
        self.caches.pipelines.find_or_create(desc, |desc| {
            device.create_pipeline(&PipelineCreateInfo { desc, render_pass, shader })
        })
    }
}

impl Drop for RenderObjects {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            igfx_error!("igfx::RenderObjects", "wait_idle failed during teardown: {}", e);
        }
        self.caches.clear();
        self.binding_sets.clear();
        self.meshes.clear();
        self.buffers.clear();
        self.shaders.clear();
        self.images.clear();
    }
}

#[cfg(test)]
#[path = "render_objects_tests.rs"]
mod tests;
