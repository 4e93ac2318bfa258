//! Staging upload pipe
//!
//! A linear arena in one host-visible buffer plus a dedicated command list.
//! Uploads record `discard -> TransferDestination`, a buffer-to-image copy and
//! `-> FragmentShaderRead`. The arena is reset when a new staging window
//! opens, which is only safe because a single frame is in flight.

use std::sync::Arc;
use crate::error::{Error, Result};
use crate::graphics_device::{
    BufferDesc, BufferImageCopy, CommandList, GraphicsDevice, ImageBarrier, NativeBuffer,
};
use crate::layout::{plan_transition, BarrierFlags, ImageLayout};
use crate::resource::{BufferUsage, ImageKey, ImageUsage, RenderObjects};
use crate::igfx_debug;

const SOURCE: &str = "igfx::StagingPipe";

fn align_up(offset: u64, alignment: u64) -> u64 {
    if alignment <= 1 {
        return offset;
    }
    offset.div_ceil(alignment) * alignment
}

pub struct StagingPipe {
    buffer: Arc<dyn NativeBuffer>,
    capacity: u64,
    offset: u64,
    command_list: Box<dyn CommandList>,
    in_frame: bool,
}

impl StagingPipe {
    /// Create the arena and open the first staging window
    pub fn new(device: &mut dyn GraphicsDevice, capacity: u64) -> Result<Self> {
        let buffer = device.create_buffer(&BufferDesc { size: capacity, usage: BufferUsage::Staging })?;
        let command_list = device.create_command_list()?;
        let mut pipe = Self {
            buffer,
            capacity,
            offset: 0,
            command_list,
            in_frame: false,
        };
        pipe.begin_frame()?;
        igfx_debug!(SOURCE, "Staging arena of {} bytes", capacity);
        Ok(pipe)
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Bytes used in the current window
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn is_in_frame(&self) -> bool {
        self.in_frame
    }

    pub fn buffer(&self) -> &Arc<dyn NativeBuffer> {
        &self.buffer
    }

    pub fn command_list(&self) -> &dyn CommandList {
        self.command_list.as_ref()
    }

    /// Open a staging window; no-op if one is already open
    pub fn begin_frame(&mut self) -> Result<()> {
        if self.in_frame {
            return Ok(());
        }
        self.offset = 0;
        self.command_list.begin()?;
        self.in_frame = true;
        Ok(())
    }

    /// Close the window; the caller submits [`Self::command_list`] afterwards
    pub fn end_frame(&mut self) -> Result<()> {
        if !self.in_frame {
            return Err(Error::InvalidState("staging window is not open".to_string()));
        }
        self.command_list.end()?;
        self.in_frame = false;
        Ok(())
    }

    /// Copy tightly packed pixels into `image` and leave it shader-readable
    pub fn stage_image_data(&mut self, objects: &mut RenderObjects, key: ImageKey, data: &[u8]) -> Result<()> {
        if !self.in_frame {
            return Err(Error::InvalidState("stage_image_data outside a staging window".to_string()));
        }
        let image = objects.image_mut(key)?;
        if image.is_presentable() || !image.usage().contains(ImageUsage::SHADER) {
            return Err(Error::InvalidResource("staging target must have SHADER usage".to_string()));
        }
        let expected = u64::from(image.width())
            * u64::from(image.height())
            * u64::from(image.format().bytes_per_pixel());
        if data.len() as u64 != expected {
            return Err(Error::InvalidResource(format!(
                "staged {} bytes for a {}x{} image ({} expected)",
                data.len(),
                image.width(),
                image.height(),
                expected
            )));
        }

        let offset = align_up(self.offset, image.native().memory_alignment());
        if offset + expected > self.capacity {
            return Err(Error::OutOfMemory);
        }
        self.buffer.write(offset, data)?;
        self.offset = offset + expected;

        self.command_list.pipeline_barrier(&ImageBarrier {
            image: image.native(),
            format: image.format(),
            old_layout: ImageLayout::Undefined,
            new_layout: ImageLayout::TransferDestination,
        })?;
        self.command_list.copy_buffer_to_image(&BufferImageCopy {
            buffer: &self.buffer,
            buffer_offset: offset,
            image: image.native(),
            width: image.width(),
            height: image.height(),
        })?;
        self.command_list.pipeline_barrier(&ImageBarrier {
            image: image.native(),
            format: image.format(),
            old_layout: ImageLayout::TransferDestination,
            new_layout: ImageLayout::FragmentShaderRead,
        })?;
        image.set_layout(ImageLayout::FragmentShaderRead);

        igfx_debug!(
            SOURCE,
            "Staged {} bytes at offset {} ({}x{})",
            expected,
            offset,
            image.width(),
            image.height()
        );
        Ok(())
    }

    /// Move a fresh image to the layout of its first use
    ///
    /// Render targets go to their attachment layout, everything else to
    /// FragmentShaderRead.
    pub fn initialize_image_layout(&mut self, objects: &mut RenderObjects, key: ImageKey) -> Result<()> {
        if !self.in_frame {
            return Err(Error::InvalidState("initialize_image_layout outside a staging window".to_string()));
        }
        let image = objects.image_mut(key)?;
        let target = if image.usage().contains(ImageUsage::RENDER_TARGET) {
            image.format().attachment_layout()
        } else {
            ImageLayout::FragmentShaderRead
        };
        let Some(transition) = plan_transition(image.layout(), target, BarrierFlags::NONE) else {
            return Ok(());
        };
        self.command_list.pipeline_barrier(&ImageBarrier {
            image: image.native(),
            format: image.format(),
            old_layout: transition.old_layout,
            new_layout: transition.new_layout,
        })?;
        image.set_layout(target);
        Ok(())
    }
}

#[cfg(test)]
#[path = "staging_tests.rs"]
mod tests;
