/// Command context: the immediate-mode recording surface
///
/// One context records one linear command stream per frame. It derives the
/// identity of render passes, framebuffers and pipelines from the calls it
/// receives, resolves them through the caches in [`RenderObjects`], and keeps
/// image layouts and render pass boundaries consistent.
///
/// State machine:
///
/// ```text
/// Idle --begin--> Recording/NotInPass --set_render_targets--> Recording/InPass
///   ^                 ^                                            |
///   |                 +-- end_render_pass | blit | barrier on a ---+
///   |                     bound attachment
///   +------------------------------- end ----------------------------
/// ```

use std::sync::Arc;
use crate::cache::{FramebufferDesc, PipelineDesc, RenderPassDesc};
use crate::error::{Error, Result};
use crate::graphics_device::{
    ClearValue, CommandList, ImageBarrier, ImageBlit, IndexType, NativeFramebuffer,
    NativeRenderPass, Rect2D, Viewport,
};
use crate::layout::{plan_transition, BarrierFlags, ImageLayout};
use crate::resource::{BindingSetKey, ImageKey, MeshKey, RenderObjects, ShaderKey};
use crate::igfx_trace;

const SOURCE: &str = "igfx::CommandContext";

/// Per-frame counters, reset by [`CommandContext::begin`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextStats {
    pub barriers_recorded: u32,
    pub barriers_elided: u32,
    pub render_passes_begun: u32,
    pub draws: u32,
}

/// The pass currently open on the command list
struct ActivePass {
    desc: RenderPassDesc,
    render_pass: Arc<dyn NativeRenderPass>,
    framebuffer: Arc<dyn NativeFramebuffer>,
    render_area: Rect2D,
    color: Option<ImageKey>,
    depth: Option<ImageKey>,
}

pub struct CommandContext {
    command_list: Box<dyn CommandList>,
    recording: bool,
    pass: Option<ActivePass>,
    viewport_width: u32,
    viewport_height: u32,
    stats: ContextStats,
}

impl CommandContext {
    pub fn new(command_list: Box<dyn CommandList>) -> Self {
        Self {
            command_list,
            recording: false,
            pass: None,
            viewport_width: 0,
            viewport_height: 0,
            stats: ContextStats::default(),
        }
    }

    pub fn command_list(&self) -> &dyn CommandList {
        self.command_list.as_ref()
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn in_render_pass(&self) -> bool {
        self.pass.is_some()
    }

    /// Description of the open pass, if any
    pub fn render_pass_desc(&self) -> Option<RenderPassDesc> {
        self.pass.as_ref().map(|pass| pass.desc)
    }

    /// Framebuffer of the open pass, if any
    pub fn framebuffer(&self) -> Option<&Arc<dyn NativeFramebuffer>> {
        self.pass.as_ref().map(|pass| &pass.framebuffer)
    }

    /// Render area of the open pass, if any
    pub fn render_area(&self) -> Option<Rect2D> {
        self.pass.as_ref().map(|pass| pass.render_area)
    }

    pub fn stats(&self) -> ContextStats {
        self.stats
    }

    fn require_recording(&self, operation: &str) -> Result<()> {
        if !self.recording {
            return Err(Error::InvalidState(format!("{} called outside begin/end", operation)));
        }
        Ok(())
    }

    fn require_pass(&self, operation: &str) -> Result<&ActivePass> {
        self.pass
            .as_ref()
            .ok_or_else(|| Error::InvalidState(format!("{} called outside a render pass", operation)))
    }

    // ===== FRAME =====

    /// Open recording for a new frame
    pub fn begin(&mut self) -> Result<()> {
        if self.recording {
            return Err(Error::InvalidState("begin called while already recording".to_string()));
        }
        self.pass = None;
        self.stats = ContextStats::default();
        self.command_list.begin()?;
        self.recording = true;
        Ok(())
    }

    /// Close any open pass and stop recording
    pub fn end(&mut self) -> Result<()> {
        self.require_recording("end")?;
        self.end_render_pass()?;
        self.command_list.end()?;
        self.recording = false;
        igfx_trace!(SOURCE, "Frame recorded: {:?}", self.stats);
        Ok(())
    }

    // ===== RENDER PASSES =====

    /// Bind render targets and begin a (non-clearing) pass on them
    ///
    /// Any open pass is ended first. Each target is transitioned to its
    /// attachment layout; the barrier is elided when the image is already
    /// there.
    pub fn set_render_targets(
        &mut self,
        objects: &mut RenderObjects,
        color: Option<ImageKey>,
        depth: Option<ImageKey>,
    ) -> Result<()> {
        self.require_recording("set_render_targets")?;
        if color.is_none() && depth.is_none() {
            return Err(Error::InvalidState(
                "set_render_targets needs a color or a depth target".to_string(),
            ));
        }

        let color_info = match color {
            Some(key) => {
                let image = objects.image(key)?;
                if image.format().is_depth() {
                    return Err(Error::InvalidResource(
                        "depth image bound as color target".to_string(),
                    ));
                }
                Some((image.format(), image.view(), image.width(), image.height()))
            }
            None => None,
        };
        let depth_info = match depth {
            Some(key) => {
                let image = objects.image(key)?;
                if !image.format().is_depth() {
                    return Err(Error::InvalidResource(
                        "color image bound as depth target".to_string(),
                    ));
                }
                Some((image.format(), image.view(), image.width(), image.height()))
            }
            None => None,
        };

        self.end_render_pass()?;

        if let Some(key) = color {
            self.transition(objects, key, ImageLayout::ColorAttachment, BarrierFlags::NONE)?;
        }
        if let Some(key) = depth {
            self.transition(objects, key, ImageLayout::DepthStencilAttachment, BarrierFlags::NONE)?;
        }

        let desc = RenderPassDesc::for_targets(
            color_info.map(|(format, ..)| format),
            depth_info.map(|(format, ..)| format),
        );
        let render_pass = objects.find_or_create_render_pass(&desc)?;

        // Color takes precedence for the framebuffer size
        let (width, height) = color_info
            .or(depth_info)
            .map(|(_, _, width, height)| (width, height))
            .unwrap_or_default();
        let fb_desc = FramebufferDesc {
            width,
            height,
            color_view: color_info.map(|(_, view, ..)| view),
            depth_view: depth_info.map(|(_, view, ..)| view),
        };
        let framebuffer = objects.find_or_create_framebuffer(&fb_desc, &render_pass, color, depth)?;

        let render_area = Rect2D { x: 0, y: 0, width, height };
        self.command_list
            .begin_render_pass(&render_pass, &framebuffer, render_area, &[])?;
        self.stats.render_passes_begun += 1;
        igfx_trace!(SOURCE, "Begin render pass {:?} on {}x{}", desc, width, height);

        self.pass = Some(ActivePass {
            desc,
            render_pass,
            framebuffer,
            render_area,
            color,
            depth,
        });
        Ok(())
    }

    /// Clear the bound targets by restarting the pass with its clearing twin
    ///
    /// The new pass uses the same framebuffer and render area. A flag whose
    /// attachment is not bound is ignored.
    pub fn clear(
        &mut self,
        objects: &mut RenderObjects,
        clear_color: bool,
        clear_depth: bool,
        color: [f32; 4],
        depth: f32,
    ) -> Result<()> {
        self.require_recording("clear")?;
        let active = self.require_pass("clear")?;

        let desc = active.desc.with_clear(clear_color, clear_depth);
        let framebuffer = Arc::clone(&active.framebuffer);
        let render_area = active.render_area;

        // One value per attachment in attachment order
        let mut clear_values = Vec::with_capacity(desc.attachment_count());
        if desc.color.is_some() {
            clear_values.push(ClearValue::Color(color));
        }
        if desc.depth.is_some() {
            clear_values.push(ClearValue::DepthStencil { depth, stencil: 0 });
        }

        let render_pass = objects.find_or_create_render_pass(&desc)?;

        self.command_list.end_render_pass()?;
        self.command_list
            .begin_render_pass(&render_pass, &framebuffer, render_area, &clear_values)?;
        self.stats.render_passes_begun += 1;
        igfx_trace!(SOURCE, "Restart render pass for clear {:?}", desc);

        if let Some(pass) = self.pass.as_mut() {
            pass.desc = desc;
            pass.render_pass = render_pass;
        }
        Ok(())
    }

    /// End the open render pass, if any
    pub fn end_render_pass(&mut self) -> Result<()> {
        self.require_recording("end_render_pass")?;
        if self.pass.is_some() {
            self.command_list.end_render_pass()?;
            self.pass = None;
        }
        Ok(())
    }

    // ===== DRAWING =====

    /// Capture the viewport and scissor size used by the following draws
    ///
    /// The size is kept across frames until set again.
    pub fn set_viewport_and_scissor(&mut self, width: u32, height: u32) {
        self.viewport_width = width;
        self.viewport_height = height;
    }

    /// Draw all indices of `mesh` with `shader`
    ///
    /// The pipeline is found or created for the open pass and the shader.
    /// Fails with `InvalidState` until a non-empty viewport has been set.
    pub fn draw(&mut self, objects: &mut RenderObjects, mesh: MeshKey, shader: ShaderKey) -> Result<()> {
        self.require_recording("draw")?;
        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err(Error::InvalidState(
                "draw called before set_viewport_and_scissor".to_string(),
            ));
        }
        let active = self.require_pass("draw")?;

        let desc = PipelineDesc { render_pass: active.desc, shader };
        let render_pass = Arc::clone(&active.render_pass);
        let pipeline = objects.find_or_create_pipeline(&desc, &render_pass)?;

        let mesh = *objects.mesh(mesh)?;
        let vertex_buffer = Arc::clone(objects.buffer(mesh.vertex_buffer())?.native());
        let index_buffer = Arc::clone(objects.buffer(mesh.index_buffer())?.native());

        self.command_list.bind_pipeline(&pipeline)?;
        self.command_list.set_viewport(Viewport {
            x: 0.0,
            y: 0.0,
            width: self.viewport_width as f32,
            height: self.viewport_height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        })?;
        self.command_list.set_scissor(Rect2D {
            x: 0,
            y: 0,
            width: self.viewport_width,
            height: self.viewport_height,
        })?;
        self.command_list.bind_vertex_buffer(&vertex_buffer, 0)?;
        self.command_list.bind_index_buffer(&index_buffer, 0, IndexType::U16)?;
        self.command_list.draw_indexed(mesh.index_count(), 0, 0)?;
        self.stats.draws += 1;
        Ok(())
    }

    /// Bind a resource-binding set at the set index of its scope
    pub fn bind_resource_set(&mut self, objects: &RenderObjects, set: BindingSetKey) -> Result<()> {
        self.require_recording("bind_resource_set")?;
        let set = objects.binding_set(set)?;
        self.command_list.bind_binding_set(set.scope(), set.native())
    }

    // ===== TRANSFERS =====

    /// Full-surface linear copy from `src` to `dst`
    ///
    /// Ends any open pass. `src` must already be in TransferSource and `dst`
    /// in TransferDestination; no barrier is inserted.
    pub fn blit(&mut self, objects: &RenderObjects, src: ImageKey, dst: ImageKey) -> Result<()> {
        self.require_recording("blit")?;
        let src = objects.image(src)?;
        let dst = objects.image(dst)?;
        self.end_render_pass()?;
        self.command_list.blit_image(&ImageBlit {
            src: src.native(),
            src_width: src.width(),
            src_height: src.height(),
            dst: dst.native(),
            dst_width: dst.width(),
            dst_height: dst.height(),
        })
    }

    /// Move `image` to `new_layout`
    ///
    /// Ends the open pass if the image is one of its attachments, or if a
    /// barrier has to be recorded. Without DISCARD the barrier is elided when
    /// the tracked layout already matches.
    pub fn pipeline_barrier(
        &mut self,
        objects: &mut RenderObjects,
        image: ImageKey,
        new_layout: ImageLayout,
        flags: BarrierFlags,
    ) -> Result<()> {
        self.require_recording("pipeline_barrier")?;
        if new_layout == ImageLayout::Undefined {
            return Err(Error::InvalidState("cannot transition an image to Undefined".to_string()));
        }
        objects.image(image)?;

        let bound = self
            .pass
            .as_ref()
            .is_some_and(|pass| pass.color == Some(image) || pass.depth == Some(image));
        if bound {
            igfx_trace!(SOURCE, "Barrier on a bound attachment ends the render pass");
            self.end_render_pass()?;
        }

        self.transition(objects, image, new_layout, flags)
    }

    /// Record the barrier (outside any pass) and update the tracked layout
    fn transition(
        &mut self,
        objects: &mut RenderObjects,
        key: ImageKey,
        new_layout: ImageLayout,
        flags: BarrierFlags,
    ) -> Result<()> {
        let image = objects.image_mut(key)?;
        let Some(transition) = plan_transition(image.layout(), new_layout, flags) else {
            self.stats.barriers_elided += 1;
            return Ok(());
        };

        // Barriers cannot be recorded inside a render pass
        if self.pass.is_some() {
            self.end_render_pass()?;
        }

        self.command_list.pipeline_barrier(&ImageBarrier {
            image: image.native(),
            format: image.format(),
            old_layout: transition.old_layout,
            new_layout: transition.new_layout,
        })?;
        image.set_layout(new_layout);
        self.stats.barriers_recorded += 1;
        igfx_trace!(
            SOURCE,
            "Barrier {:?} -> {:?}",
            transition.old_layout,
            transition.new_layout
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "command_context_tests.rs"]
mod tests;
