/// Command queue, command buffer and render command encoder traits
///
/// A command buffer is single-use: it is created for one frame, receives one
/// render pass through an encoder, optionally a present request, and is then
/// consumed by `CommandQueue::submit()`.

use std::any::Any;

use crate::error::Result;
use crate::graphics_device::{Framebuffer, RenderPassDesc, RenderPipelineState, Texture};
use crate::surface::SurfaceSize;

/// Kind of work a queue accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueType {
    Graphics,
}

/// Descriptor for creating a command queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandQueueDesc {
    pub queue_type: QueueType,
}

impl CommandQueueDesc {
    pub fn graphics() -> Self {
        Self { queue_type: QueueType::Graphics }
    }
}

/// Primitive topology of a draw call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Point,
    Line,
    LineStrip,
    Triangle,
    TriangleStrip,
}

/// Viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Viewport covering the whole surface with the full depth range
    pub fn covering(size: SurfaceSize) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: size.width as f32,
            height: size.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// Scissor rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScissorRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ScissorRect {
    /// Scissor covering the whole surface
    pub fn covering(size: SurfaceSize) -> Self {
        Self { x: 0, y: 0, width: size.width, height: size.height }
    }
}

/// Queue that hands out command buffers and executes them
pub trait CommandQueue: Send + Sync {
    /// Create a fresh single-use command buffer
    fn create_command_buffer(&self) -> Result<Box<dyn CommandBuffer>>;

    /// Submit a recorded command buffer, then present its drawable if one
    /// was attached with `CommandBuffer::present()`
    fn submit(&self, command_buffer: Box<dyn CommandBuffer>) -> Result<()>;

    /// Backend downcasting hook
    fn as_any(&self) -> &dyn Any;
}

/// One frame's worth of recorded GPU commands
pub trait CommandBuffer: Send {
    /// Begin a render pass on `framebuffer` with the given load/store actions
    fn create_render_command_encoder(
        &mut self,
        pass: &RenderPassDesc,
        framebuffer: &dyn Framebuffer,
    ) -> Result<Box<dyn RenderCommandEncoder>>;

    /// Schedule presentation of `drawable` once the buffer has executed
    fn present(&mut self, drawable: &dyn Texture) -> Result<()>;

    /// Backend downcasting hook
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcasting hook, used by queues on submission
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Records the commands of one render pass
///
/// Commands are written into the command buffer that created the encoder.
/// `end_encoding()` must be called before the buffer is submitted.
pub trait RenderCommandEncoder: Send {
    fn bind_render_pipeline_state(&mut self, pipeline: &dyn RenderPipelineState) -> Result<()>;

    fn bind_viewport(&mut self, viewport: Viewport) -> Result<()>;

    fn bind_scissor_rect(&mut self, rect: ScissorRect) -> Result<()>;

    /// Open a named region visible in GPU debuggers
    fn push_debug_group_label(&mut self, label: &str) -> Result<()>;

    fn pop_debug_group_label(&mut self) -> Result<()>;

    /// Non-indexed draw
    fn draw(&mut self, primitive: PrimitiveType, first_vertex: u32, vertex_count: u32) -> Result<()>;

    /// Close the render pass
    fn end_encoding(&mut self) -> Result<()>;
}
