/// Mock graphics device for unit tests (no GPU required)
///
/// Every call made through the capability traits is appended to a shared
/// journal, together with the drop order of pipelines, framebuffers, queues
/// and the device itself. Faults can be armed through the same handle to
/// exercise error paths.

use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{engine_bail, engine_error};
use crate::error::{Error, Result};
use crate::graphics_device::{
    CommandBuffer, CommandQueue, CommandQueueDesc, Framebuffer, FramebufferDesc,
    GraphicsDevice, HwDeviceDesc, HwDeviceType, PrimitiveType, RenderCommandEncoder,
    RenderPassDesc, RenderPipelineDesc, RenderPipelineState, RenderTargetDesc,
    ScissorRect, Texture, TextureDesc, TextureDimensions, TextureFormat, TextureUsage,
    Viewport,
};
use crate::surface::SurfaceSize;

// ============================================================================
// Journal
// ============================================================================

/// One recorded call
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    CreateCommandQueue,
    CreateTexture { dimensions: TextureDimensions, format: TextureFormat, usage: TextureUsage },
    CreateFramebuffer { color_slots: Vec<Option<TextureDimensions>>, has_depth: bool },
    CreateRenderPipeline { target: RenderTargetDesc },
    AcquireDrawable,
    InitSwapchain { width: u32, height: u32 },
    WaitIdle,
    UpdateDrawable,
    CreateCommandBuffer,
    BeginPass { pass: RenderPassDesc, dimensions: TextureDimensions },
    BindPipeline,
    BindViewport(Viewport),
    BindScissor(ScissorRect),
    PushLabel(String),
    PopLabel,
    Draw { primitive: PrimitiveType, first_vertex: u32, vertex_count: u32 },
    EndEncoding,
    Present,
    Submit,
}

#[derive(Default)]
struct MockState {
    calls: Vec<MockCall>,
    drops: Vec<&'static str>,
    fail_acquire: bool,
    empty_acquire: bool,
    fail_texture: bool,
    fail_pipeline: bool,
}

/// Shared view on the journal of a MockGraphicsDevice
#[derive(Clone, Default)]
pub struct MockJournal {
    state: Arc<Mutex<MockState>>,
}

impl MockJournal {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    fn record(&self, call: MockCall) {
        self.lock().calls.push(call);
    }

    fn dropped(&self, what: &'static str) {
        self.lock().drops.push(what);
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    /// Forget the calls recorded so far (drops are kept)
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn drops(&self) -> Vec<&'static str> {
        self.lock().drops.clone()
    }

    pub fn count(&self, pred: impl Fn(&MockCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|call| pred(call)).count()
    }

    pub fn submissions(&self) -> usize {
        self.count(|c| matches!(c, MockCall::Submit))
    }

    pub fn draws(&self) -> usize {
        self.count(|c| matches!(c, MockCall::Draw { .. }))
    }

    pub fn textures_created(&self) -> usize {
        self.count(|c| matches!(c, MockCall::CreateTexture { .. }))
    }

    pub fn pipelines_created(&self) -> usize {
        self.count(|c| matches!(c, MockCall::CreateRenderPipeline { .. }))
    }

    pub fn viewports(&self) -> Vec<Viewport> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MockCall::BindViewport(viewport) => Some(viewport),
                _ => None,
            })
            .collect()
    }

    pub fn scissors(&self) -> Vec<ScissorRect> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MockCall::BindScissor(rect) => Some(rect),
                _ => None,
            })
            .collect()
    }

    /// Make acquire_drawable return an error
    pub fn fail_acquire(&self, fail: bool) {
        self.lock().fail_acquire = fail;
    }

    /// Make acquire_drawable return Ok(None)
    pub fn empty_acquire(&self, empty: bool) {
        self.lock().empty_acquire = empty;
    }

    /// Make create_texture return an error
    pub fn fail_texture(&self, fail: bool) {
        self.lock().fail_texture = fail;
    }

    /// Make create_render_pipeline return an error
    pub fn fail_pipeline(&self, fail: bool) {
        self.lock().fail_pipeline = fail;
    }
}

// ============================================================================
// Mock Texture
// ============================================================================

#[derive(Debug)]
pub struct MockTexture {
    pub format: TextureFormat,
    pub dimensions: TextureDimensions,
    pub usage: TextureUsage,
    pub name: String,
}

impl MockTexture {
    pub fn new(format: TextureFormat, width: u32, height: u32, usage: TextureUsage, name: &str) -> Self {
        Self {
            format,
            dimensions: TextureDimensions::new(width, height),
            usage,
            name: name.to_string(),
        }
    }
}

impl Texture for MockTexture {
    fn format(&self) -> TextureFormat {
        self.format
    }

    fn dimensions(&self) -> TextureDimensions {
        self.dimensions
    }

    fn usage(&self) -> TextureUsage {
        self.usage
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Framebuffer
// ============================================================================

pub struct MockFramebuffer {
    journal: MockJournal,
    color: Vec<Option<Arc<dyn Texture>>>,
    depth: Option<Arc<dyn Texture>>,
}

impl Framebuffer for MockFramebuffer {
    fn color_slot_count(&self) -> usize {
        self.color.len()
    }

    fn color_attachment(&self, slot: usize) -> Option<&Arc<dyn Texture>> {
        self.color.get(slot).and_then(|t| t.as_ref())
    }

    fn depth_attachment(&self) -> Option<&Arc<dyn Texture>> {
        self.depth.as_ref()
    }

    fn update_drawable(&mut self, drawable: Arc<dyn Texture>) -> Result<()> {
        self.journal.record(MockCall::UpdateDrawable);
        match self.color.first_mut() {
            Some(slot) => {
                *slot = Some(drawable);
                Ok(())
            }
            None => engine_bail!(InvalidResource, "triframe::MockFramebuffer", "no color slot 0"),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockFramebuffer {
    fn drop(&mut self) {
        self.journal.dropped("framebuffer");
    }
}

// ============================================================================
// Mock Pipeline
// ============================================================================

pub struct MockPipeline {
    journal: MockJournal,
    target: RenderTargetDesc,
}

impl RenderPipelineState for MockPipeline {
    fn target(&self) -> &RenderTargetDesc {
        &self.target
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockPipeline {
    fn drop(&mut self) {
        self.journal.dropped("pipeline");
    }
}

// ============================================================================
// Mock Command Queue / Buffer / Encoder
// ============================================================================

pub struct MockCommandQueue {
    journal: MockJournal,
}

impl CommandQueue for MockCommandQueue {
    fn create_command_buffer(&self) -> Result<Box<dyn CommandBuffer>> {
        self.journal.record(MockCall::CreateCommandBuffer);
        Ok(Box::new(MockCommandBuffer { journal: self.journal.clone() }))
    }

    fn submit(&self, _command_buffer: Box<dyn CommandBuffer>) -> Result<()> {
        self.journal.record(MockCall::Submit);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockCommandQueue {
    fn drop(&mut self) {
        self.journal.dropped("command_queue");
    }
}

pub struct MockCommandBuffer {
    journal: MockJournal,
}

impl CommandBuffer for MockCommandBuffer {
    fn create_render_command_encoder(
        &mut self,
        pass: &RenderPassDesc,
        framebuffer: &dyn Framebuffer,
    ) -> Result<Box<dyn RenderCommandEncoder>> {
        let dimensions = framebuffer
            .color_attachment(0)
            .map(|t| t.dimensions())
            .unwrap_or_default();
        self.journal.record(MockCall::BeginPass { pass: pass.clone(), dimensions });
        Ok(Box::new(MockEncoder { journal: self.journal.clone() }))
    }

    fn present(&mut self, _drawable: &dyn Texture) -> Result<()> {
        self.journal.record(MockCall::Present);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub struct MockEncoder {
    journal: MockJournal,
}

impl RenderCommandEncoder for MockEncoder {
    fn bind_render_pipeline_state(&mut self, _pipeline: &dyn RenderPipelineState) -> Result<()> {
        self.journal.record(MockCall::BindPipeline);
        Ok(())
    }

    fn bind_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.journal.record(MockCall::BindViewport(viewport));
        Ok(())
    }

    fn bind_scissor_rect(&mut self, rect: ScissorRect) -> Result<()> {
        self.journal.record(MockCall::BindScissor(rect));
        Ok(())
    }

    fn push_debug_group_label(&mut self, label: &str) -> Result<()> {
        self.journal.record(MockCall::PushLabel(label.to_string()));
        Ok(())
    }

    fn pop_debug_group_label(&mut self) -> Result<()> {
        self.journal.record(MockCall::PopLabel);
        Ok(())
    }

    fn draw(&mut self, primitive: PrimitiveType, first_vertex: u32, vertex_count: u32) -> Result<()> {
        self.journal.record(MockCall::Draw { primitive, first_vertex, vertex_count });
        Ok(())
    }

    fn end_encoding(&mut self) -> Result<()> {
        self.journal.record(MockCall::EndEncoding);
        Ok(())
    }
}

// ============================================================================
// Mock Graphics Device
// ============================================================================

/// Device whose swapchain always hands out drawables of the current
/// swapchain size, in `format`
pub struct MockGraphicsDevice {
    journal: MockJournal,
    hw: HwDeviceDesc,
    swapchain_size: SurfaceSize,
    format: TextureFormat,
    acquired: u64,
}

impl MockGraphicsDevice {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            journal: MockJournal::default(),
            hw: HwDeviceDesc { name: "Mock GPU".to_string(), device_type: HwDeviceType::Discrete },
            swapchain_size: SurfaceSize::new(width, height),
            format: TextureFormat::B8G8R8A8_SRGB,
            acquired: 0,
        }
    }

    pub fn journal(&self) -> MockJournal {
        self.journal.clone()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn hw_device(&self) -> &HwDeviceDesc {
        &self.hw
    }

    fn create_command_queue(&self, _desc: &CommandQueueDesc) -> Result<Box<dyn CommandQueue>> {
        self.journal.record(MockCall::CreateCommandQueue);
        Ok(Box::new(MockCommandQueue { journal: self.journal.clone() }))
    }

    fn create_texture(&self, desc: &TextureDesc) -> Result<Arc<dyn Texture>> {
        if self.journal.lock().fail_texture {
            engine_error!("triframe::MockGraphicsDevice", "texture '{}' not created", desc.debug_name);
            return Err(Error::OutOfMemory);
        }
        self.journal.record(MockCall::CreateTexture {
            dimensions: desc.dimensions,
            format: desc.format,
            usage: desc.usage,
        });
        Ok(Arc::new(MockTexture {
            format: desc.format,
            dimensions: desc.dimensions,
            usage: desc.usage,
            name: desc.debug_name.clone(),
        }))
    }

    fn create_framebuffer(&self, desc: FramebufferDesc) -> Result<Box<dyn Framebuffer>> {
        self.journal.record(MockCall::CreateFramebuffer {
            color_slots: desc
                .color_attachments
                .iter()
                .map(|slot| slot.as_ref().map(|t| t.dimensions()))
                .collect(),
            has_depth: desc.depth_attachment.is_some(),
        });
        Ok(Box::new(MockFramebuffer {
            journal: self.journal.clone(),
            color: desc.color_attachments,
            depth: desc.depth_attachment,
        }))
    }

    fn create_render_pipeline(&self, desc: &RenderPipelineDesc) -> Result<Arc<dyn RenderPipelineState>> {
        if self.journal.lock().fail_pipeline {
            engine_bail!("triframe::MockGraphicsDevice", "pipeline '{}' failed to link", desc.debug_name);
        }
        self.journal.record(MockCall::CreateRenderPipeline { target: desc.target.clone() });
        Ok(Arc::new(MockPipeline { journal: self.journal.clone(), target: desc.target.clone() }))
    }

    fn acquire_drawable(&mut self) -> Result<Option<Arc<dyn Texture>>> {
        self.journal.record(MockCall::AcquireDrawable);
        let (fail, empty) = {
            let state = self.journal.lock();
            (state.fail_acquire, state.empty_acquire)
        };
        if fail {
            engine_bail!(DrawableUnavailable, "triframe::MockGraphicsDevice", "swapchain lost");
        }
        if empty {
            return Ok(None);
        }
        self.acquired += 1;
        Ok(Some(Arc::new(MockTexture::new(
            self.format,
            self.swapchain_size.width,
            self.swapchain_size.height,
            TextureUsage::ATTACHMENT,
            &format!("Drawable #{}", self.acquired),
        ))))
    }

    fn init_swapchain(&mut self, width: u32, height: u32) -> Result<()> {
        self.journal.record(MockCall::InitSwapchain { width, height });
        self.swapchain_size = SurfaceSize::new(width, height);
        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        self.journal.record(MockCall::WaitIdle);
        Ok(())
    }
}

impl Drop for MockGraphicsDevice {
    fn drop(&mut self) {
        self.journal.dropped("context");
    }
}
