/// GpuContext - Shared GPU state for all Vulkan objects
///
/// Contains everything resources need after device creation:
/// - Logical device and memory allocator
/// - Graphics and present queues
/// - Surface and swapchain loaders
/// - The per-frame synchronization objects
///
/// Every resource keeps an `Arc<GpuContext>`, so the device, surface and
/// instance are destroyed only once the last texture, pipeline or swapchain
/// referencing them is gone.

use ash::vk;
use gpu_allocator::vulkan::Allocator;
use std::mem::ManuallyDrop;
use std::sync::atomic::AtomicBool;
use std::sync::Mutex;
use triframe_engine::triframe::render::HwDeviceDesc;
use triframe_engine::engine_debug;

/// Synchronization for the single frame in flight
pub(crate) struct FrameSync {
    /// Signaled when the last submission finished executing
    pub in_flight: vk::Fence,
    /// Signaled when the acquired swapchain image is ready to be rendered to
    pub image_available: vk::Semaphore,
    /// Set between a successful acquire and the submission waiting on
    /// `image_available`
    pub acquire_pending: AtomicBool,
}

/// Shared GPU context for all Vulkan resources
pub(crate) struct GpuContext {
    /// Vulkan logical device
    pub device: ash::Device,

    /// GPU memory allocator
    /// Wrapped in ManuallyDrop to free its memory blocks BEFORE the device is destroyed
    pub allocator: ManuallyDrop<Mutex<Allocator>>,

    pub physical_device: vk::PhysicalDevice,

    pub graphics_queue: vk::Queue,
    pub graphics_queue_family: u32,
    /// May be the same queue as graphics_queue
    pub present_queue: vk::Queue,
    pub present_queue_family: u32,

    /// Window surface the swapchains present to
    pub surface: vk::SurfaceKHR,
    pub surface_loader: ash::khr::surface::Instance,
    pub swapchain_loader: ash::khr::swapchain::Device,

    /// Debug label / object name entry points, only when validation is on
    pub debug_labels: Option<ash::ext::debug_utils::Device>,

    pub frame_sync: FrameSync,

    /// The physical GPU, as reported to the engine
    pub hw_device: HwDeviceDesc,

    /// Debug messenger (loader + handle), destroyed before the instance
    pub(crate) debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,

    instance: ash::Instance,

    /// Keeps the Vulkan library loaded
    _entry: ash::Entry,
}

/// Everything needed to build a GpuContext, in creation order
pub(crate) struct GpuContextParts {
    pub entry: ash::Entry,
    pub instance: ash::Instance,
    pub debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    pub surface: vk::SurfaceKHR,
    pub surface_loader: ash::khr::surface::Instance,
    pub physical_device: vk::PhysicalDevice,
    pub hw_device: HwDeviceDesc,
    pub device: ash::Device,
    pub graphics_queue_family: u32,
    pub present_queue_family: u32,
    pub allocator: Allocator,
    pub frame_sync: FrameSync,
    pub debug_labels: Option<ash::ext::debug_utils::Device>,
}

impl GpuContext {
    pub(crate) fn new(parts: GpuContextParts) -> Self {
        let swapchain_loader = ash::khr::swapchain::Device::new(&parts.instance, &parts.device);
        let (graphics_queue, present_queue) = unsafe {
            (
                parts.device.get_device_queue(parts.graphics_queue_family, 0),
                parts.device.get_device_queue(parts.present_queue_family, 0),
            )
        };

        Self {
            graphics_queue,
            graphics_queue_family: parts.graphics_queue_family,
            present_queue,
            present_queue_family: parts.present_queue_family,
            allocator: ManuallyDrop::new(Mutex::new(parts.allocator)),
            physical_device: parts.physical_device,
            surface: parts.surface,
            surface_loader: parts.surface_loader,
            swapchain_loader,
            debug_labels: parts.debug_labels,
            frame_sync: parts.frame_sync,
            hw_device: parts.hw_device,
            debug_messenger: parts.debug_messenger,
            device: parts.device,
            instance: parts.instance,
            _entry: parts.entry,
        }
    }

    /// Name a Vulkan object for GPU debuggers and validation messages
    ///
    /// No-op when the debug utils extension is not loaded.
    pub(crate) fn set_object_name<H: vk::Handle>(&self, handle: H, name: &str) {
        let Some(debug_labels) = &self.debug_labels else {
            return;
        };
        let Ok(name) = std::ffi::CString::new(name) else {
            return;
        };
        let info = vk::DebugUtilsObjectNameInfoEXT::default()
            .object_handle(handle)
            .object_name(&name);
        unsafe {
            debug_labels.set_debug_utils_object_name(&info).ok();
        }
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            // 1. Frame synchronization objects
            self.device.destroy_fence(self.frame_sync.in_flight, None);
            self.device.destroy_semaphore(self.frame_sync.image_available, None);

            // 2. Allocator: free VkDeviceMemory pages BEFORE destroying the device
            ManuallyDrop::drop(&mut self.allocator);

            // 3. Device, then the surface (every swapchain is gone by now)
            self.device.destroy_device(None);
            self.surface_loader.destroy_surface(self.surface, None);

            // 4. Report and stop forwarding validation messages, then destroy
            //    the messenger BEFORE the instance
            #[cfg(feature = "vulkan-validation")]
            crate::debug::shutdown_validation_reporting();

            if let Some((debug_utils, messenger)) = self.debug_messenger.take() {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            // 5. Instance
            self.instance.destroy_instance(None);
        }

        engine_debug!("triframe::vulkan", "GPU context destroyed");
    }
}
