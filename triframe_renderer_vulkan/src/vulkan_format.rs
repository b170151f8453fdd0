/// Conversions between engine enums and their Vulkan counterparts

use ash::vk;
use triframe_engine::triframe::render::{
    ColorSpace, HwDeviceType, LoadAction, PrimitiveType, StoreAction, TextureFormat,
};

/// Convert TextureFormat to Vulkan format
pub(crate) fn texture_format_to_vk(format: TextureFormat) -> vk::Format {
    match format {
        TextureFormat::R8G8B8A8_SRGB => vk::Format::R8G8B8A8_SRGB,
        TextureFormat::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
        TextureFormat::B8G8R8A8_SRGB => vk::Format::B8G8R8A8_SRGB,
        TextureFormat::B8G8R8A8_UNORM => vk::Format::B8G8R8A8_UNORM,
        TextureFormat::D16_UNORM => vk::Format::D16_UNORM,
        TextureFormat::D32_FLOAT => vk::Format::D32_SFLOAT,
        TextureFormat::D24_UNORM_S8_UINT => vk::Format::D24_UNORM_S8_UINT,
    }
}

/// Convert a Vulkan format back, None for formats the engine does not know
pub(crate) fn texture_format_from_vk(format: vk::Format) -> Option<TextureFormat> {
    match format {
        vk::Format::R8G8B8A8_SRGB => Some(TextureFormat::R8G8B8A8_SRGB),
        vk::Format::R8G8B8A8_UNORM => Some(TextureFormat::R8G8B8A8_UNORM),
        vk::Format::B8G8R8A8_SRGB => Some(TextureFormat::B8G8R8A8_SRGB),
        vk::Format::B8G8R8A8_UNORM => Some(TextureFormat::B8G8R8A8_UNORM),
        vk::Format::D16_UNORM => Some(TextureFormat::D16_UNORM),
        vk::Format::D32_SFLOAT => Some(TextureFormat::D32_FLOAT),
        vk::Format::D24_UNORM_S8_UINT => Some(TextureFormat::D24_UNORM_S8_UINT),
        _ => None,
    }
}

/// Image aspects covered by a view of this format
pub(crate) fn aspect_mask(format: TextureFormat) -> vk::ImageAspectFlags {
    if format.has_stencil() {
        vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
    } else if format.is_depth() {
        vk::ImageAspectFlags::DEPTH
    } else {
        vk::ImageAspectFlags::COLOR
    }
}

pub(crate) fn primitive_type_to_vk(primitive: PrimitiveType) -> vk::PrimitiveTopology {
    match primitive {
        PrimitiveType::Point => vk::PrimitiveTopology::POINT_LIST,
        PrimitiveType::Line => vk::PrimitiveTopology::LINE_LIST,
        PrimitiveType::LineStrip => vk::PrimitiveTopology::LINE_STRIP,
        PrimitiveType::Triangle => vk::PrimitiveTopology::TRIANGLE_LIST,
        PrimitiveType::TriangleStrip => vk::PrimitiveTopology::TRIANGLE_STRIP,
    }
}

pub(crate) fn load_action_to_vk(action: LoadAction) -> vk::AttachmentLoadOp {
    match action {
        LoadAction::DontCare => vk::AttachmentLoadOp::DONT_CARE,
        LoadAction::Load => vk::AttachmentLoadOp::LOAD,
        LoadAction::Clear => vk::AttachmentLoadOp::CLEAR,
    }
}

pub(crate) fn store_action_to_vk(action: StoreAction) -> vk::AttachmentStoreOp {
    match action {
        StoreAction::DontCare => vk::AttachmentStoreOp::DONT_CARE,
        StoreAction::Store => vk::AttachmentStoreOp::STORE,
    }
}

pub(crate) fn hw_device_type_from_vk(device_type: vk::PhysicalDeviceType) -> HwDeviceType {
    match device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => HwDeviceType::Discrete,
        vk::PhysicalDeviceType::INTEGRATED_GPU => HwDeviceType::Integrated,
        vk::PhysicalDeviceType::VIRTUAL_GPU => HwDeviceType::Virtual,
        vk::PhysicalDeviceType::CPU => HwDeviceType::Cpu,
        _ => HwDeviceType::Other,
    }
}

/// Pick the swapchain surface format
///
/// Only sRGB non-linear surfaces in one of the engine's 8-bit BGRA/RGBA
/// formats are considered. `SrgbNonLinear` prefers the `_SRGB` formats
/// (hardware encoding on write), `SrgbLinear` the `_UNORM` ones; the other
/// encoding is accepted as a fallback. BGRA wins over RGBA.
pub(crate) fn choose_surface_format(
    available: &[vk::SurfaceFormatKHR],
    color_space: ColorSpace,
) -> Option<(vk::SurfaceFormatKHR, TextureFormat)> {
    let srgb = [vk::Format::B8G8R8A8_SRGB, vk::Format::R8G8B8A8_SRGB];
    let unorm = [vk::Format::B8G8R8A8_UNORM, vk::Format::R8G8B8A8_UNORM];
    let (preferred, fallback) = match color_space {
        ColorSpace::SrgbNonLinear => (srgb, unorm),
        ColorSpace::SrgbLinear => (unorm, srgb),
    };

    preferred
        .iter()
        .chain(fallback.iter())
        .find_map(|&wanted| {
            available.iter().find(|f| {
                f.format == wanted && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
            })
        })
        .and_then(|&surface_format| {
            texture_format_from_vk(surface_format.format).map(|format| (surface_format, format))
        })
}

#[cfg(test)]
#[path = "vulkan_format_tests.rs"]
mod tests;
