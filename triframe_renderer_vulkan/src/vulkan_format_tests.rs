//! Unit tests for Vulkan format conversion functions
//!
//! Pure mappings only, no GPU required.

use super::*;

fn surface_format(format: vk::Format) -> vk::SurfaceFormatKHR {
    vk::SurfaceFormatKHR {
        format,
        color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    }
}

// ============================================================================
// TEXTURE FORMAT CONVERSION TESTS
// ============================================================================

#[test]
fn test_texture_format_to_vk_color_formats() {
    assert_eq!(texture_format_to_vk(TextureFormat::R8G8B8A8_SRGB), vk::Format::R8G8B8A8_SRGB);
    assert_eq!(texture_format_to_vk(TextureFormat::R8G8B8A8_UNORM), vk::Format::R8G8B8A8_UNORM);
    assert_eq!(texture_format_to_vk(TextureFormat::B8G8R8A8_SRGB), vk::Format::B8G8R8A8_SRGB);
    assert_eq!(texture_format_to_vk(TextureFormat::B8G8R8A8_UNORM), vk::Format::B8G8R8A8_UNORM);
}

#[test]
fn test_texture_format_to_vk_depth_formats() {
    assert_eq!(texture_format_to_vk(TextureFormat::D16_UNORM), vk::Format::D16_UNORM);
    assert_eq!(texture_format_to_vk(TextureFormat::D32_FLOAT), vk::Format::D32_SFLOAT);
    assert_eq!(
        texture_format_to_vk(TextureFormat::D24_UNORM_S8_UINT),
        vk::Format::D24_UNORM_S8_UINT
    );
}

#[test]
fn test_texture_format_from_vk_inverts_to_vk() {
    let all = [
        TextureFormat::R8G8B8A8_SRGB,
        TextureFormat::R8G8B8A8_UNORM,
        TextureFormat::B8G8R8A8_SRGB,
        TextureFormat::B8G8R8A8_UNORM,
        TextureFormat::D16_UNORM,
        TextureFormat::D32_FLOAT,
        TextureFormat::D24_UNORM_S8_UINT,
    ];
    for format in all {
        assert_eq!(texture_format_from_vk(texture_format_to_vk(format)), Some(format));
    }
}

#[test]
fn test_texture_format_from_vk_unknown_format() {
    assert_eq!(texture_format_from_vk(vk::Format::R16G16B16A16_SFLOAT), None);
    assert_eq!(texture_format_from_vk(vk::Format::A2B10G10R10_UNORM_PACK32), None);
}

#[test]
fn test_aspect_mask() {
    assert_eq!(aspect_mask(TextureFormat::B8G8R8A8_SRGB), vk::ImageAspectFlags::COLOR);
    assert_eq!(aspect_mask(TextureFormat::D32_FLOAT), vk::ImageAspectFlags::DEPTH);
    assert_eq!(
        aspect_mask(TextureFormat::D24_UNORM_S8_UINT),
        vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
    );
}

// ============================================================================
// PIPELINE / PASS CONVERSION TESTS
// ============================================================================

#[test]
fn test_primitive_type_to_vk() {
    assert_eq!(primitive_type_to_vk(PrimitiveType::Triangle), vk::PrimitiveTopology::TRIANGLE_LIST);
    assert_eq!(
        primitive_type_to_vk(PrimitiveType::TriangleStrip),
        vk::PrimitiveTopology::TRIANGLE_STRIP
    );
    assert_eq!(primitive_type_to_vk(PrimitiveType::Line), vk::PrimitiveTopology::LINE_LIST);
    assert_eq!(primitive_type_to_vk(PrimitiveType::LineStrip), vk::PrimitiveTopology::LINE_STRIP);
    assert_eq!(primitive_type_to_vk(PrimitiveType::Point), vk::PrimitiveTopology::POINT_LIST);
}

#[test]
fn test_load_store_actions_to_vk() {
    assert_eq!(load_action_to_vk(LoadAction::Clear), vk::AttachmentLoadOp::CLEAR);
    assert_eq!(load_action_to_vk(LoadAction::Load), vk::AttachmentLoadOp::LOAD);
    assert_eq!(load_action_to_vk(LoadAction::DontCare), vk::AttachmentLoadOp::DONT_CARE);
    assert_eq!(store_action_to_vk(StoreAction::Store), vk::AttachmentStoreOp::STORE);
    assert_eq!(store_action_to_vk(StoreAction::DontCare), vk::AttachmentStoreOp::DONT_CARE);
}

#[test]
fn test_hw_device_type_from_vk() {
    assert_eq!(hw_device_type_from_vk(vk::PhysicalDeviceType::DISCRETE_GPU), HwDeviceType::Discrete);
    assert_eq!(
        hw_device_type_from_vk(vk::PhysicalDeviceType::INTEGRATED_GPU),
        HwDeviceType::Integrated
    );
    assert_eq!(hw_device_type_from_vk(vk::PhysicalDeviceType::VIRTUAL_GPU), HwDeviceType::Virtual);
    assert_eq!(hw_device_type_from_vk(vk::PhysicalDeviceType::CPU), HwDeviceType::Cpu);
    assert_eq!(hw_device_type_from_vk(vk::PhysicalDeviceType::OTHER), HwDeviceType::Other);
}

// ============================================================================
// SURFACE FORMAT SELECTION TESTS
// ============================================================================

#[test]
fn test_choose_surface_format_linear_prefers_unorm() {
    let available = [
        surface_format(vk::Format::B8G8R8A8_SRGB),
        surface_format(vk::Format::B8G8R8A8_UNORM),
    ];
    let (chosen, format) = choose_surface_format(&available, ColorSpace::SrgbLinear).unwrap();
    assert_eq!(chosen.format, vk::Format::B8G8R8A8_UNORM);
    assert_eq!(format, TextureFormat::B8G8R8A8_UNORM);
}

#[test]
fn test_choose_surface_format_non_linear_prefers_srgb() {
    let available = [
        surface_format(vk::Format::B8G8R8A8_UNORM),
        surface_format(vk::Format::B8G8R8A8_SRGB),
    ];
    let (_, format) = choose_surface_format(&available, ColorSpace::SrgbNonLinear).unwrap();
    assert_eq!(format, TextureFormat::B8G8R8A8_SRGB);
}

#[test]
fn test_choose_surface_format_falls_back_to_other_encoding() {
    let available = [surface_format(vk::Format::R8G8B8A8_SRGB)];
    let (_, format) = choose_surface_format(&available, ColorSpace::SrgbLinear).unwrap();
    assert_eq!(format, TextureFormat::R8G8B8A8_SRGB);
}

#[test]
fn test_choose_surface_format_prefers_bgra() {
    let available = [
        surface_format(vk::Format::R8G8B8A8_UNORM),
        surface_format(vk::Format::B8G8R8A8_UNORM),
    ];
    let (_, format) = choose_surface_format(&available, ColorSpace::SrgbLinear).unwrap();
    assert_eq!(format, TextureFormat::B8G8R8A8_UNORM);
}

#[test]
fn test_choose_surface_format_rejects_unknown_formats_and_color_spaces() {
    let hdr = vk::SurfaceFormatKHR {
        format: vk::Format::B8G8R8A8_UNORM,
        color_space: vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT,
    };
    let available = [hdr, surface_format(vk::Format::A2B10G10R10_UNORM_PACK32)];
    assert!(choose_surface_format(&available, ColorSpace::SrgbLinear).is_none());
    assert!(choose_surface_format(&[], ColorSpace::SrgbNonLinear).is_none());
}
