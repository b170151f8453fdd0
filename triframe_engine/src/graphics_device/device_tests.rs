//! Unit tests for device.rs

use crate::graphics_device::{select_hardware_device, ColorSpace, DeviceConfig, HwDeviceDesc, HwDeviceType};
use crate::error::Error;

fn hw(name: &str, device_type: HwDeviceType) -> HwDeviceDesc {
    HwDeviceDesc { name: name.to_string(), device_type }
}

#[test]
fn test_device_config_defaults() {
    let config = DeviceConfig::default();
    assert_eq!(config.max_textures, 8);
    assert_eq!(config.max_samplers, 8);
    assert!(config.terminate_on_validation_error);
    assert_eq!(config.swapchain_color_space, ColorSpace::SrgbLinear);
    assert_eq!(config.enable_validation, cfg!(debug_assertions));
}

#[test]
fn test_select_prefers_discrete() {
    let devices = [
        hw("Intel UHD 630", HwDeviceType::Integrated),
        hw("llvmpipe", HwDeviceType::Cpu),
        hw("RTX 3070", HwDeviceType::Discrete),
    ];
    assert_eq!(select_hardware_device(&devices).unwrap(), 2);
}

#[test]
fn test_select_falls_back_to_integrated() {
    let devices = [
        hw("llvmpipe", HwDeviceType::Cpu),
        hw("Intel UHD 630", HwDeviceType::Integrated),
    ];
    assert_eq!(select_hardware_device(&devices).unwrap(), 1);
}

#[test]
fn test_select_takes_first_of_same_kind() {
    let devices = [
        hw("GPU A", HwDeviceType::Discrete),
        hw("GPU B", HwDeviceType::Discrete),
    ];
    assert_eq!(select_hardware_device(&devices).unwrap(), 0);
}

#[test]
fn test_select_fails_without_gpu() {
    assert!(matches!(select_hardware_device(&[]), Err(Error::DeviceNotFound)));

    let devices = [hw("llvmpipe", HwDeviceType::Cpu), hw("virtio", HwDeviceType::Virtual)];
    assert!(matches!(select_hardware_device(&devices), Err(Error::DeviceNotFound)));
}
