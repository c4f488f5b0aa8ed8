// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use fai_bridge::{
    AccessMode, Bridge, CameraHandle, HostValue, NodeHandle, NodeMapHandle, NodeType,
    SimulatedSdk, Status, StatusKind, ToHost, Visibility, STRING_CAPACITY,
};
use fai_sys::{
    FA_ERR_ACCESS_DENIED, FA_ERR_BUFFER_TOO_SMALL, FA_ERR_INVALID_HANDLE, FA_ERR_IO,
    FA_ERR_NOT_AVAILABLE, FA_PIXEL_FORMAT_MONO8, FA_PIXEL_FORMAT_RGB8,
};
use serial_test::serial;
use std::{error::Error, ffi::CStr, sync::Arc};

fn open(sim: &Arc<SimulatedSdk>) -> Result<(Bridge, CameraHandle, NodeMapHandle), Box<dyn Error>> {
    let bridge = Bridge::new(sim.clone());
    let (status, camera) = bridge.camera_open(0);
    status.check()?;
    let (status, nodemap) = bridge.camera_get_node_map(camera);
    status.check()?;
    Ok((bridge, camera, nodemap))
}

fn node(
    bridge: &Bridge,
    nodemap: NodeMapHandle,
    name: &CStr,
) -> Result<NodeHandle, Box<dyn Error>> {
    let (status, node) = bridge.node_map_get_node(nodemap, name);
    status.check()?;
    assert!(!node.is_null());
    Ok(node)
}

#[test]
fn test_enumerate() -> Result<(), Box<dyn Error>> {
    let sim = Arc::new(SimulatedSdk::with_cameras(&[
        ("FA-SIM-1", "SIM0000001"),
        ("FA-SIM-2", "SIM0000002"),
    ]));
    let bridge = Bridge::new(sim);

    let (status, count) = bridge.camera_enumerate();
    assert_eq!(status, Status::SUCCESS);
    assert_eq!(count, 2);

    assert_eq!(bridge.camera_get_model_name(1), (Status::SUCCESS, "FA-SIM-2".to_owned()));
    assert_eq!(
        bridge.camera_get_serial_number(0),
        (Status::SUCCESS, "SIM0000001".to_owned())
    );
    Ok(())
}

#[test]
fn test_open_close() -> Result<(), Box<dyn Error>> {
    let sim = Arc::new(SimulatedSdk::new());
    let (bridge, camera, _) = open(&sim)?;
    assert!(!camera.is_null());

    let (status, second) = bridge.camera_open(0);
    assert_eq!(status.kind(), StatusKind::Busy);
    assert!(second.is_null());

    let (status, message) = bridge.get_last_error_message();
    assert!(status.is_success());
    assert!(message.contains("FA_Camera_Open"), "{message}");

    assert!(bridge.camera_close(camera).is_success());
    assert_eq!(bridge.camera_close(camera).code(), FA_ERR_INVALID_HANDLE);
    Ok(())
}

#[test]
fn test_handle_round_trip_through_native() -> Result<(), Box<dyn Error>> {
    let sim = Arc::new(SimulatedSdk::new());
    let (bridge, camera, nodemap) = open(&sim)?;

    // Through the host integer representation and back.
    let host = camera.to_host();
    let HostValue::UInt(addr) = host else {
        panic!("camera handle is not an unsigned integer: {host:?}");
    };
    let decoded = CameraHandle::from_host(&HostValue::UInt(addr))?;
    assert_eq!(decoded, camera);

    let (status, again) = bridge.camera_get_node_map(decoded);
    assert!(status.is_success());
    assert_eq!(again, nodemap);

    let null = CameraHandle::from_host(&HostValue::None)?;
    assert!(null.is_null());
    assert_eq!(bridge.camera_start_grabbing(null).code(), FA_ERR_INVALID_HANDLE);
    Ok(())
}

#[test]
fn test_typed_values() -> Result<(), Box<dyn Error>> {
    let sim = Arc::new(SimulatedSdk::new());
    let (bridge, _, nodemap) = open(&sim)?;

    let width = node(&bridge, nodemap, c"Width")?;
    assert_eq!(bridge.node_get_type(width), (Status::SUCCESS, NodeType::Integer));
    assert_eq!(bridge.integer_get_value(width), (Status::SUCCESS, 64));
    assert_eq!(bridge.integer_get_min(width), (Status::SUCCESS, 16));
    assert_eq!(bridge.integer_get_max(width), (Status::SUCCESS, 4096));
    assert_eq!(bridge.integer_get_inc(width), (Status::SUCCESS, 16));

    assert!(bridge.integer_set_value(width, 128).is_success());
    assert_eq!(bridge.integer_get_value(width), (Status::SUCCESS, 128));
    assert_eq!(
        bridge.integer_set_value(width, 8192).kind(),
        StatusKind::OutOfRange
    );
    assert_eq!(bridge.integer_get_value(width), (Status::SUCCESS, 128));

    let exposure = node(&bridge, nodemap, c"ExposureTime")?;
    assert!(bridge.float_set_value(exposure, 1250.0).is_success());
    assert_eq!(bridge.float_get_value(exposure), (Status::SUCCESS, 1250.0));
    assert_eq!(bridge.float_get_min(exposure), (Status::SUCCESS, 10.0));

    let temperature = node(&bridge, nodemap, c"DeviceTemperature")?;
    assert_eq!(bridge.node_get_access_mode(temperature), (Status::SUCCESS, AccessMode::ReadOnly));
    assert_eq!(
        bridge.float_set_value(temperature, 20.0).code(),
        FA_ERR_ACCESS_DENIED
    );

    let user_id = node(&bridge, nodemap, c"DeviceUserID")?;
    assert!(bridge.string_set_value(user_id, c"bench-left").is_success());
    assert_eq!(
        bridge.string_get_value(user_id),
        (Status::SUCCESS, "bench-left".to_owned())
    );
    Ok(())
}

#[test]
fn test_enumeration() -> Result<(), Box<dyn Error>> {
    let sim = Arc::new(SimulatedSdk::new());
    let (bridge, _, nodemap) = open(&sim)?;

    let format = node(&bridge, nodemap, c"PixelFormat")?;
    assert_eq!(bridge.node_get_type(format), (Status::SUCCESS, NodeType::Enumeration));
    assert_eq!(bridge.enumeration_get_num_entries(format), (Status::SUCCESS, 2));

    let (status, entry) = bridge.enumeration_get_entry_by_index(format, 1);
    assert!(status.is_success());
    assert_eq!(bridge.enum_entry_get_symbolic(entry), (Status::SUCCESS, "RGB8".to_owned()));
    assert_eq!(
        bridge.enum_entry_get_int_value(entry),
        (Status::SUCCESS, FA_PIXEL_FORMAT_RGB8 as i64)
    );

    let (status, by_name) = bridge.enumeration_get_entry_by_name(format, c"RGB8");
    assert!(status.is_success());
    assert_eq!(by_name, entry);

    assert!(bridge.node_from_string(format, c"RGB8").is_success());
    assert_eq!(
        bridge.enumeration_get_int_value(format),
        (Status::SUCCESS, FA_PIXEL_FORMAT_RGB8 as i64)
    );
    assert!(bridge
        .enumeration_set_int_value(format, FA_PIXEL_FORMAT_MONO8 as i64)
        .is_success());
    assert_eq!(bridge.node_to_string(format), (Status::SUCCESS, "Mono8".to_owned()));

    let (status, missing) = bridge.enumeration_get_entry_by_name(format, c"Bayer");
    assert_eq!(status.kind(), StatusKind::NotFound);
    assert!(missing.is_null());
    Ok(())
}

#[test]
fn test_strings() -> Result<(), Box<dyn Error>> {
    let sim = Arc::new(SimulatedSdk::new());
    let (bridge, _, nodemap) = open(&sim)?;

    let width = node(&bridge, nodemap, c"Width")?;
    assert_eq!(bridge.node_get_name(width), (Status::SUCCESS, "Width".to_owned()));
    assert_eq!(bridge.node_get_display_name(width), (Status::SUCCESS, "Width".to_owned()));
    let (status, tip) = bridge.node_get_tool_tip(width);
    assert!(status.is_success());
    assert!(tip.starts_with("Width of the image"));

    let user_id = node(&bridge, nodemap, c"DeviceUserID")?;
    assert_eq!(bridge.string_get_value(user_id), (Status::SUCCESS, String::new()));

    let exact = "x".repeat(STRING_CAPACITY - 1);
    let value = std::ffi::CString::new(exact.clone())?;
    assert!(bridge.string_set_value(user_id, &value).is_success());
    assert_eq!(bridge.string_get_value(user_id), (Status::SUCCESS, exact));
    Ok(())
}

#[test]
fn test_string_truncation() -> Result<(), Box<dyn Error>> {
    let sim = Arc::new(SimulatedSdk::new());
    let (bridge, _, nodemap) = open(&sim)?;

    let manifest = node(&bridge, nodemap, c"DeviceManifest")?;
    let (status, text) = bridge.string_get_value(manifest);
    assert_eq!(status.code(), FA_ERR_BUFFER_TOO_SMALL);
    assert_eq!(text.len(), STRING_CAPACITY - 1);
    assert!(text.starts_with("model=FA-SIM-1;serial=SIM0000001;"));
    Ok(())
}

#[test]
fn test_boolean_normalizer() -> Result<(), Box<dyn Error>> {
    let sim = Arc::new(SimulatedSdk::new());
    let (bridge, camera, nodemap) = open(&sim)?;

    let reverse_x = node(&bridge, nodemap, c"ReverseX")?;
    assert_eq!(bridge.boolean_value(reverse_x), Ok(false));
    assert_eq!(bridge.is_readable(reverse_x), Ok(true));
    assert_eq!(bridge.is_writable(reverse_x), Ok(true));

    assert!(bridge.boolean_set_value(reverse_x, true).is_success());
    assert_eq!(bridge.boolean_value(reverse_x), Ok(true));

    let lut = node(&bridge, nodemap, c"LUTEnable")?;
    assert_eq!(bridge.is_available(lut), Ok(false));
    let err = bridge.boolean_value(lut).unwrap_err();
    assert_eq!(err.code(), FA_ERR_ACCESS_DENIED);
    assert_eq!(err.kind(), StatusKind::AccessDenied);

    sim.fail_next_call(FA_ERR_IO);
    assert_eq!(bridge.boolean_value(reverse_x), Err(Status::from_code(FA_ERR_IO)));
    assert_eq!(bridge.boolean_value(reverse_x), Ok(true));

    assert_eq!(bridge.is_grabbing(camera), Ok(false));
    Ok(())
}

#[test]
fn test_commands() -> Result<(), Box<dyn Error>> {
    let sim = Arc::new(SimulatedSdk::new());
    let (bridge, _, nodemap) = open(&sim)?;

    let trigger = node(&bridge, nodemap, c"TriggerSoftware")?;
    assert_eq!(bridge.node_get_type(trigger), (Status::SUCCESS, NodeType::Command));
    assert_eq!(bridge.is_command_done(trigger), Ok(true));

    assert!(bridge.command_execute(trigger).is_success());
    assert_eq!(bridge.command_is_done(trigger), (Status::SUCCESS, false));
    assert_eq!(bridge.is_command_done(trigger), Ok(true));
    Ok(())
}

#[test]
fn test_node_enumeration_by_index() -> Result<(), Box<dyn Error>> {
    let sim = Arc::new(SimulatedSdk::new());
    let (bridge, _, nodemap) = open(&sim)?;

    let (status, count) = bridge.node_map_get_num_nodes(nodemap);
    assert!(status.is_success());
    assert!(count >= 17, "{count} nodes");

    let mut names = Vec::new();
    for index in 0..count {
        let (status, node) = bridge.node_map_get_node_by_index(nodemap, index);
        assert!(status.is_success());
        names.push(bridge.node_get_name(node).1);
    }
    assert!(names.iter().any(|n| n == "Root"));
    assert!(names.iter().any(|n| n == "ExposureTime"));

    let (status, past_end) = bridge.node_map_get_node_by_index(nodemap, count);
    assert!(!status.is_success());
    assert!(past_end.is_null());
    Ok(())
}

#[test]
fn test_walk() -> Result<(), Box<dyn Error>> {
    let sim = Arc::new(SimulatedSdk::new());
    let (bridge, _, nodemap) = open(&sim)?;

    let nodes = bridge.walk(nodemap)?;
    assert_eq!(nodes.len(), 17);

    assert_eq!(nodes[0].name, "Root");
    assert_eq!(nodes[0].depth, 0);
    assert_eq!(nodes[0].node_type, NodeType::Category);
    assert_eq!(nodes[1].name, "DeviceControl");
    assert_eq!(nodes[1].depth, 1);
    assert_eq!(nodes[2].name, "DeviceModelName");
    assert_eq!(nodes[2].depth, 2);
    assert_eq!(nodes[2].value.as_deref(), Some("FA-SIM-1"));

    let manifest = nodes.iter().find(|n| n.name == "DeviceManifest").unwrap();
    assert_eq!(manifest.visibility, Visibility::Guru);
    assert_eq!(manifest.value.as_ref().map(String::len), Some(STRING_CAPACITY - 1));

    let lut = nodes.iter().find(|n| n.name == "LUTEnable").unwrap();
    assert_eq!(lut.access, AccessMode::NotAvailable);
    assert_eq!(lut.value, None);

    let json = nodes[2].to_json();
    assert_eq!(json["name"], "DeviceModelName");
    Ok(())
}

#[test]
fn test_buffer_without_frame() -> Result<(), Box<dyn Error>> {
    let sim = Arc::new(SimulatedSdk::new());
    let (bridge, camera, _) = open(&sim)?;

    let (status, bytes) = bridge.get_buffer(camera)?;
    assert_eq!(status.code(), FA_ERR_NOT_AVAILABLE);
    assert_eq!(bytes, None);

    let (status, image) = bridge.retrieve_result(camera, 10)?;
    assert_eq!(status.code(), FA_ERR_NOT_AVAILABLE);
    assert!(image.is_none());
    Ok(())
}

#[test]
#[serial]
fn test_grab_results() -> Result<(), Box<dyn Error>> {
    let sim = Arc::new(SimulatedSdk::new());
    let (bridge, camera, _) = open(&sim)?;

    assert!(bridge.camera_start_grabbing(camera).is_success());
    assert_eq!(bridge.camera_is_grabbing(camera), (Status::SUCCESS, true));

    let mut last_id = 0;
    for _ in 0..3 {
        let (status, image) = bridge.retrieve_result(camera, 1000)?;
        status.check()?;
        let image = image.unwrap();
        assert_eq!((image.width, image.height), (64, 48));
        assert_eq!(image.pixel_format, FA_PIXEL_FORMAT_MONO8);
        assert_eq!(image.data.len(), 64 * 48);
        assert!(image.frame_id > last_id);
        last_id = image.frame_id;

        let (status, bytes) = bridge.get_buffer(camera)?;
        assert!(status.is_success());
        assert_eq!(bytes.as_deref(), Some(image.data.as_slice()));
    }

    assert!(bridge.camera_stop_grabbing(camera).is_success());
    assert_eq!(bridge.is_grabbing(camera), Ok(false));
    assert!(bridge.camera_close(camera).is_success());
    Ok(())
}
