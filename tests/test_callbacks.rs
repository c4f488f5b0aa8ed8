// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use fai_bridge::{
    callback::{self, CameraEvents, NodeEvents},
    fault_count, Bridge, BridgeError, Callback, CameraCallbackHandle, CameraHandle, HostLock,
    NodeMapHandle, SimulatedSdk, Status, TRAMPOLINE_SLOTS,
};
use fai_sys::{c_void, FA_ERR_INVALID_HANDLE, FA_ERR_IO};
use parking_lot::Mutex;
use serial_test::serial;
use std::{
    error::Error,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Barrier,
    },
    thread,
    time::Duration,
};

fn open(sim: &Arc<SimulatedSdk>) -> Result<(Bridge, CameraHandle, NodeMapHandle), Box<dyn Error>> {
    let bridge = Bridge::new(sim.clone());
    let (status, camera) = bridge.camera_open(0);
    status.check()?;
    let (status, nodemap) = bridge.camera_get_node_map(camera);
    status.check()?;
    Ok((bridge, camera, nodemap))
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 251) as u8).collect()
}

#[test]
#[serial]
fn test_image_grabbed_once() -> Result<(), Box<dyn Error>> {
    let sim = Arc::new(SimulatedSdk::new());
    let (bridge, camera, _) = open(&sim)?;

    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let (status, registration) = bridge.register_image_grabbed(camera, {
        let calls = calls.clone();
        let seen = seen.clone();
        Callback::host(move |handle| {
            calls.fetch_add(1, Ordering::SeqCst);
            seen.lock().push(handle);
        })
    })?;
    status.check()?;
    assert!(!registration.is_null());
    assert_eq!(callback::live::<CameraEvents>(), 1);

    let payload = pattern(1024);
    assert!(sim.trigger_grab(camera, &payload).is_success());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(*seen.lock(), vec![camera]);

    let (status, bytes) = bridge.get_buffer(camera)?;
    assert!(status.is_success());
    assert_eq!(bytes, Some(payload));

    assert!(bridge
        .deregister_camera_callback(camera, registration)
        .is_success());
    assert_eq!(callback::live::<CameraEvents>(), 0);

    assert!(sim.trigger_grab(camera, &pattern(16)).is_success());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
#[serial]
fn test_buffer_outlives_frame() -> Result<(), Box<dyn Error>> {
    let sim = Arc::new(SimulatedSdk::new());
    let (bridge, camera, _) = open(&sim)?;

    let first = pattern(1024);
    sim.trigger_grab(camera, &first).check()?;
    let (_, copy) = bridge.get_buffer(camera)?;

    // Replaces and frees the native payload the copy was taken from.
    sim.trigger_grab(camera, &[0xff; 64]).check()?;
    assert_eq!(copy, Some(first));

    let (_, current) = bridge.get_buffer(camera)?;
    assert_eq!(current, Some(vec![0xff; 64]));
    Ok(())
}

#[test]
#[serial]
fn test_callback_reenters_sdk() -> Result<(), Box<dyn Error>> {
    let sim = Arc::new(SimulatedSdk::new());
    let (bridge, camera, _) = open(&sim)?;
    let bridge = Arc::new(bridge);

    let copied = Arc::new(Mutex::new(None));
    let (status, registration) = bridge.register_image_grabbed(camera, {
        let bridge = bridge.clone();
        let copied = copied.clone();
        Callback::host(move |camera| {
            if let Ok((status, bytes)) = bridge.get_buffer(camera) {
                assert!(status.is_success());
                *copied.lock() = bytes;
            }
        })
    })?;
    status.check()?;

    let payload = pattern(300);
    sim.trigger_grab(camera, &payload).check()?;
    assert_eq!(copied.lock().take(), Some(payload));

    bridge
        .deregister_camera_callback(camera, registration)
        .check()?;
    Ok(())
}

#[test]
#[serial]
fn test_callback_on_native_thread() -> Result<(), Box<dyn Error>> {
    let sim = Arc::new(SimulatedSdk::new());
    let (bridge, camera, _) = open(&sim)?;

    let threads = Arc::new(Mutex::new(Vec::new()));
    let (status, registration) = bridge.register_image_grabbed(camera, {
        let threads = threads.clone();
        Callback::host(move |_| threads.lock().push(thread::current().id()))
    })?;
    status.check()?;

    let status = sim
        .trigger_grab_on_thread(camera, pattern(128))
        .join()
        .map_err(|_| "grab thread panicked")?;
    assert!(status.is_success());

    let threads = threads.lock().clone();
    assert_eq!(threads.len(), 1);
    assert_ne!(threads[0], thread::current().id());

    bridge
        .deregister_camera_callback(camera, registration)
        .check()?;
    Ok(())
}

#[test]
#[serial]
fn test_panic_is_contained() -> Result<(), Box<dyn Error>> {
    let sim = Arc::new(SimulatedSdk::new());
    let (bridge, camera, nodemap) = open(&sim)?;

    let before = fault_count();
    let (status, registration) = bridge.register_image_grabbed(
        camera,
        Callback::host(|_| panic!("host callback failed")),
    )?;
    status.check()?;

    assert!(sim.trigger_grab(camera, &pattern(32)).is_success());
    assert_eq!(fault_count(), before + 1);

    // Nothing is poisoned.
    let (status, width) = bridge.node_map_get_node(nodemap, c"Width");
    status.check()?;
    assert_eq!(bridge.integer_get_value(width), (Status::SUCCESS, 64));
    assert!(sim.trigger_grab(camera, &pattern(32)).is_success());
    assert_eq!(fault_count(), before + 2);

    bridge
        .deregister_camera_callback(camera, registration)
        .check()?;
    Ok(())
}

#[test]
#[serial]
fn test_host_lock_held_during_callback() -> Result<(), Box<dyn Error>> {
    let sim = Arc::new(SimulatedSdk::new());
    let (bridge, camera, _) = open(&sim)?;

    let held = Arc::new(Mutex::new(Vec::new()));
    let (status, registration) = bridge.register_image_grabbed(camera, {
        let held = held.clone();
        Callback::host(move |_| {
            let free = thread::spawn(|| HostLock::global().try_acquire().is_some())
                .join()
                .unwrap_or(true);
            held.lock().push(!free);
        })
    })?;
    status.check()?;

    sim.trigger_grab(camera, &pattern(16)).check()?;
    assert_eq!(*held.lock(), vec![true]);
    bridge
        .deregister_camera_callback(camera, registration)
        .check()?;

    // A panicking callable still releases the lock.
    let before = fault_count();
    let (status, registration) = bridge.register_image_grabbed(
        camera,
        Callback::host(|_| panic!("host callback failed")),
    )?;
    status.check()?;
    sim.trigger_grab_on_thread(camera, pattern(16))
        .join()
        .map_err(|_| "grab thread panicked")?
        .check()?;
    assert_eq!(fault_count(), before + 1);
    assert!(HostLock::global().try_acquire().is_some());

    bridge
        .deregister_camera_callback(camera, registration)
        .check()?;
    Ok(())
}

#[test]
#[serial]
fn test_deregister_during_invocation() -> Result<(), Box<dyn Error>> {
    let sim = Arc::new(SimulatedSdk::new());
    let (bridge, camera, _) = open(&sim)?;

    let entered = Arc::new(Barrier::new(2));
    let resume = Arc::new(Barrier::new(2));
    let calls = Arc::new(AtomicUsize::new(0));
    let completed = Arc::new(AtomicUsize::new(0));
    let (status, registration) = bridge.register_image_grabbed(camera, {
        let entered = entered.clone();
        let resume = resume.clone();
        let calls = calls.clone();
        let completed = completed.clone();
        Callback::host(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            entered.wait();
            resume.wait();
            completed.fetch_add(1, Ordering::SeqCst);
        })
    })?;
    status.check()?;

    let grab = sim.trigger_grab_on_thread(camera, pattern(64));
    entered.wait();
    bridge
        .deregister_camera_callback(camera, registration)
        .check()?;
    assert_eq!(callback::live::<CameraEvents>(), 0);
    assert_eq!(completed.load(Ordering::SeqCst), 0);

    resume.wait();
    grab.join().map_err(|_| "grab thread panicked")?.check()?;
    assert_eq!(completed.load(Ordering::SeqCst), 1);

    let faults = fault_count();
    sim.trigger_grab(camera, &pattern(64)).check()?;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(fault_count(), faults);
    Ok(())
}

#[test]
#[serial]
fn test_events_delivered_in_order() -> Result<(), Box<dyn Error>> {
    const FRAMES: u8 = 16;

    let sim = Arc::new(SimulatedSdk::new());
    let (bridge, camera, _) = open(&sim)?;
    let bridge = Arc::new(bridge);

    let order = Arc::new(Mutex::new(Vec::new()));
    let (status, registration) = bridge.register_image_grabbed(camera, {
        let bridge = bridge.clone();
        let order = order.clone();
        Callback::host(move |camera| {
            if let Ok((_, Some(bytes))) = bridge.get_buffer(camera) {
                order.lock().push(bytes[0]);
            }
        })
    })?;
    status.check()?;

    let source = sim.clone();
    let statuses = thread::spawn(move || {
        (0..FRAMES)
            .map(|id| source.trigger_grab(camera, &[id; 32]))
            .collect::<Vec<_>>()
    })
    .join()
    .map_err(|_| "grab thread panicked")?;
    assert!(statuses.iter().all(|status| status.is_success()));
    assert_eq!(*order.lock(), (0..FRAMES).collect::<Vec<_>>());

    bridge
        .deregister_camera_callback(camera, registration)
        .check()?;
    Ok(())
}

#[test]
#[serial]
fn test_registration_handles_per_source() -> Result<(), Box<dyn Error>> {
    let sim = Arc::new(SimulatedSdk::new());
    sim.number_registrations_per_source();
    let (bridge, _, nodemap) = open(&sim)?;
    let (status, width) = bridge.node_map_get_node(nodemap, c"Width");
    status.check()?;
    let (status, height) = bridge.node_map_get_node(nodemap, c"Height");
    status.check()?;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let (status, on_width) = bridge.register_node_callback(width, {
        let seen = seen.clone();
        Callback::host(move |node| seen.lock().push(node))
    })?;
    status.check()?;
    let (status, on_height) = bridge.register_node_callback(height, {
        let seen = seen.clone();
        Callback::host(move |node| seen.lock().push(node))
    })?;
    status.check()?;
    assert_eq!(on_width, on_height);
    assert_eq!(bridge.registrations(), 2);
    assert_eq!(callback::live::<NodeEvents>(), 2);

    bridge.deregister_node_callback(width, on_width).check()?;
    assert_eq!(bridge.registrations(), 1);
    assert_eq!(callback::live::<NodeEvents>(), 1);
    assert_eq!(sim.registrations(), (0, 1));

    bridge.integer_set_value(width, 128).check()?;
    bridge.integer_set_value(height, 96).check()?;
    assert_eq!(*seen.lock(), vec![height]);

    drop(bridge);
    assert_eq!(sim.registrations(), (0, 0));
    assert_eq!(callback::live::<NodeEvents>(), 0);
    Ok(())
}

#[test]
#[serial]
fn test_node_callbacks() -> Result<(), Box<dyn Error>> {
    let sim = Arc::new(SimulatedSdk::new());
    let (bridge, _, nodemap) = open(&sim)?;
    let (status, width) = bridge.node_map_get_node(nodemap, c"Width");
    status.check()?;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let (status, registration) = bridge.register_node_callback(width, {
        let seen = seen.clone();
        Callback::host(move |node| seen.lock().push(node))
    })?;
    status.check()?;
    assert_eq!(sim.registrations(), (0, 1));

    bridge.integer_set_value(width, 256).check()?;
    assert_eq!(*seen.lock(), vec![width]);

    bridge.node_map_invalidate_nodes(nodemap).check()?;
    assert_eq!(seen.lock().len(), 2);

    // Rejected writes raise no event.
    assert!(!bridge.integer_set_value(width, 1).is_success());
    assert_eq!(seen.lock().len(), 2);

    bridge.deregister_node_callback(width, registration).check()?;
    assert_eq!(callback::live::<NodeEvents>(), 0);
    bridge.integer_set_value(width, 512).check()?;
    assert_eq!(seen.lock().len(), 2);
    Ok(())
}

static NATIVE_CALLS: AtomicUsize = AtomicUsize::new(0);

unsafe extern "C" fn count_native(_camera: *mut c_void) {
    NATIVE_CALLS.fetch_add(1, Ordering::SeqCst);
}

#[test]
#[serial]
fn test_native_pointer_passthrough() -> Result<(), Box<dyn Error>> {
    let sim = Arc::new(SimulatedSdk::new());
    let (bridge, camera, _) = open(&sim)?;
    NATIVE_CALLS.store(0, Ordering::SeqCst);

    let (status, raw) = bridge.register_image_grabbed_raw(camera, Some(count_native));
    status.check()?;
    let (status, wrapped) =
        bridge.register_image_grabbed(camera, Callback::Native(count_native))?;
    status.check()?;
    assert_eq!(callback::live::<CameraEvents>(), 0);
    assert_eq!(bridge.registrations(), 2);

    sim.trigger_grab(camera, &pattern(8)).check()?;
    assert_eq!(NATIVE_CALLS.load(Ordering::SeqCst), 2);

    bridge.deregister_camera_callback(camera, raw).check()?;
    bridge.deregister_camera_callback(camera, wrapped).check()?;
    assert_eq!(bridge.registrations(), 0);
    assert_eq!(sim.registrations(), (0, 0));
    Ok(())
}

#[test]
#[serial]
fn test_configuration_removal() -> Result<(), Box<dyn Error>> {
    let sim = Arc::new(SimulatedSdk::new());
    let (bridge, camera, _) = open(&sim)?;

    let removed = Arc::new(AtomicUsize::new(0));
    let (status, registration) = bridge.register_configuration_removal(camera, {
        let removed = removed.clone();
        Callback::host(move |_| {
            removed.fetch_add(1, Ordering::SeqCst);
        })
    })?;
    status.check()?;

    // Image events do not reach removal callbacks.
    sim.trigger_grab(camera, &pattern(8)).check()?;
    assert_eq!(removed.load(Ordering::SeqCst), 0);

    sim.remove_configuration(camera).check()?;
    assert_eq!(removed.load(Ordering::SeqCst), 1);
    assert_eq!(bridge.camera_start_grabbing(camera).code(), FA_ERR_IO);

    bridge
        .deregister_camera_callback(camera, registration)
        .check()?;
    assert_eq!(callback::live::<CameraEvents>(), 0);
    Ok(())
}

#[test]
#[serial]
fn test_failed_registration_releases_slot() -> Result<(), Box<dyn Error>> {
    let sim = Arc::new(SimulatedSdk::new());
    let (bridge, camera, _) = open(&sim)?;

    sim.fail_next_call(FA_ERR_IO);
    let (status, registration) =
        bridge.register_image_grabbed(camera, Callback::host(|_| {}))?;
    assert_eq!(status.code(), FA_ERR_IO);
    assert!(registration.is_null());
    assert_eq!(callback::live::<CameraEvents>(), 0);
    assert_eq!(bridge.registrations(), 0);
    Ok(())
}

#[test]
#[serial]
fn test_failed_deregistration_keeps_slot() -> Result<(), Box<dyn Error>> {
    let sim = Arc::new(SimulatedSdk::new());
    let (bridge, camera, _) = open(&sim)?;

    let (status, registration) =
        bridge.register_image_grabbed(camera, Callback::host(|_| {}))?;
    status.check()?;

    let bogus = CameraCallbackHandle::decode(Some(0xdead));
    let status = bridge.deregister_camera_callback(camera, bogus);
    assert_eq!(status.code(), FA_ERR_INVALID_HANDLE);
    assert_eq!(callback::live::<CameraEvents>(), 1);
    assert_eq!(bridge.registrations(), 1);

    bridge
        .deregister_camera_callback(camera, registration)
        .check()?;
    assert_eq!(callback::live::<CameraEvents>(), 0);
    Ok(())
}

#[test]
#[serial]
fn test_trampoline_exhaustion() -> Result<(), Box<dyn Error>> {
    let sim = Arc::new(SimulatedSdk::new());
    let (bridge, _, nodemap) = open(&sim)?;
    let (status, width) = bridge.node_map_get_node(nodemap, c"Width");
    status.check()?;

    let calls = Arc::new(AtomicUsize::new(0));
    for _ in 0..TRAMPOLINE_SLOTS {
        let calls = calls.clone();
        let (status, _) = bridge.register_node_callback(
            width,
            Callback::host(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            }),
        )?;
        status.check()?;
    }
    assert_eq!(callback::live::<NodeEvents>(), TRAMPOLINE_SLOTS);

    let err = bridge
        .register_node_callback(width, Callback::host(|_| {}))
        .unwrap_err();
    assert!(matches!(
        err,
        BridgeError::TrampolinesExhausted {
            family: "node",
            capacity: TRAMPOLINE_SLOTS,
        }
    ));
    assert_eq!(sim.registrations(), (0, TRAMPOLINE_SLOTS));

    // Every slot dispatches to its own callable.
    bridge.integer_set_value(width, 32).check()?;
    assert_eq!(calls.load(Ordering::SeqCst), TRAMPOLINE_SLOTS);

    drop(bridge);
    assert_eq!(sim.registrations(), (0, 0));
    assert_eq!(callback::live::<NodeEvents>(), 0);
    Ok(())
}

#[test]
#[serial]
fn test_drop_deregisters() -> Result<(), Box<dyn Error>> {
    let sim = Arc::new(SimulatedSdk::new());
    let (bridge, camera, nodemap) = open(&sim)?;
    let (status, exposure) = bridge.node_map_get_node(nodemap, c"ExposureTime");
    status.check()?;

    bridge
        .register_image_grabbed(camera, Callback::host(|_| {}))?
        .0
        .check()?;
    bridge
        .register_configuration_removal(camera, Callback::host(|_| {}))?
        .0
        .check()?;
    bridge
        .register_node_callback(exposure, Callback::host(|_| {}))?
        .0
        .check()?;
    assert_eq!(sim.registrations(), (2, 1));
    assert_eq!(bridge.registrations(), 3);

    drop(bridge);
    assert_eq!(sim.registrations(), (0, 0));
    assert_eq!(callback::live::<CameraEvents>(), 0);
    assert_eq!(callback::live::<NodeEvents>(), 0);
    Ok(())
}

#[test]
#[serial]
fn test_grab_thread_events() -> Result<(), Box<dyn Error>> {
    let sim = Arc::new(SimulatedSdk::with_frame_interval(
        &[("FA-SIM-1", "SIM0000001")],
        Duration::from_millis(5),
    ));
    let (bridge, camera, _) = open(&sim)?;

    let (tx, rx) = kanal::bounded::<CameraHandle>(64);
    let (status, registration) = bridge.register_image_grabbed(
        camera,
        Callback::host(move |camera| {
            let _ = tx.try_send(camera);
        }),
    )?;
    status.check()?;
    bridge.camera_start_grabbing(camera).check()?;

    for _ in 0..3 {
        let handle = rx.recv_timeout(Duration::from_secs(1))?;
        assert_eq!(handle, camera);
        let (status, image) = bridge.retrieve_result(camera, 1000)?;
        status.check()?;
        assert!(image.is_some_and(|image| !image.data.is_empty()));
    }

    bridge.camera_stop_grabbing(camera).check()?;
    bridge
        .deregister_camera_callback(camera, registration)
        .check()?;
    Ok(())
}
