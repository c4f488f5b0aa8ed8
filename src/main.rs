// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

mod args;

use args::Args;
use clap::Parser;
use fai_bridge::{Bridge, Callback, CameraHandle, ImageInfo, NodeInfo, SimulatedSdk};
use std::{error::Error, fs, io, process, sync::Arc, time::Duration};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, Layer};

fn init_logging(args: &Args) -> Result<(), Box<dyn Error>> {
    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let stderr = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_filter(level);

    let journald = if args.journald {
        Some(tracing_journald::layer()?.with_filter(level))
    } else {
        None
    };

    let tracy = if args.tracy {
        tracy_client::Client::start();
        Some(tracing_tracy::TracyLayer::default())
    } else {
        None
    };

    let subscriber = tracing_subscriber::registry()
        .with(stderr)
        .with(journald)
        .with(tracy);
    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;
    Ok(())
}

/// Encodes a Mono8, RGB8 or BGR8 frame as JPEG.
fn encode_jpeg(image: &ImageInfo) -> Result<turbojpeg::OwnedBuf, Box<dyn Error>> {
    use turbojpeg::{PixelFormat, Subsamp};

    let (format, channels, subsamp) = match image.pixel_format {
        fai_sys::FA_PIXEL_FORMAT_MONO8 => (PixelFormat::GRAY, 1, Subsamp::Gray),
        fai_sys::FA_PIXEL_FORMAT_RGB8 => (PixelFormat::RGB, 3, Subsamp::Sub2x2),
        fai_sys::FA_PIXEL_FORMAT_BGR8 => (PixelFormat::BGR, 3, Subsamp::Sub2x2),
        other => {
            return Err(Box::new(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot encode pixel format {other:#010x}"),
            )));
        }
    };

    let img = turbojpeg::Image {
        width: image.width as usize,
        height: image.height as usize,
        format,
        pixels: image.data.as_slice(),
        pitch: image.width as usize * channels,
    };
    Ok(turbojpeg::compress(img, 95, subsamp)?)
}

fn dump(bridge: &Bridge, camera: CameraHandle) -> Result<(), Box<dyn Error>> {
    let (status, nodemap) = bridge.camera_get_node_map(camera);
    status.check()?;

    let nodes = bridge.walk(nodemap)?;
    debug!(count = nodes.len(), "walked feature tree");
    let json = serde_json::Value::Array(nodes.iter().map(NodeInfo::to_json).collect());
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn grab(bridge: &Bridge, camera: CameraHandle, args: &Args) -> Result<(), Box<dyn Error>> {
    let (tx, rx) = kanal::bounded::<CameraHandle>(16);
    let (status, registration) = bridge.register_image_grabbed(
        camera,
        Callback::host(move |camera| {
            if !matches!(tx.try_send(camera), Ok(true)) {
                debug!(?camera, "dropped image grabbed notification");
            }
        }),
    )?;
    status.check()?;
    bridge.camera_start_grabbing(camera).check()?;

    let timeout = Duration::from_millis(args.timeout as u64);
    let mut last = None;
    let mut grabbed = 0;
    while grabbed < args.grab {
        if rx.recv_timeout(timeout).is_err() {
            warn!(grabbed, "timed out waiting for a frame");
            break;
        }

        match bridge.retrieve_result(camera, args.timeout)? {
            (status, Some(image)) if status.is_success() => {
                info!(
                    frame_id = image.frame_id,
                    width = image.width,
                    height = image.height,
                    size = image.data.len(),
                    "grabbed"
                );
                last = Some(image);
                grabbed += 1;
            }
            (status, _) => warn!(%status, "retrieve result failed"),
        }
    }

    let status = bridge.camera_stop_grabbing(camera);
    if !status.is_success() {
        warn!(%status, "stop grabbing failed");
    }
    bridge
        .deregister_camera_callback(camera, registration)
        .check()?;

    if let (Some(path), Some(image)) = (&args.save, last) {
        let jpeg = encode_jpeg(&image)?;
        fs::write(path, &*jpeg)?;
        info!(path = %path.display(), size = jpeg.len(), "saved frame");
    }
    Ok(())
}

fn run(bridge: &Bridge, camera: CameraHandle, args: &Args) -> Result<(), Box<dyn Error>> {
    let (status, removal) = bridge.register_configuration_removal(
        camera,
        Callback::host(|camera| warn!(?camera, "camera removed")),
    )?;
    status.check()?;

    if args.dump {
        dump(bridge, camera)?;
    }
    if args.grab > 0 {
        grab(bridge, camera, args)?;
    }

    bridge.deregister_camera_callback(camera, removal).check()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(&args)?;

    let bridge = if args.simulate {
        info!("using simulated FA SDK");
        Bridge::new(Arc::new(SimulatedSdk::new()))
    } else {
        Bridge::load(&args.library)?
    };

    let (status, count) = bridge.camera_enumerate();
    status.check()?;
    for index in 0..count {
        let (_, model) = bridge.camera_get_model_name(index);
        let (_, serial) = bridge.camera_get_serial_number(index);
        info!(index, model = %model, serial = %serial, "found camera");
    }
    if args.camera >= count {
        error!(camera = args.camera, count, "no such camera");
        process::exit(1);
    }

    let (status, camera) = bridge.camera_open(args.camera);
    if let Err(err) = status.check() {
        let (_, message) = bridge.get_last_error_message();
        error!(%err, message = %message, "failed to open camera");
        process::exit(1);
    }

    let result = run(&bridge, camera, &args);
    let status = bridge.camera_close(camera);
    if !status.is_success() {
        warn!(%status, "camera close failed");
    }
    result
}
