// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the FA SDK probe.
///
/// Arguments can be given on the command line or through environment
/// variables.
///
/// # Example
///
/// ```bash
/// # Dump the feature tree of the first camera
/// fai-probe --dump
///
/// # Grab ten frames from a simulated camera and keep the last one
/// fai-probe --simulate --grab 10 --save frame.jpg
/// ```
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the FA SDK C library
    #[arg(long, env = "FAI_LIBRARY", default_value = fai_sys::DEFAULT_LIBRARY)]
    pub library: String,

    /// Use the built-in simulated SDK instead of loading the library
    #[arg(long, env = "FAI_SIMULATE")]
    pub simulate: bool,

    /// Index of the camera to open
    #[arg(short, long, env = "CAMERA", default_value = "0")]
    pub camera: usize,

    /// Print the camera's feature tree as JSON
    #[arg(long)]
    pub dump: bool,

    /// Number of frames to grab
    #[arg(short, long, default_value = "0")]
    pub grab: usize,

    /// Grab timeout in milliseconds
    #[arg(long, env = "GRAB_TIMEOUT", default_value = "1000")]
    pub timeout: u32,

    /// Save the last grabbed frame as JPEG
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Send logs to the systemd journal
    #[arg(long, env = "JOURNALD")]
    pub journald: bool,

    /// Enable Tracy profiler for performance analysis
    #[arg(long, env = "TRACY")]
    pub tracy: bool,
}
