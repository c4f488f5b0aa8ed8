// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Simulated FA SDK.
//!
//! [`SimulatedSdk`] implements [`NativeApi`] in process so the bridge can be
//! exercised without a camera. It behaves like a native library at the
//! boundary: results are written through the caller's out-pointers, text is
//! copied into the caller's buffers under the capacity contract, handles are
//! synthetic addresses and callbacks are invoked through the registered
//! `extern "C"` function pointers, from a grab thread while grabbing.
//!
//! Every simulated camera exposes the same feature tree below `Root`:
//!
//! ```text
//! Root
//! ├── DeviceControl        DeviceModelName, DeviceSerialNumber, DeviceUserID,
//! │                        DeviceManifest, DeviceTemperature, DeviceReset
//! ├── ImageFormatControl   Width, Height, PixelFormat, ReverseX, LUTEnable
//! └── AcquisitionControl   ExposureTime, TriggerSoftware
//! ```
//!
//! `DeviceManifest` is longer than the bridge's text buffers and `LUTEnable`
//! is never available, which makes both useful for failure paths.

use crate::{callback::NativeCallback, handle::CameraHandle, native::NativeApi, status::Status};
use fai_sys::*;
use parking_lot::{Condvar, Mutex};
use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    ffi::CStr,
    ptr,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};
use tracing::{debug, trace};

const CAMERA_BASE: usize = 0x1000_0000;
const NODEMAP_BASE: usize = 0x2000_0000;
const NODE_BASE: usize = 0x3000_0000;
const REGISTRATION_BASE: usize = 0x4000_0000;
const STRIDE: usize = 0x40;

/// Frames buffered between the grab thread and `FA_Camera_RetrieveResult`.
const QUEUE_DEPTH: usize = 4;

const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(10);

fn encode(base: usize, index: usize) -> *mut c_void {
    (base + (index + 1) * STRIDE) as *mut c_void
}

fn decode(base: usize, raw: *mut c_void) -> Option<usize> {
    let offset = (raw as usize).checked_sub(base)?;
    if offset == 0 || offset % STRIDE != 0 {
        return None;
    }
    Some(offset / STRIDE - 1)
}

unsafe fn put<T>(out: *mut T, value: T) -> Result<(), FA_STATUS> {
    if out.is_null() {
        return Err(FA_ERR_INVALID_ARGUMENT);
    }
    out.write(value);
    Ok(())
}

/// Writes `text` under the SDK text contract, see the `fai-sys` docs.
unsafe fn put_text(text: &str, buf: *mut c_char, len: *mut size_t) -> Result<(), FA_STATUS> {
    if buf.is_null() || len.is_null() {
        return Err(FA_ERR_INVALID_ARGUMENT);
    }
    let capacity = *len;
    let bytes = text.as_bytes();
    *len = bytes.len();
    if capacity == 0 {
        return Err(FA_ERR_BUFFER_TOO_SMALL);
    }
    let n = bytes.len().min(capacity - 1);
    ptr::copy_nonoverlapping(bytes.as_ptr().cast::<c_char>(), buf, n);
    *buf.add(n) = 0;
    if n < bytes.len() {
        Err(FA_ERR_BUFFER_TOO_SMALL)
    } else {
        Ok(())
    }
}

unsafe fn get_text<'a>(text: *const c_char) -> Result<&'a str, FA_STATUS> {
    if text.is_null() {
        return Err(FA_ERR_INVALID_ARGUMENT);
    }
    CStr::from_ptr(text)
        .to_str()
        .map_err(|_| FA_ERR_INVALID_ARGUMENT)
}

struct Event {
    callback: NativeCallback,
    handle: usize,
}

fn fire(events: Vec<Event>) {
    for event in events {
        unsafe { (event.callback)(event.handle as *mut c_void) };
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum CameraEvent {
    ConfigurationRemoval,
    ImageGrabbed,
}

struct CameraRegistration {
    event: CameraEvent,
    callback: NativeCallback,
}

/// Object a registration is attached to, by camera or node index.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Source {
    Camera(usize),
    Node(usize),
}

struct IntValue {
    value: i64,
    min: i64,
    max: i64,
    inc: i64,
}

impl IntValue {
    fn set(&mut self, value: i64) -> Result<(), FA_STATUS> {
        if value < self.min || value > self.max || (value - self.min) % self.inc != 0 {
            return Err(FA_ERR_OUT_OF_RANGE);
        }
        self.value = value;
        Ok(())
    }
}

struct FloatValue {
    value: f64,
    min: f64,
    max: f64,
}

impl FloatValue {
    fn set(&mut self, value: f64) -> Result<(), FA_STATUS> {
        if !(self.min..=self.max).contains(&value) {
            return Err(FA_ERR_OUT_OF_RANGE);
        }
        self.value = value;
        Ok(())
    }
}

enum SimValue {
    Category(Vec<usize>),
    Integer(IntValue),
    Float(FloatValue),
    Boolean(bool),
    Text(String),
    Enumeration { entries: Vec<usize>, value: i64 },
    EnumEntry { symbolic: String, value: i64 },
    /// Number of `IsDone` polls left before the command completes.
    Command { pending: u8 },
}

struct SimNode {
    camera: usize,
    name: String,
    display_name: String,
    tool_tip: String,
    visibility: FA_VISIBILITY,
    access: FA_ACCESS_MODE,
    value: SimValue,
}

impl SimNode {
    fn node_type(&self) -> FA_NODE_TYPE {
        match self.value {
            SimValue::Category(_) => FA_NODE_TYPE_CATEGORY,
            SimValue::Integer(_) => FA_NODE_TYPE_INTEGER,
            SimValue::Float(_) => FA_NODE_TYPE_FLOAT,
            SimValue::Boolean(_) => FA_NODE_TYPE_BOOLEAN,
            SimValue::Text(_) => FA_NODE_TYPE_STRING,
            SimValue::Enumeration { .. } => FA_NODE_TYPE_ENUMERATION,
            SimValue::EnumEntry { .. } => FA_NODE_TYPE_ENUM_ENTRY,
            SimValue::Command { .. } => FA_NODE_TYPE_COMMAND,
        }
    }

    fn is_available(&self) -> bool {
        !matches!(self.access, FA_ACCESS_NI | FA_ACCESS_NA)
    }

    fn is_readable(&self) -> bool {
        matches!(self.access, FA_ACCESS_RO | FA_ACCESS_RW)
    }

    fn is_writable(&self) -> bool {
        matches!(self.access, FA_ACCESS_WO | FA_ACCESS_RW)
    }

    fn available(&self) -> Result<&SimValue, FA_STATUS> {
        if self.is_available() {
            Ok(&self.value)
        } else {
            Err(FA_ERR_ACCESS_DENIED)
        }
    }

    fn readable(&self) -> Result<&SimValue, FA_STATUS> {
        if self.is_readable() {
            Ok(&self.value)
        } else {
            Err(FA_ERR_ACCESS_DENIED)
        }
    }

    fn writable(&mut self) -> Result<&mut SimValue, FA_STATUS> {
        if self.is_writable() {
            Ok(&mut self.value)
        } else {
            Err(FA_ERR_ACCESS_DENIED)
        }
    }
}

struct Frame {
    width: u32,
    height: u32,
    pixel_format: u32,
    frame_id: u64,
    timestamp: u64,
    data: Vec<u8>,
}

struct SimCamera {
    model: String,
    serial: String,
    open: bool,
    removed: bool,
    grabbing: bool,
    /// Bumped on every start so a stale grab thread stops on its own.
    generation: u64,
    /// Node arena indices in declaration order.
    nodes: Vec<usize>,
    names: HashMap<String, usize>,
    queue: VecDeque<Frame>,
    current: Option<Frame>,
    frame_id: u64,
}

struct SimState {
    cameras: Vec<SimCamera>,
    nodes: Vec<SimNode>,
    camera_callbacks: BTreeMap<(usize, usize), CameraRegistration>,
    node_callbacks: BTreeMap<(usize, usize), NativeCallback>,
    /// Last issued registration id, per source when `per_source_ids` is set.
    next_registration: BTreeMap<Option<Source>, usize>,
    per_source_ids: bool,
    fail_next: Option<FA_STATUS>,
    last_error: String,
}

impl SimState {
    fn fail(&mut self, op: &'static str, code: FA_STATUS) -> FA_STATUS {
        trace!(op, code, "simulated call failed");
        self.last_error = format!("{op} failed with status {code}");
        code
    }

    /// Camera index of an open, attached camera.
    fn camera(&self, raw: FA_CAMERA_HANDLE) -> Result<usize, FA_STATUS> {
        let index = decode(CAMERA_BASE, raw).ok_or(FA_ERR_INVALID_HANDLE)?;
        let camera = self.cameras.get(index).ok_or(FA_ERR_INVALID_HANDLE)?;
        if !camera.open {
            return Err(FA_ERR_INVALID_HANDLE);
        }
        if camera.removed {
            return Err(FA_ERR_IO);
        }
        Ok(index)
    }

    fn nodemap(&self, raw: FA_NODEMAP_HANDLE) -> Result<usize, FA_STATUS> {
        let index = decode(NODEMAP_BASE, raw).ok_or(FA_ERR_INVALID_HANDLE)?;
        self.camera(encode(CAMERA_BASE, index))
    }

    fn node_index(&self, raw: FA_NODE_HANDLE) -> Result<usize, FA_STATUS> {
        let index = decode(NODE_BASE, raw).ok_or(FA_ERR_INVALID_HANDLE)?;
        let node = self.nodes.get(index).ok_or(FA_ERR_INVALID_HANDLE)?;
        self.camera(encode(CAMERA_BASE, node.camera))?;
        Ok(index)
    }

    fn node(&self, raw: FA_NODE_HANDLE) -> Result<&SimNode, FA_STATUS> {
        Ok(&self.nodes[self.node_index(raw)?])
    }

    fn integer(&self, raw: FA_NODE_HANDLE) -> Result<&IntValue, FA_STATUS> {
        match self.node(raw)?.available()? {
            SimValue::Integer(value) => Ok(value),
            _ => Err(FA_ERR_INVALID_ARGUMENT),
        }
    }

    fn float(&self, raw: FA_NODE_HANDLE) -> Result<&FloatValue, FA_STATUS> {
        match self.node(raw)?.available()? {
            SimValue::Float(value) => Ok(value),
            _ => Err(FA_ERR_INVALID_ARGUMENT),
        }
    }

    fn render(&self, index: usize) -> Result<String, FA_STATUS> {
        match self.nodes[index].readable()? {
            SimValue::Integer(v) => Ok(v.value.to_string()),
            SimValue::Float(v) => Ok(v.value.to_string()),
            SimValue::Boolean(b) => Ok(b.to_string()),
            SimValue::Text(s) => Ok(s.clone()),
            SimValue::Enumeration { entries, value } => self.symbolic(entries, *value),
            SimValue::EnumEntry { symbolic, .. } => Ok(symbolic.clone()),
            SimValue::Category(_) | SimValue::Command { .. } => Err(FA_ERR_INVALID_ARGUMENT),
        }
    }

    fn symbolic(&self, entries: &[usize], value: i64) -> Result<String, FA_STATUS> {
        entries
            .iter()
            .find_map(|&entry| match &self.nodes[entry].value {
                SimValue::EnumEntry { symbolic, value: v } if *v == value => Some(symbolic.clone()),
                _ => None,
            })
            .ok_or(FA_ERR_NOT_FOUND)
    }

    fn entry_value(&self, entries: &[usize], symbolic: &str) -> Result<i64, FA_STATUS> {
        entries
            .iter()
            .find_map(|&entry| match &self.nodes[entry].value {
                SimValue::EnumEntry { symbolic: s, value } if s == symbolic => Some(*value),
                _ => None,
            })
            .ok_or(FA_ERR_OUT_OF_RANGE)
    }

    fn set_enumeration(&mut self, index: usize, value: i64) -> Result<(), FA_STATUS> {
        let entries = match self.nodes[index].writable()? {
            SimValue::Enumeration { entries, .. } => entries.clone(),
            _ => return Err(FA_ERR_INVALID_ARGUMENT),
        };
        self.symbolic(&entries, value).map_err(|_| FA_ERR_OUT_OF_RANGE)?;
        if let SimValue::Enumeration { value: current, .. } = &mut self.nodes[index].value {
            *current = value;
        }
        Ok(())
    }

    fn set_from_string(&mut self, index: usize, text: &str) -> Result<(), FA_STATUS> {
        let entries = match self.nodes[index].writable()? {
            SimValue::Integer(v) => {
                return v.set(text.trim().parse().map_err(|_| FA_ERR_INVALID_ARGUMENT)?)
            }
            SimValue::Float(v) => {
                return v.set(text.trim().parse().map_err(|_| FA_ERR_INVALID_ARGUMENT)?)
            }
            SimValue::Boolean(b) => {
                *b = match text.trim() {
                    "true" | "1" => true,
                    "false" | "0" => false,
                    _ => return Err(FA_ERR_INVALID_ARGUMENT),
                };
                return Ok(());
            }
            SimValue::Text(s) => {
                *s = text.to_owned();
                return Ok(());
            }
            SimValue::Enumeration { entries, .. } => entries.clone(),
            _ => return Err(FA_ERR_INVALID_ARGUMENT),
        };
        let value = self.entry_value(&entries, text.trim())?;
        self.set_enumeration(index, value)
    }

    fn register(&mut self, source: Source) -> usize {
        let key = self.per_source_ids.then_some(source);
        let next = self.next_registration.entry(key).or_insert(0);
        *next += 1;
        REGISTRATION_BASE + *next * STRIDE
    }

    fn camera_events(&self, camera: usize, event: CameraEvent) -> Vec<Event> {
        self.camera_callbacks
            .range((camera, 0)..=(camera, usize::MAX))
            .filter(|(_, r)| r.event == event)
            .map(|(_, r)| Event {
                callback: r.callback,
                handle: encode(CAMERA_BASE, camera) as usize,
            })
            .collect()
    }

    fn node_events(&self, node: usize) -> Vec<Event> {
        self.node_callbacks
            .range((node, 0)..=(node, usize::MAX))
            .map(|(_, &callback)| Event {
                callback,
                handle: encode(NODE_BASE, node) as usize,
            })
            .collect()
    }

    fn feature_value(&self, camera: usize, name: &str) -> i64 {
        let index = self.cameras[camera].names.get(name).copied();
        match index.map(|index| &self.nodes[index].value) {
            Some(SimValue::Integer(v)) => v.value,
            Some(SimValue::Enumeration { value, .. }) => *value,
            _ => 0,
        }
    }

    fn next_frame(&mut self, camera: usize, epoch: Instant, data: Option<Vec<u8>>) -> Frame {
        let width = self.feature_value(camera, "Width") as u32;
        let height = self.feature_value(camera, "Height") as u32;
        let pixel_format = self.feature_value(camera, "PixelFormat") as u32;
        let cam = &mut self.cameras[camera];
        cam.frame_id += 1;
        let frame_id = cam.frame_id;
        let data = data.unwrap_or_else(|| {
            let channels = if pixel_format == FA_PIXEL_FORMAT_MONO8 { 1 } else { 3 };
            let stride = width as usize * channels;
            (0..stride * height as usize)
                .map(|i| (i % stride + i / stride + frame_id as usize) as u8)
                .collect()
        });
        Frame {
            width,
            height,
            pixel_format,
            frame_id,
            timestamp: epoch.elapsed().as_nanos() as u64,
            data,
        }
    }
}

struct TreeBuilder<'a> {
    nodes: &'a mut Vec<SimNode>,
    camera: usize,
    order: Vec<usize>,
    names: HashMap<String, usize>,
}

impl TreeBuilder<'_> {
    fn add(
        &mut self,
        name: &str,
        tool_tip: &str,
        visibility: FA_VISIBILITY,
        access: FA_ACCESS_MODE,
        value: SimValue,
    ) -> usize {
        let index = self.nodes.len();
        self.nodes.push(SimNode {
            camera: self.camera,
            name: name.to_owned(),
            display_name: display_name(name),
            tool_tip: tool_tip.to_owned(),
            visibility,
            access,
            value,
        });
        self.order.push(index);
        self.names.insert(name.to_owned(), index);
        index
    }

    fn category(&mut self, name: &str, features: Vec<usize>) -> usize {
        self.add(
            name,
            "",
            FA_VISIBILITY_BEGINNER,
            FA_ACCESS_RO,
            SimValue::Category(features),
        )
    }

    fn enumeration(&mut self, name: &str, tool_tip: &str, entries: &[(&str, i64)]) -> usize {
        let entries = entries
            .iter()
            .map(|(symbolic, value)| {
                self.add(
                    &format!("EnumEntry_{name}_{symbolic}"),
                    "",
                    FA_VISIBILITY_BEGINNER,
                    FA_ACCESS_RO,
                    SimValue::EnumEntry {
                        symbolic: symbolic.to_string(),
                        value: *value,
                    },
                )
            })
            .collect::<Vec<_>>();
        let value = entries
            .first()
            .map(|&entry| match self.nodes[entry].value {
                SimValue::EnumEntry { value, .. } => value,
                _ => 0,
            })
            .unwrap_or(0);
        self.add(
            name,
            tool_tip,
            FA_VISIBILITY_BEGINNER,
            FA_ACCESS_RW,
            SimValue::Enumeration { entries, value },
        )
    }
}

/// Splits a CamelCase feature name into words, keeping acronyms together.
fn display_name(name: &str) -> String {
    let chars = name.chars().collect::<Vec<_>>();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        let boundary = i > 0
            && c.is_uppercase()
            && (chars[i - 1].is_lowercase()
                || chars.get(i + 1).is_some_and(|next| next.is_lowercase()));
        if boundary {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

fn build_camera(nodes: &mut Vec<SimNode>, camera: usize, model: &str, serial: &str) -> SimCamera {
    let mut tree = TreeBuilder {
        nodes,
        camera,
        order: Vec::new(),
        names: HashMap::new(),
    };

    let device = vec![
        tree.add(
            "DeviceModelName",
            "Model of the device.",
            FA_VISIBILITY_BEGINNER,
            FA_ACCESS_RO,
            SimValue::Text(model.to_owned()),
        ),
        tree.add(
            "DeviceSerialNumber",
            "Serial number of the device.",
            FA_VISIBILITY_BEGINNER,
            FA_ACCESS_RO,
            SimValue::Text(serial.to_owned()),
        ),
        tree.add(
            "DeviceUserID",
            "User-programmable device identifier.",
            FA_VISIBILITY_BEGINNER,
            FA_ACCESS_RW,
            SimValue::Text(String::new()),
        ),
        tree.add(
            "DeviceManifest",
            "Build manifest of the device firmware.",
            FA_VISIBILITY_GURU,
            FA_ACCESS_RO,
            SimValue::Text(manifest(model, serial)),
        ),
        tree.add(
            "DeviceTemperature",
            "Device temperature in degrees Celsius.",
            FA_VISIBILITY_EXPERT,
            FA_ACCESS_RO,
            SimValue::Float(FloatValue {
                value: 42.5,
                min: -40.0,
                max: 125.0,
            }),
        ),
        tree.add(
            "DeviceReset",
            "Resets the device.",
            FA_VISIBILITY_GURU,
            FA_ACCESS_WO,
            SimValue::Command { pending: 0 },
        ),
    ];

    let width = tree.add(
        "Width",
        "Width of the image in pixels.",
        FA_VISIBILITY_BEGINNER,
        FA_ACCESS_RW,
        SimValue::Integer(IntValue {
            value: 64,
            min: 16,
            max: 4096,
            inc: 16,
        }),
    );
    let height = tree.add(
        "Height",
        "Height of the image in pixels.",
        FA_VISIBILITY_BEGINNER,
        FA_ACCESS_RW,
        SimValue::Integer(IntValue {
            value: 48,
            min: 2,
            max: 3072,
            inc: 2,
        }),
    );
    let pixel_format = tree.enumeration(
        "PixelFormat",
        "Format of the pixels provided by the device.",
        &[
            ("Mono8", FA_PIXEL_FORMAT_MONO8 as i64),
            ("RGB8", FA_PIXEL_FORMAT_RGB8 as i64),
        ],
    );
    let reverse_x = tree.add(
        "ReverseX",
        "Flips the image horizontally.",
        FA_VISIBILITY_EXPERT,
        FA_ACCESS_RW,
        SimValue::Boolean(false),
    );
    let lut_enable = tree.add(
        "LUTEnable",
        "Activates the lookup table.",
        FA_VISIBILITY_GURU,
        FA_ACCESS_NA,
        SimValue::Boolean(false),
    );
    let image_format = vec![width, height, pixel_format, reverse_x, lut_enable];

    let acquisition = vec![
        tree.add(
            "ExposureTime",
            "Exposure time in microseconds.",
            FA_VISIBILITY_BEGINNER,
            FA_ACCESS_RW,
            SimValue::Float(FloatValue {
                value: 5000.0,
                min: 10.0,
                max: 1_000_000.0,
            }),
        ),
        tree.add(
            "TriggerSoftware",
            "Generates a software trigger.",
            FA_VISIBILITY_BEGINNER,
            FA_ACCESS_WO,
            SimValue::Command { pending: 0 },
        ),
    ];

    let categories = vec![
        tree.category("DeviceControl", device),
        tree.category("ImageFormatControl", image_format),
        tree.category("AcquisitionControl", acquisition),
    ];
    tree.category("Root", categories);

    SimCamera {
        model: model.to_owned(),
        serial: serial.to_owned(),
        open: false,
        removed: false,
        grabbing: false,
        generation: 0,
        nodes: tree.order,
        names: tree.names,
        queue: VecDeque::new(),
        current: None,
        frame_id: 0,
    }
}

fn manifest(model: &str, serial: &str) -> String {
    let mut text = format!("model={model};serial={serial};firmware=3.2.1;");
    while text.len() < 300 {
        text.push_str("module=acquisition-core;");
    }
    text.truncate(300);
    text
}

struct Shared {
    state: Mutex<SimState>,
    frame_ready: Condvar,
    frame_interval: Duration,
    epoch: Instant,
}

impl Shared {
    fn with<F>(&self, op: &'static str, f: F) -> FA_STATUS
    where
        F: FnOnce(&mut SimState) -> Result<(), FA_STATUS>,
    {
        self.with_events(op, |state| f(state).map(|_| Vec::new()))
    }

    /// Runs `f` under the state lock and fires the events it returns after
    /// the lock is released, so callbacks may call back into the SDK.
    fn with_events<F>(&self, op: &'static str, f: F) -> FA_STATUS
    where
        F: FnOnce(&mut SimState) -> Result<Vec<Event>, FA_STATUS>,
    {
        let result = {
            let mut state = self.state.lock();
            let result = match state.fail_next.take() {
                Some(code) => Err(code),
                None => f(&mut state),
            };
            result.map_err(|code| state.fail(op, code))
        };
        match result {
            Ok(events) => {
                fire(events);
                FA_SUCCESS
            }
            Err(code) => code,
        }
    }

    fn grab_loop(self: Arc<Self>, camera: usize, generation: u64) {
        debug!(camera, generation, "simulated grab thread started");
        loop {
            thread::sleep(self.frame_interval);
            let events = {
                let mut state = self.state.lock();
                let cam = &state.cameras[camera];
                if !cam.grabbing || cam.generation != generation || cam.removed {
                    break;
                }
                let frame = state.next_frame(camera, self.epoch, None);
                let queue = &mut state.cameras[camera].queue;
                queue.push_back(frame);
                if queue.len() > QUEUE_DEPTH {
                    queue.pop_front();
                }
                self.frame_ready.notify_all();
                state.camera_events(camera, CameraEvent::ImageGrabbed)
            };
            fire(events);
        }
        debug!(camera, generation, "simulated grab thread stopped");
    }

    fn trigger_grab(&self, camera: CameraHandle, payload: Vec<u8>) -> Status {
        Status::from_code(self.with_events("trigger_grab", |state| {
            let index = state.camera(camera.as_raw())?;
            let frame = state.next_frame(index, self.epoch, Some(payload));
            state.cameras[index].current = Some(frame);
            Ok(state.camera_events(index, CameraEvent::ImageGrabbed))
        }))
    }
}

/// In-process stand-in for the FA SDK.
pub struct SimulatedSdk {
    shared: Arc<Shared>,
}

impl SimulatedSdk {
    /// One camera, model `FA-SIM-1`.
    pub fn new() -> Self {
        Self::with_cameras(&[("FA-SIM-1", "SIM0000001")])
    }

    /// One camera per `(model, serial)` pair.
    pub fn with_cameras(cameras: &[(&str, &str)]) -> Self {
        Self::with_frame_interval(cameras, DEFAULT_FRAME_INTERVAL)
    }

    pub fn with_frame_interval(cameras: &[(&str, &str)], frame_interval: Duration) -> Self {
        let mut nodes = Vec::new();
        let cameras = cameras
            .iter()
            .enumerate()
            .map(|(index, (model, serial))| build_camera(&mut nodes, index, model, serial))
            .collect();
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SimState {
                    cameras,
                    nodes,
                    camera_callbacks: BTreeMap::new(),
                    node_callbacks: BTreeMap::new(),
                    next_registration: BTreeMap::new(),
                    per_source_ids: false,
                    fail_next: None,
                    last_error: String::new(),
                }),
                frame_ready: Condvar::new(),
                frame_interval,
                epoch: Instant::now(),
            }),
        }
    }

    /// Delivers `payload` as the next frame of `camera` and raises the
    /// image-grabbed event on the calling thread.
    pub fn trigger_grab(&self, camera: CameraHandle, payload: &[u8]) -> Status {
        self.shared.trigger_grab(camera, payload.to_vec())
    }

    /// Like [`SimulatedSdk::trigger_grab`], but raises the event on a new
    /// thread owned by the simulated SDK.
    pub fn trigger_grab_on_thread(
        &self,
        camera: CameraHandle,
        payload: Vec<u8>,
    ) -> thread::JoinHandle<Status> {
        let shared = self.shared.clone();
        thread::spawn(move || shared.trigger_grab(camera, payload))
    }

    /// Simulates the camera being unplugged.
    pub fn remove_configuration(&self, camera: CameraHandle) -> Status {
        Status::from_code(self.shared.with_events("remove_configuration", |state| {
            let index = state.camera(camera.as_raw())?;
            let cam = &mut state.cameras[index];
            cam.removed = true;
            cam.grabbing = false;
            Ok(state.camera_events(index, CameraEvent::ConfigurationRemoval))
        }))
    }

    /// Numbers callback registrations per camera and per node from now on,
    /// so registrations on different sources may share a handle value.
    pub fn number_registrations_per_source(&self) {
        self.shared.state.lock().per_source_ids = true;
    }

    /// Makes the next entry point return `code` without doing anything.
    pub fn fail_next_call(&self, code: FA_STATUS) {
        self.shared.state.lock().fail_next = Some(code);
    }

    /// Live `(camera, node)` callback registrations.
    pub fn registrations(&self) -> (usize, usize) {
        let state = self.shared.state.lock();
        (state.camera_callbacks.len(), state.node_callbacks.len())
    }

    unsafe fn register_camera(
        &self,
        op: &'static str,
        event: CameraEvent,
        camera: FA_CAMERA_HANDLE,
        callback: FA_CameraCallback,
        registration: *mut FA_CAMERA_CALLBACK_HANDLE,
    ) -> FA_STATUS {
        self.shared.with(op, |s| {
            let index = s.camera(camera)?;
            let callback = callback.ok_or(FA_ERR_INVALID_ARGUMENT)?;
            if registration.is_null() {
                return Err(FA_ERR_INVALID_ARGUMENT);
            }
            let id = s.register(Source::Camera(index));
            s.camera_callbacks
                .insert((index, id), CameraRegistration { event, callback });
            put(registration, id as FA_CAMERA_CALLBACK_HANDLE)
        })
    }

    unsafe fn text_of<F>(
        &self,
        op: &'static str,
        node: FA_NODE_HANDLE,
        buf: *mut c_char,
        len: *mut size_t,
        f: F,
    ) -> FA_STATUS
    where
        F: FnOnce(&SimNode) -> &str,
    {
        self.shared.with(op, |s| put_text(f(s.node(node)?), buf, len))
    }
}

impl Default for SimulatedSdk {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SimulatedSdk {
    fn drop(&mut self) {
        for camera in self.shared.state.lock().cameras.iter_mut() {
            camera.grabbing = false;
        }
        self.shared.frame_ready.notify_all();
    }
}

impl NativeApi for SimulatedSdk {
    unsafe fn get_last_error_message(&self, buf: *mut c_char, len: *mut size_t) -> FA_STATUS {
        let state = self.shared.state.lock();
        match put_text(&state.last_error, buf, len) {
            Ok(()) => FA_SUCCESS,
            Err(code) => code,
        }
    }

    unsafe fn camera_enumerate(&self, count: *mut size_t) -> FA_STATUS {
        self.shared
            .with("FA_Camera_Enumerate", |s| put(count, s.cameras.len()))
    }

    unsafe fn camera_get_model_name(
        &self,
        index: size_t,
        buf: *mut c_char,
        len: *mut size_t,
    ) -> FA_STATUS {
        self.shared.with("FA_Camera_GetModelName", |s| {
            let camera = s.cameras.get(index).ok_or(FA_ERR_NOT_FOUND)?;
            put_text(&camera.model, buf, len)
        })
    }

    unsafe fn camera_get_serial_number(
        &self,
        index: size_t,
        buf: *mut c_char,
        len: *mut size_t,
    ) -> FA_STATUS {
        self.shared.with("FA_Camera_GetSerialNumber", |s| {
            let camera = s.cameras.get(index).ok_or(FA_ERR_NOT_FOUND)?;
            put_text(&camera.serial, buf, len)
        })
    }

    unsafe fn camera_open(&self, index: size_t, camera: *mut FA_CAMERA_HANDLE) -> FA_STATUS {
        self.shared.with("FA_Camera_Open", |s| {
            let cam = s.cameras.get_mut(index).ok_or(FA_ERR_NOT_FOUND)?;
            if cam.open {
                return Err(FA_ERR_BUSY);
            }
            put(camera, encode(CAMERA_BASE, index))?;
            cam.open = true;
            debug!(index, model = %cam.model, "simulated camera opened");
            Ok(())
        })
    }

    unsafe fn camera_close(&self, camera: FA_CAMERA_HANDLE) -> FA_STATUS {
        let status = self.shared.with("FA_Camera_Close", |s| {
            let index = decode(CAMERA_BASE, camera).ok_or(FA_ERR_INVALID_HANDLE)?;
            let cam = s.cameras.get_mut(index).ok_or(FA_ERR_INVALID_HANDLE)?;
            if !cam.open {
                return Err(FA_ERR_INVALID_HANDLE);
            }
            cam.open = false;
            cam.grabbing = false;
            cam.queue.clear();
            Ok(())
        });
        self.shared.frame_ready.notify_all();
        status
    }

    unsafe fn camera_get_node_map(
        &self,
        camera: FA_CAMERA_HANDLE,
        nodemap: *mut FA_NODEMAP_HANDLE,
    ) -> FA_STATUS {
        self.shared.with("FA_Camera_GetNodeMap", |s| {
            let index = s.camera(camera)?;
            put(nodemap, encode(NODEMAP_BASE, index))
        })
    }

    unsafe fn camera_start_grabbing(&self, camera: FA_CAMERA_HANDLE) -> FA_STATUS {
        let shared = self.shared.clone();
        self.shared.with("FA_Camera_StartGrabbing", move |s| {
            let index = s.camera(camera)?;
            let cam = &mut s.cameras[index];
            if cam.grabbing {
                return Ok(());
            }
            cam.grabbing = true;
            cam.generation += 1;
            cam.queue.clear();
            let generation = cam.generation;
            thread::Builder::new()
                .name(format!("fa-sim-grab-{index}"))
                .spawn(move || shared.grab_loop(index, generation))
                .map_err(|_| FA_ERR_IO)?;
            Ok(())
        })
    }

    unsafe fn camera_stop_grabbing(&self, camera: FA_CAMERA_HANDLE) -> FA_STATUS {
        let status = self.shared.with("FA_Camera_StopGrabbing", |s| {
            let index = s.camera(camera)?;
            s.cameras[index].grabbing = false;
            Ok(())
        });
        self.shared.frame_ready.notify_all();
        status
    }

    unsafe fn camera_is_grabbing(
        &self,
        camera: FA_CAMERA_HANDLE,
        grabbing: *mut bool,
    ) -> FA_STATUS {
        self.shared.with("FA_Camera_IsGrabbing", |s| {
            let index = s.camera(camera)?;
            put(grabbing, s.cameras[index].grabbing)
        })
    }

    unsafe fn camera_retrieve_result(
        &self,
        camera: FA_CAMERA_HANDLE,
        timeout_ms: u32,
        info: *mut FA_ImageInfo,
    ) -> FA_STATUS {
        const OP: &str = "FA_Camera_RetrieveResult";
        let deadline = Instant::now() + Duration::from_millis(timeout_ms as u64);
        let mut state = self.shared.state.lock();
        if let Some(code) = state.fail_next.take() {
            return state.fail(OP, code);
        }
        if info.is_null() {
            return state.fail(OP, FA_ERR_INVALID_ARGUMENT);
        }
        let index = loop {
            let index = match state.camera(camera) {
                Ok(index) => index,
                Err(code) => return state.fail(OP, code),
            };
            let cam = &mut state.cameras[index];
            if let Some(frame) = cam.queue.pop_front() {
                cam.current = Some(frame);
                break index;
            }
            if !cam.grabbing {
                return state.fail(OP, FA_ERR_NOT_AVAILABLE);
            }
            if Instant::now() >= deadline {
                return state.fail(OP, FA_ERR_TIMEOUT);
            }
            self.shared.frame_ready.wait_until(&mut state, deadline);
        };

        let Some(frame) = state.cameras[index].current.as_mut() else {
            return state.fail(OP, FA_ERR_UNKNOWN);
        };
        info.write(FA_ImageInfo {
            width: frame.width,
            height: frame.height,
            pixel_format: frame.pixel_format,
            offset_x: 0,
            offset_y: 0,
            frame_id: frame.frame_id,
            timestamp: frame.timestamp,
            buffer: frame.data.as_mut_ptr(),
            size: frame.data.len(),
        });
        FA_SUCCESS
    }

    unsafe fn camera_get_image_buffer(
        &self,
        camera: FA_CAMERA_HANDLE,
        buffer: *mut *mut u8,
        size: *mut size_t,
    ) -> FA_STATUS {
        self.shared.with("FA_Camera_GetImageBuffer", |s| {
            let index = s.camera(camera)?;
            let frame = s.cameras[index]
                .current
                .as_mut()
                .filter(|frame| !frame.data.is_empty())
                .ok_or(FA_ERR_NOT_AVAILABLE)?;
            put(buffer, frame.data.as_mut_ptr())?;
            put(size, frame.data.len())
        })
    }

    unsafe fn camera_register_configuration_removal(
        &self,
        camera: FA_CAMERA_HANDLE,
        callback: FA_CameraCallback,
        registration: *mut FA_CAMERA_CALLBACK_HANDLE,
    ) -> FA_STATUS {
        self.register_camera(
            "FA_Camera_RegisterConfigurationRemoval",
            CameraEvent::ConfigurationRemoval,
            camera,
            callback,
            registration,
        )
    }

    unsafe fn camera_register_image_grabbed(
        &self,
        camera: FA_CAMERA_HANDLE,
        callback: FA_CameraCallback,
        registration: *mut FA_CAMERA_CALLBACK_HANDLE,
    ) -> FA_STATUS {
        self.register_camera(
            "FA_Camera_RegisterImageGrabbed",
            CameraEvent::ImageGrabbed,
            camera,
            callback,
            registration,
        )
    }

    unsafe fn camera_deregister_callback(
        &self,
        camera: FA_CAMERA_HANDLE,
        registration: FA_CAMERA_CALLBACK_HANDLE,
    ) -> FA_STATUS {
        self.shared.with("FA_Camera_DeregisterCallback", |s| {
            let index = decode(CAMERA_BASE, camera).ok_or(FA_ERR_INVALID_HANDLE)?;
            s.camera_callbacks
                .remove(&(index, registration as usize))
                .map(drop)
                .ok_or(FA_ERR_INVALID_HANDLE)
        })
    }

    unsafe fn node_map_get_node(
        &self,
        nodemap: FA_NODEMAP_HANDLE,
        name: *const c_char,
        node: *mut FA_NODE_HANDLE,
    ) -> FA_STATUS {
        self.shared.with("FA_NodeMap_GetNode", |s| {
            let camera = s.nodemap(nodemap)?;
            let index = *s.cameras[camera]
                .names
                .get(get_text(name)?)
                .ok_or(FA_ERR_NOT_FOUND)?;
            put(node, encode(NODE_BASE, index))
        })
    }

    unsafe fn node_map_get_num_nodes(
        &self,
        nodemap: FA_NODEMAP_HANDLE,
        count: *mut size_t,
    ) -> FA_STATUS {
        self.shared.with("FA_NodeMap_GetNumNodes", |s| {
            let camera = s.nodemap(nodemap)?;
            put(count, s.cameras[camera].nodes.len())
        })
    }

    unsafe fn node_map_get_node_by_index(
        &self,
        nodemap: FA_NODEMAP_HANDLE,
        index: size_t,
        node: *mut FA_NODE_HANDLE,
    ) -> FA_STATUS {
        self.shared.with("FA_NodeMap_GetNodeByIndex", |s| {
            let camera = s.nodemap(nodemap)?;
            let found = *s.cameras[camera].nodes.get(index).ok_or(FA_ERR_OUT_OF_RANGE)?;
            put(node, encode(NODE_BASE, found))
        })
    }

    unsafe fn node_map_invalidate_nodes(&self, nodemap: FA_NODEMAP_HANDLE) -> FA_STATUS {
        self.shared.with_events("FA_NodeMap_InvalidateNodes", |s| {
            let camera = s.nodemap(nodemap)?;
            Ok(s.cameras[camera]
                .nodes
                .iter()
                .flat_map(|&node| s.node_events(node))
                .collect())
        })
    }

    unsafe fn node_get_type(
        &self,
        node: FA_NODE_HANDLE,
        node_type: *mut FA_NODE_TYPE,
    ) -> FA_STATUS {
        self.shared
            .with("FA_Node_GetType", |s| put(node_type, s.node(node)?.node_type()))
    }

    unsafe fn node_get_visibility(
        &self,
        node: FA_NODE_HANDLE,
        visibility: *mut FA_VISIBILITY,
    ) -> FA_STATUS {
        self.shared
            .with("FA_Node_GetVisibility", |s| put(visibility, s.node(node)?.visibility))
    }

    unsafe fn node_get_access_mode(
        &self,
        node: FA_NODE_HANDLE,
        access: *mut FA_ACCESS_MODE,
    ) -> FA_STATUS {
        self.shared
            .with("FA_Node_GetAccessMode", |s| put(access, s.node(node)?.access))
    }

    unsafe fn node_get_name(
        &self,
        node: FA_NODE_HANDLE,
        buf: *mut c_char,
        len: *mut size_t,
    ) -> FA_STATUS {
        self.text_of("FA_Node_GetName", node, buf, len, |n| &n.name)
    }

    unsafe fn node_get_display_name(
        &self,
        node: FA_NODE_HANDLE,
        buf: *mut c_char,
        len: *mut size_t,
    ) -> FA_STATUS {
        self.text_of("FA_Node_GetDisplayName", node, buf, len, |n| &n.display_name)
    }

    unsafe fn node_get_tool_tip(
        &self,
        node: FA_NODE_HANDLE,
        buf: *mut c_char,
        len: *mut size_t,
    ) -> FA_STATUS {
        self.text_of("FA_Node_GetToolTip", node, buf, len, |n| &n.tool_tip)
    }

    unsafe fn node_is_readable(&self, node: FA_NODE_HANDLE, readable: *mut bool) -> FA_STATUS {
        self.shared
            .with("FA_Node_IsReadable", |s| put(readable, s.node(node)?.is_readable()))
    }

    unsafe fn node_is_writable(&self, node: FA_NODE_HANDLE, writable: *mut bool) -> FA_STATUS {
        self.shared
            .with("FA_Node_IsWritable", |s| put(writable, s.node(node)?.is_writable()))
    }

    unsafe fn node_is_available(&self, node: FA_NODE_HANDLE, available: *mut bool) -> FA_STATUS {
        self.shared
            .with("FA_Node_IsAvailable", |s| put(available, s.node(node)?.is_available()))
    }

    unsafe fn node_to_string(
        &self,
        node: FA_NODE_HANDLE,
        buf: *mut c_char,
        len: *mut size_t,
    ) -> FA_STATUS {
        self.shared.with("FA_Node_ToString", |s| {
            let text = s.render(s.node_index(node)?)?;
            put_text(&text, buf, len)
        })
    }

    unsafe fn node_from_string(&self, node: FA_NODE_HANDLE, value: *const c_char) -> FA_STATUS {
        self.shared.with_events("FA_Node_FromString", |s| {
            let index = s.node_index(node)?;
            s.set_from_string(index, get_text(value)?)?;
            Ok(s.node_events(index))
        })
    }

    unsafe fn node_register_callback(
        &self,
        node: FA_NODE_HANDLE,
        callback: FA_NodeCallback,
        registration: *mut FA_CALLBACK_HANDLE,
    ) -> FA_STATUS {
        self.shared.with("FA_Node_RegisterCallback", |s| {
            let index = s.node_index(node)?;
            let callback = callback.ok_or(FA_ERR_INVALID_ARGUMENT)?;
            if registration.is_null() {
                return Err(FA_ERR_INVALID_ARGUMENT);
            }
            let id = s.register(Source::Node(index));
            s.node_callbacks.insert((index, id), callback);
            put(registration, id as FA_CALLBACK_HANDLE)
        })
    }

    unsafe fn node_deregister_callback(
        &self,
        node: FA_NODE_HANDLE,
        registration: FA_CALLBACK_HANDLE,
    ) -> FA_STATUS {
        self.shared.with("FA_Node_DeregisterCallback", |s| {
            let index = decode(NODE_BASE, node).ok_or(FA_ERR_INVALID_HANDLE)?;
            s.node_callbacks
                .remove(&(index, registration as usize))
                .map(drop)
                .ok_or(FA_ERR_INVALID_HANDLE)
        })
    }

    unsafe fn integer_get_value(&self, node: FA_NODE_HANDLE, value: *mut i64) -> FA_STATUS {
        self.shared.with("FA_Integer_GetValue", |s| {
            s.node(node)?.readable()?;
            put(value, s.integer(node)?.value)
        })
    }

    unsafe fn integer_set_value(&self, node: FA_NODE_HANDLE, value: i64) -> FA_STATUS {
        self.shared.with_events("FA_Integer_SetValue", |s| {
            let index = s.node_index(node)?;
            match s.nodes[index].writable()? {
                SimValue::Integer(v) => v.set(value)?,
                _ => return Err(FA_ERR_INVALID_ARGUMENT),
            }
            Ok(s.node_events(index))
        })
    }

    unsafe fn integer_get_min(&self, node: FA_NODE_HANDLE, value: *mut i64) -> FA_STATUS {
        self.shared
            .with("FA_Integer_GetMin", |s| put(value, s.integer(node)?.min))
    }

    unsafe fn integer_get_max(&self, node: FA_NODE_HANDLE, value: *mut i64) -> FA_STATUS {
        self.shared
            .with("FA_Integer_GetMax", |s| put(value, s.integer(node)?.max))
    }

    unsafe fn integer_get_inc(&self, node: FA_NODE_HANDLE, value: *mut i64) -> FA_STATUS {
        self.shared
            .with("FA_Integer_GetInc", |s| put(value, s.integer(node)?.inc))
    }

    unsafe fn float_get_value(&self, node: FA_NODE_HANDLE, value: *mut f64) -> FA_STATUS {
        self.shared.with("FA_Float_GetValue", |s| {
            s.node(node)?.readable()?;
            put(value, s.float(node)?.value)
        })
    }

    unsafe fn float_set_value(&self, node: FA_NODE_HANDLE, value: f64) -> FA_STATUS {
        self.shared.with_events("FA_Float_SetValue", |s| {
            let index = s.node_index(node)?;
            match s.nodes[index].writable()? {
                SimValue::Float(v) => v.set(value)?,
                _ => return Err(FA_ERR_INVALID_ARGUMENT),
            }
            Ok(s.node_events(index))
        })
    }

    unsafe fn float_get_min(&self, node: FA_NODE_HANDLE, value: *mut f64) -> FA_STATUS {
        self.shared
            .with("FA_Float_GetMin", |s| put(value, s.float(node)?.min))
    }

    unsafe fn float_get_max(&self, node: FA_NODE_HANDLE, value: *mut f64) -> FA_STATUS {
        self.shared
            .with("FA_Float_GetMax", |s| put(value, s.float(node)?.max))
    }

    unsafe fn boolean_get_value(&self, node: FA_NODE_HANDLE, value: *mut bool) -> FA_STATUS {
        self.shared.with("FA_Boolean_GetValue", |s| {
            let n = s.node(node)?;
            if !matches!(n.available()?, SimValue::Boolean(_)) {
                return Err(FA_ERR_INVALID_ARGUMENT);
            }
            match n.readable()? {
                SimValue::Boolean(b) => put(value, *b),
                _ => Err(FA_ERR_INVALID_ARGUMENT),
            }
        })
    }

    unsafe fn boolean_set_value(&self, node: FA_NODE_HANDLE, value: bool) -> FA_STATUS {
        self.shared.with_events("FA_Boolean_SetValue", |s| {
            let index = s.node_index(node)?;
            match s.nodes[index].writable()? {
                SimValue::Boolean(b) => *b = value,
                _ => return Err(FA_ERR_INVALID_ARGUMENT),
            }
            Ok(s.node_events(index))
        })
    }

    unsafe fn string_get_value(
        &self,
        node: FA_NODE_HANDLE,
        buf: *mut c_char,
        len: *mut size_t,
    ) -> FA_STATUS {
        self.shared.with("FA_String_GetValue", |s| match s.node(node)?.readable()? {
            SimValue::Text(text) => put_text(text, buf, len),
            _ => Err(FA_ERR_INVALID_ARGUMENT),
        })
    }

    unsafe fn string_set_value(&self, node: FA_NODE_HANDLE, value: *const c_char) -> FA_STATUS {
        self.shared.with_events("FA_String_SetValue", |s| {
            let index = s.node_index(node)?;
            let text = get_text(value)?;
            match s.nodes[index].writable()? {
                SimValue::Text(current) => *current = text.to_owned(),
                _ => return Err(FA_ERR_INVALID_ARGUMENT),
            }
            Ok(s.node_events(index))
        })
    }

    unsafe fn command_execute(&self, node: FA_NODE_HANDLE) -> FA_STATUS {
        self.shared.with("FA_Command_Execute", |s| {
            let index = s.node_index(node)?;
            match s.nodes[index].writable()? {
                SimValue::Command { pending } => *pending = 1,
                _ => return Err(FA_ERR_INVALID_ARGUMENT),
            }
            Ok(())
        })
    }

    unsafe fn command_is_done(&self, node: FA_NODE_HANDLE, done: *mut bool) -> FA_STATUS {
        self.shared.with("FA_Command_IsDone", |s| {
            let index = s.node_index(node)?;
            if !s.nodes[index].is_available() {
                return Err(FA_ERR_ACCESS_DENIED);
            }
            match &mut s.nodes[index].value {
                SimValue::Command { pending } => {
                    let finished = *pending == 0;
                    *pending = pending.saturating_sub(1);
                    put(done, finished)
                }
                _ => Err(FA_ERR_INVALID_ARGUMENT),
            }
        })
    }

    unsafe fn enumeration_get_num_entries(
        &self,
        node: FA_NODE_HANDLE,
        count: *mut size_t,
    ) -> FA_STATUS {
        self.shared.with("FA_Enumeration_GetNumEntries", |s| {
            match s.node(node)?.available()? {
                SimValue::Enumeration { entries, .. } => put(count, entries.len()),
                _ => Err(FA_ERR_INVALID_ARGUMENT),
            }
        })
    }

    unsafe fn enumeration_get_entry_by_index(
        &self,
        node: FA_NODE_HANDLE,
        index: size_t,
        entry: *mut FA_NODE_HANDLE,
    ) -> FA_STATUS {
        self.shared.with("FA_Enumeration_GetEntryByIndex", |s| {
            match s.node(node)?.available()? {
                SimValue::Enumeration { entries, .. } => {
                    let found = *entries.get(index).ok_or(FA_ERR_OUT_OF_RANGE)?;
                    put(entry, encode(NODE_BASE, found))
                }
                _ => Err(FA_ERR_INVALID_ARGUMENT),
            }
        })
    }

    unsafe fn enumeration_get_entry_by_name(
        &self,
        node: FA_NODE_HANDLE,
        name: *const c_char,
        entry: *mut FA_NODE_HANDLE,
    ) -> FA_STATUS {
        self.shared.with("FA_Enumeration_GetEntryByName", |s| {
            let name = get_text(name)?;
            let entries = match s.node(node)?.available()? {
                SimValue::Enumeration { entries, .. } => entries,
                _ => return Err(FA_ERR_INVALID_ARGUMENT),
            };
            let found = entries
                .iter()
                .copied()
                .find(|&e| {
                    matches!(
                        &s.nodes[e].value,
                        SimValue::EnumEntry { symbolic, .. } if symbolic == name
                    )
                })
                .ok_or(FA_ERR_NOT_FOUND)?;
            put(entry, encode(NODE_BASE, found))
        })
    }

    unsafe fn enumeration_get_int_value(&self, node: FA_NODE_HANDLE, value: *mut i64) -> FA_STATUS {
        self.shared.with("FA_Enumeration_GetIntValue", |s| {
            match s.node(node)?.readable()? {
                SimValue::Enumeration { value: current, .. } => put(value, *current),
                _ => Err(FA_ERR_INVALID_ARGUMENT),
            }
        })
    }

    unsafe fn enumeration_set_int_value(&self, node: FA_NODE_HANDLE, value: i64) -> FA_STATUS {
        self.shared.with_events("FA_Enumeration_SetIntValue", |s| {
            let index = s.node_index(node)?;
            s.set_enumeration(index, value)?;
            Ok(s.node_events(index))
        })
    }

    unsafe fn enum_entry_get_symbolic(
        &self,
        entry: FA_NODE_HANDLE,
        buf: *mut c_char,
        len: *mut size_t,
    ) -> FA_STATUS {
        self.shared.with("FA_EnumEntry_GetSymbolic", |s| {
            match s.node(entry)?.available()? {
                SimValue::EnumEntry { symbolic, .. } => put_text(symbolic, buf, len),
                _ => Err(FA_ERR_INVALID_ARGUMENT),
            }
        })
    }

    unsafe fn enum_entry_get_int_value(&self, entry: FA_NODE_HANDLE, value: *mut i64) -> FA_STATUS {
        self.shared.with("FA_EnumEntry_GetIntValue", |s| {
            match s.node(entry)?.available()? {
                SimValue::EnumEntry { value: v, .. } => put(value, *v),
                _ => Err(FA_ERR_INVALID_ARGUMENT),
            }
        })
    }

    unsafe fn category_get_num_features(
        &self,
        node: FA_NODE_HANDLE,
        count: *mut size_t,
    ) -> FA_STATUS {
        self.shared.with("FA_Category_GetNumFeatures", |s| {
            match s.node(node)?.available()? {
                SimValue::Category(features) => put(count, features.len()),
                _ => Err(FA_ERR_INVALID_ARGUMENT),
            }
        })
    }

    unsafe fn category_get_feature_by_index(
        &self,
        node: FA_NODE_HANDLE,
        index: size_t,
        feature: *mut FA_NODE_HANDLE,
    ) -> FA_STATUS {
        self.shared.with("FA_Category_GetFeatureByIndex", |s| {
            match s.node(node)?.available()? {
                SimValue::Category(features) => {
                    let found = *features.get(index).ok_or(FA_ERR_OUT_OF_RANGE)?;
                    put(feature, encode(NODE_BASE, found))
                }
                _ => Err(FA_ERR_INVALID_ARGUMENT),
            }
        })
    }
}
