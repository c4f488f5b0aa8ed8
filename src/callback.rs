// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Callback bridge.
//!
//! FA SDK callbacks are plain `extern "C"` functions whose only argument is
//! the handle of the object raising the event. There is no user data
//! pointer, so a host closure cannot be smuggled through the call. Instead
//! every callback family owns a fixed table of [`TRAMPOLINE_SLOTS`] statically
//! generated thunks, one per slot. Registering a host callable claims a free
//! slot, stores the callable in it and hands the native side the address of
//! that slot's thunk.
//!
//! A thunk may run on any thread, including threads owned by the SDK. It
//! clones the callable out of its slot, acquires the [`HostLock`], runs the
//! callable and releases the lock. A panic in the callable is caught at the
//! thunk, logged and counted; it never unwinds into native frames.
//!
//! Slots are released only after the native side confirmed deregistration.
//! An invocation already in flight holds its own reference to the callable,
//! so releasing a slot never frees a callable that is still running.

use crate::{
    error::BridgeError,
    handle::{Callback as CallbackKind, Camera, CameraCallback, Handle, HandleKind, Node},
    host::HostLock,
};
use fai_sys::c_void;
use parking_lot::RwLock;
use std::{
    any::Any,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};
use tracing::{debug, error, trace};

/// Number of concurrently live host registrations per callback family.
pub const TRAMPOLINE_SLOTS: usize = 32;

/// Native callback signature shared by every family.
pub type NativeCallback = unsafe extern "C" fn(*mut c_void);

/// Host callable invoked with the handle of the object raising the event.
pub type HostCallback<K> = Arc<dyn Fn(Handle<K>) + Send + Sync>;

type Slot<K> = RwLock<Option<HostCallback<K>>>;

static FAULTS: AtomicUsize = AtomicUsize::new(0);

/// Number of host callables that panicked inside a thunk since start-up.
pub fn fault_count() -> usize {
    FAULTS.load(Ordering::Relaxed)
}

/// One family of native callbacks sharing a signature.
pub trait CallbackFamily: 'static {
    /// Kind of the handle passed to the callback.
    type Kind: HandleKind;
    /// Kind of the handle returned by registration.
    type Registration: HandleKind;

    const NAME: &'static str;

    fn table() -> &'static TrampolineTable<Self::Kind>;
}

/// Camera events: configuration removal and image grabbed.
#[derive(Debug)]
pub enum CameraEvents {}

/// Node invalidation and value change events.
#[derive(Debug)]
pub enum NodeEvents {}

static CAMERA_TABLE: TrampolineTable<Camera> = TrampolineTable::new();
static NODE_TABLE: TrampolineTable<Node> = TrampolineTable::new();

impl CallbackFamily for CameraEvents {
    type Kind = Camera;
    type Registration = CameraCallback;
    const NAME: &'static str = "camera";

    fn table() -> &'static TrampolineTable<Camera> {
        &CAMERA_TABLE
    }
}

impl CallbackFamily for NodeEvents {
    type Kind = Node;
    type Registration = CallbackKind;
    const NAME: &'static str = "node";

    fn table() -> &'static TrampolineTable<Node> {
        &NODE_TABLE
    }
}

pub struct TrampolineTable<K: HandleKind> {
    slots: [Slot<K>; TRAMPOLINE_SLOTS],
}

impl<K: HandleKind> TrampolineTable<K> {
    const fn new() -> Self {
        Self {
            slots: [const { parking_lot::const_rwlock(None) }; TRAMPOLINE_SLOTS],
        }
    }

    fn claim(&self, callable: HostCallback<K>) -> Option<usize> {
        let mut callable = Some(callable);
        for (index, slot) in self.slots.iter().enumerate() {
            let mut slot = slot.write();
            if slot.is_none() {
                *slot = callable.take();
                return Some(index);
            }
        }
        None
    }

    fn release(&self, index: usize) -> Option<HostCallback<K>> {
        self.slots.get(index).and_then(|slot| slot.write().take())
    }

    fn get(&self, index: usize) -> Option<HostCallback<K>> {
        self.slots.get(index).and_then(|slot| slot.read().clone())
    }

    /// Number of occupied slots.
    pub fn live(&self) -> usize {
        self.slots.iter().filter(|slot| slot.read().is_some()).count()
    }
}

/// Callable handed to a registration entry point.
pub enum Callback<K: HandleKind> {
    /// Host callable, routed through a trampoline slot.
    Host(HostCallback<K>),
    /// Native function pointer, passed to the SDK unchanged.
    Native(NativeCallback),
}

impl<K: HandleKind> Callback<K> {
    pub fn host<F>(f: F) -> Self
    where
        F: Fn(Handle<K>) + Send + Sync + 'static,
    {
        Callback::Host(Arc::new(f))
    }
}

impl<K: HandleKind> fmt::Debug for Callback<K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Callback::Host(_) => write!(f, "Callback::Host({})", K::NAME),
            Callback::Native(ptr) => write!(f, "Callback::Native({:p})", *ptr as *const ()),
        }
    }
}

/// A callback ready to be passed to the SDK.
#[derive(Copy, Clone, Debug)]
pub struct BridgedCallback {
    pub pointer: NativeCallback,
    /// Trampoline slot owned by this callback, `None` for native pointers.
    pub slot: Option<usize>,
}

/// Turns `callback` into a native function pointer.
///
/// Host callables claim a trampoline slot that stays occupied until
/// [`release`] is called for it.
pub fn bridge_callback<F: CallbackFamily>(
    callback: Callback<F::Kind>,
) -> Result<BridgedCallback, BridgeError> {
    match callback {
        Callback::Native(pointer) => Ok(BridgedCallback {
            pointer,
            slot: None,
        }),
        Callback::Host(callable) => {
            let slot = F::table()
                .claim(callable)
                .ok_or(BridgeError::TrampolinesExhausted {
                    family: F::NAME,
                    capacity: TRAMPOLINE_SLOTS,
                })?;
            trace!(family = F::NAME, slot, "claimed trampoline");
            Ok(BridgedCallback {
                pointer: thunk_for::<F>(slot),
                slot: Some(slot),
            })
        }
    }
}

/// Empties a trampoline slot. Invoking its thunk afterwards is a no-op.
pub fn release<F: CallbackFamily>(slot: usize) {
    if F::table().release(slot).is_some() {
        trace!(family = F::NAME, slot, "released trampoline");
    }
}

/// Number of live host registrations of a family.
pub fn live<F: CallbackFamily>() -> usize {
    F::table().live()
}

fn thunk_for<F: CallbackFamily>(slot: usize) -> NativeCallback {
    macro_rules! thunks {
        ($($index:literal)*) => {
            [$(thunk::<F, $index> as NativeCallback,)*]
        };
    }

    let table: [NativeCallback; TRAMPOLINE_SLOTS] = thunks!(
        0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15
        16 17 18 19 20 21 22 23 24 25 26 27 28 29 30 31
    );
    table[slot]
}

unsafe extern "C" fn thunk<F: CallbackFamily, const SLOT: usize>(raw: *mut c_void) {
    dispatch::<F>(SLOT, Handle::from_raw(raw));
}

fn dispatch<F: CallbackFamily>(slot: usize, handle: Handle<F::Kind>) {
    let Some(callable) = F::table().get(slot) else {
        debug!(family = F::NAME, slot, ?handle, "event on released trampoline");
        return;
    };

    let _guard = HostLock::global().acquire();
    // The clone may be the last reference once the slot is released, so it
    // is dropped inside the guard as well.
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(move || callable(handle))) {
        FAULTS.fetch_add(1, Ordering::Relaxed);
        error!(
            family = F::NAME,
            slot,
            ?handle,
            "host callback panicked: {}",
            panic_message(payload.as_ref())
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
