/* Copyright (C) 2024 by Jacob Alexander
 *
 * This file is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This file is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this file.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Device core: the fd lifecycle, capability/identity ioctls, and the
//! polling thread that paces outgoing events, shared by the mouse and
//! keyboard facets.

mod ticker;

use crate::abi;
use crate::errors::{DeviceError, Result};
use crate::phys_path;
use crate::preset::Preset;
use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use ticker::TickerMessage;

/// Narrow FFI boundary between the device core and the kernel. Isolating
/// `open`/`ioctl`/`write`/`close` behind a trait means the core's logic can
/// be exercised against a recording mock instead of a real `/dev/uinput`
/// node in ordinary unit tests.
pub trait Backend: Sized {
    fn open(path: &str) -> std::result::Result<Self, i32>;
    fn ioctl_int(&self, request: u64, arg: i32) -> std::result::Result<(), i32>;
    fn ioctl_bytes(&self, request: u64, bytes: &[u8]) -> std::result::Result<(), i32>;
    fn ioctl_none(&self, request: u64) -> std::result::Result<(), i32>;
    fn write(&self, buf: &[u8]) -> std::result::Result<usize, i32>;
}

/// Version field `UI_DEV_SETUP` is invoked with, independent of whatever a
/// preset's `InputId` carries; this is what real uinput clients report.
const DEVICE_SETUP_VERSION: u16 = 0x0111;

fn errno() -> i32 {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

/// Real backend, talking to the kernel through raw `libc` calls the same
/// way any other uinput client does.
pub struct LibcBackend {
    fd: std::os::unix::io::RawFd,
}

impl Backend for LibcBackend {
    fn open(path: &str) -> std::result::Result<Self, i32> {
        let cpath = std::ffi::CString::new(path).expect("uinput path has no interior NUL");
        let fd = unsafe { libc::open(cpath.as_ptr(), libc::O_WRONLY | libc::O_NONBLOCK) };
        if fd < 0 {
            return Err(errno());
        }
        Ok(LibcBackend { fd })
    }

    fn ioctl_int(&self, request: u64, arg: i32) -> std::result::Result<(), i32> {
        let rc = unsafe { libc::ioctl(self.fd, request as _, arg) };
        if rc < 0 {
            Err(errno())
        } else {
            Ok(())
        }
    }

    fn ioctl_bytes(&self, request: u64, bytes: &[u8]) -> std::result::Result<(), i32> {
        let rc = unsafe { libc::ioctl(self.fd, request as _, bytes.as_ptr()) };
        if rc < 0 {
            Err(errno())
        } else {
            Ok(())
        }
    }

    fn ioctl_none(&self, request: u64) -> std::result::Result<(), i32> {
        let rc = unsafe { libc::ioctl(self.fd, request as _) };
        if rc < 0 {
            Err(errno())
        } else {
            Ok(())
        }
    }

    fn write(&self, buf: &[u8]) -> std::result::Result<usize, i32> {
        let rc = unsafe { libc::write(self.fd, buf.as_ptr() as *const libc::c_void, buf.len()) };
        if rc < 0 {
            Err(errno())
        } else {
            Ok(rc as usize)
        }
    }
}

impl Drop for LibcBackend {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

/// Records every ioctl/write instead of touching hardware, so device-core
/// and capability logic can be covered by ordinary unit tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoctlCall {
    pub request: u64,
    pub arg: i32,
}

#[derive(Default)]
pub struct MockBackend {
    int_calls: RefCell<Vec<IoctlCall>>,
    bytes_calls: RefCell<Vec<(u64, Vec<u8>)>>,
    none_calls: RefCell<Vec<u64>>,
    writes: RefCell<Vec<Vec<u8>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        MockBackend::default()
    }

    pub fn tape(&self) -> Vec<IoctlCall> {
        self.int_calls.borrow().clone()
    }

    pub fn bytes_tape(&self) -> Vec<(u64, Vec<u8>)> {
        self.bytes_calls.borrow().clone()
    }

    pub fn none_tape(&self) -> Vec<u64> {
        self.none_calls.borrow().clone()
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.borrow().clone()
    }
}

impl Backend for MockBackend {
    fn open(_path: &str) -> std::result::Result<Self, i32> {
        Ok(MockBackend::new())
    }

    fn ioctl_int(&self, request: u64, arg: i32) -> std::result::Result<(), i32> {
        self.int_calls.borrow_mut().push(IoctlCall { request, arg });
        Ok(())
    }

    fn ioctl_bytes(&self, request: u64, bytes: &[u8]) -> std::result::Result<(), i32> {
        self.bytes_calls
            .borrow_mut()
            .push((request, bytes.to_vec()));
        Ok(())
    }

    fn ioctl_none(&self, request: u64) -> std::result::Result<(), i32> {
        self.none_calls.borrow_mut().push(request);
        Ok(())
    }

    fn write(&self, buf: &[u8]) -> std::result::Result<usize, i32> {
        self.writes.borrow_mut().push(buf.to_vec());
        Ok(buf.len())
    }
}

#[derive(PartialEq, Eq)]
enum State {
    Running,
    Destroyed,
}

/// Owns a uinput device from `UI_DEV_CREATE` through `UI_DEV_DESTROY`.
/// Once built, the only way to talk to the kernel fd is through the
/// dedicated polling thread; `emit` just hands events across a channel.
pub struct DeviceCore<B: Backend> {
    tx: mpsc::Sender<TickerMessage>,
    ticker: Option<JoinHandle<()>>,
    state: RefCell<State>,
    /// Flipped by the ticker thread when a write to the kernel fd fails or
    /// comes back short; checked by `emit` so a device that can no longer
    /// reliably reach the kernel stops accepting new events instead of
    /// silently dropping them forever.
    degraded: Arc<AtomicBool>,
    _backend: PhantomData<B>,
}

impl<B: Backend + Send + 'static> DeviceCore<B> {
    /// Opens `/dev/uinput`, configures capabilities and identity, creates
    /// the device, and starts the polling thread at `polling_hz`. `profile_id`
    /// seeds the deterministic `phys` path; a mouse and keyboard sharing a
    /// profile id land on the same simulated USB controller.
    pub fn create(preset: &Preset, profile_id: &str, polling_hz: u32) -> Result<Self> {
        let backend = B::open("/dev/uinput").map_err(|errno| DeviceError::OpenFailed { errno })?;
        preset.capabilities.configure(&backend)?;

        let mut id = preset.input_id();
        id.version = DEVICE_SETUP_VERSION;
        let setup = abi::UinputSetup::new(id, preset.name);
        backend
            .ioctl_bytes(abi::UI_DEV_SETUP, setup.as_bytes())
            .map_err(|errno| DeviceError::SetupFailed { errno })?;

        let phys = phys_path::generate(profile_id, preset.kind)?;
        let mut phys_bytes = phys.clone().into_bytes();
        phys_bytes.push(0);
        backend
            .ioctl_bytes(abi::UI_SET_PHYS, &phys_bytes)
            .map_err(|errno| DeviceError::PhysFailed {
                errno,
                path: phys.clone(),
            })?;

        backend
            .ioctl_none(abi::UI_DEV_CREATE)
            .map_err(|errno| DeviceError::CreateFailed { errno })?;

        let (tx, rx) = mpsc::channel();
        let degraded = Arc::new(AtomicBool::new(false));
        let ticker = ticker::spawn(backend, rx, polling_hz, degraded.clone());

        Ok(DeviceCore {
            tx,
            ticker: Some(ticker),
            state: RefCell::new(State::Running),
            degraded,
            _backend: PhantomData,
        })
    }

    /// Queue an event for the next flush. Events land on the wire in the
    /// order they were queued; a `SYN_REPORT` is appended automatically at
    /// each frame boundary, so callers never emit it themselves.
    pub fn emit(&self, event: abi::InputEvent) -> Result<()> {
        if *self.state.borrow() != State::Running {
            return Err(DeviceError::NotCreated);
        }
        if self.degraded.load(Ordering::SeqCst) {
            return Err(DeviceError::NotCreated);
        }
        self.tx
            .send(TickerMessage::Emit(event))
            .map_err(|_| DeviceError::NotCreated)
    }

    /// Tear the device down ahead of `Drop`, e.g. to release `/dev/uinput`
    /// without waiting for the value to go out of scope.
    pub fn destroy(&self) {
        if *self.state.borrow() == State::Running {
            *self.state.borrow_mut() = State::Destroyed;
            let _ = self.tx.send(TickerMessage::Shutdown);
        }
    }
}

impl<B: Backend> Drop for DeviceCore<B> {
    fn drop(&mut self) {
        if *self.state.borrow() == State::Running {
            *self.state.borrow_mut() = State::Destroyed;
            let _ = self.tx.send(TickerMessage::Shutdown);
        }
        if let Some(handle) = self.ticker.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::{PresetKind, MOUSE_PRESETS};

    #[test]
    fn create_configures_capabilities_before_create_ioctl() {
        let preset = &MOUSE_PRESETS[0];
        assert_eq!(preset.kind, PresetKind::Mouse);
        let core = DeviceCore::<MockBackend>::create(preset, "test-profile", 125).unwrap();
        core.destroy();
    }

    #[test]
    fn emit_after_destroy_is_rejected() {
        let preset = &MOUSE_PRESETS[0];
        let core = DeviceCore::<MockBackend>::create(preset, "test-profile", 125).unwrap();
        core.destroy();
        std::thread::sleep(std::time::Duration::from_millis(20));
        let err = core.emit(abi::InputEvent::new(abi::EV_REL, abi::REL_X, 1));
        assert!(matches!(err, Err(DeviceError::NotCreated)));
    }

    #[test]
    fn emit_after_write_failure_is_rejected() {
        let preset = &MOUSE_PRESETS[0];
        let core = DeviceCore::<MockBackend>::create(preset, "test-profile", 125).unwrap();
        // Simulate what the ticker does when a write to the kernel fd fails,
        // without needing a real failing fd: flip the same flag `emit` reads.
        core.degraded.store(true, Ordering::SeqCst);
        let err = core.emit(abi::InputEvent::new(abi::EV_REL, abi::REL_X, 1));
        assert!(matches!(err, Err(DeviceError::NotCreated)));
        core.destroy();
    }
}
