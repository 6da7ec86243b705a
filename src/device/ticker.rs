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

//! Dedicated polling thread. Owns the backend for the device's whole
//! lifetime and is the only thing that ever touches the kernel fd once the
//! device is created, which is what lets `DeviceCore::emit` be a plain
//! channel send from any thread.
//!
//! Events arriving between two tick deadlines are held, not written
//! immediately: a real 125/250/500/1000 Hz device physically cannot report
//! more than one frame per interval, so two `emit`s a millisecond apart on a
//! 125 Hz device must still land in the same `SYN_REPORT`-terminated frame
//! at the next tick, not two frames back to back.

use super::Backend;
use crate::abi;
use crate::errors::DeviceError;
use log::warn;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

pub enum TickerMessage {
    Emit(abi::InputEvent),
    Shutdown,
}

pub fn spawn<B: Backend + Send + 'static>(
    backend: B,
    rx: Receiver<TickerMessage>,
    polling_hz: u32,
    degraded: Arc<AtomicBool>,
) -> JoinHandle<()> {
    let period = Duration::from_secs_f64(1.0 / polling_hz.max(1) as f64);
    thread::Builder::new()
        .name("uinput-hid-ticker".to_string())
        .spawn(move || {
            run(backend, rx, period, degraded);
        })
        .expect("failed to spawn uinput polling thread")
}

/// Returns the backend once the thread is done with it, so tests can
/// inspect what it recorded.
fn run<B: Backend>(
    backend: B,
    rx: Receiver<TickerMessage>,
    period: Duration,
    degraded: Arc<AtomicBool>,
) -> B {
    // Reused for every flush so a busy device doesn't allocate per event.
    let buffer = Mutex::new([0u8; 24]);
    let mut pending: Vec<abi::InputEvent> = Vec::new();
    let mut next_tick = Instant::now() + period;

    loop {
        let timeout = next_tick.saturating_duration_since(Instant::now());
        match rx.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => {
                next_tick += period;
                emit_frame(&backend, &buffer, &mut pending, &degraded);
            }
            Err(RecvTimeoutError::Disconnected) => {
                emit_frame(&backend, &buffer, &mut pending, &degraded);
                let _ = backend.ioctl_none(abi::UI_DEV_DESTROY);
                return backend;
            }
            Ok(TickerMessage::Shutdown) => {
                emit_frame(&backend, &buffer, &mut pending, &degraded);
                let _ = backend.ioctl_none(abi::UI_DEV_DESTROY);
                return backend;
            }
            Ok(TickerMessage::Emit(event)) => {
                // Held until the next tick deadline, not written here: this
                // is what makes a burst of emits inside one interval
                // coalesce into a single frame instead of jumping ahead of
                // the device's polling rate.
                pending.push(event);
            }
        }
    }
}

/// Write out everything accumulated since the last tick, in arrival order,
/// closing with exactly one `SYN_REPORT` if anything was written. A no-op
/// if nothing was queued this interval.
fn emit_frame<B: Backend>(
    backend: &B,
    buffer: &Mutex<[u8; 24]>,
    pending: &mut Vec<abi::InputEvent>,
    degraded: &AtomicBool,
) {
    if pending.is_empty() {
        return;
    }
    for event in pending.drain(..) {
        write_event(backend, buffer, event, degraded);
    }
    write_event(backend, buffer, abi::InputEvent::syn_report(), degraded);
}

fn write_event<B: Backend>(
    backend: &B,
    buffer: &Mutex<[u8; 24]>,
    event: abi::InputEvent,
    degraded: &AtomicBool,
) {
    let mut guard = buffer.lock().expect("ticker emission buffer poisoned");
    guard.copy_from_slice(event.as_bytes());
    match backend.write(&guard[..]) {
        Ok(written) if written == guard.len() => {}
        Ok(written) => {
            degraded.store(true, Ordering::SeqCst);
            warn!(
                "{}",
                DeviceError::WriteFailed {
                    written,
                    expected: guard.len(),
                    errno: 0,
                }
            );
        }
        Err(errno) => {
            degraded.store(true, Ordering::SeqCst);
            warn!(
                "{}",
                DeviceError::WriteFailed {
                    written: 0,
                    expected: guard.len(),
                    errno,
                }
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MockBackend;
    use std::sync::mpsc;

    #[test]
    fn shutdown_issues_destroy_ioctl_on_the_owning_thread() {
        let backend = MockBackend::new();
        let (tx, rx) = mpsc::channel();
        tx.send(TickerMessage::Shutdown).unwrap();
        let backend = run(backend, rx, Duration::from_millis(8), Arc::new(AtomicBool::new(false)));
        assert_eq!(backend.none_tape(), vec![abi::UI_DEV_DESTROY]);
    }

    #[test]
    fn emit_is_followed_by_a_syn_report() {
        let backend = MockBackend::new();
        let (tx, rx) = mpsc::channel();
        tx.send(TickerMessage::Emit(abi::InputEvent::new(
            abi::EV_REL,
            abi::REL_X,
            5,
        )))
        .unwrap();
        tx.send(TickerMessage::Shutdown).unwrap();
        let backend = run(backend, rx, Duration::from_millis(8), Arc::new(AtomicBool::new(false)));
        let writes = backend.writes();
        assert_eq!(writes.len(), 2);
        let last = &writes[1];
        let syn_type = u16::from_ne_bytes([last[16], last[17]]);
        assert_eq!(syn_type, abi::EV_SYN);
    }

    #[test]
    fn events_faster_than_the_interval_coalesce_into_one_frame() {
        let backend = MockBackend::new();
        let (tx, rx) = mpsc::channel();
        // Two emits sent back to back, well inside a single 50ms interval.
        tx.send(TickerMessage::Emit(abi::InputEvent::new(abi::EV_REL, abi::REL_X, 1)))
            .unwrap();
        tx.send(TickerMessage::Emit(abi::InputEvent::new(abi::EV_REL, abi::REL_Y, 1)))
            .unwrap();
        tx.send(TickerMessage::Shutdown).unwrap();
        let backend = run(backend, rx, Duration::from_millis(50), Arc::new(AtomicBool::new(false)));
        let writes = backend.writes();
        // Both deltas plus a single trailing SYN_REPORT: one frame, not two.
        assert_eq!(writes.len(), 3);
        let last = &writes[2];
        let syn_type = u16::from_ne_bytes([last[16], last[17]]);
        assert_eq!(syn_type, abi::EV_SYN);
    }

    #[test]
    fn write_failure_sets_the_degraded_flag() {
        struct FailingBackend;
        impl Backend for FailingBackend {
            fn open(_path: &str) -> std::result::Result<Self, i32> {
                Ok(FailingBackend)
            }
            fn ioctl_int(&self, _request: u64, _arg: i32) -> std::result::Result<(), i32> {
                Ok(())
            }
            fn ioctl_bytes(&self, _request: u64, _bytes: &[u8]) -> std::result::Result<(), i32> {
                Ok(())
            }
            fn ioctl_none(&self, _request: u64) -> std::result::Result<(), i32> {
                Ok(())
            }
            fn write(&self, _buf: &[u8]) -> std::result::Result<usize, i32> {
                Err(5)
            }
        }

        let (tx, rx) = mpsc::channel();
        tx.send(TickerMessage::Emit(abi::InputEvent::new(abi::EV_REL, abi::REL_X, 1)))
            .unwrap();
        tx.send(TickerMessage::Shutdown).unwrap();
        let degraded = Arc::new(AtomicBool::new(false));
        run(FailingBackend, rx, Duration::from_millis(8), degraded.clone());
        assert!(degraded.load(Ordering::SeqCst));
    }
}
