// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Auto-reset rendezvous signals.
//!
//! A signal is a capacity-1 channel split into a setting half and a waiting
//! half. Setting an already-set signal is a no-op; a wait consumes the signal
//! and wakes exactly one waiter. When every [`SignalSet`] is dropped, a
//! blocked [`SignalWait`] returns [`SignalClosed`] instead of hanging.

use crossbeam_channel::{Receiver, RecvError, Sender, TrySendError};
use std::fmt;

/// The setting half of an auto-reset signal.
#[derive(Debug, Clone)]
pub struct SignalSet(Sender<()>);

/// The waiting half of an auto-reset signal.
#[derive(Debug)]
pub struct SignalWait(Receiver<()>);

/// Every setting half of the signal was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalClosed;

impl fmt::Display for SignalClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "signal closed: the setting side was dropped")
    }
}

impl std::error::Error for SignalClosed {}

/// Creates a new, unset auto-reset signal.
pub fn auto_reset() -> (SignalSet, SignalWait) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    (SignalSet(tx), SignalWait(rx))
}

impl SignalSet {
    /// Sets the signal. Returns `false` if it was already set or nobody can wait on it.
    pub fn set(&self) -> bool {
        match self.0.try_send(()) {
            Ok(()) => true,
            Err(TrySendError::Full(())) => false,
            Err(TrySendError::Disconnected(())) => {
                log::trace!("Signal set after its waiter was dropped.");
                false
            }
        }
    }
}

impl SignalWait {
    /// Blocks until the signal is set, then clears it.
    pub fn wait(&self) -> Result<(), SignalClosed> {
        self.0.recv().map_err(|RecvError| SignalClosed)
    }

    /// Whether the signal is currently set.
    pub fn is_set(&self) -> bool {
        !self.0.is_empty()
    }
}
