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

use super::panic_message;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tessel_core::{CommandError, CommandRecord, CommandValue};

type Handler<T> =
    Box<dyn Fn(&mut T, &CommandRecord) -> Result<CommandValue, CommandError> + Send + Sync>;

/// Maps method names to typed handlers on a worker.
///
/// Built once at registration through [`Worker::register_commands`](super::Worker::register_commands).
/// Names are validated there, so a command that reaches a worker's queue
/// always resolves.
pub struct CommandTable<T> {
    handlers: HashMap<String, Handler<T>>,
}

impl<T> CommandTable<T> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers `handler` under `method`.
    ///
    /// ## Errors
    /// * `CommandError::DuplicateMethod` - If `method` is already registered.
    pub fn register<F>(&mut self, method: &str, handler: F) -> Result<&mut Self, CommandError>
    where
        F: Fn(&mut T, &CommandRecord) -> Result<CommandValue, CommandError> + Send + Sync + 'static,
    {
        if self.handlers.contains_key(method) {
            return Err(CommandError::DuplicateMethod {
                method: method.to_string(),
            });
        }
        self.handlers.insert(method.to_string(), Box::new(handler));
        Ok(self)
    }

    /// Whether a handler is registered under `method`.
    pub fn contains(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// The registered method names, in no particular order.
    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Resolves `command` and runs its handler on `target`.
    ///
    /// A panicking handler is caught and reported as
    /// [`CommandError::HandlerPanicked`].
    pub fn invoke(
        &self,
        worker: &str,
        target: &mut T,
        command: &CommandRecord,
    ) -> Result<CommandValue, CommandError> {
        let handler =
            self.handlers
                .get(command.method())
                .ok_or_else(|| CommandError::UnknownMethod {
                    worker: worker.to_string(),
                    method: command.method().to_string(),
                })?;

        catch_unwind(AssertUnwindSafe(|| handler(target, command))).unwrap_or_else(|payload| {
            Err(CommandError::HandlerPanicked {
                method: command.method().to_string(),
                details: panic_message(payload.as_ref()),
            })
        })
    }
}

impl<T> Default for CommandTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for CommandTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}
