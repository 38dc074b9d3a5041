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

//! Cross-thread command records and their results.
//!
//! A [`CommandRecord`] names an operation and carries its positional arguments.
//! It is built by the caller, handed to a worker's inbound queue, and never
//! mutated afterwards. The worker answers with a [`CommandResult`].

use std::fmt;

/// An opaque argument or return value carried by a command.
pub type CommandValue = serde_json::Value;

/// An immutable description of a named operation to run on a worker thread.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRecord {
    method: String,
    arguments: Vec<CommandValue>,
}

impl CommandRecord {
    /// Creates a record for `method` with the given positional arguments.
    pub fn new(method: impl Into<String>, arguments: Vec<CommandValue>) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }

    /// Creates a record without arguments.
    pub fn named(method: impl Into<String>) -> Self {
        Self::new(method, Vec::new())
    }

    /// The name the worker's command table resolves.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// All positional arguments, in call order.
    pub fn arguments(&self) -> &[CommandValue] {
        &self.arguments
    }

    /// Returns the argument at `index`.
    ///
    /// ## Errors
    /// * `CommandError::MissingArgument` - If the record has fewer arguments.
    pub fn argument(&self, index: usize) -> Result<&CommandValue, CommandError> {
        self.arguments
            .get(index)
            .ok_or_else(|| CommandError::MissingArgument {
                method: self.method.clone(),
                index,
            })
    }

    /// Returns the argument at `index` as a signed integer.
    pub fn arg_i64(&self, index: usize) -> Result<i64, CommandError> {
        self.argument(index)?
            .as_i64()
            .ok_or_else(|| self.invalid(index, "integer"))
    }

    /// Returns the argument at `index` as a float. Integers are widened.
    pub fn arg_f64(&self, index: usize) -> Result<f64, CommandError> {
        self.argument(index)?
            .as_f64()
            .ok_or_else(|| self.invalid(index, "number"))
    }

    /// Returns the argument at `index` as a boolean.
    pub fn arg_bool(&self, index: usize) -> Result<bool, CommandError> {
        self.argument(index)?
            .as_bool()
            .ok_or_else(|| self.invalid(index, "boolean"))
    }

    /// Returns the argument at `index` as a string slice.
    pub fn arg_str(&self, index: usize) -> Result<&str, CommandError> {
        self.argument(index)?
            .as_str()
            .ok_or_else(|| self.invalid(index, "string"))
    }

    fn invalid(&self, index: usize, expected: &'static str) -> CommandError {
        CommandError::InvalidArgument {
            method: self.method.clone(),
            index,
            expected,
        }
    }
}

/// The outcome delivered to a task's callback.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResult {
    /// Whether the handler returned normally.
    pub success: bool,
    /// The handler's return value.
    pub payload: CommandValue,
}

impl CommandResult {
    /// A successful result carrying `payload`.
    pub fn success(payload: CommandValue) -> Self {
        Self {
            success: true,
            payload,
        }
    }
}

/// An error raised while registering, enqueuing, or executing a command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandError {
    /// No handler is registered under this name.
    UnknownMethod {
        /// The worker the command was addressed to.
        worker: String,
        /// The unresolved method name.
        method: String,
    },
    /// A handler with the same name was already registered.
    DuplicateMethod {
        /// The conflicting method name.
        method: String,
    },
    /// The command has fewer arguments than the handler reads.
    MissingArgument {
        /// The method being invoked.
        method: String,
        /// The missing argument position.
        index: usize,
    },
    /// An argument does not have the type the handler expects.
    InvalidArgument {
        /// The method being invoked.
        method: String,
        /// The offending argument position.
        index: usize,
        /// A short description of the expected type.
        expected: &'static str,
    },
    /// The handler reported a failure.
    HandlerFailed {
        /// The method being invoked.
        method: String,
        /// The handler's error message.
        details: String,
    },
    /// The handler panicked.
    HandlerPanicked {
        /// The method being invoked.
        method: String,
        /// The panic payload, if it was a string.
        details: String,
    },
    /// The worker does not accept commands (no thread, or already stopped).
    NotAccepting {
        /// The worker the command was addressed to.
        worker: String,
    },
}

impl CommandError {
    /// Wraps an arbitrary handler failure.
    pub fn failed(method: &str, details: impl fmt::Display) -> Self {
        CommandError::HandlerFailed {
            method: method.to_string(),
            details: details.to_string(),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::UnknownMethod { worker, method } => {
                write!(f, "Worker '{worker}' has no command named '{method}'")
            }
            CommandError::DuplicateMethod { method } => {
                write!(f, "Command '{method}' is registered twice")
            }
            CommandError::MissingArgument { method, index } => {
                write!(f, "Command '{method}' is missing argument #{index}")
            }
            CommandError::InvalidArgument {
                method,
                index,
                expected,
            } => {
                write!(
                    f,
                    "Command '{method}' expected argument #{index} to be a {expected}"
                )
            }
            CommandError::HandlerFailed { method, details } => {
                write!(f, "Command '{method}' failed: {details}")
            }
            CommandError::HandlerPanicked { method, details } => {
                write!(f, "Command '{method}' panicked: {details}")
            }
            CommandError::NotAccepting { worker } => {
                write!(f, "Worker '{worker}' does not accept commands")
            }
        }
    }
}

impl std::error::Error for CommandError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn typed_accessors_read_positional_arguments() {
        let cmd = CommandRecord::new("Spawn", vec![json!(3), json!(1.5), json!("crate"), json!(true)]);

        assert_eq!(cmd.method(), "Spawn");
        assert_eq!(cmd.arg_i64(0), Ok(3));
        assert_eq!(cmd.arg_f64(0), Ok(3.0));
        assert_eq!(cmd.arg_f64(1), Ok(1.5));
        assert_eq!(cmd.arg_str(2), Ok("crate"));
        assert_eq!(cmd.arg_bool(3), Ok(true));
    }

    #[test]
    fn missing_and_mistyped_arguments_are_reported() {
        let cmd = CommandRecord::new("Add", vec![json!("two")]);

        assert_eq!(
            cmd.arg_i64(1),
            Err(CommandError::MissingArgument {
                method: "Add".into(),
                index: 1
            })
        );
        assert_eq!(
            cmd.arg_i64(0),
            Err(CommandError::InvalidArgument {
                method: "Add".into(),
                index: 0,
                expected: "integer"
            })
        );
    }

    #[test]
    fn error_display() {
        let err = CommandError::UnknownMethod {
            worker: "physics".into(),
            method: "Jump".into(),
        };
        assert_eq!(format!("{err}"), "Worker 'physics' has no command named 'Jump'");

        let err = CommandError::failed("Add", "overflow");
        assert_eq!(format!("{err}"), "Command 'Add' failed: overflow");
    }
}
