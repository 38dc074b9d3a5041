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

//! In-flight and completed tasks, and the queue that carries results back to
//! the orchestrator's thread.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tessel_core::{CommandRecord, CommandResult, WorkerId};

/// Receives a command's result. Always invoked on the orchestrator's thread.
pub type CommandCallback = Box<dyn FnOnce(CommandResult) + Send + 'static>;

/// A command waiting in, or taken from, a worker's inbound queue.
pub struct Task {
    /// The command to execute.
    pub command: CommandRecord,
    /// Invoked with the result once the orchestrator drains the completion.
    pub callback: Option<CommandCallback>,
}

impl Task {
    /// Creates a task.
    pub fn new(command: CommandRecord, callback: Option<CommandCallback>) -> Self {
        Self { command, callback }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("command", &self.command)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

/// A task that executed successfully on a worker thread.
#[derive(Debug)]
pub struct CompletedTask {
    /// The worker that executed the task.
    pub worker: WorkerId,
    /// The original task, callback included.
    pub task: Task,
    /// The handler's result.
    pub result: CommandResult,
}

impl CompletedTask {
    /// Invokes the callback, if any, consuming the completion.
    /// Returns whether a callback ran.
    pub fn deliver(self) -> bool {
        match self.task.callback {
            Some(callback) => {
                callback(self.result);
                true
            }
            None => false,
        }
    }
}

/// A mutex-guarded FIFO of completed tasks.
///
/// Any worker thread may push; only the orchestrator drains.
#[derive(Debug, Default)]
pub struct CompletionQueue {
    inner: Mutex<VecDeque<CompletedTask>>,
}

impl CompletionQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a completion.
    pub fn push(&self, completed: CompletedTask) {
        self.lock().push_back(completed);
    }

    /// Takes every queued completion, oldest first.
    pub fn drain(&self) -> VecDeque<CompletedTask> {
        std::mem::take(&mut *self.lock())
    }

    /// Number of completions waiting to be drained.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panicking producer cannot leave the deque half-modified, so a
    // poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, VecDeque<CompletedTask>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn completed(worker: WorkerId, n: i64, callback: Option<CommandCallback>) -> CompletedTask {
        CompletedTask {
            worker,
            task: Task::new(CommandRecord::new("Echo", vec![json!(n)]), callback),
            result: CommandResult::success(json!(n)),
        }
    }

    #[test]
    fn drain_preserves_push_order() {
        let queue = CompletionQueue::new();
        let id = WorkerId::new();
        for n in 0..4 {
            queue.push(completed(id, n, None));
        }

        let drained: Vec<_> = queue.drain().into_iter().map(|c| c.result.payload).collect();
        assert_eq!(drained, vec![json!(0), json!(1), json!(2), json!(3)]);
        assert!(queue.is_empty());
    }

    #[test]
    fn deliver_invokes_callback_once_with_result() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let with_callback = completed(
            WorkerId::new(),
            7,
            Some(Box::new(move |result| sink.lock().unwrap().push(result))),
        );

        assert!(with_callback.deliver());
        assert!(!completed(WorkerId::new(), 8, None).deliver());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], CommandResult::success(json!(7)));
    }
}
