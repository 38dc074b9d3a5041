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

use super::journal::{DeviceEvent, Submission};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tessel_core::renderer::{
    BufferDescriptor, BufferId, BufferUsage, CommandBufferId, GraphicsDevice, RecordedCommand,
    RenderError, ResourceError, ResourceSetDescriptor, ResourceSetId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordingState {
    Initial,
    Recording,
    Finished,
}

#[derive(Debug)]
struct CommandBufferEntry {
    label: Option<String>,
    state: RecordingState,
    commands: Vec<RecordedCommand>,
}

#[derive(Debug)]
#[allow(dead_code)]
struct BufferEntry {
    label: Option<String>,
    usage: BufferUsage,
    data: Vec<u8>,
}

/// The internal, non-clonable state of the [`HeadlessDevice`].
#[derive(Debug, Default)]
struct HeadlessDeviceInternal {
    command_buffers: Mutex<HashMap<CommandBufferId, CommandBufferEntry>>,
    buffers: Mutex<HashMap<BufferId, BufferEntry>>,
    resource_sets: Mutex<HashMap<ResourceSetId, Vec<BufferId>>>,
    journal: Mutex<Vec<DeviceEvent>>,
    submissions: Mutex<Vec<Submission>>,

    next_command_buffer_id: AtomicU64,
    next_buffer_id: AtomicUsize,
    next_resource_set_id: AtomicUsize,

    lost: AtomicBool,
}

/// A clonable, thread-safe graphics device with no GPU behind it.
///
/// Every command buffer goes through the same state machine a real backend
/// enforces (`begin_recording → record* → end_recording → submit`), and every
/// call that changes device state is appended to a journal the caller can
/// inspect afterwards.
#[derive(Clone, Debug, Default)]
pub struct HeadlessDevice {
    internal: Arc<HeadlessDeviceInternal>,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>, ResourceError> {
    mutex
        .lock()
        .map_err(|e| ResourceError::BackendError(format!("Mutex poisoned ({what}): {e}")))
}

impl HeadlessDevice {
    /// Creates a device with no resources.
    pub fn new() -> Self {
        log::info!("HeadlessDevice: created.");
        Self::default()
    }

    // --- ID Generation Helpers ---

    fn generate_command_buffer_id(&self) -> CommandBufferId {
        CommandBufferId(
            self.internal
                .next_command_buffer_id
                .fetch_add(1, Ordering::Relaxed),
        )
    }

    fn generate_buffer_id(&self) -> BufferId {
        BufferId(self.internal.next_buffer_id.fetch_add(1, Ordering::Relaxed))
    }

    fn generate_resource_set_id(&self) -> ResourceSetId {
        ResourceSetId(
            self.internal
                .next_resource_set_id
                .fetch_add(1, Ordering::Relaxed),
        )
    }

    fn push_event(&self, event: DeviceEvent) {
        if let Ok(mut journal) = self.internal.journal.lock() {
            journal.push(event);
        }
    }

    /// Runs `operation` on a command buffer entry.
    fn with_command_buffer<R>(
        &self,
        id: CommandBufferId,
        operation: impl FnOnce(&mut CommandBufferEntry) -> Result<R, RenderError>,
    ) -> Result<R, RenderError> {
        let mut buffers = self.internal.command_buffers.lock().map_err(|e| {
            RenderError::Internal(format!("Mutex poisoned (command_buffers): {e}"))
        })?;
        let entry = buffers
            .get_mut(&id)
            .ok_or(RenderError::ResourceError(ResourceError::InvalidHandle))?;
        operation(entry)
    }

    fn check_alive(&self) -> Result<(), RenderError> {
        if self.internal.lost.load(Ordering::Acquire) {
            Err(RenderError::DeviceLost)
        } else {
            Ok(())
        }
    }

    // --- Inspection ---

    /// Every state-changing call, in the order the device observed them.
    pub fn events(&self) -> Vec<DeviceEvent> {
        self.internal
            .journal
            .lock()
            .map(|journal| journal.clone())
            .unwrap_or_default()
    }

    /// Every submission, in submission order.
    pub fn submissions(&self) -> Vec<Submission> {
        self.internal
            .submissions
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Number of `wait_for_idle` calls.
    pub fn idle_waits(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, DeviceEvent::WaitForIdle))
            .count()
    }

    /// Clears the event journal and the submission log. Resources are kept.
    pub fn clear_journal(&self) {
        if let Ok(mut journal) = self.internal.journal.lock() {
            journal.clear();
        }
        if let Ok(mut submissions) = self.internal.submissions.lock() {
            submissions.clear();
        }
    }

    /// The current contents of a GPU buffer.
    pub fn buffer_contents(&self, id: BufferId) -> Option<Vec<u8>> {
        let buffers = self.internal.buffers.lock().ok()?;
        buffers.get(&id).map(|b| b.data.clone())
    }

    /// The label given to a command buffer at allocation.
    pub fn command_buffer_label(&self, id: CommandBufferId) -> Option<String> {
        let buffers = self.internal.command_buffers.lock().ok()?;
        buffers.get(&id).and_then(|b| b.label.clone())
    }

    /// Number of allocated command buffers.
    pub fn command_buffer_count(&self) -> usize {
        self.internal
            .command_buffers
            .lock()
            .map(|b| b.len())
            .unwrap_or(0)
    }

    /// Simulates (or clears) a lost device. While lost, `submit` and
    /// `wait_for_idle` fail with [`RenderError::DeviceLost`].
    pub fn set_lost(&self, lost: bool) {
        self.internal.lost.store(lost, Ordering::Release);
        if lost {
            log::warn!("HeadlessDevice: marked as lost.");
        }
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn create_command_buffer(&self, label: Option<&str>) -> Result<CommandBufferId, ResourceError> {
        let id = self.generate_command_buffer_id();
        lock(&self.internal.command_buffers, "command_buffers")?.insert(
            id,
            CommandBufferEntry {
                label: label.map(str::to_string),
                state: RecordingState::Initial,
                commands: Vec::new(),
            },
        );
        log::trace!("HeadlessDevice: command buffer {id:?} ({label:?}) created.");
        self.push_event(DeviceEvent::CommandBufferCreated(id));
        Ok(id)
    }

    fn begin_recording(&self, buffer: CommandBufferId) -> Result<(), RenderError> {
        self.with_command_buffer(buffer, |entry| {
            if entry.state == RecordingState::Recording {
                return Err(RenderError::AlreadyRecording(buffer));
            }
            entry.commands.clear();
            entry.state = RecordingState::Recording;
            Ok(())
        })
    }

    fn record(&self, buffer: CommandBufferId, command: RecordedCommand) -> Result<(), RenderError> {
        self.with_command_buffer(buffer, |entry| {
            if entry.state != RecordingState::Recording {
                return Err(RenderError::NotRecording(buffer));
            }
            entry.commands.push(command);
            Ok(())
        })
    }

    fn end_recording(&self, buffer: CommandBufferId) -> Result<(), RenderError> {
        self.with_command_buffer(buffer, |entry| {
            if entry.state != RecordingState::Recording {
                return Err(RenderError::NotRecording(buffer));
            }
            entry.state = RecordingState::Finished;
            Ok(())
        })
    }

    fn submit(&self, buffer: CommandBufferId) -> Result<(), RenderError> {
        self.check_alive()?;
        let submission = self.with_command_buffer(buffer, |entry| match entry.state {
            RecordingState::Recording => Err(RenderError::SubmitWhileRecording(buffer)),
            RecordingState::Initial => Err(RenderError::NotRecording(buffer)),
            RecordingState::Finished => {
                entry.state = RecordingState::Initial;
                Ok(Submission {
                    buffer,
                    label: entry.label.clone(),
                    commands: std::mem::take(&mut entry.commands),
                })
            }
        })?;

        log::trace!(
            "HeadlessDevice: submitted {:?} with {} command(s).",
            buffer,
            submission.commands.len()
        );
        lock(&self.internal.submissions, "submissions")?.push(submission);
        self.push_event(DeviceEvent::Submitted(buffer));
        Ok(())
    }

    fn wait_for_idle(&self) -> Result<(), RenderError> {
        self.check_alive()?;
        // Work completes at submission; there is nothing to drain.
        self.push_event(DeviceEvent::WaitForIdle);
        Ok(())
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        let size = usize::try_from(descriptor.size).map_err(|_| ResourceError::OutOfBounds)?;
        let id = self.generate_buffer_id();
        lock(&self.internal.buffers, "buffers")?.insert(
            id,
            BufferEntry {
                label: descriptor.label.as_deref().map(str::to_string),
                usage: descriptor.usage,
                data: vec![0; size],
            },
        );
        self.push_event(DeviceEvent::BufferCreated(id));
        Ok(id)
    }

    fn create_resource_set(
        &self,
        descriptor: &ResourceSetDescriptor,
    ) -> Result<ResourceSetId, ResourceError> {
        {
            let buffers = lock(&self.internal.buffers, "buffers")?;
            if let Some(missing) = descriptor.buffers.iter().find(|id| !buffers.contains_key(*id)) {
                log::error!(
                    "HeadlessDevice: resource set {:?} references unknown buffer {missing:?}.",
                    descriptor.label
                );
                return Err(ResourceError::InvalidHandle);
            }
        }

        let id = self.generate_resource_set_id();
        lock(&self.internal.resource_sets, "resource_sets")?
            .insert(id, descriptor.buffers.to_vec());
        self.push_event(DeviceEvent::ResourceSetCreated(id));
        Ok(id)
    }

    fn update_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        {
            let mut buffers = lock(&self.internal.buffers, "buffers")?;
            let entry = buffers.get_mut(&id).ok_or(ResourceError::NotFound)?;
            let start = usize::try_from(offset).map_err(|_| ResourceError::OutOfBounds)?;
            let end = start
                .checked_add(data.len())
                .filter(|end| *end <= entry.data.len())
                .ok_or(ResourceError::OutOfBounds)?;
            entry.data[start..end].copy_from_slice(data);
        }
        self.push_event(DeviceEvent::BufferUpdated {
            id,
            offset,
            len: data.len(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use tessel_core::renderer::{DrawCommand, Rect};

    fn draw(count: u32) -> RecordedCommand {
        RecordedCommand::Draw(DrawCommand {
            vertex_buffer: BufferId(0),
            index_buffer: None,
            resource_set: None,
            element_count: count,
            instance_count: 1,
        })
    }

    #[test]
    fn recording_protocol_is_enforced() {
        let device = HeadlessDevice::new();
        let cb = device.create_command_buffer(Some("test")).unwrap();

        assert_eq!(device.record(cb, draw(3)), Err(RenderError::NotRecording(cb)));
        assert_eq!(device.submit(cb), Err(RenderError::NotRecording(cb)));

        device.begin_recording(cb).unwrap();
        assert_eq!(device.begin_recording(cb), Err(RenderError::AlreadyRecording(cb)));
        device
            .record(cb, RecordedCommand::SetViewport(Rect::default()))
            .unwrap();
        device.record(cb, draw(3)).unwrap();
        assert_eq!(device.submit(cb), Err(RenderError::SubmitWhileRecording(cb)));

        device.end_recording(cb).unwrap();
        device.submit(cb).unwrap();

        let submissions = device.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].label.as_deref(), Some("test"));
        assert_eq!(submissions[0].commands.len(), 2);
        assert_eq!(submissions[0].draw_count(), 1);
    }

    #[test]
    fn command_buffers_are_reusable_after_submit() {
        let device = HeadlessDevice::new();
        let cb = device.create_command_buffer(None).unwrap();

        for frame in 1..=3 {
            device.begin_recording(cb).unwrap();
            device.record(cb, draw(frame)).unwrap();
            device.end_recording(cb).unwrap();
            device.submit(cb).unwrap();
        }

        let submissions = device.submissions();
        assert_eq!(submissions.len(), 3);
        assert!(submissions.iter().all(|s| s.commands.len() == 1));
    }

    #[test]
    fn buffer_updates_are_bounds_checked() {
        let device = HeadlessDevice::new();
        let id = device
            .create_buffer(&BufferDescriptor {
                label: Some(Cow::Borrowed("uniforms")),
                size: 8,
                usage: BufferUsage::Uniform,
            })
            .unwrap();

        device.update_buffer(id, 4, &[1, 2, 3, 4]).unwrap();
        assert_eq!(device.buffer_contents(id).unwrap(), vec![0, 0, 0, 0, 1, 2, 3, 4]);
        assert_eq!(
            device.update_buffer(id, 6, &[1, 2, 3]),
            Err(ResourceError::OutOfBounds)
        );
        assert_eq!(
            device.update_buffer(BufferId(99), 0, &[1]),
            Err(ResourceError::NotFound)
        );
    }

    #[test]
    fn resource_sets_require_known_buffers() {
        let device = HeadlessDevice::new();
        let missing = [BufferId(42)];
        let result = device.create_resource_set(&ResourceSetDescriptor {
            label: None,
            buffers: &missing,
        });
        assert_eq!(result, Err(ResourceError::InvalidHandle));
        assert!(!device.events().iter().any(DeviceEvent::touches_resources));
    }

    #[test]
    fn lost_device_refuses_submission() {
        let device = HeadlessDevice::new();
        let cb = device.create_command_buffer(None).unwrap();
        device.begin_recording(cb).unwrap();
        device.end_recording(cb).unwrap();

        device.set_lost(true);
        assert_eq!(device.submit(cb), Err(RenderError::DeviceLost));
        assert_eq!(device.wait_for_idle(), Err(RenderError::DeviceLost));

        device.set_lost(false);
        device.submit(cb).unwrap();
        device.wait_for_idle().unwrap();
        assert_eq!(device.idle_waits(), 1);
    }
}
