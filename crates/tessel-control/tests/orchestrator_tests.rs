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

use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tessel_control::{
    CommandTable, ControlError, FrameOrchestrator, SchedulerConfig, SchedulingPolicy, Worker,
    WorkerState,
};
use tessel_core::{CommandError, CommandRecord, CommandValue};

const DT: Duration = Duration::from_millis(16);

// ── Test workers ─────────────────────────────────────────────────────

/// Counts its cycles and records setup/teardown.
#[derive(Default, Clone)]
struct Tally {
    cycles: Arc<AtomicU64>,
    set_up: Arc<AtomicBool>,
    torn_down: Arc<AtomicBool>,
}

struct CounterWorker {
    name: &'static str,
    tally: Tally,
}

impl CounterWorker {
    fn new(name: &'static str) -> (Self, Tally) {
        let tally = Tally::default();
        (
            Self {
                name,
                tally: tally.clone(),
            },
            tally,
        )
    }
}

impl Worker for CounterWorker {
    fn name(&self) -> &str {
        self.name
    }

    fn setup(&mut self) -> anyhow::Result<()> {
        self.tally.set_up.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn step(&mut self) -> anyhow::Result<()> {
        self.tally.cycles.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn teardown(&mut self) {
        self.tally.torn_down.store(true, Ordering::SeqCst);
    }
}

/// A worker exposing arithmetic commands.
#[derive(Default)]
struct Calculator {
    total: i64,
}

impl Worker for Calculator {
    fn name(&self) -> &str {
        "calculator"
    }

    fn step(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn async_interval(&self) -> Option<Duration> {
        Some(Duration::from_millis(1))
    }

    fn register_commands(table: &mut CommandTable<Self>) -> Result<(), CommandError> {
        table
            .register("Add", |_: &mut Calculator, cmd| {
                Ok(json!(cmd.arg_i64(0)? + cmd.arg_i64(1)?))
            })?
            .register("Accumulate", |calc: &mut Calculator, cmd| {
                calc.total += cmd.arg_i64(0)?;
                Ok(json!(calc.total))
            })?
            .register("Echo", |_: &mut Calculator, cmd| Ok(cmd.argument(0)?.clone()))?
            .register("Fail", |_: &mut Calculator, cmd| {
                Err(CommandError::failed(cmd.method(), "refused"))
            })?;
        Ok(())
    }
}

/// A worker whose step fails every other cycle and panics on the third.
#[derive(Default)]
struct Flaky {
    cycle: u32,
}

impl Worker for Flaky {
    fn name(&self) -> &str {
        "flaky"
    }

    fn step(&mut self) -> anyhow::Result<()> {
        self.cycle += 1;
        match self.cycle {
            3 => panic!("flaky step panicked"),
            n if n % 2 == 0 => anyhow::bail!("flaky step failed on cycle {n}"),
            _ => Ok(()),
        }
    }
}

struct BrokenSetup;

impl Worker for BrokenSetup {
    fn name(&self) -> &str {
        "broken"
    }

    fn setup(&mut self) -> anyhow::Result<()> {
        anyhow::bail!("device not found")
    }

    fn step(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Records the order in which setups ran.
struct Ordered {
    name: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl Worker for Ordered {
    fn name(&self) -> &str {
        self.name
    }

    fn setup(&mut self) -> anyhow::Result<()> {
        self.log.lock().unwrap().push(self.name);
        Ok(())
    }

    fn step(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

fn loaded() -> FrameOrchestrator {
    let mut orchestrator = FrameOrchestrator::new(SchedulerConfig::default());
    orchestrator.on_load().unwrap();
    orchestrator
}

fn collector() -> (Arc<Mutex<Vec<CommandValue>>>, impl Fn() -> Vec<CommandValue>) {
    let results = Arc::new(Mutex::new(Vec::new()));
    let read = {
        let results = Arc::clone(&results);
        move || results.lock().unwrap().clone()
    };
    (results, read)
}

// ── Rendezvous ───────────────────────────────────────────────────────

#[test]
fn sync_counter_reaches_five_after_five_updates() {
    let mut orchestrator = loaded();
    let (worker, tally) = CounterWorker::new("counter");
    orchestrator
        .register_worker(worker, SchedulingPolicy::SyncService, 1.0)
        .unwrap();

    for _ in 0..5 {
        orchestrator.on_update(DT);
    }

    assert_eq!(tally.cycles.load(Ordering::SeqCst), 5);
    assert_eq!(orchestrator.stats().finish_waits, 5);
    assert_eq!(orchestrator.stats().update_ticks, 5);
}

#[test]
fn render_workers_only_cycle_on_render_ticks() {
    let mut orchestrator = loaded();
    let (update, update_tally) = CounterWorker::new("logic");
    let (render, render_tally) = CounterWorker::new("present");
    orchestrator
        .register_worker(update, SchedulingPolicy::SyncService, 1.0)
        .unwrap();
    orchestrator
        .register_worker(render, SchedulingPolicy::SyncRenderService, 1.0)
        .unwrap();

    for _ in 0..3 {
        orchestrator.on_update(DT);
    }
    assert_eq!(render_tally.cycles.load(Ordering::SeqCst), 0);

    orchestrator.on_render(DT);
    orchestrator.on_render(DT);

    assert_eq!(update_tally.cycles.load(Ordering::SeqCst), 3);
    assert_eq!(render_tally.cycles.load(Ordering::SeqCst), 2);
}

#[test]
fn several_sync_workers_share_one_barrier() {
    let mut orchestrator = loaded();
    let tallys: Vec<_> = ["a", "b", "c"]
        .into_iter()
        .map(|name| {
            let (worker, tally) = CounterWorker::new(name);
            orchestrator
                .register_worker(worker, SchedulingPolicy::SyncService, 0.5)
                .unwrap();
            tally
        })
        .collect();

    orchestrator.on_update(DT);
    orchestrator.on_update(DT);

    for tally in &tallys {
        assert_eq!(tally.cycles.load(Ordering::SeqCst), 2);
    }
    assert_eq!(orchestrator.stats().finish_waits, 6);
}

// ── Commands and callbacks ───────────────────────────────────────────

#[test]
fn add_command_delivers_five_exactly_once() {
    let mut orchestrator = loaded();
    let handle = orchestrator
        .register_worker(Calculator::default(), SchedulingPolicy::SyncService, 1.0)
        .unwrap();
    let (results, read) = collector();

    handle
        .call(CommandRecord::new("Add", vec![json!(2), json!(3)]), move |r| {
            assert!(r.success);
            results.lock().unwrap().push(r.payload);
        })
        .unwrap();

    orchestrator.on_update(DT);
    assert_eq!(read(), vec![json!(5)]);

    orchestrator.on_update(DT);
    assert_eq!(read(), vec![json!(5)]);
    assert_eq!(orchestrator.stats().callbacks_invoked, 1);
}

#[test]
fn callbacks_fire_in_enqueue_order() {
    let mut orchestrator = loaded();
    let handle = orchestrator
        .register_worker(Calculator::default(), SchedulingPolicy::SyncService, 1.0)
        .unwrap();
    let (results, read) = collector();

    for i in 0..20 {
        let results = Arc::clone(&results);
        handle
            .call(CommandRecord::new("Echo", vec![json!(i)]), move |r| {
                results.lock().unwrap().push(r.payload)
            })
            .unwrap();
    }

    orchestrator.on_update(DT);

    let expected: Vec<_> = (0..20).map(|i| json!(i)).collect();
    assert_eq!(read(), expected);
}

#[test]
fn finish_is_observed_after_the_whole_queue_drained() {
    let mut orchestrator = loaded();
    let handle = orchestrator
        .register_worker(Calculator::default(), SchedulingPolicy::SyncService, 1.0)
        .unwrap();
    let (results, read) = collector();

    for _ in 0..100 {
        let results = Arc::clone(&results);
        handle
            .call(CommandRecord::new("Accumulate", vec![json!(1)]), move |r| {
                results.lock().unwrap().push(r.payload)
            })
            .unwrap();
    }

    orchestrator.on_update(DT);

    let results = read();
    assert_eq!(results.len(), 100);
    assert_eq!(results.last(), Some(&json!(100)));
    assert_eq!(handle.status().queued, 0);
}

#[test]
fn failed_handler_drops_its_callback_and_the_worker_continues() {
    let mut orchestrator = loaded();
    let handle = orchestrator
        .register_worker(Calculator::default(), SchedulingPolicy::SyncService, 1.0)
        .unwrap();
    let (results, read) = collector();

    let failed = Arc::clone(&results);
    handle
        .call(CommandRecord::named("Fail"), move |r| {
            failed.lock().unwrap().push(r.payload)
        })
        .unwrap();
    // Missing arguments fail inside the handler too.
    handle.send(CommandRecord::named("Add")).unwrap();
    let ok = Arc::clone(&results);
    handle
        .call(CommandRecord::new("Add", vec![json!(1), json!(1)]), move |r| {
            ok.lock().unwrap().push(r.payload)
        })
        .unwrap();

    orchestrator.on_update(DT);

    assert_eq!(read(), vec![json!(2)]);
    assert_eq!(handle.status().failed_commands, 2);
    assert_eq!(handle.state(), WorkerState::Idle);
}

#[test]
fn unknown_methods_are_rejected_at_enqueue() {
    let mut orchestrator = loaded();
    let handle = orchestrator
        .register_worker(Calculator::default(), SchedulingPolicy::SyncService, 1.0)
        .unwrap();

    let err = handle.send(CommandRecord::named("Divide")).unwrap_err();
    assert_eq!(
        err,
        CommandError::UnknownMethod {
            worker: "calculator".into(),
            method: "Divide".into()
        }
    );
    assert_eq!(handle.status().queued, 0);
}

#[test]
fn panicking_callback_is_contained() {
    let mut orchestrator = loaded();
    let handle = orchestrator
        .register_worker(Calculator::default(), SchedulingPolicy::SyncService, 1.0)
        .unwrap();
    let (results, read) = collector();

    handle
        .call(CommandRecord::new("Echo", vec![json!("first")]), |_| {
            panic!("callback exploded")
        })
        .unwrap();
    handle
        .call(CommandRecord::new("Echo", vec![json!("second")]), move |r| {
            results.lock().unwrap().push(r.payload)
        })
        .unwrap();

    orchestrator.on_update(DT);

    assert_eq!(read(), vec![json!("second")]);
    assert_eq!(orchestrator.stats().callbacks_failed, 1);
    assert_eq!(orchestrator.stats().callbacks_invoked, 1);
}

#[test]
fn async_worker_delivers_without_blocking_ticks() {
    let mut orchestrator = loaded();
    let handle = orchestrator
        .register_worker(Calculator::default(), SchedulingPolicy::AsyncService, 1.0)
        .unwrap();
    let (results, read) = collector();

    handle
        .call(CommandRecord::new("Add", vec![json!(40), json!(2)]), move |r| {
            results.lock().unwrap().push(r.payload)
        })
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while read().is_empty() && Instant::now() < deadline {
        orchestrator.on_update(DT);
        std::thread::sleep(Duration::from_millis(2));
    }

    assert_eq!(read(), vec![json!(42)]);
    assert_eq!(orchestrator.stats().finish_waits, 0);
}

// ── Failure isolation ────────────────────────────────────────────────

#[test]
fn step_errors_and_panics_do_not_stop_the_worker() {
    let mut orchestrator = loaded();
    let handle = orchestrator
        .register_worker(Flaky::default(), SchedulingPolicy::SyncService, 1.0)
        .unwrap();

    for _ in 0..5 {
        orchestrator.on_update(DT);
    }

    let status = handle.status();
    assert_eq!(status.cycles, 5);
    // Cycles 2 and 4 fail, cycle 3 panics.
    assert_eq!(status.failed_steps, 3);
    assert_eq!(status.state, WorkerState::Idle);
}

#[test]
fn setup_failure_propagates_from_registration_after_load() {
    let mut orchestrator = loaded();

    let err = orchestrator
        .register_worker(BrokenSetup, SchedulingPolicy::SyncService, 1.0)
        .unwrap_err();

    assert!(matches!(err, ControlError::SetupFailed { ref name, .. } if name == "broken"));
    assert_eq!(orchestrator.worker_count(), 0);
}

#[test]
fn setup_failure_propagates_from_load() {
    let mut orchestrator = FrameOrchestrator::new(SchedulerConfig::default());
    orchestrator
        .register_worker(BrokenSetup, SchedulingPolicy::AsyncService, 1.0)
        .unwrap();

    let err = orchestrator.on_load().unwrap_err();

    assert!(matches!(err, ControlError::SetupFailed { .. }));
    assert!(!orchestrator.is_loaded());
}

#[test]
fn duplicate_command_names_fail_registration() {
    struct Twice;

    impl Worker for Twice {
        fn name(&self) -> &str {
            "twice"
        }

        fn step(&mut self) -> anyhow::Result<()> {
            Ok(())
        }

        fn register_commands(table: &mut CommandTable<Self>) -> Result<(), CommandError> {
            table
                .register("Go", |_: &mut Twice, _| Ok(json!(null)))?
                .register("Go", |_: &mut Twice, _| Ok(json!(null)))?;
            Ok(())
        }
    }

    let mut orchestrator = loaded();
    let err = orchestrator
        .register_worker(Twice, SchedulingPolicy::SyncService, 1.0)
        .unwrap_err();

    assert!(matches!(
        err,
        ControlError::CommandTable {
            source: CommandError::DuplicateMethod { .. },
            ..
        }
    ));
}

// ── Registration and lifecycle ───────────────────────────────────────

#[test]
fn registration_before_load_is_deferred() {
    let mut orchestrator = FrameOrchestrator::new(SchedulerConfig::default());
    let (worker, tally) = CounterWorker::new("deferred");
    let handle = orchestrator
        .register_worker(worker, SchedulingPolicy::SyncService, 1.0)
        .unwrap();

    assert!(!tally.set_up.load(Ordering::SeqCst));
    assert_eq!(handle.state(), WorkerState::Init);

    orchestrator.on_update(DT);
    assert_eq!(tally.cycles.load(Ordering::SeqCst), 0);

    orchestrator.on_load().unwrap();
    assert!(tally.set_up.load(Ordering::SeqCst));

    orchestrator.on_update(DT);
    assert_eq!(tally.cycles.load(Ordering::SeqCst), 1);
}

#[test]
fn registration_after_load_starts_immediately() {
    let mut orchestrator = loaded();
    let (worker, tally) = CounterWorker::new("immediate");
    orchestrator
        .register_worker(worker, SchedulingPolicy::SyncService, 1.0)
        .unwrap();

    assert!(tally.set_up.load(Ordering::SeqCst));
}

#[test]
fn deferred_setup_follows_priority_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut orchestrator = FrameOrchestrator::new(SchedulerConfig::default());
    for (name, priority) in [("low", 0.1), ("high", 0.9), ("mid", 0.5)] {
        orchestrator
            .register_worker(
                Ordered {
                    name,
                    log: Arc::clone(&log),
                },
                SchedulingPolicy::None,
                priority,
            )
            .unwrap();
    }

    orchestrator.on_load().unwrap();

    assert_eq!(*log.lock().unwrap(), ["high", "mid", "low"]);
}

#[test]
fn none_policy_runs_setup_inline_and_rejects_commands() {
    let mut orchestrator = loaded();
    let (worker, tally) = CounterWorker::new("inline");
    let handle = orchestrator
        .register_worker(worker, SchedulingPolicy::None, 1.0)
        .unwrap();

    assert!(tally.set_up.load(Ordering::SeqCst));
    orchestrator.on_update(DT);
    orchestrator.on_render(DT);
    assert_eq!(tally.cycles.load(Ordering::SeqCst), 0);

    let calc = orchestrator
        .register_worker(Calculator::default(), SchedulingPolicy::None, 1.0)
        .unwrap();
    assert!(matches!(
        calc.send(CommandRecord::new("Add", vec![json!(1), json!(2)])),
        Err(CommandError::NotAccepting { .. })
    ));

    orchestrator.shutdown();
    assert!(tally.torn_down.load(Ordering::SeqCst));
    assert_eq!(handle.state(), WorkerState::Closed);
}

#[test]
fn shutdown_closes_every_worker_after_teardown() {
    let mut orchestrator = loaded();
    let mut handles = Vec::new();
    let mut tallys = Vec::new();
    for (name, policy) in [
        ("sync", SchedulingPolicy::SyncService),
        ("render", SchedulingPolicy::SyncRenderService),
        ("async", SchedulingPolicy::AsyncService),
    ] {
        let (worker, tally) = CounterWorker::new(name);
        handles.push(orchestrator.register_worker(worker, policy, 1.0).unwrap());
        tallys.push(tally);
    }
    orchestrator.on_update(DT);
    orchestrator.on_render(DT);

    orchestrator.shutdown();

    for (handle, tally) in handles.iter().zip(&tallys) {
        assert_eq!(handle.state(), WorkerState::Closed, "{}", handle.name());
        assert!(tally.torn_down.load(Ordering::SeqCst));
    }
    assert!(orchestrator
        .statuses()
        .iter()
        .all(|s| s.state == WorkerState::Closed));

    let (late, _) = CounterWorker::new("late");
    assert!(matches!(
        orchestrator.register_worker(late, SchedulingPolicy::SyncService, 1.0),
        Err(ControlError::ShutDown)
    ));
}

#[test]
fn stopped_handle_leaves_the_barrier() {
    let mut orchestrator = loaded();
    let (worker, tally) = CounterWorker::new("quitter");
    let handle = orchestrator
        .register_worker(worker, SchedulingPolicy::SyncService, 1.0)
        .unwrap();

    orchestrator.on_update(DT);
    handle.stop();
    orchestrator.on_update(DT);
    orchestrator.on_update(DT);

    assert_eq!(tally.cycles.load(Ordering::SeqCst), 1);
    assert!(matches!(
        handle.send(CommandRecord::named("Anything")),
        Err(CommandError::NotAccepting { .. })
    ));

    orchestrator.shutdown();
    assert_eq!(handle.state(), WorkerState::Closed);
    assert!(tally.torn_down.load(Ordering::SeqCst));
}
