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

//! The bounded thread pool recording tasks run on.

use crate::error::DispatchError;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

/// A job's result, stamped when it was handed back.
#[derive(Debug)]
pub struct Completed<R> {
    /// Position in completion order, from 0 within one [`RecordingPool::run`].
    pub sequence: usize,
    /// When the result entered the result channel.
    pub finished_at: Instant,
    /// What the job returned.
    pub value: R,
}

/// A fixed-size pool of recording threads.
pub struct RecordingPool {
    pool: ThreadPool,
}

impl RecordingPool {
    /// Builds a pool of `threads` threads named `{prefix}-{index}`.
    pub fn new(threads: usize, prefix: &str) -> Result<Self, DispatchError> {
        let prefix = prefix.to_string();
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(move |index| format!("{prefix}-{index}"))
            .build()?;
        Ok(Self { pool })
    }

    /// The number of threads in the pool.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Runs every job on the pool and blocks until all of them returned.
    ///
    /// Results come back in completion order, not submission order. Each one
    /// is stamped as it enters the result channel, so sequence numbers and
    /// timestamps agree with the returned order.
    pub fn run<J, R>(&self, jobs: Vec<J>) -> Vec<Completed<R>>
    where
        J: FnOnce() -> R + Send,
        R: Send,
    {
        if jobs.is_empty() {
            return Vec::new();
        }

        let (tx, rx) = crossbeam_channel::unbounded();
        let next = Mutex::new(0usize);
        self.pool.scope(|scope| {
            for job in jobs {
                let tx = tx.clone();
                let next = &next;
                scope.spawn(move |_| {
                    let value = job();
                    let mut sequence = next.lock().unwrap_or_else(PoisonError::into_inner);
                    // The receiver outlives the scope.
                    let _ = tx.send(Completed {
                        sequence: *sequence,
                        finished_at: Instant::now(),
                        value,
                    });
                    *sequence += 1;
                });
            }
        });
        drop(tx);
        rx.try_iter().collect()
    }
}

impl std::fmt::Debug for RecordingPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingPool")
            .field("threads", &self.threads())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn results_arrive_in_completion_order() {
        let pool = RecordingPool::new(3, "test-record").unwrap();
        let jobs: Vec<_> = [30u64, 0, 15]
            .into_iter()
            .map(|delay| {
                move || {
                    std::thread::sleep(Duration::from_millis(delay * 4));
                    delay
                }
            })
            .collect();

        let done = pool.run(jobs);
        let values: Vec<_> = done.iter().map(|c| c.value).collect();
        assert_eq!(values, vec![0, 15, 30]);
        let sequences: Vec<_> = done.iter().map(|c| c.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
        assert!(done.windows(2).all(|w| w[0].finished_at <= w[1].finished_at));
    }

    #[test]
    fn stamps_follow_channel_order_under_contention() {
        let pool = RecordingPool::new(4, "test-record").unwrap();
        let jobs: Vec<_> = (0..64).map(|i| move || i).collect();

        let done = pool.run(jobs);
        assert_eq!(done.len(), 64);
        for (position, completed) in done.iter().enumerate() {
            assert_eq!(completed.sequence, position);
        }
        assert!(done.windows(2).all(|w| w[0].finished_at <= w[1].finished_at));
    }

    #[test]
    fn jobs_may_borrow_from_the_caller() {
        let pool = RecordingPool::new(2, "test-record").unwrap();
        let data = vec![1, 2, 3, 4];
        let jobs: Vec<_> = data.chunks(2).map(|c| move || c.iter().sum::<i32>()).collect();

        let mut sums: Vec<_> = pool.run(jobs).into_iter().map(|c| c.value).collect();
        sums.sort();
        assert_eq!(sums, vec![3, 7]);
        assert_eq!(pool.threads(), 2);
    }

    #[test]
    fn threads_carry_the_prefix() {
        let pool = RecordingPool::new(1, "named").unwrap();
        let names = pool.run(vec![|| std::thread::current().name().map(str::to_string)]);
        assert_eq!(names[0].value.as_deref(), Some("named-0"));
    }
}
