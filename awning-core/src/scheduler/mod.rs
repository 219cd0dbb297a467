//! Fixed-table cooperative task scheduler.
//!
//! The scheduler owns a compile-time-sized table of periodic and one-shot
//! tasks. A hardware tick source advances time through [`Scheduler::tick`];
//! the run loop drains due tasks through [`Scheduler::dispatch`]. Actions are
//! plain function pointers over a caller-provided context, so the same table
//! drives the MCU control loop, the host emulator, and the test suites.
//!
//! `tick` belongs to the tick interrupt's context and only touches counters
//! and run-flags; `dispatch` belongs to the ordinary run loop and is the only
//! place task logic executes. The integration layer is responsible for
//! serializing access between the two (the firmware counts pending ticks in
//! an atomic and drains them from the control task).

use core::fmt;

/// Tick counts used for task delays and periods.
pub type Ticks = u32;

/// Action dispatched when a task comes due.
///
/// Actions receive the shared context plus the scheduler itself, so a task
/// can arm a one-shot follow-up (the ranging flow relies on this).
pub type TaskFn<C, const N: usize> = fn(&mut C, &mut Scheduler<C, N>);

/// Handle returned on registration, naming the slot the task occupies.
pub type TaskId = usize;

/// Errors reported by [`Scheduler::add_task`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SchedulerError {
    /// Every slot in the task table is occupied.
    CapacityExhausted,
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerError::CapacityExhausted => f.write_str("task table at capacity"),
        }
    }
}

struct Task<C, const N: usize> {
    action: TaskFn<C, N>,
    /// Ticks remaining until the next run.
    delay: Ticks,
    /// Repeat interval; 0 marks a one-shot task.
    period: Ticks,
    /// Set by `tick`, cleared by `dispatch`. Always assigned, never
    /// accumulated, so the tick context writes exactly one flag value.
    run: bool,
}

/// Cooperative scheduler over a fixed table of `N` slots.
pub struct Scheduler<C, const N: usize> {
    slots: [Option<Task<C, N>>; N],
    started: bool,
}

impl<C, const N: usize> Scheduler<C, N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [const { None }; N],
            started: false,
        }
    }

    /// Registers `action` into the first empty slot.
    ///
    /// `delay` is the number of ticks before the first run; `period` is the
    /// repeat interval, with 0 marking a one-shot task whose slot is released
    /// after it fires.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::CapacityExhausted`] when the table is full;
    /// no existing registration is disturbed.
    pub fn add_task(
        &mut self,
        action: TaskFn<C, N>,
        delay: Ticks,
        period: Ticks,
    ) -> Result<TaskId, SchedulerError> {
        let slot = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(SchedulerError::CapacityExhausted)?;
        self.slots[slot] = Some(Task {
            action,
            delay,
            period,
            run: false,
        });
        Ok(slot)
    }

    /// Arms the scheduler. Until this is called, [`Scheduler::tick`] is inert
    /// and no task runs regardless of registration.
    pub fn start(&mut self) {
        self.started = true;
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn active_tasks(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Advances time by one tick: every active task's delay counter moves
    /// toward zero, and tasks that reach it have their run-flag set. Periodic
    /// tasks reload their delay from the period; one-shot tasks stay due
    /// until the next dispatch pass releases them.
    pub fn tick(&mut self) {
        if !self.started {
            return;
        }
        for task in self.slots.iter_mut().flatten() {
            if task.delay > 0 {
                task.delay -= 1;
            }
            if task.delay == 0 {
                task.run = true;
                if task.period > 0 {
                    task.delay = task.period;
                }
            }
        }
    }

    /// Runs every task whose run-flag is set, in slot order.
    ///
    /// The flag is cleared before the action executes, so a due task runs at
    /// most once per tick; a one-shot slot is released as soon as its action
    /// returns. Actions run to completion before the scan moves on.
    pub fn dispatch(&mut self, ctx: &mut C) {
        for index in 0..N {
            let Some(task) = self.slots[index].as_mut() else {
                continue;
            };
            if !task.run {
                continue;
            }
            task.run = false;
            let one_shot = task.period == 0;
            let action = task.action;
            action(ctx, self);
            if one_shot {
                self.slots[index] = None;
            }
        }
    }
}

impl<C, const N: usize> Default for Scheduler<C, N> {
    fn default() -> Self {
        Self::new()
    }
}
