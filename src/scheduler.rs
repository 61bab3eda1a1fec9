//! Timer/scheduler engine.
//!
//! The scheduler counts loop ticks and notifies a [`SchedulerDelegate`]
//! when a schedule falls due; the controller implements the delegate side
//! and runs the sample or report work.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │   main loop tick (tick_interval_ms)                          │
//! │          │                                                   │
//! │          ▼                                                   │
//! │   Scheduler.tick() ──▶ SchedulerDelegate.on_schedule_fired() │
//! │                               │                              │
//! │                 ┌─────────────┴────────────┐                 │
//! │                 ▼                          ▼                 │
//! │          Sample cycle               Report / publish         │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use crate::app::ports::{ScheduledTask, SchedulerDelegate};
use log::info;

// ═══════════════════════════════════════════════════════════════
//  Schedule types
// ═══════════════════════════════════════════════════════════════

/// A single schedule entry.
#[derive(Debug, Clone)]
pub struct Schedule {
    /// Human-readable label (e.g., "sample").
    pub label: &'static str,
    /// What firing triggers.
    pub task: ScheduledTask,
    /// Type of schedule.
    pub kind: ScheduleKind,
    /// Whether this schedule is currently enabled.
    pub enabled: bool,
}

/// The type of schedule determines how and when it fires.
#[derive(Debug, Clone, Copy)]
pub enum ScheduleKind {
    /// Fire every `interval_ms`.
    Periodic { interval_ms: u32 },
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Maximum number of concurrent schedules (stack-allocated).
const MAX_SCHEDULES: usize = 4;

/// The scheduler engine.
///
/// Decoupled from the controller: firing invokes the
/// [`SchedulerDelegate`] callback rather than running work directly.
pub struct Scheduler {
    schedules: [Option<ScheduleEntry>; MAX_SCHEDULES],
    /// Global enable flag.
    enabled: bool,
}

/// Internal bookkeeping for a live schedule.
#[derive(Debug, Clone)]
struct ScheduleEntry {
    schedule: Schedule,
    /// Milliseconds accumulated since last fire (or since added).
    elapsed_ms: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            schedules: [None, None, None, None],
            enabled: true,
        }
    }

    /// Add a schedule.  Returns the slot index, or `None` if full.
    pub fn add(&mut self, schedule: Schedule) -> Option<usize> {
        for (i, slot) in self.schedules.iter_mut().enumerate() {
            if slot.is_none() {
                info!("Scheduler: added '{}' at slot {}", schedule.label, i);
                *slot = Some(ScheduleEntry {
                    schedule,
                    elapsed_ms: 0,
                });
                return Some(i);
            }
        }
        None // All slots full.
    }

    /// Remove a schedule by slot index.
    pub fn remove(&mut self, slot: usize) {
        if slot < MAX_SCHEDULES {
            if let Some(entry) = &self.schedules[slot] {
                info!("Scheduler: removed '{}' from slot {}", entry.schedule.label, slot);
            }
            self.schedules[slot] = None;
        }
    }

    /// Enable or disable one schedule.  The interval restarts when it is
    /// re-enabled.
    pub fn set_schedule_enabled(&mut self, slot: usize, enabled: bool) {
        if let Some(Some(entry)) = self.schedules.get_mut(slot) {
            entry.schedule.enabled = enabled;
            entry.elapsed_ms = 0;
        }
    }

    /// Enable or disable the entire scheduler.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Advance every schedule by `tick_ms`.  Call once per loop tick.
    ///
    /// When a schedule fires, `delegate.on_schedule_fired()` is called
    /// with the schedule label and its task.
    pub fn tick(&mut self, tick_ms: u32, delegate: &mut dyn SchedulerDelegate) {
        if !self.enabled {
            return;
        }

        for entry in self.schedules.iter_mut().flatten() {
            if !entry.schedule.enabled {
                continue;
            }
            entry.elapsed_ms += u64::from(tick_ms);

            match entry.schedule.kind {
                ScheduleKind::Periodic { interval_ms } => {
                    if entry.elapsed_ms >= u64::from(interval_ms) {
                        delegate.on_schedule_fired(entry.schedule.label, entry.schedule.task);
                        entry.elapsed_ms = 0;
                    }
                }
            }
        }
    }

    /// Number of active (enabled) schedules.
    pub fn active_count(&self) -> usize {
        self.schedules
            .iter()
            .flatten()
            .filter(|e| e.schedule.enabled)
            .count()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
