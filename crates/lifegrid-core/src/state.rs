//! The simulation state machine.
//!
//! [`SimulationState`] applies one [`Command`] at a time through a single
//! exhaustive [`SimulationState::dispatch`]. It owns the grid and the one
//! armed timer, but not the scheduler or the randomness source: both are
//! passed in, so the machine runs the same under Tokio and under a manual
//! scheduler in tests.
//!
//! # States
//!
//! - **Idle** (`running == false`): no timer is armed.
//! - **Running**: exactly one timer is armed; each matching tick evolves
//!   the grid and re-arms.
//!
//! Resize, Randomize, Clear, and a successful `LoadPattern` always return
//! the machine to Idle and reset the generation to 0.

use std::time::Duration;

use lifegrid_grid::{Grid, place_pattern};
use lifegrid_types::{Cell, Dimensions, Snapshot};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::bounds::{clamp_dimensions, clamp_tick_ms};
use crate::command::{Command, CommandError};
use crate::scheduler::{TickHandle, TickScheduler, TimerId};

/// The last-known size and speed of a simulation.
///
/// The supervisor restarts a crashed actor from these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SimulationSettings {
    /// Number of rows.
    pub rows: u32,
    /// Number of columns.
    pub cols: u32,
    /// Delay between ticks, in milliseconds.
    pub tick_ms: u64,
}

impl SimulationSettings {
    /// Settings from raw user input, clamped into bounds.
    pub fn clamped(rows: i64, cols: i64, tick_ms: i64) -> Self {
        let dims = clamp_dimensions(rows, cols);
        Self {
            rows: dims.rows,
            cols: dims.cols,
            tick_ms: clamp_tick_ms(tick_ms),
        }
    }

    /// Grid size described by these settings.
    pub const fn dimensions(self) -> Dimensions {
        Dimensions::new(self.rows, self.cols)
    }
}

/// Result of applying one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// `Err` when the command was refused and the state left untouched.
    pub result: Result<(), CommandError>,
    /// Whether subscribers should receive a fresh snapshot.
    pub publish: bool,
}

impl Outcome {
    const fn changed() -> Self {
        Self {
            result: Ok(()),
            publish: true,
        }
    }

    const fn unchanged() -> Self {
        Self {
            result: Ok(()),
            publish: false,
        }
    }

    const fn rejected(err: CommandError) -> Self {
        Self {
            result: Err(err),
            publish: false,
        }
    }
}

/// State of one simulation.
#[derive(Debug)]
pub struct SimulationState {
    grid: Grid,
    dims: Dimensions,
    generation: u64,
    tick_ms: u64,
    running: bool,
    timer: Option<TickHandle>,
}

impl SimulationState {
    /// Idle state at generation 0. Cells outside `settings` are dropped.
    pub fn new(settings: SimulationSettings, grid: Grid) -> Self {
        let dims = settings.dimensions();
        let grid = if grid.fits_within(dims) {
            grid
        } else {
            grid.iter().copied().filter(|&cell| dims.contains(cell)).collect()
        };
        Self {
            grid,
            dims,
            generation: 0,
            tick_ms: settings.tick_ms,
            running: false,
            timer: None,
        }
    }

    /// Apply one command.
    pub fn dispatch<S, R>(&mut self, command: Command, scheduler: &mut S, rng: &mut R) -> Outcome
    where
        S: TickScheduler + ?Sized,
        R: Rng,
    {
        match command {
            Command::Start => {
                if self.running {
                    return Outcome::unchanged();
                }
                self.running = true;
                self.arm(scheduler);
                info!(generation = self.generation, tick_ms = self.tick_ms, "simulation started");
                Outcome::changed()
            }
            Command::Stop => {
                self.cancel_timer(scheduler);
                if self.running {
                    self.running = false;
                    info!(generation = self.generation, "simulation stopped");
                }
                Outcome::changed()
            }
            Command::Tick(id) => {
                if !self.running || self.armed_timer() != Some(id) {
                    debug!(timer = %id, running = self.running, "ignoring stale tick");
                    return Outcome::unchanged();
                }
                self.timer = None;
                self.advance();
                self.arm(scheduler);
                Outcome::changed()
            }
            Command::ToggleCell { row, col } => {
                let cell = Cell::new(row, col);
                if !self.dims.contains(cell) {
                    return Outcome::rejected(CommandError::CellOutOfBounds {
                        cell,
                        dims: self.dims,
                    });
                }
                self.grid.toggle_cell(cell);
                Outcome::changed()
            }
            Command::SetSpeed { tick_ms } => {
                self.tick_ms = clamp_tick_ms(tick_ms);
                if self.running {
                    self.cancel_timer(scheduler);
                    self.arm(scheduler);
                }
                Outcome::changed()
            }
            Command::Resize { rows, cols } => {
                self.dims = clamp_dimensions(rows, cols);
                let grid = Grid::random(self.dims, rng);
                self.reset(grid, scheduler, "resize");
                Outcome::changed()
            }
            Command::Step => {
                if self.running {
                    return Outcome::unchanged();
                }
                self.advance();
                Outcome::changed()
            }
            Command::Randomize => {
                let grid = Grid::random(self.dims, rng);
                self.reset(grid, scheduler, "randomize");
                Outcome::changed()
            }
            Command::Clear => {
                self.reset(Grid::empty(), scheduler, "clear");
                Outcome::changed()
            }
            Command::LoadPattern { key } => match place_pattern(&key, self.dims) {
                Ok(grid) => {
                    self.reset(grid, scheduler, "load_pattern");
                    Outcome::changed()
                }
                Err(err) => Outcome::rejected(err.into()),
            },
            Command::GetState => Outcome::unchanged(),
        }
    }

    /// Immutable copy of the current state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            rows: self.dims.rows,
            cols: self.dims.cols,
            generation: self.generation,
            tick_ms: self.tick_ms,
            running: self.running,
            alive_cells: self.grid.alive_cells(),
            alive_count: self.grid.alive_count(),
        }
    }

    /// Current size and speed.
    pub const fn settings(&self) -> SimulationSettings {
        SimulationSettings {
            rows: self.dims.rows,
            cols: self.dims.cols,
            tick_ms: self.tick_ms,
        }
    }

    /// Cancel the armed timer, if any.
    pub fn cancel_timer<S: TickScheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if let Some(handle) = self.timer.take() {
            scheduler.cancel(handle);
        }
    }

    /// Id of the armed timer.
    pub fn armed_timer(&self) -> Option<TimerId> {
        self.timer.as_ref().map(TickHandle::id)
    }

    /// The alive-cell set.
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Current grid size.
    pub const fn dimensions(&self) -> Dimensions {
        self.dims
    }

    /// Generations since the last reset.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the simulation is advancing on its own.
    pub const fn is_running(&self) -> bool {
        self.running
    }

    fn advance(&mut self) {
        self.grid = self.grid.evolve(self.dims);
        self.generation = self.generation.saturating_add(1);
    }

    fn arm<S: TickScheduler + ?Sized>(&mut self, scheduler: &mut S) {
        self.cancel_timer(scheduler);
        self.timer = Some(scheduler.schedule(Duration::from_millis(self.tick_ms)));
    }

    /// Replace the grid, zero the generation, and force Idle.
    fn reset<S: TickScheduler + ?Sized>(&mut self, grid: Grid, scheduler: &mut S, reason: &str) {
        self.cancel_timer(scheduler);
        if self.running {
            info!(reason, "simulation forced idle");
        }
        self.running = false;
        self.grid = grid;
        self.generation = 0;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::scheduler::ManualTickScheduler;

    struct Harness {
        state: SimulationState,
        scheduler: ManualTickScheduler,
        rng: StdRng,
    }

    impl Harness {
        fn new(rows: i64, cols: i64, tick_ms: i64) -> Self {
            let mut rng = StdRng::seed_from_u64(17);
            let settings = SimulationSettings::clamped(rows, cols, tick_ms);
            let grid = Grid::random(settings.dimensions(), &mut rng);
            Self {
                state: SimulationState::new(settings, grid),
                scheduler: ManualTickScheduler::new(),
                rng,
            }
        }

        fn apply(&mut self, command: Command) -> Outcome {
            let outcome = self
                .state
                .dispatch(command, &mut self.scheduler, &mut self.rng);
            assert!(self.scheduler.pending_count() <= 1, "more than one timer armed");
            assert_eq!(
                self.scheduler.pending_count(),
                usize::from(self.state.armed_timer().is_some())
            );
            assert!(self.state.grid().fits_within(self.state.dimensions()));
            outcome
        }

        /// Fire the pending timer and deliver its wake.
        fn tick(&mut self) -> Outcome {
            let id = self.scheduler.fire_next().unwrap();
            self.apply(Command::Tick(id))
        }
    }

    #[test]
    fn start_arms_one_timer_with_tick_delay() {
        let mut h = Harness::new(10, 10, 100);
        assert_eq!(h.apply(Command::Start), Outcome::changed());
        assert!(h.state.is_running());
        let id = h.state.armed_timer().unwrap();
        assert_eq!(h.scheduler.pending_delay(id), Some(Duration::from_millis(100)));
    }

    #[test]
    fn start_while_running_is_silent() {
        let mut h = Harness::new(10, 10, 100);
        h.apply(Command::Start);
        let armed = h.state.armed_timer();
        assert_eq!(h.apply(Command::Start), Outcome::unchanged());
        assert_eq!(h.state.armed_timer(), armed);
    }

    #[test]
    fn tick_evolves_and_rearms() {
        let mut h = Harness::new(10, 10, 100);
        let expected = h.state.grid().evolve(h.state.dimensions());
        h.apply(Command::Start);
        let first = h.state.armed_timer().unwrap();

        assert_eq!(h.tick(), Outcome::changed());
        assert_eq!(h.state.generation(), 1);
        assert_eq!(h.state.grid(), &expected);
        let second = h.state.armed_timer().unwrap();
        assert_ne!(first, second);

        h.tick();
        assert_eq!(h.state.generation(), 2);
    }

    #[test]
    fn stop_cancels_and_late_tick_is_ignored() {
        let mut h = Harness::new(10, 10, 100);
        h.apply(Command::Start);
        h.tick();
        let pending = h.state.armed_timer().unwrap();

        assert_eq!(h.apply(Command::Stop), Outcome::changed());
        assert!(!h.state.is_running());
        assert_eq!(h.scheduler.cancelled(), &[pending]);

        // The wake raced the cancellation and arrived anyway.
        let before = h.state.snapshot();
        assert_eq!(h.apply(Command::Tick(pending)), Outcome::unchanged());
        assert_eq!(h.state.snapshot(), before);
    }

    #[test]
    fn stop_while_idle_still_publishes() {
        let mut h = Harness::new(10, 10, 100);
        assert_eq!(h.apply(Command::Stop), Outcome::changed());
    }

    #[test]
    fn tick_from_replaced_timer_is_ignored() {
        let mut h = Harness::new(10, 10, 100);
        h.apply(Command::Start);
        let old = h.state.armed_timer().unwrap();

        h.apply(Command::SetSpeed { tick_ms: 300 });
        let new = h.state.armed_timer().unwrap();
        assert_ne!(old, new);
        assert_eq!(h.scheduler.pending_delay(new), Some(Duration::from_millis(300)));

        assert_eq!(h.apply(Command::Tick(old)), Outcome::unchanged());
        assert_eq!(h.state.generation(), 0);
        assert_eq!(h.state.armed_timer(), Some(new));
    }

    #[test]
    fn set_speed_clamps_and_keeps_idle_unarmed() {
        let mut h = Harness::new(10, 10, 100);
        assert_eq!(h.apply(Command::SetSpeed { tick_ms: -5 }), Outcome::changed());
        assert_eq!(h.state.settings().tick_ms, 50);
        h.apply(Command::SetSpeed { tick_ms: 0 });
        assert_eq!(h.state.settings().tick_ms, 50);
        h.apply(Command::SetSpeed { tick_ms: i64::MAX });
        assert_eq!(h.state.settings().tick_ms, 2_000);
        assert_eq!(h.state.armed_timer(), None);
    }

    #[test]
    fn toggle_keeps_generation_and_running() {
        let mut h = Harness::new(10, 10, 100);
        h.apply(Command::Start);
        h.tick();
        let before = h.state.grid().clone();

        assert_eq!(h.apply(Command::ToggleCell { row: 2, col: 3 }), Outcome::changed());
        assert_eq!(h.state.grid(), &before.toggled(Cell::new(2, 3)));
        assert_eq!(h.state.generation(), 1);
        assert!(h.state.is_running());
    }

    #[test]
    fn toggle_outside_grid_is_refused() {
        let mut h = Harness::new(10, 10, 100);
        let before = h.state.snapshot();
        let outcome = h.apply(Command::ToggleCell { row: 10, col: 0 });
        assert_eq!(
            outcome.result,
            Err(CommandError::CellOutOfBounds {
                cell: Cell::new(10, 0),
                dims: Dimensions::new(10, 10),
            })
        );
        assert!(!outcome.publish);
        assert_eq!(h.state.snapshot(), before);
    }

    #[test]
    fn resize_forces_idle_and_resets() {
        let mut h = Harness::new(10, 10, 100);
        h.apply(Command::Start);
        h.tick();

        assert_eq!(h.apply(Command::Resize { rows: 20, cols: 7 }), Outcome::changed());
        assert_eq!(h.state.dimensions(), Dimensions::new(20, 7));
        assert_eq!(h.state.generation(), 0);
        assert!(!h.state.is_running());
        assert_eq!(h.state.armed_timer(), None);
    }

    #[test]
    fn resize_clamps_extreme_input() {
        let mut h = Harness::new(10, 10, 100);
        h.apply(Command::Resize { rows: -3, cols: 0 });
        assert_eq!(h.state.dimensions(), Dimensions::new(5, 5));
        h.apply(Command::Resize {
            rows: i64::MAX,
            cols: 1_000,
        });
        assert_eq!(h.state.dimensions(), Dimensions::new(100, 100));
    }

    #[test]
    fn step_only_advances_while_idle() {
        let mut h = Harness::new(10, 10, 100);
        assert_eq!(h.apply(Command::Step), Outcome::changed());
        assert_eq!(h.state.generation(), 1);
        assert!(!h.state.is_running());
        assert_eq!(h.state.armed_timer(), None);

        h.apply(Command::Start);
        assert_eq!(h.apply(Command::Step), Outcome::unchanged());
        assert_eq!(h.state.generation(), 1);
    }

    #[test]
    fn randomize_forces_idle_and_resets() {
        let mut h = Harness::new(10, 10, 100);
        h.apply(Command::Start);
        h.tick();
        assert_eq!(h.apply(Command::Randomize), Outcome::changed());
        assert_eq!(h.state.generation(), 0);
        assert!(!h.state.is_running());
        assert!(!h.state.grid().is_empty());
    }

    #[test]
    fn clear_empties_grid() {
        let mut h = Harness::new(10, 10, 100);
        h.apply(Command::Start);
        assert_eq!(h.apply(Command::Clear), Outcome::changed());
        let snapshot = h.state.snapshot();
        assert_eq!(snapshot.alive_count, 0);
        assert!(snapshot.alive_cells.is_empty());
        assert_eq!(snapshot.generation, 0);
        assert!(!snapshot.running);
    }

    #[test]
    fn load_pattern_replaces_grid() {
        let mut h = Harness::new(10, 10, 100);
        h.apply(Command::Start);
        h.tick();
        let outcome = h.apply(Command::LoadPattern {
            key: "blinker".to_owned(),
        });
        assert_eq!(outcome, Outcome::changed());
        assert_eq!(
            h.state.grid().alive_cells(),
            vec![Cell::new(4, 3), Cell::new(4, 4), Cell::new(4, 5)]
        );
        assert_eq!(h.state.generation(), 0);
        assert!(!h.state.is_running());
    }

    #[test]
    fn unknown_pattern_leaves_state_untouched() {
        let mut h = Harness::new(10, 10, 100);
        h.apply(Command::Start);
        h.tick();
        let before = h.state.snapshot();
        let armed = h.state.armed_timer();

        let outcome = h.apply(Command::LoadPattern {
            key: "nonexistent".to_owned(),
        });
        assert_eq!(
            outcome.result,
            Err(CommandError::PatternNotFound {
                key: "nonexistent".to_owned()
            })
        );
        assert!(!outcome.publish);
        assert_eq!(h.state.snapshot(), before);
        assert_eq!(h.state.armed_timer(), armed);
    }

    #[test]
    fn get_state_is_read_only() {
        let mut h = Harness::new(10, 10, 100);
        let before = h.state.snapshot();
        assert_eq!(h.apply(Command::GetState), Outcome::unchanged());
        assert_eq!(h.state.snapshot(), before);
    }

    #[test]
    fn snapshot_is_sorted_and_counted() {
        let h = Harness::new(12, 9, 100);
        let snapshot = h.state.snapshot();
        assert_eq!(snapshot.alive_count, snapshot.alive_cells.len());
        assert!(snapshot.alive_cells.is_sorted());
        assert_eq!(snapshot.dimensions(), Dimensions::new(12, 9));
    }

    #[test]
    fn new_drops_cells_outside_bounds() {
        let settings = SimulationSettings::clamped(5, 5, 100);
        let grid = Grid::from_cells([Cell::new(1, 1), Cell::new(7, 2)]);
        let state = SimulationState::new(settings, grid);
        assert_eq!(state.grid().alive_cells(), vec![Cell::new(1, 1)]);
    }

    #[test]
    fn settings_clamp_all_fields() {
        let settings = SimulationSettings::clamped(0, 500, 10);
        assert_eq!(
            settings,
            SimulationSettings {
                rows: 5,
                cols: 100,
                tick_ms: 50
            }
        );
    }
}
