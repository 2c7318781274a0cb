//! The closed set of commands a simulation actor understands.

use lifegrid_grid::GridError;
use lifegrid_types::{Cell, Dimensions, Snapshot};
use tokio::sync::oneshot;

use crate::scheduler::TimerId;

/// A request applied to one simulation.
///
/// Numeric arguments are signed and unclamped: the actor pulls them into
/// range itself, so callers may pass anything a user typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Begin advancing on the timer.
    Start,
    /// Stop advancing.
    Stop,
    /// Timer wake produced by the timer with the given id.
    Tick(TimerId),
    /// Flip a single cell.
    ToggleCell {
        /// Row of the cell.
        row: u32,
        /// Column of the cell.
        col: u32,
    },
    /// Change the tick delay.
    SetSpeed {
        /// Requested delay in milliseconds.
        tick_ms: i64,
    },
    /// Change the grid size and reseed it randomly.
    Resize {
        /// Requested row count.
        rows: i64,
        /// Requested column count.
        cols: i64,
    },
    /// Evolve exactly one generation while stopped.
    Step,
    /// Replace the grid with a random one.
    Randomize,
    /// Kill every cell.
    Clear,
    /// Replace the grid with a catalog pattern.
    LoadPattern {
        /// Catalog key, e.g. `glider`.
        key: String,
    },
    /// Read the current state.
    GetState,
}

impl Command {
    /// Short name used in log fields.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Tick(_) => "tick",
            Self::ToggleCell { .. } => "toggle_cell",
            Self::SetSpeed { .. } => "set_speed",
            Self::Resize { .. } => "resize",
            Self::Step => "step",
            Self::Randomize => "randomize",
            Self::Clear => "clear",
            Self::LoadPattern { .. } => "load_pattern",
            Self::GetState => "get_state",
        }
    }
}

/// Why a command left the state untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// No catalog pattern has the requested key.
    #[error("pattern not found: {key}")]
    PatternNotFound {
        /// The key that was looked up.
        key: String,
    },

    /// A toggle targeted a cell outside the grid.
    #[error("cell {cell} is outside the {}x{} grid", .dims.rows, .dims.cols)]
    CellOutOfBounds {
        /// The requested cell.
        cell: Cell,
        /// The grid size at the time of the request.
        dims: Dimensions,
    },
}

impl From<GridError> for CommandError {
    fn from(err: GridError) -> Self {
        match err {
            GridError::PatternNotFound { key } => Self::PatternNotFound { key },
        }
    }
}

/// One-shot reply channel carried by a command.
pub(crate) type Reply = oneshot::Sender<Result<Snapshot, CommandError>>;

/// Inbox message of a simulation actor.
#[derive(Debug)]
pub(crate) enum Message {
    /// A command, with an optional reply channel. Timer wakes carry none.
    Command {
        /// The command to apply.
        command: Command,
        /// Where to send the resulting snapshot.
        reply: Option<Reply>,
    },
    /// Stop the actor loop.
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_error_converts() {
        let err: CommandError = GridError::PatternNotFound {
            key: "nope".to_owned(),
        }
        .into();
        assert_eq!(
            err,
            CommandError::PatternNotFound {
                key: "nope".to_owned()
            }
        );
    }

    #[test]
    fn out_of_bounds_message_names_the_grid() {
        let err = CommandError::CellOutOfBounds {
            cell: Cell::new(12, 3),
            dims: Dimensions::new(10, 10),
        };
        assert_eq!(err.to_string(), "cell (12, 3) is outside the 10x10 grid");
    }

    #[test]
    fn names_are_snake_case() {
        assert_eq!(Command::Tick(TimerId::new(3)).name(), "tick");
        assert_eq!(
            Command::LoadPattern {
                key: "glider".to_owned()
            }
            .name(),
            "load_pattern"
        );
    }
}
