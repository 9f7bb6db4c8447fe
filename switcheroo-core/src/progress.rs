//! Host progress hook for long AI searches.

use crate::{Board, Player};

/// Win checks between two progress ticks.
pub const PROGRESS_CALLBACK_FREQUENCY: u32 = 3;

/// Receives periodic ticks while the AI is searching.
///
/// Implemented for any `FnMut()` closure.
pub trait Progress {
    fn tick(&mut self);
}

impl<F: FnMut()> Progress for F {
    fn tick(&mut self) {
        self()
    }
}

/// Progress sink that ignores every tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct Silent;

impl Progress for Silent {
    fn tick(&mut self) {}
}

/// Win-check front end used by the AI; counts checks and ticks the sink.
pub(crate) struct Probe<'a> {
    sink: &'a mut dyn Progress,
    pending: u32,
    pub(crate) win_checks: u64,
}

impl<'a> Probe<'a> {
    pub(crate) fn new(sink: &'a mut dyn Progress) -> Probe<'a> {
        Probe { sink, pending: 0, win_checks: 0 }
    }

    #[inline]
    pub(crate) fn has_won(&mut self, board: &Board, player: Player) -> bool {
        self.win_checks += 1;
        self.pending += 1;
        if self.pending >= PROGRESS_CALLBACK_FREQUENCY {
            self.pending = 0;
            self.sink.tick();
        }
        board.has_won(player)
    }
}
