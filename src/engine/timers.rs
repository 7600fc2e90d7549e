//! Delayed callbacks
//!
//! The engine schedules ship respawns and level transitions here instead of
//! on the host's timer queue. Timers count down by frame delta, so they
//! freeze with the simulation. Clearing bumps a generation counter; a fired
//! timer carries the generation it was scheduled under and is ignored if the
//! counter has moved on.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Respawn,
    LevelTransition,
}

/// A timer that has elapsed this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub kind: TimerKind,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    kind: TimerKind,
    remaining_ms: f32,
    generation: u64,
}

#[derive(Debug, Clone, Default)]
pub struct Timers {
    pending: Vec<Pending>,
    generation: u64,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `kind` to fire after `delay_ms`, replacing any pending one
    pub fn schedule(&mut self, kind: TimerKind, delay_ms: f32) {
        self.cancel(kind);
        self.pending.push(Pending {
            kind,
            remaining_ms: delay_ms.max(0.0),
            generation: self.generation,
        });
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        self.pending.retain(|p| p.kind != kind);
    }

    /// Drop everything and invalidate timers already handed out
    pub fn clear(&mut self) {
        self.pending.clear();
        self.generation += 1;
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.pending.iter().any(|p| p.kind == kind)
    }

    pub fn is_current(&self, fired: Fired) -> bool {
        fired.generation == self.generation
    }

    /// Count down and return the timers that elapsed, in schedule order
    pub fn advance(&mut self, dt_ms: f32) -> Vec<Fired> {
        let mut fired = Vec::new();
        for p in &mut self.pending {
            p.remaining_ms -= dt_ms.max(0.0);
            if p.remaining_ms <= 0.0 {
                fired.push(Fired {
                    kind: p.kind,
                    generation: p.generation,
                });
            }
        }
        self.pending.retain(|p| p.remaining_ms > 0.0);
        fired
    }
}
