//! Tick sources for the scheduler.
//!
//! DOS releases derive ticks from wall-clock time but never advance by more
//! than one tick per poll, so a slow frame simply stretches game time. The
//! Windows release counts scheduler passes instead. `Manual` leaves the
//! counter entirely to the host.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickSource {
    Dos,
    Frame,
    Manual,
}

/// Millisecond wall clock consulted by the DOS tick source.
pub trait MillisSource: fmt::Debug {
    fn millis(&mut self) -> u64;
}

#[derive(Debug)]
pub struct WallMillis {
    start: Instant,
}

impl WallMillis {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for WallMillis {
    fn default() -> Self {
        Self::new()
    }
}

impl MillisSource for WallMillis {
    fn millis(&mut self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

#[derive(Debug)]
pub struct Clock {
    source: TickSource,
    ticks_per_second: u32,
    tick: u32,
    wall: Box<dyn MillisSource>,
    last_wall_tick: Option<u64>,
    refresh_deadline: Option<u32>,
}

impl Clock {
    pub fn new(source: TickSource, ticks_per_second: u32) -> Self {
        Self::with_millis(source, ticks_per_second, Box::new(WallMillis::new()))
    }

    pub fn with_millis(
        source: TickSource,
        ticks_per_second: u32,
        wall: Box<dyn MillisSource>,
    ) -> Self {
        Self {
            source,
            ticks_per_second: ticks_per_second.max(1),
            tick: 0,
            wall,
            last_wall_tick: None,
            refresh_deadline: None,
        }
    }

    /// Host-driven clock starting at `start`.
    pub fn manual(start: u32) -> Self {
        let mut clock = Self::new(TickSource::Manual, 1);
        clock.tick = start;
        clock
    }

    pub fn source(&self) -> TickSource {
        self.source
    }

    pub fn ticks_per_second(&self) -> u32 {
        self.ticks_per_second
    }

    /// Last known tick; never polls the wall clock.
    pub fn now(&self) -> u32 {
        self.tick
    }

    /// Polls the wall clock (DOS source only) and returns the current tick.
    pub fn update(&mut self) -> u32 {
        if self.source == TickSource::Dos {
            let wall_tick = self.wall.millis() * u64::from(self.ticks_per_second) / 1000;
            let last = *self.last_wall_tick.get_or_insert(wall_tick);
            if wall_tick != last {
                self.last_wall_tick = Some(wall_tick);
                self.tick = self.tick.wrapping_add(1);
            }
        }
        self.tick
    }

    /// Called once after every scheduler pass.
    pub fn end_of_pass(&mut self) {
        if self.source == TickSource::Frame {
            self.tick = self.tick.wrapping_add(1);
        }
    }

    pub fn advance(&mut self, ticks: u32) {
        self.tick = self.tick.wrapping_add(ticks);
    }

    pub fn set(&mut self, tick: u32) {
        self.tick = tick;
    }

    /// Spins until the next tick boundary. Frames that overrun simply carry
    /// on without waiting. Only meaningful for the DOS source.
    pub fn wait_for_refresh(&mut self) {
        if self.source != TickSource::Dos {
            return;
        }
        let deadline = match self.refresh_deadline {
            Some(deadline) => deadline,
            None => self.update(),
        };
        let mut now = self.update();
        while now < deadline {
            std::hint::spin_loop();
            now = self.update();
        }
        self.refresh_deadline = Some(now.wrapping_add(1));
    }
}
