use std::fmt;

use hugo_formats::ActionRef;
use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

/// Largest pool the save format can address with `i16` slot indices.
pub const MAX_CAPACITY: usize = i16::MAX as usize;

/// Slot handle into the event pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EventId(u16);

impl EventId {
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    pub(crate) fn from_index(index: usize) -> Self {
        debug_assert!(index <= MAX_CAPACITY);
        EventId(index as u16)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Scene-local events are flushed on screen transitions; global ones persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventScope {
    Local,
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotState {
    Free,
    Acquired,
    Queued,
}

/// Pending activation of one action at an absolute tick.
#[derive(Debug, Clone)]
pub struct Event {
    pub(crate) action: Option<ActionRef>,
    pub(crate) scope: EventScope,
    pub(crate) time: u32,
    pub(crate) prev: Option<EventId>,
    pub(crate) next: Option<EventId>,
    pub(crate) state: SlotState,
}

impl Event {
    fn vacant(next: Option<EventId>) -> Self {
        Self {
            action: None,
            scope: EventScope::Local,
            time: 0,
            prev: None,
            next,
            state: SlotState::Free,
        }
    }

    pub fn action(&self) -> Option<ActionRef> {
        self.action
    }

    pub fn scope(&self) -> EventScope {
        self.scope
    }

    pub fn time(&self) -> u32 {
        self.time
    }

    pub fn is_queued(&self) -> bool {
        self.state == SlotState::Queued
    }

    pub fn is_free(&self) -> bool {
        self.state == SlotState::Free
    }
}

/// Fixed-capacity arena of event slots threaded by a free list.
#[derive(Debug, Clone)]
pub struct EventPool {
    slots: Vec<Event>,
    free: Option<EventId>,
    free_len: usize,
}

impl EventPool {
    pub fn new(capacity: usize) -> Result<Self, SchedulerError> {
        if capacity == 0 || capacity > MAX_CAPACITY {
            return Err(SchedulerError::InvalidCapacity(capacity));
        }
        let slots = (0..capacity)
            .map(|index| {
                let next = (index + 1 < capacity).then(|| EventId::from_index(index + 1));
                Event::vacant(next)
            })
            .collect();
        Ok(Self {
            slots,
            free: Some(EventId::from_index(0)),
            free_len: capacity,
        })
    }

    /// Rebuilds a pool from already validated slots.
    pub(crate) fn from_parts(slots: Vec<Event>, free: Option<EventId>, free_len: usize) -> Self {
        Self {
            slots,
            free,
            free_len,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn free_len(&self) -> usize {
        self.free_len
    }

    pub fn free_head(&self) -> Option<EventId> {
        self.free
    }

    /// Takes a slot off the free list. Running dry means the script content
    /// schedules more than the pool was sized for.
    pub fn acquire(&mut self) -> Result<EventId, SchedulerError> {
        let id = self.free.ok_or(SchedulerError::PoolExhausted {
            capacity: self.capacity(),
        })?;
        let slot = &mut self.slots[id.index()];
        self.free = slot.next.take();
        slot.prev = None;
        slot.state = SlotState::Acquired;
        self.free_len -= 1;
        log::trace!("acquired event {id} ({} free)", self.free_len);
        Ok(id)
    }

    /// Returns an acquired slot to the free list.
    pub fn release(&mut self, id: EventId) -> Result<(), SchedulerError> {
        let free = self.free;
        let slot = self.get_mut(id)?;
        match slot.state {
            SlotState::Free => return Err(SchedulerError::DoubleRelease(id)),
            SlotState::Queued => return Err(SchedulerError::StillQueued(id)),
            SlotState::Acquired => {}
        }
        *slot = Event::vacant(free);
        self.free = Some(id);
        self.free_len += 1;
        log::trace!("released event {id} ({} free)", self.free_len);
        Ok(())
    }

    pub fn get(&self, id: EventId) -> Result<&Event, SchedulerError> {
        self.slots
            .get(id.index())
            .ok_or(SchedulerError::UnknownEvent(id))
    }

    pub(crate) fn get_mut(&mut self, id: EventId) -> Result<&mut Event, SchedulerError> {
        self.slots
            .get_mut(id.index())
            .ok_or(SchedulerError::UnknownEvent(id))
    }

    pub(crate) fn slots(&self) -> &[Event] {
        &self.slots
    }

    /// Slot ids along the free list, head first.
    pub fn free_ids(&self) -> impl Iterator<Item = EventId> + '_ {
        std::iter::successors(self.free, move |id| self.slots[id.index()].next)
    }
}
