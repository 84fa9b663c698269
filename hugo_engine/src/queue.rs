use hugo_formats::ActionRef;

use crate::error::SchedulerError;
use crate::pool::{Event, EventId, EventPool, EventScope, SlotState};

/// Time-ordered doubly linked list of events drawn from an [`EventPool`].
///
/// Head holds the earliest deadline. Events with equal times keep their
/// insertion order.
#[derive(Debug, Clone)]
pub struct EventQueue {
    pool: EventPool,
    head: Option<EventId>,
    tail: Option<EventId>,
    len: usize,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Result<Self, SchedulerError> {
        Ok(Self {
            pool: EventPool::new(capacity)?,
            head: None,
            tail: None,
            len: 0,
        })
    }

    pub(crate) fn from_parts(
        pool: EventPool,
        head: Option<EventId>,
        tail: Option<EventId>,
        len: usize,
    ) -> Self {
        Self {
            pool,
            head,
            tail,
            len,
        }
    }

    /// Empties the queue and refills the free list.
    pub fn reset(&mut self) -> Result<(), SchedulerError> {
        *self = Self::new(self.capacity())?;
        Ok(())
    }

    pub fn pool(&self) -> &EventPool {
        &self.pool
    }

    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn free_len(&self) -> usize {
        self.pool.free_len()
    }

    pub fn head(&self) -> Option<EventId> {
        self.head
    }

    pub fn tail(&self) -> Option<EventId> {
        self.tail
    }

    pub fn event(&self, id: EventId) -> Result<&Event, SchedulerError> {
        self.pool.get(id)
    }

    pub fn is_queued(&self, id: EventId) -> bool {
        self.pool.get(id).map(Event::is_queued).unwrap_or(false)
    }

    pub fn next(&self, id: EventId) -> Option<EventId> {
        self.pool.get(id).ok().filter(|e| e.is_queued())?.next
    }

    pub fn prev(&self, id: EventId) -> Option<EventId> {
        self.pool.get(id).ok().filter(|e| e.is_queued())?.prev
    }

    pub fn acquire(&mut self) -> Result<EventId, SchedulerError> {
        self.pool.acquire()
    }

    pub fn release(&mut self, id: EventId) -> Result<(), SchedulerError> {
        self.pool.release(id)
    }

    /// Acquires a slot, fills it and inserts it at `time`.
    pub fn schedule(
        &mut self,
        action: ActionRef,
        scope: EventScope,
        time: u32,
    ) -> Result<EventId, SchedulerError> {
        let id = self.pool.acquire()?;
        {
            let event = self.pool.get_mut(id)?;
            event.action = Some(action);
            event.scope = scope;
        }
        self.insert(id, time)?;
        Ok(id)
    }

    /// Splices an acquired event into time order.
    ///
    /// The scan starts at the tail since most deadlines are near-future: it
    /// walks toward the head until it meets an event due no later than
    /// `time` and links the new event right after it.
    pub fn insert(&mut self, id: EventId, time: u32) -> Result<(), SchedulerError> {
        if self.pool.get(id)?.state != SlotState::Acquired {
            return Err(SchedulerError::NotAcquired(id));
        }

        let mut cursor = self.tail;
        while let Some(current) = cursor {
            let event = self.pool.get(current)?;
            if event.time <= time {
                break;
            }
            cursor = event.prev;
        }

        let next = match cursor {
            Some(after) => self.pool.get(after)?.next,
            None => self.head,
        };

        {
            let event = self.pool.get_mut(id)?;
            event.time = time;
            event.prev = cursor;
            event.next = next;
            event.state = SlotState::Queued;
        }
        match cursor {
            Some(after) => self.pool.get_mut(after)?.next = Some(id),
            None => self.head = Some(id),
        }
        match next {
            Some(before) => self.pool.get_mut(before)?.prev = Some(id),
            None => self.tail = Some(id),
        }
        self.len += 1;
        Ok(())
    }

    /// Unlinks a queued event from any position and frees its slot.
    pub fn remove(&mut self, id: EventId) -> Result<(), SchedulerError> {
        let (prev, next) = {
            let event = self.pool.get_mut(id)?;
            if event.state != SlotState::Queued {
                return Err(SchedulerError::NotQueued(id));
            }
            event.state = SlotState::Acquired;
            (event.prev.take(), event.next.take())
        };
        match prev {
            Some(prev) => self.pool.get_mut(prev)?.next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.pool.get_mut(next)?.prev = prev,
            None => self.tail = prev,
        }
        self.len -= 1;
        self.pool.release(id)
    }

    /// Removes every queued event matching `predicate`, keeping the rest in
    /// place. Returns how many were removed.
    pub fn remove_where<F>(&mut self, mut predicate: F) -> Result<usize, SchedulerError>
    where
        F: FnMut(&Event) -> bool,
    {
        let mut removed = 0;
        let mut cursor = self.head;
        while let Some(id) = cursor {
            let event = self.pool.get(id)?;
            cursor = event.next;
            if predicate(event) {
                self.remove(id)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Queued event ids from head to tail.
    pub fn ids(&self) -> impl Iterator<Item = EventId> + '_ {
        std::iter::successors(self.head, move |id| self.next(*id))
    }

    /// Queued events from head to tail.
    pub fn iter(&self) -> impl Iterator<Item = (EventId, &Event)> + '_ {
        self.ids()
            .filter_map(move |id| self.pool.get(id).ok().map(|event| (id, event)))
    }

    /// Walks both directions and checks ordering and slot accounting.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut forward = Vec::new();
        let mut prev: Option<EventId> = None;
        let mut last_time: Option<u32> = None;
        let mut cursor = self.head;
        while let Some(id) = cursor {
            if forward.len() > self.capacity() {
                return Err("queue forward walk loops".to_string());
            }
            let event = self.pool.get(id).map_err(|err| err.to_string())?;
            if !event.is_queued() {
                return Err(format!("event {id} linked into the queue but not queued"));
            }
            if event.prev != prev {
                return Err(format!("event {id} has a stale prev link"));
            }
            if last_time.is_some_and(|t| t > event.time) {
                return Err(format!("event {id} is earlier than its predecessor"));
            }
            last_time = Some(event.time);
            forward.push(id);
            prev = Some(id);
            cursor = event.next;
        }
        if prev != self.tail {
            return Err("tail does not terminate the forward walk".to_string());
        }

        let mut backward = Vec::new();
        let mut cursor = self.tail;
        while let Some(id) = cursor {
            if backward.len() > self.capacity() {
                return Err("queue backward walk loops".to_string());
            }
            backward.push(id);
            cursor = self.pool.get(id).map_err(|err| err.to_string())?.prev;
        }
        backward.reverse();
        if backward != forward {
            return Err("forward and backward walks disagree".to_string());
        }
        if forward.len() != self.len {
            return Err(format!(
                "queue length {} but {} events reachable",
                self.len,
                forward.len()
            ));
        }

        let mut free = 0;
        for id in self.pool.free_ids() {
            if free > self.capacity() {
                return Err("free list loops".to_string());
            }
            let event = self.pool.get(id).map_err(|err| err.to_string())?;
            if !event.is_free() {
                return Err(format!("event {id} on the free list is in use"));
            }
            free += 1;
        }
        if free != self.pool.free_len() {
            return Err("free list length out of sync".to_string());
        }
        let acquired = self
            .pool
            .slots()
            .iter()
            .filter(|slot| slot.state == SlotState::Acquired)
            .count();
        if forward.len() + free + acquired != self.capacity() {
            return Err(format!(
                "{} queued + {} free + {} acquired != capacity {}",
                forward.len(),
                free,
                acquired,
                self.capacity()
            ));
        }
        Ok(())
    }
}
