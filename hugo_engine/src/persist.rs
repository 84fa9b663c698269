//! Save-game codec for the event queue and the mutable action payloads.
//!
//! Layout (big-endian): `save_tick:u32`, `free:i16`, `head:i16`, `tail:i16`,
//! one record per pool slot (`action:i32`, `time:u32`, `scope:u8`,
//! `prev:i16`, `next:i16`), then every action of every list including its
//! sentinel in script record form. Slot links are indices, `-1` for none.

use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use hugo_formats::{read_record, write_record, ActionKind, ActionRef, FormatError};

use crate::error::SchedulerError;
use crate::pool::{Event, EventId, EventPool, EventScope, SlotState};
use crate::queue::EventQueue;
use crate::scheduler::Scheduler;

const SCOPE_GLOBAL: u8 = 0;
const SCOPE_LOCAL: u8 = 1;

fn encode_index(id: Option<EventId>) -> i16 {
    id.map_or(-1, |id| id.index() as i16)
}

fn decode_index(raw: i16, capacity: usize, what: &str) -> Result<Option<EventId>, SchedulerError> {
    match raw {
        -1 => Ok(None),
        index if index >= 0 && (index as usize) < capacity => {
            Ok(Some(EventId::from_index(index as usize)))
        }
        _ => Err(SchedulerError::CorruptSave(format!(
            "{what} index {raw} outside pool of {capacity}"
        ))),
    }
}

fn corrupt(message: impl Into<String>) -> SchedulerError {
    SchedulerError::CorruptSave(message.into())
}

/// Short reads surface as I/O failures, everything else as bad data.
fn format_error(err: FormatError) -> SchedulerError {
    match err {
        FormatError::Io(err) => SchedulerError::Io(err),
        other => SchedulerError::Format(other),
    }
}

struct SlotRecord {
    action: Option<ActionRef>,
    time: u32,
    scope: EventScope,
    prev: Option<EventId>,
    next: Option<EventId>,
}

impl Scheduler {
    /// Writes the event section: save tick, cursors and every pool slot.
    pub fn save_events<W: Write>(&self, writer: &mut W) -> Result<(), SchedulerError> {
        let pool = self.queue.pool();
        for (index, event) in pool.slots().iter().enumerate() {
            let id = EventId::from_index(index);
            if event.state == SlotState::Acquired {
                return Err(SchedulerError::Unsettled(id));
            }
            if let Some(reference) = event.action.filter(|_| event.is_queued()) {
                if self.table.get(reference).is_none() {
                    return Err(SchedulerError::MissingAction(reference));
                }
            }
        }

        writer.write_u32::<BigEndian>(self.clock.now())?;
        writer.write_i16::<BigEndian>(encode_index(pool.free_head()))?;
        writer.write_i16::<BigEndian>(encode_index(self.queue.head()))?;
        writer.write_i16::<BigEndian>(encode_index(self.queue.tail()))?;

        for event in pool.slots() {
            let queued = event.is_queued();
            let action = if queued { event.action } else { None };
            writer.write_i32::<BigEndian>(ActionRef::encode_optional(action))?;
            writer.write_u32::<BigEndian>(if queued { event.time } else { 0 })?;
            writer.write_u8(match event.scope {
                EventScope::Global if queued => SCOPE_GLOBAL,
                _ => SCOPE_LOCAL,
            })?;
            writer.write_i16::<BigEndian>(if queued { encode_index(event.prev) } else { -1 })?;
            writer.write_i16::<BigEndian>(encode_index(event.next))?;
        }
        log::debug!(
            "saved {} queued events at tick {}",
            self.queue.len(),
            self.clock.now()
        );
        Ok(())
    }

    /// Writes every action of every list, sentinels included.
    pub fn save_actions<W: Write>(&self, writer: &mut W) -> Result<(), SchedulerError> {
        for action in self.table.iter() {
            write_record(writer, action.timer, &action.kind)?;
        }
        Ok(())
    }

    pub fn save<W: Write>(&self, writer: &mut W) -> Result<(), SchedulerError> {
        self.save_events(writer)?;
        self.save_actions(writer)
    }

    /// Replaces the queue and mutable action payloads with a saved game.
    ///
    /// Nothing changes unless the whole stream decodes and validates.
    /// Event times are rebased so that every delay relative to the save
    /// tick is preserved relative to the current tick.
    pub fn restore<R: Read>(&mut self, reader: &mut R) -> Result<(), SchedulerError> {
        let queue = self.read_events(reader)?;
        let actions = self.read_actions(reader)?;

        for (reference, kind) in actions {
            if let Some(action) = self.table.get_mut(reference) {
                action.kind = kind;
            }
        }
        log::debug!(
            "restored {} queued events at tick {}",
            queue.len(),
            self.clock.now()
        );
        self.queue = queue;
        Ok(())
    }

    fn read_events<R: Read>(&self, reader: &mut R) -> Result<EventQueue, SchedulerError> {
        let capacity = self.queue.capacity();
        let save_tick = reader.read_u32::<BigEndian>()?;
        let free = decode_index(reader.read_i16::<BigEndian>()?, capacity, "free")?;
        let head = decode_index(reader.read_i16::<BigEndian>()?, capacity, "head")?;
        let tail = decode_index(reader.read_i16::<BigEndian>()?, capacity, "tail")?;

        let mut records = Vec::with_capacity(capacity);
        for index in 0..capacity {
            let raw_action = reader.read_i32::<BigEndian>()?;
            let time = reader.read_u32::<BigEndian>()?;
            let scope = match reader.read_u8()? {
                SCOPE_GLOBAL => EventScope::Global,
                SCOPE_LOCAL => EventScope::Local,
                other => return Err(corrupt(format!("slot {index} has scope byte {other}"))),
            };
            let prev = decode_index(reader.read_i16::<BigEndian>()?, capacity, "prev")?;
            let next = decode_index(reader.read_i16::<BigEndian>()?, capacity, "next")?;
            let action = ActionRef::decode(raw_action);
            if let Some(reference) = action {
                if self.table.get(reference).is_none() {
                    return Err(corrupt(format!("slot {index} references missing action {reference}")));
                }
            }
            records.push(SlotRecord {
                action,
                time,
                scope,
                prev,
                next,
            });
        }

        let mut states = vec![SlotState::Free; capacity];
        let mut seen = vec![false; capacity];

        let mut queued = 0;
        let mut prev: Option<EventId> = None;
        let mut cursor = head;
        while let Some(id) = cursor {
            let record = &records[id.index()];
            if seen[id.index()] {
                return Err(corrupt(format!("event {id} linked twice")));
            }
            if record.action.is_none() {
                return Err(corrupt(format!("queued event {id} has no action")));
            }
            if record.prev != prev {
                return Err(corrupt(format!("event {id} has a broken back link")));
            }
            if let Some(before) = prev {
                if records[before.index()].time > record.time {
                    return Err(corrupt(format!("event {id} is out of time order")));
                }
            }
            seen[id.index()] = true;
            states[id.index()] = SlotState::Queued;
            queued += 1;
            prev = Some(id);
            cursor = record.next;
        }
        if prev != tail {
            return Err(corrupt("tail does not end the queue"));
        }

        let mut free_len = 0;
        let mut cursor = free;
        while let Some(id) = cursor {
            if seen[id.index()] {
                return Err(corrupt(format!("free slot {id} is also queued or repeated")));
            }
            seen[id.index()] = true;
            free_len += 1;
            cursor = records[id.index()].next;
        }
        if queued + free_len != capacity {
            return Err(corrupt(format!(
                "{queued} queued and {free_len} free slots do not fill a pool of {capacity}"
            )));
        }

        let now = self.clock.now();
        let slots = records
            .into_iter()
            .zip(states)
            .map(|(record, state)| match state {
                SlotState::Queued => Event {
                    action: record.action,
                    scope: record.scope,
                    time: record.time.wrapping_sub(save_tick).wrapping_add(now),
                    prev: record.prev,
                    next: record.next,
                    state,
                },
                _ => Event {
                    action: None,
                    scope: EventScope::Local,
                    time: 0,
                    prev: None,
                    next: record.next,
                    state: SlotState::Free,
                },
            })
            .collect();

        let pool = EventPool::from_parts(slots, free, free_len);
        Ok(EventQueue::from_parts(pool, head, tail, queued))
    }

    fn read_actions<R: Read>(&self, reader: &mut R) -> Result<Vec<(ActionRef, ActionKind)>, SchedulerError> {
        let mut restored = Vec::new();
        for action in self.table.iter() {
            let (_, kind) = read_record(reader).map_err(format_error)?;
            if kind.opcode() != action.opcode() {
                return Err(corrupt(format!(
                    "action {} saved as {:?} but loaded as {:?}",
                    action.tag,
                    kind.opcode(),
                    action.opcode()
                )));
            }
            if kind != action.kind {
                restored.push((action.tag, kind));
            }
        }
        Ok(restored)
    }
}
