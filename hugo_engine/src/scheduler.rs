use hugo_formats::{Action, ActionKind, ActionRef, ActionTable, Opcode};
use serde::Serialize;

use crate::clock::Clock;
use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::host::GameHost;
use crate::maze::{HeroBounds, MazeExit, MazeState};
use crate::pool::{Event, EventId, EventScope};
use crate::queue::EventQueue;
use crate::release::ReleaseProfile;

/// One action executed during a scheduler pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dispatched {
    pub action: ActionRef,
    pub opcode: Opcode,
    pub time: u32,
}

/// What a single call to [`Scheduler::run`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub tick: u32,
    pub dispatched: Vec<Dispatched>,
}

/// Drives the event queue against the action table once per simulation tick.
#[derive(Debug)]
pub struct Scheduler {
    pub(crate) profile: ReleaseProfile,
    pub(crate) clock: Clock,
    pub(crate) queue: EventQueue,
    pub(crate) table: ActionTable,
    pub(crate) maze: MazeState,
    pub(crate) maze_list: Option<u16>,
}

impl Scheduler {
    pub fn new(config: &SchedulerConfig, table: ActionTable) -> Result<Self, SchedulerError> {
        let profile = config.profile();
        log::debug!(
            "scheduler for {} ({} lists, {} event slots)",
            profile.release,
            table.len(),
            config.event_capacity
        );
        Ok(Self {
            profile,
            clock: Clock::new(profile.tick_source, profile.ticks_per_second),
            queue: EventQueue::new(config.event_capacity)?,
            table,
            maze: MazeState::default(),
            maze_list: None,
        })
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Action list the maze rewrites and schedules when the hero leaves a maze screen.
    pub fn with_maze_list(mut self, list: u16) -> Self {
        self.maze_list = Some(list);
        self
    }

    pub fn profile(&self) -> &ReleaseProfile {
        &self.profile
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    pub fn now(&self) -> u32 {
        self.clock.now()
    }

    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    pub fn table(&self) -> &ActionTable {
        &self.table
    }

    pub fn maze(&self) -> &MazeState {
        &self.maze
    }

    pub fn maze_list(&self) -> Option<u16> {
        self.maze_list
    }

    /// Queued events from earliest to latest.
    pub fn events(&self) -> impl Iterator<Item = (EventId, &Event)> + '_ {
        self.queue.iter()
    }

    /// Drops every pending event.
    pub fn reset(&mut self) -> Result<(), SchedulerError> {
        log::debug!("resetting event queue");
        self.queue.reset()
    }

    pub fn wait_for_refresh(&mut self) {
        self.clock.wait_for_refresh();
    }

    /// Schedules one action at `now + timer`. Only global-schedule actions
    /// outlive a screen change.
    pub fn insert_action(&mut self, reference: ActionRef) -> Result<EventId, SchedulerError> {
        let action = self
            .table
            .get(reference)
            .ok_or(SchedulerError::MissingAction(reference))?;
        let scope = match action.opcode() {
            Opcode::GlobalSchedule => EventScope::Global,
            _ => EventScope::Local,
        };
        let time = self.clock.now().wrapping_add_signed(i32::from(action.timer));
        log::trace!(
            "insert action {reference} ({:?}) at tick {time}",
            action.opcode()
        );
        self.queue.schedule(reference, scope, time)
    }

    /// Schedules every action of `list` relative to the current tick.
    pub fn insert_action_list(&mut self, list: u16) -> Result<usize, SchedulerError> {
        log::debug!("insert action list {list}");
        let references: Vec<ActionRef> = self
            .table
            .list(list)
            .ok_or(SchedulerError::UnknownList(list))?
            .body()
            .iter()
            .map(|action| action.tag)
            .collect();
        for reference in &references {
            self.insert_action(*reference)?;
        }
        Ok(references.len())
    }

    /// Executes every event due at the current tick.
    ///
    /// The cursor advances to the successor captured after each action runs,
    /// so events an action schedules for "now" run in this same pass. A
    /// screen change ends the pass early.
    pub fn run<H>(&mut self, host: &mut H) -> Result<TickReport, SchedulerError>
    where
        H: GameHost + ?Sized,
    {
        let now = self.clock.update();
        let mut report = TickReport {
            tick: now,
            dispatched: Vec::new(),
        };

        let mut cursor = self.queue.head();
        while let Some(id) = cursor {
            let event = self.queue.event(id)?;
            if event.time() > now {
                break;
            }
            if let Some(reference) = event.action() {
                let opcode = self
                    .table
                    .get(reference)
                    .map(Action::opcode)
                    .unwrap_or(Opcode::Null);
                report.dispatched.push(Dispatched {
                    action: reference,
                    opcode,
                    time: event.time(),
                });
            }
            cursor = self.dispatch(host, id)?;
        }

        self.clock.end_of_pass();
        Ok(report)
    }

    /// Full screen transition: flush scene-local events, move the hero,
    /// load the screen and schedule its entry lists.
    pub fn new_screen<H>(&mut self, host: &mut H, screen: i16) -> Result<(), SchedulerError>
    where
        H: GameHost + ?Sized,
    {
        let removed = self
            .queue
            .remove_where(|event| event.scope() == EventScope::Local)?;
        log::debug!("new screen {screen}: flushed {removed} local events");

        host.enter_screen(screen);
        host.load_screen_files(screen);
        for list in host.screen_action_lists(screen) {
            self.insert_action_list(list)?;
        }
        host.init_new_screen_display();
        Ok(())
    }

    /// Re-enters a screen after a restore without touching the queue.
    pub fn restore_screen<H>(&mut self, host: &mut H, screen: i16)
    where
        H: GameHost + ?Sized,
    {
        log::debug!("restore screen {screen}");
        host.enter_screen(screen);
        host.load_screen_files(screen);
        host.init_new_screen_display();
    }

    /// Cancels every queued event whose action has opcode byte `target`.
    pub fn delete_events_of(&mut self, target: u8) -> Result<usize, SchedulerError> {
        let table = &self.table;
        let removed = self.queue.remove_where(|event| {
            event
                .action()
                .and_then(|reference| table.get(reference))
                .is_some_and(|action| action.opcode().as_u8() == target)
        })?;
        log::debug!("deleted {removed} events of opcode {target}");
        Ok(removed)
    }

    /// Per-tick maze boundary check. Returns true when the hero left the
    /// screen and the maze list was scheduled.
    pub fn process_maze<H>(&mut self, host: &mut H, hero: HeroBounds) -> Result<bool, SchedulerError>
    where
        H: GameHost + ?Sized,
    {
        let (_, hero_y) = host.position(host.hero());
        let Some(exit) = self.maze.exit_for(hero, host.current_screen(), hero_y) else {
            return Ok(false);
        };
        let Some(list) = self.maze_list else {
            log::warn!("maze exit to screen {} but no maze list configured", exit.screen);
            return Ok(false);
        };
        log::debug!("maze exit to screen {} at ({}, {})", exit.screen, exit.x, exit.y);

        self.rewrite_maze_list(list, exit)?;
        host.set_route_index(-1);
        self.insert_action_list(list)?;
        Ok(true)
    }

    fn rewrite_maze_list(&mut self, list: u16, exit: MazeExit) -> Result<(), SchedulerError> {
        let screen_ref = ActionRef::new(list, 3);
        let position_ref = ActionRef::new(list, 0);
        self.expect_opcode(screen_ref, Opcode::NewScreen)?;
        self.expect_opcode(position_ref, Opcode::InitObjXy)?;

        if let Some(Action {
            kind: ActionKind::NewScreen { screen },
            ..
        }) = self.table.get_mut(screen_ref)
        {
            *screen = exit.screen;
        }
        if let Some(Action {
            kind: ActionKind::InitObjXy { x, y, .. },
            ..
        }) = self.table.get_mut(position_ref)
        {
            *x = exit.x;
            *y = exit.y;
        }
        Ok(())
    }

    fn expect_opcode(&self, reference: ActionRef, expected: Opcode) -> Result<(), SchedulerError> {
        let found = self.table.get(reference).map_or(Opcode::Null, Action::opcode);
        if found == expected {
            Ok(())
        } else {
            Err(SchedulerError::UnexpectedAction {
                reference,
                expected,
                found,
            })
        }
    }
}
