use hugo_formats::ActionKind;

use crate::error::SchedulerError;
use crate::host::{GameHost, CYCLE_FORWARD};
use crate::maze::MazeState;
use crate::pool::EventId;
use crate::release::PromptMatch;
use crate::scheduler::Scheduler;

impl Scheduler {
    /// Executes the action behind queued event `id` and returns the next
    /// cursor for the current pass.
    ///
    /// The successor is read after the action has run, so anything the
    /// action queued behind the current event is still visited. A screen
    /// change returns `None`.
    pub fn dispatch<H>(&mut self, host: &mut H, id: EventId) -> Result<Option<EventId>, SchedulerError>
    where
        H: GameHost + ?Sized,
    {
        let event = self.queue.event(id)?;
        if !event.is_queued() {
            return Err(SchedulerError::NotQueued(id));
        }
        let reference = event.action().ok_or(SchedulerError::UnknownEvent(id))?;
        let kind = self
            .table
            .get(reference)
            .ok_or(SchedulerError::MissingAction(reference))?
            .kind
            .clone();

        log::trace!("dispatch {id} -> action {reference} ({:?})", kind.opcode());
        self.execute(host, &kind)?;

        if matches!(kind, ActionKind::NewScreen { .. }) {
            return Ok(None);
        }
        // DelEvents may have cancelled this very event.
        if !self.queue.is_queued(id) {
            return Ok(self.queue.head());
        }
        let next = self.queue.next(id);
        self.queue.remove(id)?;
        Ok(next)
    }

    fn branch(&mut self, passed: bool, pass: u16, fail: u16) -> Result<(), SchedulerError> {
        self.insert_action_list(if passed { pass } else { fail })?;
        Ok(())
    }

    fn execute<H>(&mut self, host: &mut H, kind: &ActionKind) -> Result<(), SchedulerError>
    where
        H: GameHost + ?Sized,
    {
        match *kind {
            ActionKind::Null => {}
            ActionKind::Schedule { list } | ActionKind::GlobalSchedule { list } => {
                self.insert_action_list(list)?;
            }
            ActionKind::StartObj {
                obj,
                cycle_numb,
                cycle,
            } => {
                host.set_cycle_count(obj, cycle_numb);
                host.set_cycling(obj, cycle);
            }
            ActionKind::InitObjXy { obj, x, y } => host.set_position(obj, x, y),
            ActionKind::Prompt {
                prompt,
                ref responses,
                pass,
                fail,
                encoded,
            } => {
                let passed = self.evaluate_prompt(host, prompt, responses, encoded);
                self.branch(passed, pass, fail)?;
            }
            ActionKind::BackgroundColor { color } => host.set_background_color(color),
            ActionKind::InitObjVxy { obj, vx, vy } => host.set_velocity(obj, vx, vy),
            ActionKind::InitCarry { obj, carried } => host.set_carried(obj, carried),
            ActionKind::InitHeroFeetCoord { obj } => {
                let hero = host.hero();
                let (x, y) = host.position(hero);
                let feet = host.image_box(hero).y2;
                host.set_position(obj, x.wrapping_sub(1), y.wrapping_add(feet).wrapping_sub(1));
                let screen = host.current_screen();
                host.set_screen(obj, screen);
            }
            ActionKind::NewScreen { screen } => self.new_screen(host, screen)?,
            ActionKind::InitObjState { obj, state } => host.set_state(obj, u16::from(state)),
            ActionKind::InitPath { obj, path, vx, vy } => host.set_path(obj, path, vx, vy),
            ActionKind::CondState {
                obj,
                state,
                pass,
                fail,
            } => {
                let passed = host.state(obj) == u16::from(state);
                self.branch(passed, pass, fail)?;
            }
            ActionKind::Text { string } => host.show_text(string),
            ActionKind::SwapImages { obj1, obj2 } => host.swap_images(obj1, obj2),
            ActionKind::CondScreen {
                obj,
                screen,
                pass,
                fail,
            } => {
                let passed = host.screen(obj) == screen;
                self.branch(passed, pass, fail)?;
            }
            ActionKind::Autopilot { obj1, obj2, dx, dy } => host.home_in(obj1, obj2, dx, dy),
            ActionKind::InitObjSeq { obj, seq } => host.set_sequence(obj, seq, 0),
            ActionKind::SetStateBits { obj, mask } => {
                let state = host.state(obj) | mask as u16;
                host.set_state(obj, state);
            }
            ActionKind::ClearStateBits { obj, mask } => {
                let state = host.state(obj) & !(mask as u16);
                host.set_state(obj, state);
            }
            ActionKind::TestStateBits {
                obj,
                mask,
                pass,
                fail,
            } => {
                let mask = mask as u16;
                let passed = host.state(obj) & mask == mask;
                self.branch(passed, pass, fail)?;
            }
            ActionKind::DelEvents { target } => {
                self.delete_events_of(target)?;
            }
            ActionKind::GameOver => host.set_game_over(),
            ActionKind::InitHeroHeadCoord { obj } => {
                let (x, y) = host.position(host.hero());
                host.set_position(obj, x, y);
                let screen = host.current_screen();
                host.set_screen(obj, screen);
            }
            ActionKind::Exit => host.end_game(),
            ActionKind::Bonus { point } => {
                if !host.bonus_scored(point) {
                    let points = host.bonus_points(point);
                    host.adjust_score(points);
                    host.mark_bonus_scored(point);
                }
            }
            ActionKind::CondBox {
                obj,
                x1,
                y1,
                x2,
                y2,
                pass,
                fail,
            } => {
                let (x, y) = host.position(obj);
                let image = host.image_box(obj);
                let dx = i32::from(x) + i32::from(image.x1);
                let dy = i32::from(y) + i32::from(image.y2);
                let passed = (i32::from(x1)..=i32::from(x2)).contains(&dx)
                    && (i32::from(y1)..=i32::from(y2)).contains(&dy);
                self.branch(passed, pass, fail)?;
            }
            ActionKind::Sound { sound } => {
                if sound < host.tune_count() {
                    host.play_music(sound);
                } else {
                    host.play_sound(sound);
                }
            }
            ActionKind::AddScore { obj } => {
                let value = host.value(obj);
                host.adjust_score(value);
            }
            ActionKind::SubScore { obj } => {
                let value = host.value(obj);
                host.adjust_score(value.wrapping_neg());
            }
            ActionKind::CondCarry { obj, pass, fail } => {
                let passed = host.is_carried(obj);
                self.branch(passed, pass, fail)?;
            }
            ActionKind::InitMaze {
                size,
                x1,
                y1,
                x2,
                y2,
                x3,
                x4,
                first_screen,
            } => {
                self.maze = MazeState {
                    enabled: true,
                    size,
                    x1,
                    y1,
                    x2,
                    y2,
                    x3,
                    x4,
                    first_screen,
                };
                log::debug!("maze enabled: {:?}", self.maze);
            }
            ActionKind::ExitMaze => self.maze.enabled = false,
            ActionKind::InitPriority { obj, priority } => host.set_priority(obj, priority),
            ActionKind::InitScreen { obj, screen } => host.set_screen(obj, screen),
            ActionKind::RemapPalette { old, new } => host.remap_palette(old, new),
            ActionKind::CondNoun { noun, pass, fail } => {
                let passed = host.is_noun_present(noun);
                self.branch(passed, pass, fail)?;
            }
            ActionKind::ScreenState { screen, state } => host.set_screen_state(screen, state),
            ActionKind::InitLips {
                lips_obj,
                obj,
                dx,
                dy,
            } => {
                let (x, y) = host.position(obj);
                host.set_position(
                    lips_obj,
                    x.wrapping_add(i16::from(dx)),
                    y.wrapping_add(i16::from(dy)),
                );
                let screen = host.current_screen();
                host.set_screen(lips_obj, screen);
                host.set_cycling(lips_obj, CYCLE_FORWARD);
            }
            ActionKind::InitStoryMode { enabled } => {
                host.set_story_mode(enabled);
                if host.is_demo() && !enabled {
                    host.end_game();
                }
            }
            ActionKind::Warn { string } => host.warn(string),
            ActionKind::CondBonus { bonus, pass, fail } => {
                let passed = host.bonus_scored(bonus);
                self.branch(passed, pass, fail)?;
            }
            ActionKind::TextTake { obj } => {
                let noun = host.noun(obj);
                host.show_take(noun);
            }
            ActionKind::YesNo { prompt, yes, no } => {
                let passed = host.ask_yes_no(prompt);
                self.branch(passed, yes, no)?;
            }
            ActionKind::StopRoute => host.set_route_index(-1),
            ActionKind::CondRoute { route, pass, fail } => {
                let passed = host.route_index() >= route;
                self.branch(passed, pass, fail)?;
            }
            ActionKind::InitJumpExit { enabled } => host.set_jump_exit(enabled),
            ActionKind::InitView {
                obj,
                view_x,
                view_y,
                direction,
            } => host.set_view(obj, view_x, view_y, direction),
            ActionKind::InitObjFrame { obj, seq, frame } => host.set_sequence(obj, seq, frame),
            ActionKind::OldSong { song } => host.set_dos_song(song),
        }
        Ok(())
    }

    /// Reads the player's answer and checks it against the accepted
    /// responses. A `-1` entry ends the response list.
    fn evaluate_prompt<H>(&self, host: &mut H, prompt: i16, responses: &[i16], encoded: bool) -> bool
    where
        H: GameHost + ?Sized,
    {
        let mut answer = host.prompt(prompt).into_bytes();
        answer.make_ascii_lowercase();
        if encoded {
            answer = self.profile.cipher.decode(&answer);
        }

        let accepted = responses.iter().copied().take_while(|&index| index != -1);
        let limit = match self.profile.prompt_match {
            PromptMatch::FirstResponse => 1,
            PromptMatch::AnyResponse => usize::MAX,
        };
        let passed = accepted.take(limit).any(|index| {
            let expected = host.fetch_string(index);
            contains(&answer, expected.as_bytes())
        });
        log::debug!("prompt {prompt}: answer accepted = {passed}");
        passed
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}
