//! In-memory game host for tools and tests. World state lives in plain
//! fields; every effect the interpreter causes is also appended to a
//! serializable log.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::Serialize;

use crate::host::{
    Dialog, GameStatus, ImageBox, ObjectStore, ScoreLedger, ScreenDisplay, ScreenLoader,
    SoundPlayer, WordParser,
};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HostEvent {
    Position { obj: i16, x: i16, y: i16 },
    Velocity { obj: i16, vx: i16, vy: i16 },
    Cycling { obj: i16, cycle: u8 },
    Carried { obj: i16, carried: bool },
    Screen { obj: i16, screen: i16 },
    State { obj: i16, state: u16 },
    Priority { obj: i16, priority: u8 },
    Path { obj: i16, path: i16, vx: u8, vy: u8 },
    SwapImages { obj1: i16, obj2: i16 },
    HomeIn { obj: i16, target: i16, dx: u8, dy: u8 },
    Sequence { obj: i16, seq: i16, frame: i16 },
    View { obj: i16, view_x: i16, view_y: i16, direction: i16 },
    BackgroundColor { color: u32 },
    RemapPalette { old: i16, new: i16 },
    ScreenDisplay,
    Music { index: i16 },
    Sound { index: i16 },
    DosSong { song: u16 },
    Score { delta: i32, total: i32 },
    BonusScored { bonus: i16 },
    Text { string: i16 },
    Warn { string: i16 },
    Take { noun: i16 },
    Prompt { prompt: i16, answer: String },
    YesNo { prompt: i16, answer: bool },
    GameOver,
    EndGame,
    StoryMode { enabled: bool },
    Route { route: i16 },
    JumpExit { enabled: bool },
    ScreenState { screen: i16, state: u8 },
    EnterScreen { screen: i16 },
    LoadScreen { screen: i16 },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SandboxObject {
    pub x: i16,
    pub y: i16,
    pub vx: i16,
    pub vy: i16,
    pub cycling: u8,
    pub cycle_count: i16,
    pub carried: bool,
    pub screen: i16,
    pub state: u16,
    pub priority: u8,
    pub path: i16,
    pub seq: i16,
    pub frame: i16,
    pub image: ImageBox,
    pub value: i32,
    pub noun: i16,
    pub view: (i16, i16, i16),
}

#[derive(Debug, Clone, Default)]
pub struct SandboxHost {
    pub objects: Vec<SandboxObject>,
    pub hero: i16,
    pub screen: i16,
    pub score: i32,
    pub tune_count: i16,
    /// Points per bonus index.
    pub bonuses: BTreeMap<i16, i32>,
    pub scored: BTreeSet<i16>,
    pub nouns: BTreeSet<u16>,
    pub strings: BTreeMap<i16, String>,
    pub prompt_replies: VecDeque<String>,
    pub yes_no_replies: VecDeque<bool>,
    pub screen_actions: BTreeMap<i16, Vec<u16>>,
    pub screen_states: BTreeMap<i16, u8>,
    pub route: i16,
    pub demo: bool,
    pub story_mode: bool,
    pub jump_exit: bool,
    pub game_over: bool,
    pub ended: bool,
    events: Vec<HostEvent>,
}

impl SandboxHost {
    pub fn new() -> Self {
        Self {
            route: -1,
            ..Self::default()
        }
    }

    pub fn events(&self) -> &[HostEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn object(&self, obj: i16) -> Option<&SandboxObject> {
        usize::try_from(obj).ok().and_then(|index| self.objects.get(index))
    }

    /// Grows the object table on demand; negative indices have no object.
    pub fn object_mut(&mut self, obj: i16) -> Option<&mut SandboxObject> {
        let index = usize::try_from(obj).ok()?;
        if index >= self.objects.len() {
            self.objects.resize_with(index + 1, SandboxObject::default);
        }
        self.objects.get_mut(index)
    }

    fn record(&mut self, event: HostEvent) {
        log::trace!("host: {event:?}");
        self.events.push(event);
    }

    fn with_object(&mut self, obj: i16, update: impl FnOnce(&mut SandboxObject), event: HostEvent) {
        if let Some(object) = self.object_mut(obj) {
            update(object);
        }
        self.record(event);
    }
}

impl ObjectStore for SandboxHost {
    fn hero(&self) -> i16 {
        self.hero
    }

    fn position(&self, obj: i16) -> (i16, i16) {
        self.object(obj).map_or((0, 0), |object| (object.x, object.y))
    }

    fn set_position(&mut self, obj: i16, x: i16, y: i16) {
        self.with_object(
            obj,
            |object| {
                object.x = x;
                object.y = y;
            },
            HostEvent::Position { obj, x, y },
        );
    }

    fn set_velocity(&mut self, obj: i16, vx: i16, vy: i16) {
        self.with_object(
            obj,
            |object| {
                object.vx = vx;
                object.vy = vy;
            },
            HostEvent::Velocity { obj, vx, vy },
        );
    }

    fn set_cycling(&mut self, obj: i16, cycle: u8) {
        self.with_object(
            obj,
            |object| object.cycling = cycle,
            HostEvent::Cycling { obj, cycle },
        );
    }

    fn set_cycle_count(&mut self, obj: i16, count: i16) {
        if let Some(object) = self.object_mut(obj) {
            object.cycle_count = count;
        }
    }

    fn is_carried(&self, obj: i16) -> bool {
        self.object(obj).is_some_and(|object| object.carried)
    }

    fn set_carried(&mut self, obj: i16, carried: bool) {
        self.with_object(
            obj,
            |object| object.carried = carried,
            HostEvent::Carried { obj, carried },
        );
    }

    fn screen(&self, obj: i16) -> i16 {
        self.object(obj).map_or(0, |object| object.screen)
    }

    fn set_screen(&mut self, obj: i16, screen: i16) {
        self.with_object(
            obj,
            |object| object.screen = screen,
            HostEvent::Screen { obj, screen },
        );
    }

    fn state(&self, obj: i16) -> u16 {
        self.object(obj).map_or(0, |object| object.state)
    }

    fn set_state(&mut self, obj: i16, state: u16) {
        self.with_object(
            obj,
            |object| object.state = state,
            HostEvent::State { obj, state },
        );
    }

    fn set_priority(&mut self, obj: i16, priority: u8) {
        self.with_object(
            obj,
            |object| object.priority = priority,
            HostEvent::Priority { obj, priority },
        );
    }

    fn set_path(&mut self, obj: i16, path: i16, vx: u8, vy: u8) {
        self.with_object(
            obj,
            |object| object.path = path,
            HostEvent::Path { obj, path, vx, vy },
        );
    }

    fn swap_images(&mut self, obj1: i16, obj2: i16) {
        let first = self.object(obj1).map(|object| object.image);
        let second = self.object(obj2).map(|object| object.image);
        if let (Some(first), Some(second)) = (first, second) {
            if let Some(object) = self.object_mut(obj1) {
                object.image = second;
            }
            if let Some(object) = self.object_mut(obj2) {
                object.image = first;
            }
        }
        self.record(HostEvent::SwapImages { obj1, obj2 });
    }

    fn home_in(&mut self, obj: i16, target: i16, dx: u8, dy: u8) {
        self.record(HostEvent::HomeIn {
            obj,
            target,
            dx,
            dy,
        });
    }

    fn set_sequence(&mut self, obj: i16, seq: i16, frame: i16) {
        self.with_object(
            obj,
            |object| {
                object.seq = seq;
                object.frame = frame;
            },
            HostEvent::Sequence { obj, seq, frame },
        );
    }

    fn image_box(&self, obj: i16) -> ImageBox {
        self.object(obj).map(|object| object.image).unwrap_or_default()
    }

    fn value(&self, obj: i16) -> i32 {
        self.object(obj).map_or(0, |object| object.value)
    }

    fn noun(&self, obj: i16) -> i16 {
        self.object(obj).map_or(0, |object| object.noun)
    }

    fn set_view(&mut self, obj: i16, view_x: i16, view_y: i16, direction: i16) {
        self.with_object(
            obj,
            |object| object.view = (view_x, view_y, direction),
            HostEvent::View {
                obj,
                view_x,
                view_y,
                direction,
            },
        );
    }
}

impl ScreenDisplay for SandboxHost {
    fn set_background_color(&mut self, color: u32) {
        self.record(HostEvent::BackgroundColor { color });
    }

    fn remap_palette(&mut self, old: i16, new: i16) {
        self.record(HostEvent::RemapPalette { old, new });
    }

    fn init_new_screen_display(&mut self) {
        self.record(HostEvent::ScreenDisplay);
    }
}

impl SoundPlayer for SandboxHost {
    fn tune_count(&self) -> i16 {
        self.tune_count
    }

    fn play_music(&mut self, index: i16) {
        self.record(HostEvent::Music { index });
    }

    fn play_sound(&mut self, index: i16) {
        self.record(HostEvent::Sound { index });
    }

    fn set_dos_song(&mut self, song: u16) {
        self.record(HostEvent::DosSong { song });
    }
}

impl WordParser for SandboxHost {
    fn is_noun_present(&self, noun: u16) -> bool {
        self.nouns.contains(&noun)
    }
}

impl ScoreLedger for SandboxHost {
    fn adjust_score(&mut self, delta: i32) {
        self.score = self.score.wrapping_add(delta);
        self.record(HostEvent::Score {
            delta,
            total: self.score,
        });
    }

    fn bonus_points(&self, bonus: i16) -> i32 {
        self.bonuses.get(&bonus).copied().unwrap_or(0)
    }

    fn bonus_scored(&self, bonus: i16) -> bool {
        self.scored.contains(&bonus)
    }

    fn mark_bonus_scored(&mut self, bonus: i16) {
        self.scored.insert(bonus);
        self.record(HostEvent::BonusScored { bonus });
    }
}

impl Dialog for SandboxHost {
    fn fetch_string(&self, index: i16) -> String {
        self.strings.get(&index).cloned().unwrap_or_default()
    }

    fn show_text(&mut self, string: i16) {
        self.record(HostEvent::Text { string });
    }

    fn warn(&mut self, string: i16) {
        self.record(HostEvent::Warn { string });
    }

    fn show_take(&mut self, noun: i16) {
        self.record(HostEvent::Take { noun });
    }

    fn prompt(&mut self, prompt: i16) -> String {
        let answer = self.prompt_replies.pop_front().unwrap_or_default();
        self.record(HostEvent::Prompt {
            prompt,
            answer: answer.clone(),
        });
        answer
    }

    fn ask_yes_no(&mut self, prompt: i16) -> bool {
        let answer = self.yes_no_replies.pop_front().unwrap_or(false);
        self.record(HostEvent::YesNo { prompt, answer });
        answer
    }
}

impl GameStatus for SandboxHost {
    fn current_screen(&self) -> i16 {
        self.screen
    }

    fn set_game_over(&mut self) {
        self.game_over = true;
        self.record(HostEvent::GameOver);
    }

    fn end_game(&mut self) {
        self.ended = true;
        self.record(HostEvent::EndGame);
    }

    fn is_demo(&self) -> bool {
        self.demo
    }

    fn set_story_mode(&mut self, enabled: bool) {
        self.story_mode = enabled;
        self.record(HostEvent::StoryMode { enabled });
    }

    fn route_index(&self) -> i16 {
        self.route
    }

    fn set_route_index(&mut self, route: i16) {
        self.route = route;
        self.record(HostEvent::Route { route });
    }

    fn set_jump_exit(&mut self, enabled: bool) {
        self.jump_exit = enabled;
        self.record(HostEvent::JumpExit { enabled });
    }

    fn set_screen_state(&mut self, screen: i16, state: u8) {
        self.screen_states.insert(screen, state);
        self.record(HostEvent::ScreenState { screen, state });
    }
}

impl ScreenLoader for SandboxHost {
    fn enter_screen(&mut self, screen: i16) {
        self.screen = screen;
        let hero = self.hero;
        if let Some(object) = self.object_mut(hero) {
            object.screen = screen;
        }
        for object in self.objects.iter_mut().filter(|object| object.carried) {
            object.screen = screen;
        }
        self.record(HostEvent::EnterScreen { screen });
    }

    fn load_screen_files(&mut self, screen: i16) {
        self.record(HostEvent::LoadScreen { screen });
    }

    fn screen_action_lists(&self, screen: i16) -> Vec<u16> {
        self.screen_actions.get(&screen).cloned().unwrap_or_default()
    }
}
