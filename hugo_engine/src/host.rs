//! Collaborator seams the interpreter drives. The scheduler owns timing and
//! the action table; everything visible to the player lives behind these
//! traits.

use serde::Serialize;

/// Cycling mode byte understood by the object store.
pub const CYCLE_FORWARD: u8 = 3;

/// Bounds of an object's current image, relative to its origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImageBox {
    pub x1: i16,
    pub y1: i16,
    pub x2: i16,
    pub y2: i16,
}

pub trait ObjectStore {
    /// Object index of the player character.
    fn hero(&self) -> i16 {
        0
    }
    fn position(&self, obj: i16) -> (i16, i16);
    fn set_position(&mut self, obj: i16, x: i16, y: i16);
    fn set_velocity(&mut self, obj: i16, vx: i16, vy: i16);
    fn set_cycling(&mut self, obj: i16, cycle: u8);
    fn set_cycle_count(&mut self, obj: i16, count: i16);
    fn is_carried(&self, obj: i16) -> bool;
    fn set_carried(&mut self, obj: i16, carried: bool);
    fn screen(&self, obj: i16) -> i16;
    fn set_screen(&mut self, obj: i16, screen: i16);
    fn state(&self, obj: i16) -> u16;
    fn set_state(&mut self, obj: i16, state: u16);
    fn set_priority(&mut self, obj: i16, priority: u8);
    fn set_path(&mut self, obj: i16, path: i16, vx: u8, vy: u8);
    fn swap_images(&mut self, obj1: i16, obj2: i16);
    fn home_in(&mut self, obj: i16, target: i16, dx: u8, dy: u8);
    /// Selects an image sequence and steps `frame` images into it.
    fn set_sequence(&mut self, obj: i16, seq: i16, frame: i16);
    fn image_box(&self, obj: i16) -> ImageBox;
    fn value(&self, obj: i16) -> i32;
    fn noun(&self, obj: i16) -> i16;
    fn set_view(&mut self, obj: i16, view_x: i16, view_y: i16, direction: i16);
}

pub trait ScreenDisplay {
    fn set_background_color(&mut self, color: u32);
    fn remap_palette(&mut self, old: i16, new: i16);
    fn init_new_screen_display(&mut self);
}

pub trait SoundPlayer {
    /// Sound indices below this value are music tracks.
    fn tune_count(&self) -> i16;
    fn play_music(&mut self, index: i16);
    fn play_sound(&mut self, index: i16);
    fn set_dos_song(&mut self, song: u16);
}

pub trait WordParser {
    fn is_noun_present(&self, noun: u16) -> bool;
}

pub trait ScoreLedger {
    fn adjust_score(&mut self, delta: i32);
    fn bonus_points(&self, bonus: i16) -> i32;
    fn bonus_scored(&self, bonus: i16) -> bool;
    fn mark_bonus_scored(&mut self, bonus: i16);
}

pub trait Dialog {
    fn fetch_string(&self, index: i16) -> String;
    fn show_text(&mut self, string: i16);
    fn warn(&mut self, string: i16);
    fn show_take(&mut self, noun: i16);
    /// Shows a free-text prompt and returns what the player typed.
    fn prompt(&mut self, prompt: i16) -> String;
    fn ask_yes_no(&mut self, prompt: i16) -> bool;
}

pub trait GameStatus {
    fn current_screen(&self) -> i16;
    fn set_game_over(&mut self);
    fn end_game(&mut self);
    fn is_demo(&self) -> bool;
    fn set_story_mode(&mut self, enabled: bool);
    fn route_index(&self) -> i16;
    fn set_route_index(&mut self, route: i16);
    fn set_jump_exit(&mut self, enabled: bool);
    fn set_screen_state(&mut self, screen: i16, state: u8);
}

pub trait ScreenLoader {
    /// Moves the hero and everything carried onto `screen`.
    fn enter_screen(&mut self, screen: i16);
    fn load_screen_files(&mut self, screen: i16);
    /// Action lists to schedule when the player arrives on `screen`.
    fn screen_action_lists(&self, screen: i16) -> Vec<u16>;
}

/// Everything the interpreter needs from the surrounding engine.
pub trait GameHost:
    ObjectStore + ScreenDisplay + SoundPlayer + WordParser + ScoreLedger + Dialog + GameStatus + ScreenLoader
{
}

impl<T> GameHost for T where
    T: ObjectStore
        + ScreenDisplay
        + SoundPlayer
        + WordParser
        + ScoreLedger
        + Dialog
        + GameStatus
        + ScreenLoader
{
}
