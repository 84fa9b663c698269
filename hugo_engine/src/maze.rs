use serde::Serialize;

/// How far inside the maze box the hero is placed after crossing an edge.
pub const SHIFT_SIZE: i16 = 5;

/// Maze bounding box and layout, only meaningful while `enabled`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MazeState {
    pub enabled: bool,
    /// Screens per maze row.
    pub size: u8,
    pub x1: i16,
    pub y1: i16,
    pub x2: i16,
    pub y2: i16,
    /// Entry x when arriving from the south.
    pub x3: i16,
    /// Entry x when arriving from the north.
    pub x4: i16,
    pub first_screen: u8,
}

/// Hero bounding box in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeroBounds {
    pub x1: i16,
    pub x2: i16,
    pub y1: i16,
    pub y2: i16,
}

/// Where the maze sends the hero next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MazeExit {
    pub screen: i16,
    pub x: i16,
    pub y: i16,
}

fn narrow(value: i32) -> i16 {
    value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

impl MazeState {
    /// Edge the hero crossed, if any, checked west, east, north, south.
    pub fn exit_for(&self, hero: HeroBounds, screen: i16, hero_y: i16) -> Option<MazeExit> {
        if !self.enabled {
            return None;
        }
        let shift = i32::from(SHIFT_SIZE);
        let size = i32::from(self.size);
        let screen = i32::from(screen);
        let (x1, x2, y1, y2) = (
            i32::from(hero.x1),
            i32::from(hero.x2),
            i32::from(hero.y1),
            i32::from(hero.y2),
        );

        let (next, x, y) = if x1 < i32::from(self.x1) {
            (screen - 1, i32::from(self.x2) - shift - (x2 - x1), i32::from(hero_y))
        } else if x2 > i32::from(self.x2) {
            (screen + 1, i32::from(self.x1) + shift, i32::from(hero_y))
        } else if y1 < i32::from(self.y1) - shift {
            (
                screen - size,
                i32::from(self.x3),
                i32::from(self.y2) - shift - (y2 - y1),
            )
        } else if y2 > i32::from(self.y2) - shift / 2 {
            (screen + size, i32::from(self.x4), i32::from(self.y1) + shift)
        } else {
            return None;
        };

        Some(MazeExit {
            screen: narrow(next),
            x: narrow(x),
            y: narrow(y),
        })
    }
}
