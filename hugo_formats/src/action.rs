use std::fmt;

use serde::Serialize;

/// Opcode byte that tags every record in the script resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum Opcode {
    Schedule = 0,
    StartObj = 1,
    InitObjXy = 2,
    Prompt = 3,
    BackgroundColor = 4,
    InitObjVxy = 5,
    InitCarry = 6,
    InitHeroFeetCoord = 7,
    NewScreen = 8,
    InitObjState = 9,
    InitPath = 10,
    CondState = 11,
    Text = 12,
    SwapImages = 13,
    CondScreen = 14,
    Autopilot = 15,
    InitObjSeq = 16,
    SetStateBits = 17,
    ClearStateBits = 18,
    TestStateBits = 19,
    DelEvents = 20,
    GameOver = 21,
    InitHeroHeadCoord = 22,
    Exit = 23,
    Bonus = 24,
    CondBox = 25,
    Sound = 26,
    AddScore = 27,
    SubScore = 28,
    CondCarry = 29,
    InitMaze = 30,
    ExitMaze = 31,
    InitPriority = 32,
    InitScreen = 33,
    GlobalSchedule = 34,
    RemapPalette = 35,
    CondNoun = 36,
    ScreenState = 37,
    InitLips = 38,
    InitStoryMode = 39,
    Warn = 40,
    CondBonus = 41,
    TextTake = 42,
    YesNo = 43,
    StopRoute = 44,
    CondRoute = 45,
    InitJumpExit = 46,
    InitView = 47,
    InitObjFrame = 48,
    OldSong = 49,
    /// List terminator, also the no-op left behind by event deletion.
    Null = 0xFF,
}

impl Opcode {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use Opcode::*;
        let opcode = match value {
            0 => Schedule,
            1 => StartObj,
            2 => InitObjXy,
            3 => Prompt,
            4 => BackgroundColor,
            5 => InitObjVxy,
            6 => InitCarry,
            7 => InitHeroFeetCoord,
            8 => NewScreen,
            9 => InitObjState,
            10 => InitPath,
            11 => CondState,
            12 => Text,
            13 => SwapImages,
            14 => CondScreen,
            15 => Autopilot,
            16 => InitObjSeq,
            17 => SetStateBits,
            18 => ClearStateBits,
            19 => TestStateBits,
            20 => DelEvents,
            21 => GameOver,
            22 => InitHeroHeadCoord,
            23 => Exit,
            24 => Bonus,
            25 => CondBox,
            26 => Sound,
            27 => AddScore,
            28 => SubScore,
            29 => CondCarry,
            30 => InitMaze,
            31 => ExitMaze,
            32 => InitPriority,
            33 => InitScreen,
            34 => GlobalSchedule,
            35 => RemapPalette,
            36 => CondNoun,
            37 => ScreenState,
            38 => InitLips,
            39 => InitStoryMode,
            40 => Warn,
            41 => CondBonus,
            42 => TextTake,
            43 => YesNo,
            44 => StopRoute,
            45 => CondRoute,
            46 => InitJumpExit,
            47 => InitView,
            48 => InitObjFrame,
            49 => OldSong,
            0xFF => Null,
            other => return Err(other),
        };
        Ok(opcode)
    }
}

/// Stable position of an action inside the table: list id plus offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ActionRef {
    pub list: u16,
    pub offset: u16,
}

impl ActionRef {
    pub const NONE_ENCODED: i32 = -1;

    pub fn new(list: u16, offset: u16) -> Self {
        Self { list, offset }
    }

    /// Packs the reference as `(list << 16) | offset`.
    pub fn encode(self) -> i32 {
        ((u32::from(self.list) << 16) | u32::from(self.offset)) as i32
    }

    /// Inverse of [`ActionRef::encode`]; an offset of `0xFFFF` marks "no action".
    pub fn decode(raw: i32) -> Option<Self> {
        let raw = raw as u32;
        if raw & 0xFFFF == 0xFFFF {
            return None;
        }
        Some(Self {
            list: (raw >> 16) as u16,
            offset: (raw & 0xFFFF) as u16,
        })
    }

    pub fn encode_optional(action: Option<ActionRef>) -> i32 {
        action.map_or(Self::NONE_ENCODED, ActionRef::encode)
    }
}

impl fmt::Display for ActionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.list, self.offset)
    }
}

/// One compiled script instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    pub tag: ActionRef,
    /// Delay in ticks relative to the moment the owning list is scheduled.
    pub timer: i16,
    pub kind: ActionKind,
}

impl Action {
    pub fn opcode(&self) -> Opcode {
        self.kind.opcode()
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self.kind, ActionKind::Null)
    }
}

/// Opcode-specific payload. List ids (`list`, `pass`, `fail`, `yes`, `no`)
/// index into the owning [`crate::ActionTable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ActionKind {
    Null,
    Schedule {
        list: u16,
    },
    StartObj {
        obj: i16,
        cycle_numb: i16,
        cycle: u8,
    },
    InitObjXy {
        obj: i16,
        x: i16,
        y: i16,
    },
    Prompt {
        prompt: i16,
        responses: Vec<i16>,
        pass: u16,
        fail: u16,
        encoded: bool,
    },
    BackgroundColor {
        color: u32,
    },
    InitObjVxy {
        obj: i16,
        vx: i16,
        vy: i16,
    },
    InitCarry {
        obj: i16,
        carried: bool,
    },
    InitHeroFeetCoord {
        obj: i16,
    },
    NewScreen {
        screen: i16,
    },
    InitObjState {
        obj: i16,
        state: u8,
    },
    InitPath {
        obj: i16,
        path: i16,
        vx: u8,
        vy: u8,
    },
    CondState {
        obj: i16,
        state: u8,
        pass: u16,
        fail: u16,
    },
    Text {
        string: i16,
    },
    SwapImages {
        obj1: i16,
        obj2: i16,
    },
    CondScreen {
        obj: i16,
        screen: i16,
        pass: u16,
        fail: u16,
    },
    Autopilot {
        obj1: i16,
        obj2: i16,
        dx: u8,
        dy: u8,
    },
    InitObjSeq {
        obj: i16,
        seq: i16,
    },
    SetStateBits {
        obj: i16,
        mask: i16,
    },
    ClearStateBits {
        obj: i16,
        mask: i16,
    },
    TestStateBits {
        obj: i16,
        mask: i16,
        pass: u16,
        fail: u16,
    },
    DelEvents {
        /// Raw opcode byte; unknown values simply match nothing.
        target: u8,
    },
    GameOver,
    InitHeroHeadCoord {
        obj: i16,
    },
    Exit,
    Bonus {
        point: i16,
    },
    CondBox {
        obj: i16,
        x1: i16,
        y1: i16,
        x2: i16,
        y2: i16,
        pass: u16,
        fail: u16,
    },
    Sound {
        sound: i16,
    },
    AddScore {
        obj: i16,
    },
    SubScore {
        obj: i16,
    },
    CondCarry {
        obj: i16,
        pass: u16,
        fail: u16,
    },
    InitMaze {
        size: u8,
        x1: i16,
        y1: i16,
        x2: i16,
        y2: i16,
        x3: i16,
        x4: i16,
        first_screen: u8,
    },
    ExitMaze,
    InitPriority {
        obj: i16,
        priority: u8,
    },
    InitScreen {
        obj: i16,
        screen: i16,
    },
    GlobalSchedule {
        list: u16,
    },
    RemapPalette {
        old: i16,
        new: i16,
    },
    CondNoun {
        noun: u16,
        pass: u16,
        fail: u16,
    },
    ScreenState {
        screen: i16,
        state: u8,
    },
    InitLips {
        lips_obj: i16,
        obj: i16,
        dx: i8,
        dy: i8,
    },
    InitStoryMode {
        enabled: bool,
    },
    Warn {
        string: i16,
    },
    CondBonus {
        bonus: i16,
        pass: u16,
        fail: u16,
    },
    TextTake {
        obj: i16,
    },
    YesNo {
        prompt: i16,
        yes: u16,
        no: u16,
    },
    StopRoute,
    CondRoute {
        route: i16,
        pass: u16,
        fail: u16,
    },
    InitJumpExit {
        enabled: bool,
    },
    InitView {
        obj: i16,
        view_x: i16,
        view_y: i16,
        direction: i16,
    },
    InitObjFrame {
        obj: i16,
        seq: i16,
        frame: i16,
    },
    OldSong {
        song: u16,
    },
}

impl ActionKind {
    pub fn opcode(&self) -> Opcode {
        use ActionKind as K;
        match self {
            K::Null => Opcode::Null,
            K::Schedule { .. } => Opcode::Schedule,
            K::StartObj { .. } => Opcode::StartObj,
            K::InitObjXy { .. } => Opcode::InitObjXy,
            K::Prompt { .. } => Opcode::Prompt,
            K::BackgroundColor { .. } => Opcode::BackgroundColor,
            K::InitObjVxy { .. } => Opcode::InitObjVxy,
            K::InitCarry { .. } => Opcode::InitCarry,
            K::InitHeroFeetCoord { .. } => Opcode::InitHeroFeetCoord,
            K::NewScreen { .. } => Opcode::NewScreen,
            K::InitObjState { .. } => Opcode::InitObjState,
            K::InitPath { .. } => Opcode::InitPath,
            K::CondState { .. } => Opcode::CondState,
            K::Text { .. } => Opcode::Text,
            K::SwapImages { .. } => Opcode::SwapImages,
            K::CondScreen { .. } => Opcode::CondScreen,
            K::Autopilot { .. } => Opcode::Autopilot,
            K::InitObjSeq { .. } => Opcode::InitObjSeq,
            K::SetStateBits { .. } => Opcode::SetStateBits,
            K::ClearStateBits { .. } => Opcode::ClearStateBits,
            K::TestStateBits { .. } => Opcode::TestStateBits,
            K::DelEvents { .. } => Opcode::DelEvents,
            K::GameOver => Opcode::GameOver,
            K::InitHeroHeadCoord { .. } => Opcode::InitHeroHeadCoord,
            K::Exit => Opcode::Exit,
            K::Bonus { .. } => Opcode::Bonus,
            K::CondBox { .. } => Opcode::CondBox,
            K::Sound { .. } => Opcode::Sound,
            K::AddScore { .. } => Opcode::AddScore,
            K::SubScore { .. } => Opcode::SubScore,
            K::CondCarry { .. } => Opcode::CondCarry,
            K::InitMaze { .. } => Opcode::InitMaze,
            K::ExitMaze => Opcode::ExitMaze,
            K::InitPriority { .. } => Opcode::InitPriority,
            K::InitScreen { .. } => Opcode::InitScreen,
            K::GlobalSchedule { .. } => Opcode::GlobalSchedule,
            K::RemapPalette { .. } => Opcode::RemapPalette,
            K::CondNoun { .. } => Opcode::CondNoun,
            K::ScreenState { .. } => Opcode::ScreenState,
            K::InitLips { .. } => Opcode::InitLips,
            K::InitStoryMode { .. } => Opcode::InitStoryMode,
            K::Warn { .. } => Opcode::Warn,
            K::CondBonus { .. } => Opcode::CondBonus,
            K::TextTake { .. } => Opcode::TextTake,
            K::YesNo { .. } => Opcode::YesNo,
            K::StopRoute => Opcode::StopRoute,
            K::CondRoute { .. } => Opcode::CondRoute,
            K::InitJumpExit { .. } => Opcode::InitJumpExit,
            K::InitView { .. } => Opcode::InitView,
            K::InitObjFrame { .. } => Opcode::InitObjFrame,
            K::OldSong { .. } => Opcode::OldSong,
        }
    }
}
