//! Opcode-tagged record codec shared by the table loader and save files.
//!
//! A record is the opcode byte followed by big-endian fields whose widths
//! depend on the opcode. The terminator (`0xFF`) carries no fields at all.

use std::io::{self, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::action::{ActionKind, Opcode};
use crate::error::FormatError;

/// Reads one complete record, opcode byte included.
pub fn read_record<R: Read>(reader: &mut R) -> Result<(i16, ActionKind), FormatError> {
    let raw = reader.read_u8()?;
    let opcode = Opcode::try_from(raw).map_err(FormatError::UnknownOpcode)?;
    Ok(read_body(reader, opcode)?)
}

fn read_flag<R: Read>(reader: &mut R) -> io::Result<bool> {
    Ok(reader.read_u8()? == 1)
}

/// Reads the fields that follow an already-consumed opcode byte.
pub(crate) fn read_body<R: Read>(r: &mut R, opcode: Opcode) -> io::Result<(i16, ActionKind)> {
    use ActionKind as K;

    if opcode == Opcode::Null {
        return Ok((0, K::Null));
    }

    let timer = r.read_i16::<BigEndian>()?;
    let kind = match opcode {
        Opcode::Null => K::Null,
        Opcode::Schedule => K::Schedule {
            list: r.read_u16::<BigEndian>()?,
        },
        Opcode::StartObj => K::StartObj {
            obj: r.read_i16::<BigEndian>()?,
            cycle_numb: r.read_i16::<BigEndian>()?,
            cycle: r.read_u8()?,
        },
        Opcode::InitObjXy => K::InitObjXy {
            obj: r.read_i16::<BigEndian>()?,
            x: r.read_i16::<BigEndian>()?,
            y: r.read_i16::<BigEndian>()?,
        },
        Opcode::Prompt => {
            let prompt = r.read_i16::<BigEndian>()?;
            let count = r.read_u16::<BigEndian>()?;
            let mut responses = Vec::with_capacity(usize::from(count));
            for _ in 0..count {
                responses.push(r.read_i16::<BigEndian>()?);
            }
            K::Prompt {
                prompt,
                responses,
                pass: r.read_u16::<BigEndian>()?,
                fail: r.read_u16::<BigEndian>()?,
                encoded: read_flag(r)?,
            }
        }
        Opcode::BackgroundColor => K::BackgroundColor {
            color: r.read_u32::<BigEndian>()?,
        },
        Opcode::InitObjVxy => K::InitObjVxy {
            obj: r.read_i16::<BigEndian>()?,
            vx: r.read_i16::<BigEndian>()?,
            vy: r.read_i16::<BigEndian>()?,
        },
        Opcode::InitCarry => K::InitCarry {
            obj: r.read_i16::<BigEndian>()?,
            carried: read_flag(r)?,
        },
        Opcode::InitHeroFeetCoord => K::InitHeroFeetCoord {
            obj: r.read_i16::<BigEndian>()?,
        },
        Opcode::NewScreen => K::NewScreen {
            screen: r.read_i16::<BigEndian>()?,
        },
        Opcode::InitObjState => K::InitObjState {
            obj: r.read_i16::<BigEndian>()?,
            state: r.read_u8()?,
        },
        Opcode::InitPath => K::InitPath {
            obj: r.read_i16::<BigEndian>()?,
            path: r.read_i16::<BigEndian>()?,
            vx: r.read_u8()?,
            vy: r.read_u8()?,
        },
        Opcode::CondState => K::CondState {
            obj: r.read_i16::<BigEndian>()?,
            state: r.read_u8()?,
            pass: r.read_u16::<BigEndian>()?,
            fail: r.read_u16::<BigEndian>()?,
        },
        Opcode::Text => K::Text {
            string: r.read_i16::<BigEndian>()?,
        },
        Opcode::SwapImages => K::SwapImages {
            obj1: r.read_i16::<BigEndian>()?,
            obj2: r.read_i16::<BigEndian>()?,
        },
        Opcode::CondScreen => K::CondScreen {
            obj: r.read_i16::<BigEndian>()?,
            screen: r.read_i16::<BigEndian>()?,
            pass: r.read_u16::<BigEndian>()?,
            fail: r.read_u16::<BigEndian>()?,
        },
        Opcode::Autopilot => K::Autopilot {
            obj1: r.read_i16::<BigEndian>()?,
            obj2: r.read_i16::<BigEndian>()?,
            dx: r.read_u8()?,
            dy: r.read_u8()?,
        },
        Opcode::InitObjSeq => K::InitObjSeq {
            obj: r.read_i16::<BigEndian>()?,
            seq: r.read_i16::<BigEndian>()?,
        },
        Opcode::SetStateBits => K::SetStateBits {
            obj: r.read_i16::<BigEndian>()?,
            mask: r.read_i16::<BigEndian>()?,
        },
        Opcode::ClearStateBits => K::ClearStateBits {
            obj: r.read_i16::<BigEndian>()?,
            mask: r.read_i16::<BigEndian>()?,
        },
        Opcode::TestStateBits => K::TestStateBits {
            obj: r.read_i16::<BigEndian>()?,
            mask: r.read_i16::<BigEndian>()?,
            pass: r.read_u16::<BigEndian>()?,
            fail: r.read_u16::<BigEndian>()?,
        },
        Opcode::DelEvents => K::DelEvents {
            target: r.read_u8()?,
        },
        Opcode::GameOver => K::GameOver,
        Opcode::InitHeroHeadCoord => K::InitHeroHeadCoord {
            obj: r.read_i16::<BigEndian>()?,
        },
        Opcode::Exit => K::Exit,
        Opcode::Bonus => K::Bonus {
            point: r.read_i16::<BigEndian>()?,
        },
        Opcode::CondBox => K::CondBox {
            obj: r.read_i16::<BigEndian>()?,
            x1: r.read_i16::<BigEndian>()?,
            y1: r.read_i16::<BigEndian>()?,
            x2: r.read_i16::<BigEndian>()?,
            y2: r.read_i16::<BigEndian>()?,
            pass: r.read_u16::<BigEndian>()?,
            fail: r.read_u16::<BigEndian>()?,
        },
        Opcode::Sound => K::Sound {
            sound: r.read_i16::<BigEndian>()?,
        },
        Opcode::AddScore => K::AddScore {
            obj: r.read_i16::<BigEndian>()?,
        },
        Opcode::SubScore => K::SubScore {
            obj: r.read_i16::<BigEndian>()?,
        },
        Opcode::CondCarry => K::CondCarry {
            obj: r.read_i16::<BigEndian>()?,
            pass: r.read_u16::<BigEndian>()?,
            fail: r.read_u16::<BigEndian>()?,
        },
        Opcode::InitMaze => K::InitMaze {
            size: r.read_u8()?,
            x1: r.read_i16::<BigEndian>()?,
            y1: r.read_i16::<BigEndian>()?,
            x2: r.read_i16::<BigEndian>()?,
            y2: r.read_i16::<BigEndian>()?,
            x3: r.read_i16::<BigEndian>()?,
            x4: r.read_i16::<BigEndian>()?,
            first_screen: r.read_u8()?,
        },
        Opcode::ExitMaze => K::ExitMaze,
        Opcode::InitPriority => K::InitPriority {
            obj: r.read_i16::<BigEndian>()?,
            priority: r.read_u8()?,
        },
        Opcode::InitScreen => K::InitScreen {
            obj: r.read_i16::<BigEndian>()?,
            screen: r.read_i16::<BigEndian>()?,
        },
        Opcode::GlobalSchedule => K::GlobalSchedule {
            list: r.read_u16::<BigEndian>()?,
        },
        Opcode::RemapPalette => K::RemapPalette {
            old: r.read_i16::<BigEndian>()?,
            new: r.read_i16::<BigEndian>()?,
        },
        Opcode::CondNoun => K::CondNoun {
            noun: r.read_u16::<BigEndian>()?,
            pass: r.read_u16::<BigEndian>()?,
            fail: r.read_u16::<BigEndian>()?,
        },
        Opcode::ScreenState => K::ScreenState {
            screen: r.read_i16::<BigEndian>()?,
            state: r.read_u8()?,
        },
        Opcode::InitLips => K::InitLips {
            lips_obj: r.read_i16::<BigEndian>()?,
            obj: r.read_i16::<BigEndian>()?,
            dx: r.read_i8()?,
            dy: r.read_i8()?,
        },
        Opcode::InitStoryMode => K::InitStoryMode {
            enabled: read_flag(r)?,
        },
        Opcode::Warn => K::Warn {
            string: r.read_i16::<BigEndian>()?,
        },
        Opcode::CondBonus => K::CondBonus {
            bonus: r.read_i16::<BigEndian>()?,
            pass: r.read_u16::<BigEndian>()?,
            fail: r.read_u16::<BigEndian>()?,
        },
        Opcode::TextTake => K::TextTake {
            obj: r.read_i16::<BigEndian>()?,
        },
        Opcode::YesNo => K::YesNo {
            prompt: r.read_i16::<BigEndian>()?,
            yes: r.read_u16::<BigEndian>()?,
            no: r.read_u16::<BigEndian>()?,
        },
        Opcode::StopRoute => K::StopRoute,
        Opcode::CondRoute => K::CondRoute {
            route: r.read_i16::<BigEndian>()?,
            pass: r.read_u16::<BigEndian>()?,
            fail: r.read_u16::<BigEndian>()?,
        },
        Opcode::InitJumpExit => K::InitJumpExit {
            enabled: read_flag(r)?,
        },
        Opcode::InitView => K::InitView {
            obj: r.read_i16::<BigEndian>()?,
            view_x: r.read_i16::<BigEndian>()?,
            view_y: r.read_i16::<BigEndian>()?,
            direction: r.read_i16::<BigEndian>()?,
        },
        Opcode::InitObjFrame => K::InitObjFrame {
            obj: r.read_i16::<BigEndian>()?,
            seq: r.read_i16::<BigEndian>()?,
            frame: r.read_i16::<BigEndian>()?,
        },
        Opcode::OldSong => K::OldSong {
            song: r.read_u16::<BigEndian>()?,
        },
    };
    Ok((timer, kind))
}

/// Writes one record in the same layout [`read_record`] accepts.
pub fn write_record<W: Write>(w: &mut W, timer: i16, kind: &ActionKind) -> io::Result<()> {
    use ActionKind as K;

    w.write_u8(kind.opcode().as_u8())?;
    if matches!(kind, K::Null) {
        return Ok(());
    }
    w.write_i16::<BigEndian>(timer)?;

    match kind {
        K::Null | K::GameOver | K::Exit | K::ExitMaze | K::StopRoute => {}
        K::Schedule { list } | K::GlobalSchedule { list } => w.write_u16::<BigEndian>(*list)?,
        K::StartObj {
            obj,
            cycle_numb,
            cycle,
        } => {
            w.write_i16::<BigEndian>(*obj)?;
            w.write_i16::<BigEndian>(*cycle_numb)?;
            w.write_u8(*cycle)?;
        }
        K::InitObjXy { obj, x, y } => {
            w.write_i16::<BigEndian>(*obj)?;
            w.write_i16::<BigEndian>(*x)?;
            w.write_i16::<BigEndian>(*y)?;
        }
        K::Prompt {
            prompt,
            responses,
            pass,
            fail,
            encoded,
        } => {
            w.write_i16::<BigEndian>(*prompt)?;
            let count = u16::try_from(responses.len()).map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidInput, "too many prompt responses")
            })?;
            w.write_u16::<BigEndian>(count)?;
            for response in responses {
                w.write_i16::<BigEndian>(*response)?;
            }
            w.write_u16::<BigEndian>(*pass)?;
            w.write_u16::<BigEndian>(*fail)?;
            w.write_u8(u8::from(*encoded))?;
        }
        K::BackgroundColor { color } => w.write_u32::<BigEndian>(*color)?,
        K::InitObjVxy { obj, vx, vy } => {
            w.write_i16::<BigEndian>(*obj)?;
            w.write_i16::<BigEndian>(*vx)?;
            w.write_i16::<BigEndian>(*vy)?;
        }
        K::InitCarry { obj, carried } => {
            w.write_i16::<BigEndian>(*obj)?;
            w.write_u8(u8::from(*carried))?;
        }
        K::InitHeroFeetCoord { obj }
        | K::InitHeroHeadCoord { obj }
        | K::AddScore { obj }
        | K::SubScore { obj }
        | K::TextTake { obj } => w.write_i16::<BigEndian>(*obj)?,
        K::NewScreen { screen } => w.write_i16::<BigEndian>(*screen)?,
        K::InitObjState { obj, state } => {
            w.write_i16::<BigEndian>(*obj)?;
            w.write_u8(*state)?;
        }
        K::InitPath { obj, path, vx, vy } => {
            w.write_i16::<BigEndian>(*obj)?;
            w.write_i16::<BigEndian>(*path)?;
            w.write_u8(*vx)?;
            w.write_u8(*vy)?;
        }
        K::CondState {
            obj,
            state,
            pass,
            fail,
        } => {
            w.write_i16::<BigEndian>(*obj)?;
            w.write_u8(*state)?;
            w.write_u16::<BigEndian>(*pass)?;
            w.write_u16::<BigEndian>(*fail)?;
        }
        K::Text { string } | K::Warn { string } => w.write_i16::<BigEndian>(*string)?,
        K::SwapImages { obj1, obj2 } => {
            w.write_i16::<BigEndian>(*obj1)?;
            w.write_i16::<BigEndian>(*obj2)?;
        }
        K::CondScreen {
            obj,
            screen,
            pass,
            fail,
        } => {
            w.write_i16::<BigEndian>(*obj)?;
            w.write_i16::<BigEndian>(*screen)?;
            w.write_u16::<BigEndian>(*pass)?;
            w.write_u16::<BigEndian>(*fail)?;
        }
        K::Autopilot { obj1, obj2, dx, dy } => {
            w.write_i16::<BigEndian>(*obj1)?;
            w.write_i16::<BigEndian>(*obj2)?;
            w.write_u8(*dx)?;
            w.write_u8(*dy)?;
        }
        K::InitObjSeq { obj, seq } => {
            w.write_i16::<BigEndian>(*obj)?;
            w.write_i16::<BigEndian>(*seq)?;
        }
        K::SetStateBits { obj, mask } | K::ClearStateBits { obj, mask } => {
            w.write_i16::<BigEndian>(*obj)?;
            w.write_i16::<BigEndian>(*mask)?;
        }
        K::TestStateBits {
            obj,
            mask,
            pass,
            fail,
        } => {
            w.write_i16::<BigEndian>(*obj)?;
            w.write_i16::<BigEndian>(*mask)?;
            w.write_u16::<BigEndian>(*pass)?;
            w.write_u16::<BigEndian>(*fail)?;
        }
        K::DelEvents { target } => w.write_u8(*target)?,
        K::Bonus { point } => w.write_i16::<BigEndian>(*point)?,
        K::CondBox {
            obj,
            x1,
            y1,
            x2,
            y2,
            pass,
            fail,
        } => {
            for value in [*obj, *x1, *y1, *x2, *y2] {
                w.write_i16::<BigEndian>(value)?;
            }
            w.write_u16::<BigEndian>(*pass)?;
            w.write_u16::<BigEndian>(*fail)?;
        }
        K::Sound { sound } => w.write_i16::<BigEndian>(*sound)?,
        K::CondCarry { obj, pass, fail } => {
            w.write_i16::<BigEndian>(*obj)?;
            w.write_u16::<BigEndian>(*pass)?;
            w.write_u16::<BigEndian>(*fail)?;
        }
        K::InitMaze {
            size,
            x1,
            y1,
            x2,
            y2,
            x3,
            x4,
            first_screen,
        } => {
            w.write_u8(*size)?;
            for value in [*x1, *y1, *x2, *y2, *x3, *x4] {
                w.write_i16::<BigEndian>(value)?;
            }
            w.write_u8(*first_screen)?;
        }
        K::InitPriority { obj, priority } => {
            w.write_i16::<BigEndian>(*obj)?;
            w.write_u8(*priority)?;
        }
        K::InitScreen { obj, screen } => {
            w.write_i16::<BigEndian>(*obj)?;
            w.write_i16::<BigEndian>(*screen)?;
        }
        K::RemapPalette { old, new } => {
            w.write_i16::<BigEndian>(*old)?;
            w.write_i16::<BigEndian>(*new)?;
        }
        K::CondNoun { noun, pass, fail } => {
            w.write_u16::<BigEndian>(*noun)?;
            w.write_u16::<BigEndian>(*pass)?;
            w.write_u16::<BigEndian>(*fail)?;
        }
        K::ScreenState { screen, state } => {
            w.write_i16::<BigEndian>(*screen)?;
            w.write_u8(*state)?;
        }
        K::InitLips {
            lips_obj,
            obj,
            dx,
            dy,
        } => {
            w.write_i16::<BigEndian>(*lips_obj)?;
            w.write_i16::<BigEndian>(*obj)?;
            w.write_i8(*dx)?;
            w.write_i8(*dy)?;
        }
        K::InitStoryMode { enabled } | K::InitJumpExit { enabled } => {
            w.write_u8(u8::from(*enabled))?
        }
        K::CondBonus { bonus, pass, fail } => {
            w.write_i16::<BigEndian>(*bonus)?;
            w.write_u16::<BigEndian>(*pass)?;
            w.write_u16::<BigEndian>(*fail)?;
        }
        K::YesNo { prompt, yes, no } => {
            w.write_i16::<BigEndian>(*prompt)?;
            w.write_u16::<BigEndian>(*yes)?;
            w.write_u16::<BigEndian>(*no)?;
        }
        K::CondRoute { route, pass, fail } => {
            w.write_i16::<BigEndian>(*route)?;
            w.write_u16::<BigEndian>(*pass)?;
            w.write_u16::<BigEndian>(*fail)?;
        }
        K::InitView {
            obj,
            view_x,
            view_y,
            direction,
        } => {
            for value in [*obj, *view_x, *view_y, *direction] {
                w.write_i16::<BigEndian>(value)?;
            }
        }
        K::InitObjFrame { obj, seq, frame } => {
            w.write_i16::<BigEndian>(*obj)?;
            w.write_i16::<BigEndian>(*seq)?;
            w.write_i16::<BigEndian>(*frame)?;
        }
        K::OldSong { song } => w.write_u16::<BigEndian>(*song)?,
    }
    Ok(())
}
