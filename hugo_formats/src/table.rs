use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use anyhow::Context;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;

use crate::action::{Action, ActionKind, ActionRef, Opcode};
use crate::error::FormatError;
use crate::record::{read_body, write_record};

/// Ordered run of actions for one scripted scene or trigger. The last entry
/// is always the [`ActionKind::Null`] terminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionList {
    actions: Vec<Action>,
}

impl ActionList {
    /// Builds a list from payloads, tagging each action and appending the terminator.
    ///
    /// A stored terminator ends the list early; anything after it is dropped.
    pub fn from_kinds<I>(list: u16, kinds: I) -> Result<Self, FormatError>
    where
        I: IntoIterator<Item = (i16, ActionKind)>,
    {
        let mut actions = Vec::new();
        for (timer, kind) in kinds {
            if kind == ActionKind::Null {
                break;
            }
            let offset = tag_offset(list, actions.len())?;
            actions.push(Action {
                tag: ActionRef::new(list, offset),
                timer,
                kind,
            });
        }
        let offset = tag_offset(list, actions.len())?;
        actions.push(Action {
            tag: ActionRef::new(list, offset),
            timer: 0,
            kind: ActionKind::Null,
        });
        Ok(Self { actions })
    }

    /// Every action including the terminator.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Actions before the terminator.
    pub fn body(&self) -> &[Action] {
        &self.actions[..self.actions.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.body().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn tag_offset(list: u16, index: usize) -> Result<u16, FormatError> {
    // 0xFFFF is reserved for "no action" in packed references.
    match u16::try_from(index) {
        Ok(offset) if offset != u16::MAX => Ok(offset),
        _ => Err(FormatError::ListTooLong {
            list: usize::from(list),
            len: index,
        }),
    }
}

/// All action lists of the selected game variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionTable {
    lists: Vec<ActionList>,
}

impl ActionTable {
    pub fn new(lists: Vec<ActionList>) -> Self {
        Self { lists }
    }

    /// Opens a script resource from disk and loads one variant from it.
    pub fn open<P: AsRef<Path>>(
        path: P,
        variant_count: usize,
        selected: usize,
    ) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("opening script resource {}", path.display()))?;
        let mut reader = BufReader::new(file);
        let table = Self::load(&mut reader, variant_count, selected)
            .with_context(|| format!("parsing action lists in {}", path.display()))?;
        Ok(table)
    }

    /// Reads every variant section in order and keeps only `selected`.
    ///
    /// Each section is a `u16` list count followed by the lists; each list is a
    /// `u16` record count followed by records. Sections that are not selected
    /// are decoded and dropped so the reader ends up past the last section.
    /// Records counted after a list's first terminator are read and discarded.
    pub fn load<R: Read>(
        reader: &mut R,
        variant_count: usize,
        selected: usize,
    ) -> Result<Self, FormatError> {
        if selected >= variant_count {
            return Err(FormatError::VariantOutOfRange {
                selected,
                count: variant_count,
            });
        }

        let mut table = ActionTable::default();
        for variant in 0..variant_count {
            let list_count = reader.read_u16::<BigEndian>()?;
            let keep = variant == selected;
            log::debug!(
                "action table variant {variant}: {list_count} lists ({})",
                if keep { "loading" } else { "skipping" }
            );

            for list in 0..list_count {
                let record_count = reader.read_u16::<BigEndian>()?;
                let mut kinds = Vec::with_capacity(if keep { usize::from(record_count) } else { 0 });
                for index in 0..usize::from(record_count) {
                    let raw = reader.read_u8()?;
                    let opcode =
                        Opcode::try_from(raw).map_err(|opcode| FormatError::UnknownOpcodeAt {
                            opcode,
                            variant,
                            list: usize::from(list),
                            index,
                        })?;
                    let record = read_body(reader, opcode)?;
                    if keep {
                        kinds.push(record);
                    }
                }
                if keep {
                    let parsed = ActionList::from_kinds(list, kinds)?;
                    if parsed.len() < usize::from(record_count) {
                        log::trace!(
                            "list {list}: terminator after {} of {record_count} records",
                            parsed.len()
                        );
                    }
                    table.lists.push(parsed);
                }
            }
        }
        Ok(table)
    }

    /// Emits the table as a single variant section, the inverse of [`ActionTable::load`]
    /// with `variant_count == 1`.
    pub fn write_variant<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let count = u16::try_from(self.lists.len()).map_err(|_| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "too many action lists")
        })?;
        writer.write_u16::<BigEndian>(count)?;
        for list in &self.lists {
            // Bounded by tag_offset at construction.
            writer.write_u16::<BigEndian>(list.len() as u16)?;
            for action in list.body() {
                write_record(writer, action.timer, &action.kind)?;
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    pub fn list(&self, id: u16) -> Option<&ActionList> {
        self.lists.get(usize::from(id))
    }

    pub fn lists(&self) -> &[ActionList] {
        &self.lists
    }

    pub fn get(&self, reference: ActionRef) -> Option<&Action> {
        self.list(reference.list)?
            .actions
            .get(usize::from(reference.offset))
    }

    /// Mutable access for the few payload fields scripts rewrite at runtime.
    pub fn get_mut(&mut self, reference: ActionRef) -> Option<&mut Action> {
        self.lists
            .get_mut(usize::from(reference.list))?
            .actions
            .get_mut(usize::from(reference.offset))
    }

    /// Every action of every list, terminators included, in storage order.
    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.lists.iter().flat_map(|list| list.actions.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Action> {
        self.lists.iter_mut().flat_map(|list| list.actions.iter_mut())
    }
}

/// Reads a section holding one `u16` per variant and returns the selected one.
pub fn read_variant_index<R: Read>(
    reader: &mut R,
    variant_count: usize,
    selected: usize,
) -> Result<u16, FormatError> {
    if selected >= variant_count {
        return Err(FormatError::VariantOutOfRange {
            selected,
            count: variant_count,
        });
    }
    let mut chosen = 0;
    for variant in 0..variant_count {
        let value = reader.read_u16::<BigEndian>()?;
        if variant == selected {
            chosen = value;
        }
    }
    Ok(chosen)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn push_list(out: &mut Vec<u8>, records: &[(i16, ActionKind)]) {
        out.extend_from_slice(&(records.len() as u16).to_be_bytes());
        for (timer, kind) in records {
            write_record(out, *timer, kind).unwrap();
        }
    }

    /// Four variants with hand-counted section sizes.
    fn four_variant_fixture() -> (Vec<u8>, usize) {
        let mut data = Vec::new();
        let mut expected = 0usize;

        // variant 0: one list with a NewScreen (1 + 2 + 2 bytes)
        data.extend_from_slice(&1u16.to_be_bytes());
        push_list(&mut data, &[(0, ActionKind::NewScreen { screen: 3 })]);
        expected += 2 + 2 + 5;

        // variant 1: two lists, a prompt (1+2+2+2+2*3+2+2+1 = 18) and an empty list
        data.extend_from_slice(&2u16.to_be_bytes());
        push_list(
            &mut data,
            &[(
                1,
                ActionKind::Prompt {
                    prompt: 5,
                    responses: vec![1, 2, 3],
                    pass: 0,
                    fail: 1,
                    encoded: false,
                },
            )],
        );
        push_list(&mut data, &[]);
        expected += 2 + (2 + 18) + 2;

        // variant 2 (selected): schedule (5), text (5), state test (11)
        data.extend_from_slice(&2u16.to_be_bytes());
        push_list(
            &mut data,
            &[
                (0, ActionKind::Schedule { list: 1 }),
                (10, ActionKind::Text { string: 22 }),
            ],
        );
        push_list(
            &mut data,
            &[(
                5,
                ActionKind::TestStateBits {
                    obj: 2,
                    mask: 0b011,
                    pass: 0,
                    fail: 1,
                },
            )],
        );
        expected += 2 + (2 + 5 + 5) + (2 + 11);

        // variant 3: one list with background color (1 + 2 + 4) and game over (3)
        data.extend_from_slice(&1u16.to_be_bytes());
        push_list(
            &mut data,
            &[
                (0, ActionKind::BackgroundColor { color: 0x00FF_00FF }),
                (9, ActionKind::GameOver),
            ],
        );
        expected += 2 + (2 + 7 + 3);

        (data, expected)
    }

    #[test]
    fn loading_one_variant_consumes_every_section() {
        let (mut data, expected) = four_variant_fixture();
        assert_eq!(data.len(), expected);
        data.extend_from_slice(b"TAIL");

        let mut cursor = Cursor::new(data.as_slice());
        let table = ActionTable::load(&mut cursor, 4, 2).unwrap();
        assert_eq!(cursor.position() as usize, expected);

        assert_eq!(table.len(), 2);
        let first = table.list(0).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first.actions().len(), 3);
        assert!(first.actions()[2].is_sentinel());
        assert_eq!(first.actions()[1].timer, 10);
        assert_eq!(first.actions()[1].tag, ActionRef::new(0, 1));
        assert_eq!(
            table.get(ActionRef::new(1, 0)).map(Action::opcode),
            Some(Opcode::TestStateBits)
        );
    }

    #[test]
    fn unknown_opcode_in_skipped_variant_aborts() {
        let mut data = Vec::new();
        data.extend_from_slice(&1u16.to_be_bytes());
        data.extend_from_slice(&1u16.to_be_bytes());
        data.push(77);
        data.extend_from_slice(&[0, 0]);

        let err = ActionTable::load(&mut Cursor::new(data.as_slice()), 2, 1).unwrap_err();
        match err {
            FormatError::UnknownOpcodeAt {
                opcode,
                variant,
                list,
                index,
            } => {
                assert_eq!((opcode, variant, list, index), (77, 0, 0, 0));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn truncated_resource_fails() {
        let (data, _) = four_variant_fixture();
        let err = ActionTable::load(&mut Cursor::new(&data[..data.len() - 1]), 4, 0).unwrap_err();
        assert!(err.is_truncation());
    }

    #[test]
    fn selected_variant_must_exist() {
        let err = ActionTable::load(&mut Cursor::new(&[][..]), 2, 2).unwrap_err();
        assert!(matches!(
            err,
            FormatError::VariantOutOfRange {
                selected: 2,
                count: 2
            }
        ));
    }

    #[test]
    fn write_variant_reloads_identically() {
        let (data, _) = four_variant_fixture();
        let table = ActionTable::load(&mut Cursor::new(data.as_slice()), 4, 2).unwrap();

        let mut single = Vec::new();
        table.write_variant(&mut single).unwrap();
        let reloaded = ActionTable::load(&mut Cursor::new(single.as_slice()), 1, 0).unwrap();
        assert_eq!(reloaded, table);
    }

    #[test]
    fn stored_terminator_closes_the_list() {
        let mut data = Vec::new();
        data.extend_from_slice(&2u16.to_be_bytes());
        push_list(
            &mut data,
            &[
                (1, ActionKind::Text { string: 1 }),
                (0, ActionKind::Null),
            ],
        );
        push_list(
            &mut data,
            &[
                (1, ActionKind::Text { string: 1 }),
                (0, ActionKind::Null),
                (2, ActionKind::Text { string: 2 }),
            ],
        );
        let expected = data.len();
        data.extend_from_slice(b"TAIL");

        let mut cursor = Cursor::new(data.as_slice());
        let table = ActionTable::load(&mut cursor, 1, 0).unwrap();
        assert_eq!(cursor.position() as usize, expected);

        for id in 0..2 {
            let list = table.list(id).unwrap();
            assert_eq!(list.len(), 1, "list {id}");
            assert_eq!(list.actions().len(), 2);
            assert!(list.actions()[1].is_sentinel());
            assert_eq!(list.body()[0].kind, ActionKind::Text { string: 1 });
        }
        assert!(table.get(ActionRef::new(1, 2)).is_none());
        assert_eq!(table.iter().filter(|action| action.is_sentinel()).count(), 2);
    }

    #[test]
    fn variant_index_picks_selected_word() {
        let data = [0u8, 10, 0, 20, 0, 30];
        let mut cursor = Cursor::new(&data[..]);
        assert_eq!(read_variant_index(&mut cursor, 3, 1).unwrap(), 20);
        assert_eq!(cursor.position(), 6);
    }

    #[test]
    fn open_reads_from_disk() {
        use std::io::Write as _;

        let (data, _) = four_variant_fixture();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&data).unwrap();

        let table = ActionTable::open(file.path(), 4, 3).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.list(0).unwrap().actions()[1].kind,
            ActionKind::GameOver
        );
    }
}
