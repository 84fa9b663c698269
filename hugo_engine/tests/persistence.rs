use std::io::Cursor;

use hugo_engine::{
    ActionKind, ActionList, ActionRef, ActionTable, Clock, ErrorCategory, EventScope, HeroBounds,
    SandboxHost, Scheduler, SchedulerConfig, SchedulerError,
};

fn script() -> ActionTable {
    let lists = vec![
        vec![
            (5, ActionKind::Text { string: 5 }),
            (1, ActionKind::Text { string: 1 }),
            (7, ActionKind::GlobalSchedule { list: 2 }),
            (3, ActionKind::Sound { sound: 3 }),
        ],
        vec![
            (0, ActionKind::InitObjXy { obj: 0, x: 0, y: 0 }),
            (0, ActionKind::Text { string: 1 }),
            (0, ActionKind::Text { string: 2 }),
            (0, ActionKind::NewScreen { screen: 0 }),
        ],
        vec![(0, ActionKind::Text { string: 9 })],
        vec![(
            0,
            ActionKind::InitMaze {
                size: 4,
                x1: 20,
                y1: 40,
                x2: 300,
                y2: 180,
                x3: 150,
                x4: 160,
                first_screen: 10,
            },
        )],
    ];
    ActionTable::new(
        lists
            .into_iter()
            .enumerate()
            .map(|(id, kinds)| ActionList::from_kinds(id as u16, kinds).unwrap())
            .collect(),
    )
}

fn scheduler_at(tick: u32) -> Scheduler {
    Scheduler::new(&SchedulerConfig::default(), script())
        .unwrap()
        .with_clock(Clock::manual(tick))
        .with_maze_list(1)
}

fn snapshot(scheduler: &Scheduler) -> Vec<(Option<ActionRef>, EventScope, u32)> {
    scheduler
        .events()
        .map(|(_, event)| (event.action(), event.scope(), event.time()))
        .collect()
}

fn saved(scheduler: &Scheduler) -> Vec<u8> {
    let mut bytes = Vec::new();
    scheduler.save(&mut bytes).unwrap();
    bytes
}

#[test]
fn restore_rebases_times_to_the_current_tick() {
    let mut original = scheduler_at(100);
    original.insert_action_list(0).unwrap();
    let bytes = saved(&original);

    let mut restored = scheduler_at(1000);
    restored.restore(&mut Cursor::new(bytes)).unwrap();

    let before = snapshot(&original);
    let after = snapshot(&restored);
    assert_eq!(before.len(), 4);
    assert_eq!(after.len(), before.len());
    for ((action, scope, time), (action2, scope2, time2)) in before.iter().zip(&after) {
        assert_eq!(action, action2);
        assert_eq!(scope, scope2);
        assert_eq!(time - 100, time2 - 1000);
    }
    assert_eq!(restored.queue().free_len(), original.queue().free_len());
    restored.queue().check_invariants().unwrap();
}

#[test]
fn restored_queue_keeps_running() {
    let mut original = scheduler_at(100);
    original.insert_action_list(0).unwrap();
    let mut restored = scheduler_at(0);
    restored.restore(&mut Cursor::new(saved(&original))).unwrap();

    let mut host = SandboxHost::new();
    let mut fired = Vec::new();
    for _ in 0..8 {
        let report = restored.run(&mut host).unwrap();
        fired.extend(report.dispatched.into_iter().map(|d| (d.time, d.action)));
        restored.clock_mut().advance(1);
    }

    assert_eq!(
        fired,
        vec![
            (1, ActionRef::new(0, 1)),
            (3, ActionRef::new(0, 3)),
            (5, ActionRef::new(0, 0)),
            (7, ActionRef::new(0, 2)),
            (7, ActionRef::new(2, 0)),
        ]
    );
}

#[test]
fn maze_rewrites_survive_a_save() {
    let mut original = scheduler_at(0);
    let mut host = SandboxHost::new();
    host.screen = 12;
    original.insert_action_list(3).unwrap();
    original.run(&mut host).unwrap();
    let west = HeroBounds { x1: 10, x2: 30, y1: 60, y2: 100 };
    assert!(original.process_maze(&mut host, west).unwrap());

    let mut restored = scheduler_at(0);
    restored.restore(&mut Cursor::new(saved(&original))).unwrap();

    assert_eq!(
        restored.table().get(ActionRef::new(1, 3)).unwrap().kind,
        ActionKind::NewScreen { screen: 11 }
    );
    assert_eq!(restored.table(), original.table());
    assert_eq!(snapshot(&restored), snapshot(&original));
}

#[test]
fn truncated_save_is_an_io_failure_and_changes_nothing() {
    let mut original = scheduler_at(10);
    original.insert_action_list(0).unwrap();
    let mut bytes = saved(&original);
    bytes.truncate(bytes.len() - 3);

    let mut target = scheduler_at(50);
    target.insert_action_list(2).unwrap();
    let before = snapshot(&target);

    let err = target.restore(&mut Cursor::new(bytes)).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Io);
    assert!(!err.is_fatal());
    assert_eq!(snapshot(&target), before);
}

#[test]
fn out_of_range_cursor_is_rejected() {
    let original = scheduler_at(0);
    let mut bytes = saved(&original);
    // head index sits after the u32 save tick and the i16 free index
    bytes[6..8].copy_from_slice(&500i16.to_be_bytes());

    let mut target = scheduler_at(0);
    let err = target.restore(&mut Cursor::new(bytes)).unwrap_err();
    assert!(matches!(err, SchedulerError::CorruptSave(_)));
    assert!(err.is_fatal());
}

#[test]
fn mismatched_action_dump_is_rejected() {
    let mut original = scheduler_at(0);
    original.insert_action_list(0).unwrap();
    let mut bytes = saved(&original);

    // first record of the action dump: list 0 action 0, a Text opcode
    let dump_start = 4 + 3 * 2 + original.queue().capacity() * 13;
    bytes[dump_start] = hugo_engine::Opcode::Sound.as_u8();

    let mut target = scheduler_at(0);
    let err = target.restore(&mut Cursor::new(bytes)).unwrap_err();
    assert!(matches!(err, SchedulerError::CorruptSave(_)));
    assert!(target.queue().is_empty());
}

#[test]
fn empty_queue_round_trips() {
    let original = scheduler_at(42);
    let mut target = scheduler_at(7);
    target.insert_action_list(0).unwrap();
    target.restore(&mut Cursor::new(saved(&original))).unwrap();
    assert!(target.queue().is_empty());
    assert_eq!(target.queue().free_len(), target.queue().capacity());
}
