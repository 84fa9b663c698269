use hugo_engine::{
    ActionKind, ActionList, ActionRef, ActionTable, Clock, EventScope, GameRelease, HeroBounds,
    GameStatus, HostEvent, ObjectStore, Opcode, SandboxHost, Scheduler, SchedulerConfig,
};

fn table(lists: Vec<Vec<(i16, ActionKind)>>) -> ActionTable {
    ActionTable::new(
        lists
            .into_iter()
            .enumerate()
            .map(|(id, kinds)| ActionList::from_kinds(id as u16, kinds).unwrap())
            .collect(),
    )
}

fn scheduler_at(tick: u32, lists: Vec<Vec<(i16, ActionKind)>>) -> Scheduler {
    Scheduler::new(&SchedulerConfig::default(), table(lists))
        .unwrap()
        .with_clock(Clock::manual(tick))
}

fn texts(host: &SandboxHost) -> Vec<i16> {
    host.events()
        .iter()
        .filter_map(|event| match event {
            HostEvent::Text { string } => Some(*string),
            _ => None,
        })
        .collect()
}

#[test]
fn delays_dispatch_in_deadline_order() {
    let mut scheduler = scheduler_at(
        100,
        vec![vec![
            (5, ActionKind::Text { string: 5 }),
            (1, ActionKind::Text { string: 1 }),
            (3, ActionKind::Text { string: 3 }),
        ]],
    );
    let mut host = SandboxHost::new();
    assert_eq!(scheduler.insert_action_list(0).unwrap(), 3);

    let mut fired = Vec::new();
    for _ in 100..=106 {
        let report = scheduler.run(&mut host).unwrap();
        for dispatched in report.dispatched {
            fired.push((report.tick, dispatched.time, dispatched.action));
        }
        scheduler.clock_mut().advance(1);
    }

    assert_eq!(
        fired,
        vec![
            (101, 101, ActionRef::new(0, 1)),
            (103, 103, ActionRef::new(0, 2)),
            (105, 105, ActionRef::new(0, 0)),
        ]
    );
    assert_eq!(texts(&host), vec![1, 3, 5]);
    assert!(scheduler.queue().is_empty());
    assert_eq!(scheduler.queue().free_len(), scheduler.queue().capacity());
}

fn state_bits_script() -> Vec<Vec<(i16, ActionKind)>> {
    vec![
        vec![(
            0,
            ActionKind::TestStateBits {
                obj: 1,
                mask: 0b011,
                pass: 1,
                fail: 2,
            },
        )],
        vec![(0, ActionKind::Text { string: 100 })],
        vec![(0, ActionKind::Text { string: 200 })],
    ]
}

#[test]
fn state_bit_test_requires_every_masked_bit() {
    for (state, expected) in [(0b111, 100), (0b100, 200), (0b001, 200)] {
        let mut scheduler = scheduler_at(0, state_bits_script());
        let mut host = SandboxHost::new();
        host.object_mut(1).unwrap().state = state;

        scheduler.insert_action_list(0).unwrap();
        let report = scheduler.run(&mut host).unwrap();

        // the branch list is due immediately and runs in the same pass
        assert_eq!(report.dispatched.len(), 2, "state {state:#b}");
        assert_eq!(texts(&host), vec![expected], "state {state:#b}");
    }
}

#[test]
fn screen_change_flushes_only_local_events() {
    let mut scheduler = scheduler_at(
        0,
        vec![
            vec![
                (50, ActionKind::GlobalSchedule { list: 2 }),
                (10, ActionKind::Text { string: 1 }),
                (60, ActionKind::GlobalSchedule { list: 2 }),
                (20, ActionKind::Sound { sound: 4 }),
            ],
            vec![(2, ActionKind::Text { string: 9 })],
            vec![],
        ],
    );
    let mut host = SandboxHost::new();
    host.screen_actions.insert(5, vec![1]);
    scheduler.insert_action_list(0).unwrap();

    let globals_before: Vec<_> = scheduler
        .events()
        .filter(|(_, event)| event.scope() == EventScope::Global)
        .map(|(id, event)| (id, event.action(), event.time()))
        .collect();
    assert_eq!(globals_before.len(), 2);

    scheduler.new_screen(&mut host, 5).unwrap();

    let globals_after: Vec<_> = scheduler
        .events()
        .filter(|(_, event)| event.scope() == EventScope::Global)
        .map(|(id, event)| (id, event.action(), event.time()))
        .collect();
    assert_eq!(globals_after, globals_before);

    let locals: Vec<_> = scheduler
        .events()
        .filter(|(_, event)| event.scope() == EventScope::Local)
        .map(|(_, event)| event.action())
        .collect();
    assert_eq!(locals, vec![Some(ActionRef::new(1, 0))]);

    assert_eq!(host.current_screen(), 5);
    assert!(host.events().contains(&HostEvent::EnterScreen { screen: 5 }));
    assert_eq!(host.events().last(), Some(&HostEvent::ScreenDisplay));
    scheduler.queue().check_invariants().unwrap();
}

#[test]
fn new_screen_action_ends_the_pass() {
    let mut scheduler = scheduler_at(
        0,
        vec![vec![
            (0, ActionKind::NewScreen { screen: 2 }),
            (0, ActionKind::Text { string: 7 }),
        ]],
    );
    let mut host = SandboxHost::new();
    scheduler.insert_action_list(0).unwrap();

    let report = scheduler.run(&mut host).unwrap();
    assert_eq!(report.dispatched.len(), 1);
    assert_eq!(report.dispatched[0].opcode, Opcode::NewScreen);
    assert_eq!(host.current_screen(), 2);
    assert!(texts(&host).is_empty());
    assert!(scheduler.queue().is_empty());
    assert_eq!(scheduler.queue().free_len(), scheduler.queue().capacity());
}

#[test]
fn delete_events_cancels_by_opcode() {
    let mut scheduler = scheduler_at(
        0,
        vec![vec![
            (
                0,
                ActionKind::DelEvents {
                    target: Opcode::Text.as_u8(),
                },
            ),
            (5, ActionKind::Text { string: 1 }),
            (5, ActionKind::Sound { sound: 3 }),
            (8, ActionKind::Text { string: 2 }),
        ]],
    );
    let mut host = SandboxHost::new();
    scheduler.insert_action_list(0).unwrap();
    scheduler.run(&mut host).unwrap();

    let remaining: Vec<_> = scheduler
        .events()
        .map(|(_, event)| event.action())
        .collect();
    assert_eq!(remaining, vec![Some(ActionRef::new(0, 2))]);
    scheduler.queue().check_invariants().unwrap();
}

#[test]
fn delete_events_may_cancel_itself() {
    let mut scheduler = scheduler_at(
        0,
        vec![vec![
            (
                0,
                ActionKind::DelEvents {
                    target: Opcode::DelEvents.as_u8(),
                },
            ),
            (0, ActionKind::Text { string: 4 }),
        ]],
    );
    let mut host = SandboxHost::new();
    scheduler.insert_action_list(0).unwrap();

    let report = scheduler.run(&mut host).unwrap();
    assert_eq!(report.dispatched.len(), 2);
    assert_eq!(texts(&host), vec![4]);
    assert!(scheduler.queue().is_empty());
}

fn prompt_script(encoded: bool) -> Vec<Vec<(i16, ActionKind)>> {
    vec![
        vec![(
            0,
            ActionKind::Prompt {
                prompt: 1,
                responses: vec![10, 11, -1],
                pass: 1,
                fail: 2,
                encoded,
            },
        )],
        vec![(0, ActionKind::Text { string: 100 })],
        vec![(0, ActionKind::Text { string: 200 })],
    ]
}

fn answer_prompt_with(
    release: GameRelease,
    encoded: bool,
    responses: [&str; 2],
    answer: &str,
) -> Vec<i16> {
    let mut scheduler = Scheduler::new(
        &SchedulerConfig::for_release(release),
        table(prompt_script(encoded)),
    )
    .unwrap()
    .with_clock(Clock::manual(0));
    let mut host = SandboxHost::new();
    host.strings.insert(10, responses[0].to_string());
    host.strings.insert(11, responses[1].to_string());
    host.prompt_replies.push_back(answer.to_string());

    scheduler.insert_action_list(0).unwrap();
    scheduler.run(&mut host).unwrap();
    texts(&host)
}

fn answer_prompt(release: GameRelease, answer: &str) -> Vec<i16> {
    answer_prompt_with(release, false, ["sesame", "door"], answer)
}

#[test]
fn prompt_matching_depends_on_release() {
    assert_eq!(answer_prompt(GameRelease::Hugo3Win, "Open The DOOR"), vec![100]);
    assert_eq!(answer_prompt(GameRelease::Hugo1Dos, "Open The DOOR"), vec![200]);
    assert_eq!(answer_prompt(GameRelease::Hugo1Dos, "open SESAME!"), vec![100]);
    assert_eq!(answer_prompt(GameRelease::Hugo2Dos, "nothing"), vec![200]);
}

#[test]
fn encoded_prompts_decode_the_answer_with_the_release_cipher() {
    for release in [GameRelease::Hugo1Dos, GameRelease::Hugo2Dos, GameRelease::Hugo3Win] {
        let decoded = release.profile().cipher.decode(b"xyzzy");
        let expected = String::from_utf8(decoded).unwrap();
        assert_ne!(expected, "xyzzy", "{release}");

        let accepted = [expected.as_str(), "door"];
        assert_eq!(
            answer_prompt_with(release, true, accepted, "XYZZY"),
            vec![100],
            "{release}: decoded answer"
        );
        assert_eq!(
            answer_prompt_with(release, false, accepted, "xyzzy"),
            vec![200],
            "{release}: plain answer"
        );
        assert_eq!(
            answer_prompt_with(release, true, ["xyzzy", "door"], "xyzzy"),
            vec![200],
            "{release}: undecoded response"
        );
    }
}

#[test]
fn bonus_is_scored_once() {
    let mut scheduler = scheduler_at(
        0,
        vec![vec![
            (0, ActionKind::Bonus { point: 3 }),
            (1, ActionKind::Bonus { point: 3 }),
            (1, ActionKind::SubScore { obj: 2 }),
        ]],
    );
    let mut host = SandboxHost::new();
    host.bonuses.insert(3, 25);
    host.object_mut(2).unwrap().value = 5;
    scheduler.insert_action_list(0).unwrap();

    scheduler.run(&mut host).unwrap();
    scheduler.clock_mut().advance(1);
    scheduler.run(&mut host).unwrap();

    assert_eq!(host.score, 20);
    assert!(host.scored.contains(&3));
}

#[test]
fn bounding_box_probe_uses_image_corner() {
    let lists = vec![
        vec![(
            0,
            ActionKind::CondBox {
                obj: 0,
                x1: 10,
                y1: 10,
                x2: 20,
                y2: 20,
                pass: 1,
                fail: 2,
            },
        )],
        vec![(0, ActionKind::Text { string: 100 })],
        vec![(0, ActionKind::Text { string: 200 })],
    ];
    for (x, y, expected) in [(5, 2, 100), (5, 3, 200), (4, 2, 200)] {
        let mut scheduler = scheduler_at(0, lists.clone());
        let mut host = SandboxHost::new();
        let hero = host.object_mut(0).unwrap();
        hero.x = x;
        hero.y = y;
        hero.image.x1 = 5;
        hero.image.y2 = 18;

        scheduler.insert_action_list(0).unwrap();
        scheduler.run(&mut host).unwrap();
        assert_eq!(texts(&host), vec![expected], "origin ({x}, {y})");
    }
}

#[test]
fn maze_exit_rewrites_and_schedules_the_maze_list() {
    let mut scheduler = scheduler_at(
        0,
        vec![
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
            vec![
                (0, ActionKind::InitObjXy { obj: 0, x: 0, y: 0 }),
                (0, ActionKind::Text { string: 1 }),
                (0, ActionKind::Text { string: 2 }),
                (0, ActionKind::NewScreen { screen: 0 }),
            ],
        ],
    )
    .with_maze_list(1);
    let mut host = SandboxHost::new();
    host.screen = 12;
    host.route = 3;
    host.object_mut(0).unwrap().y = 70;

    scheduler.insert_action_list(0).unwrap();
    scheduler.run(&mut host).unwrap();
    assert!(scheduler.maze().enabled);

    let inside = HeroBounds { x1: 100, x2: 120, y1: 70, y2: 110 };
    assert!(!scheduler.process_maze(&mut host, inside).unwrap());
    assert!(scheduler.queue().is_empty());

    let east = HeroBounds { x1: 290, x2: 301, y1: 70, y2: 110 };
    assert!(scheduler.process_maze(&mut host, east).unwrap());
    assert_eq!(host.route, -1);
    assert_eq!(scheduler.queue().len(), 4);
    assert_eq!(
        scheduler.table().get(ActionRef::new(1, 3)).unwrap().kind,
        ActionKind::NewScreen { screen: 13 }
    );
    assert_eq!(
        scheduler.table().get(ActionRef::new(1, 0)).unwrap().kind,
        ActionKind::InitObjXy { obj: 0, x: 25, y: 70 }
    );

    scheduler.clock_mut().advance(1);
    scheduler.run(&mut host).unwrap();
    assert_eq!(host.current_screen(), 13);
    assert_eq!(host.position(0), (25, 70));
}

#[test]
fn malformed_maze_list_is_left_untouched() {
    let mut scheduler = scheduler_at(
        0,
        vec![
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
            vec![
                (0, ActionKind::Text { string: 1 }),
                (0, ActionKind::Text { string: 2 }),
                (0, ActionKind::Text { string: 3 }),
                (0, ActionKind::NewScreen { screen: 0 }),
            ],
        ],
    )
    .with_maze_list(1);
    let mut host = SandboxHost::new();
    host.screen = 12;
    host.route = 3;
    scheduler.insert_action_list(0).unwrap();
    scheduler.run(&mut host).unwrap();
    let before = scheduler.table().clone();

    let east = HeroBounds { x1: 290, x2: 301, y1: 70, y2: 110 };
    let err = scheduler.process_maze(&mut host, east).unwrap_err();
    assert!(matches!(
        err,
        hugo_engine::SchedulerError::UnexpectedAction {
            expected: Opcode::InitObjXy,
            found: Opcode::Text,
            ..
        }
    ));
    assert_eq!(scheduler.table(), &before);
    assert_eq!(host.route, 3);
    assert!(scheduler.queue().is_empty());
}

#[test]
fn stored_terminator_ends_the_scheduled_list() {
    let mut scheduler = scheduler_at(
        0,
        vec![vec![
            (1, ActionKind::Text { string: 1 }),
            (0, ActionKind::Null),
            (2, ActionKind::Text { string: 2 }),
        ]],
    );
    let mut host = SandboxHost::new();
    assert_eq!(scheduler.insert_action_list(0).unwrap(), 1);
    assert_eq!(scheduler.queue().len(), 1);

    for _ in 0..4 {
        scheduler.run(&mut host).unwrap();
        scheduler.clock_mut().advance(1);
    }
    assert_eq!(texts(&host), vec![1]);
}

#[test]
fn unknown_lists_are_reported() {
    let mut scheduler = scheduler_at(0, vec![vec![(0, ActionKind::Schedule { list: 9 })]]);
    let mut host = SandboxHost::new();
    scheduler.insert_action_list(0).unwrap();

    let err = scheduler.run(&mut host).unwrap_err();
    assert!(matches!(err, hugo_engine::SchedulerError::UnknownList(9)));
    assert!(scheduler.insert_action_list(42).is_err());
}

#[test]
fn pool_exhaustion_is_fatal() {
    let config = SchedulerConfig {
        event_capacity: 2,
        ..SchedulerConfig::default()
    };
    let table = table(vec![vec![
        (1, ActionKind::Text { string: 1 }),
        (2, ActionKind::Text { string: 2 }),
        (3, ActionKind::Text { string: 3 }),
    ]]);
    let mut scheduler = Scheduler::new(&config, table).unwrap();

    let err = scheduler.insert_action_list(0).unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(err.category(), hugo_engine::ErrorCategory::ResourceExhausted);
}
