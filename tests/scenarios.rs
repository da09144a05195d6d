//! End-to-end session scenarios driven through the public API and bus.

use std::cell::RefCell;
use std::rc::Rc;

use skyhop::Tuning;
use skyhop::consts::SIM_DT;
use skyhop::sim::{
    GameEvent, GamePhase, SegmentId, Sender, Session, Terrain, TickInput, Topic, handler,
};

type Log = Rc<RefCell<Vec<GameEvent>>>;

fn record(session: &Session, topics: &[Topic]) -> Log {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let l = Rc::clone(&log);
    let h = handler(move |_, _, event| {
        l.borrow_mut().push(event.clone());
        Ok(())
    });
    for &topic in topics {
        session.bus().subscribe(topic, Rc::clone(&h));
    }
    log
}

/// Start a session and tick until GameStart has fired
fn playing_session(seed: u64) -> Session {
    let mut session = Session::new(Tuning::default(), seed).unwrap();
    session.start_game().unwrap();
    let idle = TickInput::default();
    while session.phase() != GamePhase::Playing {
        session.tick(&idle, SIM_DT);
    }
    session
}

fn land(session: &Session, times: u32) {
    for _ in 0..times {
        session.bus().publish(Sender::Body, GameEvent::UpdateScore(true));
    }
}

#[test]
fn initialize_seeds_strictly_increasing_chain() {
    let session = Session::new(Tuning::default(), 2024).unwrap();
    let log = record(&session, &[Topic::Initialize, Topic::GameStart]);
    session.start_game().unwrap();

    assert_eq!(*log.borrow(), vec![GameEvent::Initialize(true)]);
    let path = session.path();
    assert_eq!(path.pool().active_len(), 8);

    let chain = path.chain();
    assert_eq!(chain.len(), 8);
    let segments: Vec<_> = chain.iter().map(|&id| path.segment(id).unwrap()).collect();
    for pair in segments.windows(2) {
        assert_eq!(pair[0].next, Some(pair[1].id));
        assert!(pair[1].pos.z > pair[0].pos.z);
        assert!(pair[1].near_z() > pair[0].far_z(), "segments overlap in Z");
    }
}

#[test]
fn landing_at_nine_steps_difficulty() {
    let session = playing_session(1);
    land(&session, 9);
    assert_eq!(session.score(), 9);
    assert_eq!(session.speed(), 10.0);

    let log = record(
        &session,
        &[Topic::ScoreChanged, Topic::SpeedChanged, Topic::UpdateItemSpawnProb],
    );
    land(&session, 1);

    let tuning = Tuning::default();
    let p = tuning.item_probability_for(11.0);
    assert_eq!(session.score(), 10);
    assert_eq!(session.speed(), 11.0);
    assert_eq!(
        *log.borrow(),
        vec![
            GameEvent::ScoreChanged(10),
            GameEvent::SpeedChanged(11.0),
            GameEvent::UpdateItemSpawnProb(p),
        ]
    );
    // The path picked the new tunables up in the same dispatch
    assert_eq!(session.path().speed(), 11.0);
    assert_eq!(session.path().spawn_probability(), Some(p));
}

#[test]
fn reset_drains_active_segments() {
    let mut session = playing_session(5);
    let idle = TickInput::default();
    for _ in 0..60 {
        session.tick(&idle, SIM_DT);
    }
    session.bus().publish(Sender::Body, GameEvent::GameOver(true));
    assert_eq!(session.phase(), GamePhase::GameOver);

    let log = record(&session, &[Topic::Reset]);
    session.replay_game().unwrap();
    assert_eq!(*log.borrow(), vec![GameEvent::Reset(true)]);

    let path = session.path();
    let pool = path.pool();
    assert_eq!(pool.active_len(), 0);
    assert_eq!(pool.free_len(), pool.total());
    for id in 0..pool.total() as u32 {
        let seg = path.segment(SegmentId(id)).unwrap();
        assert!(!seg.active);
        assert!(seg.next.is_none());
    }
}

#[test]
fn collecting_item_skips_difficulty() {
    let session = playing_session(9);
    land(&session, 12);
    let speed = session.speed();

    let log = record(&session, &[Topic::SpeedChanged, Topic::UpdateItemSpawnProb]);
    session.bus().publish(Sender::Items, GameEvent::CollectItem(5));

    assert_eq!(session.score(), 17);
    assert_eq!(session.speed(), speed);
    assert!(log.borrow().is_empty());
}

#[test]
fn game_over_published_once_per_session() {
    let tuning = Tuning {
        horizontal_ramp_max: 0.0,
        segment_half_width: 0.5,
        ..Default::default()
    };
    let mut session = Session::new(tuning, 3).unwrap();
    let log = record(&session, &[Topic::GameOver]);
    session.start_game().unwrap();

    let idle = TickInput::default();
    for _ in 0..(20.0 / SIM_DT) as u32 {
        session.tick(&idle, SIM_DT);
    }
    assert_eq!(*log.borrow(), vec![GameEvent::GameOver(true)]);
    assert!(session.body().is_kinematic());
}

#[test]
fn items_spawn_on_recycled_links() {
    let mut session = playing_session(11);
    session.bus().publish(Sender::Controller, GameEvent::UpdateItemSpawnProb(1.0));
    let log = record(&session, &[Topic::ItemSpawnRequest]);

    let steer = TickInput {
        autopilot: true,
        ..Default::default()
    };
    for _ in 0..240 {
        session.tick(&steer, SIM_DT);
        if !log.borrow().is_empty() {
            break;
        }
    }
    assert!(!log.borrow().is_empty());
    assert!(!session.items().items().is_empty());
}

#[test]
fn start_rejected_while_playing() {
    let session = playing_session(13);
    assert!(session.start_game().is_err());
    assert!(session.replay_game().is_err());
    assert_eq!(session.phase(), GamePhase::Playing);
}
