use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use cah_engine::broadcast::BroadcastHub;
use cah_engine::domain::{BlackCard, MatchId, MatchState, Phase, Player, PlayerProfile, WhiteCard};
use cah_engine::engine::{
    self, EngineError, ErrorKind, ManagerError, MatchAction, MatchManager, MatchOptions,
    RandomSource, RoundStatus,
};
use cah_engine::infra::{InMemoryMatchStateStore, MatchStateStore, StoreError};

#[derive(Default)]
struct DummyRng;

impl RandomSource for DummyRng {
    fn shuffle<T>(&mut self, _slice: &mut [T]) {}

    fn index(&mut self, _upper: usize) -> usize {
        0
    }
}

/// Хранилище, которое можно заставить отказывать в `update` и `by_id`.
#[derive(Default)]
struct FlakyStore {
    inner: InMemoryMatchStateStore,
    fail_updates: AtomicBool,
    fail_reads: AtomicBool,
}

impl MatchStateStore for FlakyStore {
    fn create(&self, state: MatchState) -> Result<MatchState, StoreError> {
        self.inner.create(state)
    }

    fn by_id(&self, id: MatchId) -> Result<MatchState, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("connection reset".into()));
        }
        self.inner.by_id(id)
    }

    fn update(&self, state: &MatchState) -> Result<(), StoreError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("disk full".into()));
        }
        self.inner.update(state)
    }

    fn delete(&self, id: MatchId) -> Result<(), StoreError> {
        self.inner.delete(id)
    }
}

fn players(n: usize) -> Vec<Player> {
    (1..=n as u64)
        .map(|id| Player::new(PlayerProfile::new(id, format!("P{id}"))))
        .collect()
}

/// Сохранённый и инициализированный матч (ещё не у менеджера).
fn persisted_match(store: &dyn MatchStateStore, n_players: usize) -> MatchState {
    let mut state = store.create(MatchState::new(0, 3)).expect("create");
    let options = MatchOptions::new()
        .white_deck(
            (1..=200)
                .map(|i| WhiteCard::new(i, format!("white {i}"), "base"))
                .collect(),
        )
        .black_deck(
            (1..=10)
                .map(|i| BlackCard::new(1000 + i, format!("black {i}"), "base", 1))
                .collect(),
        )
        .hand_size(3);

    engine::initialize(&mut state, players(n_players), options, &mut DummyRng)
        .expect("initialize");
    store.update(&state).expect("persist");
    state
}

fn managed_match(n_players: usize) -> (Arc<InMemoryMatchStateStore>, MatchManager, MatchId) {
    let store = Arc::new(InMemoryMatchStateStore::new());
    let state = persisted_match(store.as_ref(), n_players);
    let id = state.id;

    let manager = MatchManager::new(store.clone(), BroadcastHub::new(64));
    manager.register(state);
    (store, manager, id)
}

//
// TEST 1: параллельные ходы разных грешников, переход фазы ровно один раз
//
#[test]
fn concurrent_submissions_complete_round_exactly_once() {
    let (store, manager, id) = managed_match(9);
    let manager = Arc::new(manager);
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (2..=9u64)
        .map(|player_id| {
            let manager = Arc::clone(&manager);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                manager.play_white_cards(id, player_id, &[0])
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("thread"))
        .collect();

    let completing = results
        .iter()
        .filter(|r| **r == Ok(RoundStatus::CzarChoosing))
        .count();
    let waiting = results
        .iter()
        .filter(|r| **r == Ok(RoundStatus::AwaitingSinners))
        .count();
    assert_eq!(completing, 1);
    assert_eq!(waiting, 7);

    let snapshot = manager.snapshot(id).expect("snapshot");
    assert_eq!(snapshot.phase, Phase::CzarChoosingWinner);
    assert_eq!(snapshot.version, 8);
    assert_eq!(store.by_id(id).expect("stored").version, 8);
}

//
// TEST 2: один игрок шлёт ход из нескольких потоков
//
#[test]
fn racing_duplicate_submissions_commit_once() {
    let (_store, manager, id) = managed_match(3);
    let manager = Arc::new(manager);
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                manager.play_white_cards(id, 2, &[0])
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("thread"))
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter(|r| r.is_err())
        .all(|r| *r == Err(ManagerError::Engine(EngineError::AlreadyPlayed))));

    let snapshot = manager.snapshot(id).expect("snapshot");
    let player = snapshot.player(2).expect("seat");
    assert_eq!(player.white_cards_in_play.len(), 1);
    assert_eq!(player.hand.len(), 2);
    assert_eq!(snapshot.version, 1);
}

//
// TEST 3: слушатель видит версии строго по возрастанию
//
#[test]
fn watchers_observe_increasing_versions() {
    let (_store, manager, id) = managed_match(9);
    let manager = Arc::new(manager);
    let (initial, mut sub) = manager.watch(id).expect("watch");
    assert_eq!(initial.version, 0);

    let handles: Vec<_> = (2..=9u64)
        .map(|player_id| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || manager.play_white_cards(id, player_id, &[0]))
        })
        .collect();
    for h in handles {
        h.join().expect("thread").expect("play");
    }

    let versions: Vec<u64> = sub.drain().iter().map(|s| s.version).collect();
    assert!(!versions.is_empty());
    assert!(versions.windows(2).all(|w| w[0] < w[1]), "{versions:?}");
    assert_eq!(versions.last(), Some(&8));
}

#[test]
fn sequential_commits_are_all_published() {
    let (_store, manager, id) = managed_match(3);
    let (_, mut sub) = manager.watch(id).expect("watch");

    manager.play_white_cards(id, 2, &[0]).expect("play");
    manager.play_white_cards(id, 3, &[1]).expect("play");
    let status = manager.choose_winner(id, 1, 3).expect("judge");
    assert_eq!(status, RoundStatus::NextRound { round: 2 });

    let seen: Vec<(u64, Phase)> = sub.drain().iter().map(|s| (s.version, s.phase)).collect();
    assert_eq!(
        seen,
        vec![
            (1, Phase::SinnersPlaying),
            (2, Phase::CzarChoosingWinner),
            (3, Phase::SinnersPlaying),
        ]
    );
}

//
// TEST 4: отказ хранилища не оставляет частичных изменений
//
#[test]
fn persistence_failure_rolls_back_mutation() {
    let store = Arc::new(FlakyStore::default());
    let state = persisted_match(store.as_ref(), 3);
    let id = state.id;

    let manager = MatchManager::new(store.clone(), BroadcastHub::new(8));
    manager.register(state);
    let (before, mut sub) = manager.watch(id).expect("watch");

    store.fail_updates.store(true, Ordering::SeqCst);
    let err = manager.play_white_cards(id, 2, &[0]).unwrap_err();

    assert_eq!(
        err,
        ManagerError::Persistence(StoreError::Backend("disk full".into()))
    );
    assert_eq!(err.kind(), ErrorKind::Persistence);

    let after = manager.snapshot(id).expect("snapshot");
    assert_eq!(*after, *before);
    assert!(sub.try_recv().is_none());
    assert_eq!(store.by_id(id).expect("stored").version, 0);

    store.fail_updates.store(false, Ordering::SeqCst);
    manager.play_white_cards(id, 2, &[0]).expect("retry succeeds");
    assert_eq!(sub.try_recv().map(|s| s.version), Some(1));
    assert_eq!(store.by_id(id).expect("stored").version, 1);
}

//
// TEST 5: поиск матча
//
#[test]
fn unknown_match_is_not_found() {
    let (_store, manager, _id) = managed_match(3);

    let err = manager.snapshot(999).unwrap_err();
    assert_eq!(err, ManagerError::MatchNotFound(999));
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert_eq!(
        manager.play_white_cards(999, 2, &[0]),
        Err(ManagerError::MatchNotFound(999))
    );
    assert!(manager.watch(999).is_err());
}

#[test]
fn store_outage_is_not_reported_as_missing_match() {
    let store = Arc::new(FlakyStore::default());
    let state = persisted_match(store.as_ref(), 3);
    let manager = MatchManager::new(store.clone(), BroadcastHub::new(8));

    store.fail_reads.store(true, Ordering::SeqCst);
    let err = manager.snapshot(state.id).unwrap_err();
    assert_eq!(
        err,
        ManagerError::Persistence(StoreError::Backend("connection reset".into()))
    );
    assert_eq!(err.kind(), ErrorKind::Persistence);
    assert!(matches!(
        manager.play_white_cards(state.id, 2, &[0]),
        Err(ManagerError::Persistence(_))
    ));
    assert!(!manager.has_match(state.id));

    store.fail_reads.store(false, Ordering::SeqCst);
    assert_eq!(
        manager.snapshot(999),
        Err(ManagerError::MatchNotFound(999))
    );
    assert_eq!(*manager.snapshot(state.id).expect("loaded"), state);
}

#[test]
fn stored_match_is_loaded_lazily() {
    let store = Arc::new(InMemoryMatchStateStore::new());
    let state = persisted_match(store.as_ref(), 3);
    let manager = MatchManager::new(store.clone(), BroadcastHub::new(8));

    assert!(!manager.has_match(state.id));
    let snapshot = manager.snapshot(state.id).expect("loaded from store");
    assert_eq!(*snapshot, state);
    assert!(manager.has_match(state.id));

    manager.play_white_cards(state.id, 2, &[0]).expect("play");
    assert_eq!(store.by_id(state.id).expect("stored").version, 1);
}

//
// TEST 6: выбор победителя только царём
//
#[test]
fn only_seated_czar_may_choose_winner() {
    let (_store, manager, id) = managed_match(3);
    manager.play_white_cards(id, 2, &[0]).expect("play");
    manager.play_white_cards(id, 3, &[0]).expect("play");

    assert_eq!(
        manager.choose_winner(id, 42, 2),
        Err(ManagerError::NotInMatch {
            match_id: id,
            player_id: 42
        })
    );
    assert_eq!(manager.choose_winner(id, 2, 3), Err(ManagerError::NotCzar));
    assert_eq!(ManagerError::NotCzar.kind(), ErrorKind::Validation);

    assert_eq!(
        manager.choose_winner(id, 1, 2),
        Ok(RoundStatus::NextRound { round: 2 })
    );
    let snapshot = manager.snapshot(id).expect("snapshot");
    assert!(snapshot.is_czar(2));
    assert_eq!(snapshot.player(2).map(|p| p.points.len()), Some(1));
}

#[test]
fn non_participant_cannot_play() {
    let (_store, manager, id) = managed_match(3);
    assert_eq!(
        manager.play_white_cards(id, 77, &[0]),
        Err(ManagerError::NotInMatch {
            match_id: id,
            player_id: 77
        })
    );
    assert_eq!(
        manager.play_random_white_cards(id, 77, &mut DummyRng),
        Err(ManagerError::NotInMatch {
            match_id: id,
            player_id: 77
        })
    );
}

#[test]
fn give_black_card_to_winner_skips_czar_check() {
    let (_store, manager, id) = managed_match(3);
    manager.play_random_white_cards(id, 2, &mut DummyRng).expect("play");
    manager.play_random_white_cards(id, 3, &mut DummyRng).expect("play");

    assert_eq!(
        manager.give_black_card_to_winner(id, 3),
        Ok(RoundStatus::NextRound { round: 2 })
    );
}

//
// TEST 7: конец матча и выгрузка
//
#[test]
fn ended_match_rejects_further_actions() {
    let (store, manager, id) = managed_match(3);
    manager.end(id).expect("end");

    let err = manager.play_white_cards(id, 2, &[0]).unwrap_err();
    assert_eq!(err, ManagerError::Engine(EngineError::AlreadyFinished));
    assert_eq!(err.kind(), ErrorKind::AlreadyFinished);
    assert_eq!(manager.end(id), Err(ManagerError::Engine(EngineError::AlreadyFinished)));

    assert_eq!(store.by_id(id).expect("stored").phase, Phase::Finished);
}

#[test]
fn finished_match_is_evicted_and_topic_closed() {
    let (store, manager, id) = managed_match(3);
    let (_, mut sub) = manager.watch(id).expect("watch");
    assert_eq!(manager.loaded_count(), 1);
    assert_eq!(manager.hub().active_topics(), 1);

    manager.end(id).expect("end");

    assert!(!manager.has_match(id));
    assert_eq!(manager.loaded_count(), 0);
    assert_eq!(manager.hub().active_topics(), 0);

    // Последний снапшот доставлен, затем поток закрыт.
    let last = sub.try_recv().expect("final snapshot");
    assert_eq!(last.phase, Phase::Finished);
    assert!(sub.try_recv().is_none());

    // Чтение идёт из хранилища и не возвращает матч в память.
    let snapshot = manager.snapshot(id).expect("from store");
    assert_eq!(snapshot.version, store.by_id(id).expect("stored").version);
    assert!(!manager.has_match(id));

    // Подписка на законченный матч сразу закрыта и не оставляет топик.
    let (finished, mut late) = manager.watch(id).expect("watch finished");
    assert!(finished.is_finished());
    assert!(late.try_recv().is_none());
    assert_eq!(manager.hub().active_topics(), 0);
    assert!(!manager.has_match(id));
}

#[test]
fn matches_played_to_the_end_leave_nothing_behind() {
    let store = Arc::new(InMemoryMatchStateStore::new());
    let manager = MatchManager::new(store.clone(), BroadcastHub::new(8));
    let mut rng = DummyRng;

    for _ in 0..5 {
        let state = persisted_match(store.as_ref(), 3);
        let id = state.id;
        manager.register(state);
        let (_, _sub) = manager.watch(id).expect("watch");

        loop {
            let snapshot = manager.snapshot(id).expect("snapshot");
            let czar = snapshot.current_czar().map(|p| p.id()).expect("czar");
            let sinners: Vec<u64> = snapshot.sinners().map(|(_, p)| p.id()).collect();
            for &sinner in &sinners {
                manager
                    .play_random_white_cards(id, sinner, &mut rng)
                    .expect("play");
            }
            let status = manager.choose_winner(id, czar, sinners[0]).expect("judge");
            if status == RoundStatus::Finished {
                break;
            }
        }
    }

    assert_eq!(manager.loaded_count(), 0);
    assert_eq!(manager.hub().active_topics(), 0);
}

//
// TEST 8: действие возвращает ровно свой снапшот
//
#[test]
fn apply_action_returns_committed_snapshot() {
    let (_store, manager, id) = managed_match(3);

    let (status, snapshot) = manager
        .apply_action(id, 2, MatchAction::PlayCards(vec![0]))
        .expect("play");
    assert_eq!(status, RoundStatus::AwaitingSinners);
    assert_eq!(snapshot.version, 1);
    assert!(snapshot.player(2).expect("seat").has_played());

    manager.play_white_cards(id, 3, &[0]).expect("play");

    assert_eq!(
        manager.apply_action(id, 2, MatchAction::ChooseWinner(3)),
        Err(ManagerError::NotCzar)
    );
    assert_eq!(
        manager.apply_action(id, 42, MatchAction::End),
        Err(ManagerError::NotInMatch {
            match_id: id,
            player_id: 42
        })
    );

    let (status, snapshot) = manager
        .apply_action(id, 1, MatchAction::ChooseWinner(3))
        .expect("judge");
    assert_eq!(status, RoundStatus::NextRound { round: 2 });
    assert_eq!(snapshot.version, 3);
    assert_eq!(snapshot.curr_round, 2);

    let (status, snapshot) = manager.apply_action(id, 3, MatchAction::End).expect("end");
    assert_eq!(status, RoundStatus::Finished);
    assert_eq!(snapshot.version, 4);
    assert!(snapshot.is_finished());
}

#[test]
fn unload_closes_watchers() {
    let (_store, manager, id) = managed_match(3);
    let (_, _sub) = manager.watch(id).expect("watch");
    assert_eq!(manager.hub().subscriber_count(id), 1);

    assert!(manager.unload(id));
    assert!(!manager.has_match(id));
    assert_eq!(manager.hub().subscriber_count(id), 0);
    assert!(!manager.unload(id));
}

#[test]
fn unrelated_matches_progress_in_parallel() {
    let store = Arc::new(InMemoryMatchStateStore::new());
    let manager = Arc::new(MatchManager::new(store.clone(), BroadcastHub::new(8)));

    let ids: Vec<MatchId> = (0..4)
        .map(|_| {
            let state = persisted_match(store.as_ref(), 3);
            let id = state.id;
            manager.register(state);
            id
        })
        .collect();

    let handles: Vec<_> = ids
        .iter()
        .map(|&id| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                manager.play_white_cards(id, 2, &[0])?;
                manager.play_white_cards(id, 3, &[0])?;
                manager.choose_winner(id, 1, 2)
            })
        })
        .collect();

    for h in handles {
        assert_eq!(
            h.join().expect("thread"),
            Ok(RoundStatus::NextRound { round: 2 })
        );
    }
    for id in ids {
        assert_eq!(manager.snapshot(id).expect("snapshot").version, 3);
    }
}
