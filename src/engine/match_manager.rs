// src/engine/match_manager.rs

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, warn};

use crate::broadcast::{BroadcastHub, Subscription};
use crate::domain::{MatchId, MatchState, PlayerId};
use crate::engine::errors::{EngineError, ErrorKind};
use crate::engine::{self, RandomSource, RoundStatus};
use crate::infra::persistence::{MatchStateStore, StoreError};

/// Закоммиченный снапшот, которым делимся со слушателями.
pub type Snapshot = Arc<MatchState>;

/// Ошибки уровня менеджера матчей (над движком одного матча).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ManagerError {
    /// Матча с таким ID нет ни в памяти, ни в хранилище.
    #[error("Матч {0} не найден")]
    MatchNotFound(MatchId),

    #[error("Игрок {player_id} не участвует в матче {match_id}")]
    NotInMatch { match_id: MatchId, player_id: PlayerId },

    #[error("Только царь может выбрать победителя")]
    NotCzar,

    /// Проброшенная ошибка из движка (EngineError).
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Хранилище не приняло изменение – состояние в памяти не тронуто.
    #[error("Не удалось сохранить матч: {0}")]
    Persistence(StoreError),
}

impl ManagerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ManagerError::MatchNotFound(_) => ErrorKind::NotFound,
            ManagerError::NotInMatch { .. } | ManagerError::NotCzar => ErrorKind::Validation,
            ManagerError::Engine(e) => e.kind(),
            ManagerError::Persistence(_) => ErrorKind::Persistence,
        }
    }
}

/// Действие игрока над матчем.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchAction {
    /// Грешник кладёт карты по позициям руки.
    PlayCards(Vec<usize>),
    /// Царь отдаёт чёрную карту победителю.
    ChooseWinner(PlayerId),
    /// Досрочный конец матча.
    End,
}

/// Менеджер матчей:
/// - хранит живые матчи по MatchId, у каждого свой RwLock;
/// - мутации одного матча идут строго по одной (write-блокировка матча),
///   разные матчи друг другу не мешают;
/// - мутация считается закоммиченной только после `store.update`;
/// - после коммита снапшот уходит в хаб уже без блокировки матча;
/// - законченный матч выгружается из памяти, его подписки закрываются.
pub struct MatchManager {
    store: Arc<dyn MatchStateStore>,
    hub: BroadcastHub<Snapshot>,
    matches: RwLock<HashMap<MatchId, Arc<RwLock<MatchState>>>>,
}

impl MatchManager {
    pub fn new(store: Arc<dyn MatchStateStore>, hub: BroadcastHub<Snapshot>) -> Self {
        Self {
            store,
            hub,
            matches: RwLock::new(HashMap::new()),
        }
    }

    pub fn hub(&self) -> &BroadcastHub<Snapshot> {
        &self.hub
    }

    /// Взять под управление уже сохранённый матч (после старта в лобби).
    ///
    /// Если матч с таким id уже был – заменяем его.
    pub fn register(&self, state: MatchState) -> Snapshot {
        let id = state.id;
        let snapshot = Arc::new(state.clone());
        self.matches
            .write()
            .insert(id, Arc::new(RwLock::new(state)));
        self.hub.publish(id, snapshot.version, Arc::clone(&snapshot));
        snapshot
    }

    /// Есть ли матч в памяти.
    pub fn has_match(&self, match_id: MatchId) -> bool {
        self.matches.read().contains_key(&match_id)
    }

    /// Выгрузить матч из памяти и закрыть его подписки.
    pub fn unload(&self, match_id: MatchId) -> bool {
        let removed = self.matches.write().remove(&match_id).is_some();
        self.hub.close_topic(match_id);
        removed
    }

    /// Согласованный снапшот. Читатели не мешают друг другу.
    pub fn snapshot(&self, match_id: MatchId) -> Result<Snapshot, ManagerError> {
        let slot = self.slot(match_id)?;
        let guard = slot.read();
        Ok(Arc::new(guard.clone()))
    }

    /// Подписаться и сразу получить текущее состояние.
    ///
    /// Подписка оформляется под блокировкой матча, поэтому ни одна
    /// последующая версия не теряется, а более старые не приходят.
    /// У законченного матча поток сразу закрыт.
    pub fn watch(
        &self,
        match_id: MatchId,
    ) -> Result<(Snapshot, Subscription<Snapshot>), ManagerError> {
        let slot = self.slot(match_id)?;
        let (snapshot, subscription) = {
            let guard = slot.read();
            let subscription = self.hub.subscribe_after(match_id, guard.version);
            (Arc::new(guard.clone()), subscription)
        };

        // Матч ещё в памяти – топик закроет коммит, который его закончил.
        if snapshot.is_finished() && !self.is_loaded(match_id, &slot) {
            self.hub.close_topic(match_id);
        }
        Ok((snapshot, subscription))
    }

    /// Грешник `player_id` кладёт карты по позициям руки.
    pub fn play_white_cards(
        &self,
        match_id: MatchId,
        player_id: PlayerId,
        card_indexes: &[usize],
    ) -> Result<RoundStatus, ManagerError> {
        self.commit(match_id, |state| {
            let index = seat_of(state, player_id)?;
            Ok(engine::play_white_cards(state, index, card_indexes)?)
        })
        .map(|(status, _)| status)
    }

    /// Грешник кладёт случайные карты (боты).
    pub fn play_random_white_cards<R: RandomSource>(
        &self,
        match_id: MatchId,
        player_id: PlayerId,
        rng: &mut R,
    ) -> Result<RoundStatus, ManagerError> {
        self.commit(match_id, |state| {
            let index = seat_of(state, player_id)?;
            Ok(engine::play_random_white_cards(state, index, rng)?)
        })
        .map(|(status, _)| status)
    }

    /// Отдать чёрную карту победителю.
    pub fn give_black_card_to_winner(
        &self,
        match_id: MatchId,
        winner_id: PlayerId,
    ) -> Result<RoundStatus, ManagerError> {
        self.commit(match_id, |state| {
            Ok(engine::give_black_card_to_winner(state, winner_id)?)
        })
        .map(|(status, _)| status)
    }

    /// То же, но от имени игрока `czar_id`: выбирать может только текущий царь.
    pub fn choose_winner(
        &self,
        match_id: MatchId,
        czar_id: PlayerId,
        winner_id: PlayerId,
    ) -> Result<RoundStatus, ManagerError> {
        self.apply_action(match_id, czar_id, MatchAction::ChooseWinner(winner_id))
            .map(|(status, _)| status)
    }

    /// Принудительно завершить матч.
    pub fn end(&self, match_id: MatchId) -> Result<(), ManagerError> {
        self.commit(match_id, |state| Ok(engine::end(state)?)).map(|_| ())
    }

    /// Действие от имени игрока `player_id`.
    ///
    /// Возвращает статус раунда и ровно тот снапшот, который закоммитил
    /// это действие. Любое действие требует места в матче.
    pub fn apply_action(
        &self,
        match_id: MatchId,
        player_id: PlayerId,
        action: MatchAction,
    ) -> Result<(RoundStatus, Snapshot), ManagerError> {
        self.commit(match_id, |state| {
            let index = seat_of(state, player_id)?;
            match action {
                MatchAction::PlayCards(card_indexes) => {
                    Ok(engine::play_white_cards(state, index, &card_indexes)?)
                }
                MatchAction::ChooseWinner(winner_id) => {
                    if !state.is_czar(player_id) {
                        return Err(ManagerError::NotCzar);
                    }
                    Ok(engine::give_black_card_to_winner(state, winner_id)?)
                }
                MatchAction::End => {
                    engine::end(state)?;
                    Ok(RoundStatus::Finished)
                }
            }
        })
    }

    /// Сколько матчей сейчас в памяти.
    pub fn loaded_count(&self) -> usize {
        self.matches.read().len()
    }

    /// Матч из памяти или, если его там нет, из хранилища.
    ///
    /// Законченный матч из хранилища в память не кладётся.
    fn slot(&self, match_id: MatchId) -> Result<Arc<RwLock<MatchState>>, ManagerError> {
        if let Some(slot) = self.matches.read().get(&match_id) {
            return Ok(Arc::clone(slot));
        }

        let state = self.store.by_id(match_id).map_err(|err| match err {
            StoreError::MatchNotFound(_) => ManagerError::MatchNotFound(match_id),
            other => {
                warn!(match_id, err = %other, "match load failed");
                ManagerError::Persistence(other)
            }
        })?;

        if state.is_finished() {
            return Ok(Arc::new(RwLock::new(state)));
        }

        let mut matches = self.matches.write();
        let slot = matches
            .entry(match_id)
            .or_insert_with(|| Arc::new(RwLock::new(state)));
        Ok(Arc::clone(slot))
    }

    /// Критическая секция матча: применить `op` к копии состояния,
    /// сохранить, подменить, затем разослать снапшот.
    ///
    /// Ошибка движка или хранилища оставляет состояние в памяти как было.
    fn commit<T>(
        &self,
        match_id: MatchId,
        op: impl FnOnce(&mut MatchState) -> Result<T, ManagerError>,
    ) -> Result<(T, Snapshot), ManagerError> {
        let slot = self.slot(match_id)?;

        let (out, snapshot) = {
            let mut guard = slot.write();
            let mut next = guard.clone();
            let out = op(&mut next)?;
            next.version += 1;

            if let Err(err) = self.store.update(&next) {
                warn!(match_id, %err, "match update rejected by store");
                return Err(ManagerError::Persistence(err));
            }

            let snapshot = Arc::new(next.clone());
            *guard = next;
            (out, snapshot)
        };

        let report = self
            .hub
            .publish(match_id, snapshot.version, Arc::clone(&snapshot));

        debug!(
            match_id,
            version = snapshot.version,
            phase = %snapshot.phase,
            round = snapshot.curr_round,
            delivered = report.delivered,
            dropped = report.dropped,
            "match state committed"
        );

        if snapshot.is_finished() {
            self.evict(match_id, &slot);
        }

        Ok((out, snapshot))
    }

    fn is_loaded(&self, match_id: MatchId, slot: &Arc<RwLock<MatchState>>) -> bool {
        self.matches
            .read()
            .get(&match_id)
            .is_some_and(|s| Arc::ptr_eq(s, slot))
    }

    /// Убрать законченный матч из памяти и закрыть его топик.
    fn evict(&self, match_id: MatchId, slot: &Arc<RwLock<MatchState>>) {
        {
            let mut matches = self.matches.write();
            if matches.get(&match_id).is_some_and(|s| Arc::ptr_eq(s, slot)) {
                matches.remove(&match_id);
            }
        }
        let closed = self.hub.close_topic(match_id);
        debug!(match_id, closed, "finished match evicted");
    }
}

fn seat_of(state: &MatchState, player_id: PlayerId) -> Result<usize, ManagerError> {
    state
        .player_index(player_id)
        .ok_or(ManagerError::NotInMatch {
            match_id: state.id,
            player_id,
        })
}
