// src/lobby/lifecycle.rs

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::domain::{MatchId, MatchState, Player, PlayerId, PlayerProfile, Room, RoomId};
use crate::engine::game_loop::MIN_PLAYERS;
use crate::engine::match_manager::Snapshot;
use crate::engine::{self, EngineError, MatchOption, MatchManager, MatchOptions, RandomSource};
use crate::infra::persistence::{MatchStateStore, RoomStore, StoreError};

/// Ошибки лобби.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LobbyError {
    #[error("Имя комнаты не может быть пустым")]
    BlankName,

    #[error("Для старта нужно минимум {min} игроков, получено {got}")]
    NotEnoughPlayers { min: usize, got: usize },

    #[error("Матч в комнате {0} уже начался")]
    AlreadyStarted(RoomId),

    #[error("Игрок {0} не в комнате")]
    NotJoined(PlayerId),

    #[error("Размер руки {size} вне допустимых границ {min}..={max}")]
    HandSizeOutOfBounds { size: usize, min: usize, max: usize },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Лобби матчей:
/// - создаёт комнаты, пускает и выпускает игроков;
/// - при старте собирает места из участников и отдаёт их движку;
/// - сохраняет результат и передаёт матч менеджеру.
///
/// Правила игры проверяет движок, здесь только адаптация записей лобби.
pub struct MatchLobby {
    config: EngineConfig,
    rooms: Arc<dyn RoomStore>,
    states: Arc<dyn MatchStateStore>,
    manager: Arc<MatchManager>,
    /// Сериализует чтение-изменение-запись комнат.
    edits: Mutex<()>,
}

impl MatchLobby {
    pub fn new(
        config: EngineConfig,
        rooms: Arc<dyn RoomStore>,
        states: Arc<dyn MatchStateStore>,
        manager: Arc<MatchManager>,
    ) -> Self {
        Self {
            config,
            rooms,
            states,
            manager,
            edits: Mutex::new(()),
        }
    }

    /// Создать комнату. Имя и пароль обрезаются, пустой пароль = без пароля.
    pub fn create_room(
        &self,
        owner: PlayerProfile,
        name: &str,
        password: &str,
    ) -> Result<Room, LobbyError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LobbyError::BlankName);
        }
        let password = Some(password.trim())
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        let room = self
            .rooms
            .create(Room::new(owner, name.to_string(), password))?;
        info!(room_id = room.id, name = %room.name, owner = room.owner.id, "room created");
        Ok(room)
    }

    pub fn room(&self, room_id: RoomId) -> Result<Room, LobbyError> {
        Ok(self.rooms.by_id(room_id)?)
    }

    /// Войти в комнату. Повторный вход ничего не меняет.
    pub fn join(&self, room_id: RoomId, user: PlayerProfile) -> Result<Room, LobbyError> {
        let _guard = self.edits.lock();
        let mut room = self.rooms.by_id(room_id)?;
        if !room.is_open() {
            return Err(LobbyError::AlreadyStarted(room_id));
        }
        if room.has_participant(user.id) {
            return Ok(room);
        }

        info!(room_id, player = user.id, name = %user.name, "player joins room");
        room.participants.push(user);
        self.rooms.update(&room)?;
        Ok(room)
    }

    /// Выйти из комнаты до старта.
    pub fn leave(&self, room_id: RoomId, player_id: PlayerId) -> Result<Room, LobbyError> {
        let _guard = self.edits.lock();
        let mut room = self.rooms.by_id(room_id)?;
        if !room.is_open() {
            return Err(LobbyError::AlreadyStarted(room_id));
        }

        let pos = room
            .participants
            .iter()
            .position(|p| p.id == player_id)
            .ok_or(LobbyError::NotJoined(player_id))?;

        info!(room_id, player = player_id, "player leaves room");
        room.participants.remove(pos);
        self.rooms.update(&room)?;
        Ok(room)
    }

    /// Комнаты, куда ещё можно войти.
    pub fn all_open(&self) -> Result<Vec<Room>, LobbyError> {
        Ok(self.rooms.by_phase(false, false)?)
    }

    /// Идущие матчи, в которых участвует игрок.
    pub fn in_progress_for(&self, player_id: PlayerId) -> Result<Vec<Room>, LobbyError> {
        let rooms = self.rooms.by_phase(true, false)?;
        Ok(rooms
            .into_iter()
            .filter(|r| r.has_participant(player_id))
            .collect())
    }

    /// Новое пустое состояние матча в хранилище.
    pub fn create_state(&self) -> Result<MatchState, LobbyError> {
        Ok(self
            .states
            .create(MatchState::new(0, self.config.default_hand_size))?)
    }

    /// Старт матча в комнате:
    /// - проверяет, что матч не начат и игроков хватает;
    /// - проверяет границы размера руки;
    /// - занимает комнату, пока движок инициализирует `state`;
    /// - сохраняет состояние и отдаёт матч менеджеру.
    ///
    /// Из двух одновременных стартов одной комнаты проходит ровно один,
    /// второй получает `AlreadyStarted`. Если движок или хранилище
    /// отказали, комната снова открыта.
    pub fn start<R: RandomSource>(
        &self,
        room_id: RoomId,
        mut state: MatchState,
        options: MatchOptions,
        rng: &mut R,
    ) -> Result<Snapshot, LobbyError> {
        let room = self.claim(room_id, state.id, &options)?;

        let players: Vec<Player> = room
            .participants
            .iter()
            .cloned()
            .map(Player::new)
            .collect();

        if let Err(err) = engine::initialize(&mut state, players, options, rng) {
            warn!(room_id, match_id = state.id, %err, "match failed to start");
            self.release(room_id);
            return Err(err.into());
        }
        if let Err(err) = self.states.update(&state) {
            warn!(room_id, match_id = state.id, %err, "match state not saved");
            self.release(room_id);
            return Err(err.into());
        }

        info!(
            room_id,
            match_id = state.id,
            players = state.players.len(),
            max_rounds = state.max_rounds,
            "match started"
        );

        Ok(self.manager.register(state))
    }

    /// Пометить комнату матча законченной.
    pub fn mark_finished(&self, state_id: MatchId) -> Result<Room, LobbyError> {
        let _guard = self.edits.lock();
        let mut room = self.rooms.by_state_id(state_id)?;
        if !room.finished {
            room.finished = true;
            self.rooms.update(&room)?;
            info!(room_id = room.id, match_id = state_id, "match finished");
        }
        Ok(room)
    }

    /// Проверки старта и пометка комнаты начатой под одним замком.
    fn claim(
        &self,
        room_id: RoomId,
        state_id: MatchId,
        options: &MatchOptions,
    ) -> Result<Room, LobbyError> {
        let _guard = self.edits.lock();
        let mut room = self.rooms.by_id(room_id)?;
        if room.started {
            return Err(LobbyError::AlreadyStarted(room_id));
        }

        let min = self.config.min_players.max(MIN_PLAYERS);
        if room.participants.len() < min {
            return Err(LobbyError::NotEnoughPlayers {
                min,
                got: room.participants.len(),
            });
        }

        self.check_hand_size(options)?;

        room.started = true;
        room.state_id = Some(state_id);
        self.rooms.update(&room)?;
        Ok(room)
    }

    /// Откат `claim` после неудачного старта.
    fn release(&self, room_id: RoomId) {
        let _guard = self.edits.lock();
        let result = self.rooms.by_id(room_id).and_then(|mut room| {
            room.started = false;
            room.state_id = None;
            self.rooms.update(&room)
        });
        if let Err(err) = result {
            warn!(room_id, %err, "room could not be reopened");
        }
    }

    fn check_hand_size(&self, options: &MatchOptions) -> Result<(), LobbyError> {
        for option in options.iter() {
            if let MatchOption::HandSize(size) = option {
                if !self.config.hand_size_allowed(*size) {
                    return Err(LobbyError::HandSizeOutOfBounds {
                        size: *size,
                        min: self.config.min_hand_size,
                        max: self.config.max_hand_size,
                    });
                }
            }
        }
        Ok(())
    }
}
