use std::collections::HashMap;

use parking_lot::Mutex;
use thiserror::Error;

use crate::domain::match_state::MatchState;
use crate::domain::room::Room;
use crate::domain::{MatchId, RoomId};
use crate::infra::ids::IdGenerator;

/// Ошибки хранилища.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Состояние матча {0} не найдено")]
    MatchNotFound(MatchId),

    #[error("Комната {0} не найдена")]
    RoomNotFound(RoomId),

    #[error("Комната уже сохранена под id {0}")]
    RoomAlreadyCreated(RoomId),

    #[error("Ошибка хранилища: {0}")]
    Backend(String),
}

/// Хранилище состояний матчей.
///
/// Движок считает мутацию закоммиченной только после успешного `update`.
pub trait MatchStateStore: Send + Sync {
    /// Сохранить новое состояние, выдать ему id.
    fn create(&self, state: MatchState) -> Result<MatchState, StoreError>;

    fn by_id(&self, id: MatchId) -> Result<MatchState, StoreError>;

    fn update(&self, state: &MatchState) -> Result<(), StoreError>;

    fn delete(&self, id: MatchId) -> Result<(), StoreError>;
}

/// Хранилище комнат лобби.
pub trait RoomStore: Send + Sync {
    fn create(&self, room: Room) -> Result<Room, StoreError>;

    fn by_id(&self, id: RoomId) -> Result<Room, StoreError>;

    fn by_state_id(&self, state_id: MatchId) -> Result<Room, StoreError>;

    /// Комнаты с заданными флагами started/finished.
    fn by_phase(&self, started: bool, finished: bool) -> Result<Vec<Room>, StoreError>;

    fn update(&self, room: &Room) -> Result<(), StoreError>;
}

/// Простая in-memory реализация для тестов и локального запуска.
#[derive(Debug, Default)]
pub struct InMemoryMatchStateStore {
    ids: IdGenerator,
    states: Mutex<HashMap<MatchId, MatchState>>,
}

impl InMemoryMatchStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.states.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.lock().is_empty()
    }
}

impl MatchStateStore for InMemoryMatchStateStore {
    fn create(&self, mut state: MatchState) -> Result<MatchState, StoreError> {
        state.id = self.ids.next_match_id();
        self.states.lock().insert(state.id, state.clone());
        Ok(state)
    }

    fn by_id(&self, id: MatchId) -> Result<MatchState, StoreError> {
        self.states
            .lock()
            .get(&id)
            .cloned()
            .ok_or(StoreError::MatchNotFound(id))
    }

    fn update(&self, state: &MatchState) -> Result<(), StoreError> {
        let mut states = self.states.lock();
        let slot = states
            .get_mut(&state.id)
            .ok_or(StoreError::MatchNotFound(state.id))?;
        *slot = state.clone();
        Ok(())
    }

    fn delete(&self, id: MatchId) -> Result<(), StoreError> {
        self.states
            .lock()
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::MatchNotFound(id))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRoomStore {
    ids: IdGenerator,
    rooms: Mutex<HashMap<RoomId, Room>>,
}

impl InMemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoomStore for InMemoryRoomStore {
    fn create(&self, mut room: Room) -> Result<Room, StoreError> {
        if room.id != 0 {
            return Err(StoreError::RoomAlreadyCreated(room.id));
        }
        room.id = self.ids.next_room_id();
        self.rooms.lock().insert(room.id, room.clone());
        Ok(room)
    }

    fn by_id(&self, id: RoomId) -> Result<Room, StoreError> {
        self.rooms
            .lock()
            .get(&id)
            .cloned()
            .ok_or(StoreError::RoomNotFound(id))
    }

    fn by_state_id(&self, state_id: MatchId) -> Result<Room, StoreError> {
        self.rooms
            .lock()
            .values()
            .find(|r| r.state_id == Some(state_id))
            .cloned()
            .ok_or(StoreError::MatchNotFound(state_id))
    }

    fn by_phase(&self, started: bool, finished: bool) -> Result<Vec<Room>, StoreError> {
        let mut rooms: Vec<Room> = self
            .rooms
            .lock()
            .values()
            .filter(|r| r.started == started && r.finished == finished)
            .cloned()
            .collect();
        rooms.sort_by_key(|r| r.id);
        Ok(rooms)
    }

    fn update(&self, room: &Room) -> Result<(), StoreError> {
        let mut rooms = self.rooms.lock();
        let slot = rooms
            .get_mut(&room.id)
            .ok_or(StoreError::RoomNotFound(room.id))?;
        *slot = room.clone();
        Ok(())
    }
}
