use serde::{Deserialize, Serialize};

use crate::domain::{MatchId, PlayerId, RoomId};
use crate::engine::{EngineError, ErrorKind, ManagerError};
use crate::infra::persistence::StoreError;
use crate::lobby::LobbyError;

/// Ошибки внешнего API (то, что отдаём фронту / клиенту).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ApiError {
    /// Неправильные входные данные (например, битый JSON).
    BadRequest(String),

    /// Матч не найден.
    MatchNotFound(MatchId),

    /// Комната не найдена.
    RoomNotFound(RoomId),

    /// Игрок не участвует в матче.
    NotInMatch(PlayerId),

    /// Команда не может быть выполнена в текущем состоянии.
    InvalidCommand(String),

    /// Матч уже окончен.
    MatchFinished,

    /// Ошибка хранилища.
    Persistence(String),

    /// Внутренняя ошибка сервера.
    Internal(String),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err.kind() {
            ErrorKind::AlreadyFinished => ApiError::MatchFinished,
            _ => ApiError::InvalidCommand(err.to_string()),
        }
    }
}

impl From<ManagerError> for ApiError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::MatchNotFound(id) => ApiError::MatchNotFound(id),
            ManagerError::NotInMatch { player_id, .. } => ApiError::NotInMatch(player_id),
            ManagerError::NotCzar => ApiError::InvalidCommand(err.to_string()),
            ManagerError::Engine(e) => e.into(),
            ManagerError::Persistence(e) => ApiError::Persistence(e.to_string()),
        }
    }
}

impl From<LobbyError> for ApiError {
    fn from(err: LobbyError) -> Self {
        match err {
            LobbyError::Engine(e) => e.into(),
            LobbyError::Store(StoreError::MatchNotFound(id)) => ApiError::MatchNotFound(id),
            LobbyError::Store(StoreError::RoomNotFound(id)) => ApiError::RoomNotFound(id),
            LobbyError::Store(e) => ApiError::Persistence(e.to_string()),
            other => ApiError::InvalidCommand(other.to_string()),
        }
    }
}
