use serde::{Deserialize, Serialize};

use crate::domain::player::PlayerProfile;
use crate::domain::{MatchId, PlayerId, RoomId};

/// Комната в лобби: кто создал, кто присоединился, начат ли матч.
///
/// Состояние самой игры живёт отдельно в `MatchState` (см. `state_id`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    pub owner: PlayerProfile,
    pub participants: Vec<PlayerProfile>,
    pub name: String,
    /// None – комната без пароля.
    pub password: Option<String>,
    /// Id состояния матча; появляется при старте.
    pub state_id: Option<MatchId>,
    pub started: bool,
    pub finished: bool,
}

impl Room {
    /// Новая комната, владелец сразу внутри.
    pub fn new(owner: PlayerProfile, name: String, password: Option<String>) -> Self {
        Self {
            id: 0,
            participants: vec![owner.clone()],
            owner,
            name,
            password,
            state_id: None,
            started: false,
            finished: false,
        }
    }

    pub fn has_participant(&self, player_id: PlayerId) -> bool {
        self.participants.iter().any(|p| p.id == player_id)
    }

    /// Открыта для входа: ещё не стартовала.
    pub fn is_open(&self) -> bool {
        !self.started && !self.finished
    }
}
