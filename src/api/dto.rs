use serde::{Deserialize, Serialize};

use crate::domain::{BlackCard, MatchId, Phase, PlayerId, RoomId, WhiteCard};
use crate::engine::RoundStatus;

/// DTO игрока в матче (публичная часть).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfoDto {
    pub id: PlayerId,
    pub name: String,
    /// Сколько карт на руке (сами карты видит только владелец).
    pub hand_size: usize,
    pub white_cards_in_play_count: usize,
    pub points: Vec<BlackCard>,
}

/// Открытые карты одного грешника.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionDto {
    pub player_id: PlayerId,
    pub white_cards: Vec<WhiteCard>,
}

/// DTO матча глазами конкретного игрока.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MatchViewDto {
    pub id: MatchId,
    pub phase: Phase,
    pub players: Vec<PlayerInfoDto>,
    pub current_czar_id: Option<PlayerId>,
    pub black_card_in_play: Option<BlackCard>,
    pub black_cards_left: usize,
    pub white_cards_left: usize,
    /// Есть только когда все грешники сыграли; порядок случайный.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revealed_submissions: Option<Vec<SubmissionDto>>,
    /// Рука того, кто запрашивает.
    pub viewer_private_hand: Vec<WhiteCard>,
    pub curr_round: u32,
    pub max_rounds: u32,
    pub version: u64,
}

/// DTO комнаты для лобби.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomViewDto {
    pub room_id: RoomId,
    pub name: String,
    pub owner_id: PlayerId,
    pub players: Vec<String>,
    pub has_password: bool,
    pub started: bool,
    pub finished: bool,
}

/// Ответ API на команду.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum CommandResponse {
    /// Ход принят, раунд продолжается.
    MatchState(MatchViewDto),

    /// Начался новый раунд.
    NewRound { round: u32, view: MatchViewDto },

    /// Матч окончен.
    MatchFinished(MatchViewDto),
}

impl CommandResponse {
    pub fn view(&self) -> &MatchViewDto {
        match self {
            CommandResponse::MatchState(view)
            | CommandResponse::NewRound { view, .. }
            | CommandResponse::MatchFinished(view) => view,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, CommandResponse::MatchFinished(_))
    }
}

/// Помощник: преобразование RoundStatus движка в ответ.
pub fn map_round_status_to_response(status: RoundStatus, view: MatchViewDto) -> CommandResponse {
    match status {
        RoundStatus::AwaitingSinners | RoundStatus::CzarChoosing => {
            CommandResponse::MatchState(view)
        }
        RoundStatus::NextRound { round } => CommandResponse::NewRound { round, view },
        RoundStatus::Finished => CommandResponse::MatchFinished(view),
    }
}
