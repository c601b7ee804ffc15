use serde::{Deserialize, Serialize};

use crate::api::dto::{map_round_status_to_response, CommandResponse};
use crate::api::errors::ApiError;
use crate::api::queries::build_match_view;
use crate::domain::{MatchId, PlayerId};
use crate::engine::{MatchAction, MatchManager, RandomSource};

/// Тело запроса «сыграть карты»: `{"cardIndexes": [..]}`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayCardsPayload {
    pub card_indexes: Vec<usize>,
}

/// Тело запроса «выбрать победителя»: `{"winnerId": ..}`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChooseWinnerPayload {
    pub winner_id: PlayerId,
}

impl PlayCardsPayload {
    pub fn from_json(body: &str) -> Result<Self, ApiError> {
        serde_json::from_str(body).map_err(|e| ApiError::BadRequest(e.to_string()))
    }
}

impl ChooseWinnerPayload {
    pub fn from_json(body: &str) -> Result<Self, ApiError> {
        serde_json::from_str(body).map_err(|e| ApiError::BadRequest(e.to_string()))
    }
}

/// Команда над идущим матчем.
///
/// `player_id` – кто прислал запрос (уже аутентифицирован снаружи).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Command {
    /// Грешник кладёт карты.
    PlayCards(PlayCardsCommand),

    /// Царь выбирает победителя раунда.
    ChooseWinner(ChooseWinnerCommand),

    /// Завершить матч досрочно.
    EndMatch(EndMatchCommand),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayCardsCommand {
    pub match_id: MatchId,
    pub player_id: PlayerId,
    pub payload: PlayCardsPayload,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChooseWinnerCommand {
    pub match_id: MatchId,
    pub player_id: PlayerId,
    pub payload: ChooseWinnerPayload,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EndMatchCommand {
    pub match_id: MatchId,
    pub player_id: PlayerId,
}

impl Command {
    pub fn match_id(&self) -> MatchId {
        match self {
            Command::PlayCards(c) => c.match_id,
            Command::ChooseWinner(c) => c.match_id,
            Command::EndMatch(c) => c.match_id,
        }
    }

    pub fn player_id(&self) -> PlayerId {
        match self {
            Command::PlayCards(c) => c.player_id,
            Command::ChooseWinner(c) => c.player_id,
            Command::EndMatch(c) => c.player_id,
        }
    }
}

impl From<Command> for MatchAction {
    fn from(command: Command) -> Self {
        match command {
            Command::PlayCards(c) => MatchAction::PlayCards(c.payload.card_indexes),
            Command::ChooseWinner(c) => MatchAction::ChooseWinner(c.payload.winner_id),
            Command::EndMatch(_) => MatchAction::End,
        }
    }
}

/// Выполнить команду и вернуть состояние глазами отправителя.
///
/// Вид строится из снапшота, закоммиченного этой же командой.
pub fn execute_command<R: RandomSource>(
    manager: &MatchManager,
    command: Command,
    rng: &mut R,
) -> Result<CommandResponse, ApiError> {
    let match_id = command.match_id();
    let viewer = command.player_id();

    let (status, snapshot) = manager.apply_action(match_id, viewer, command.into())?;
    let view = build_match_view(&snapshot, viewer, rng);
    Ok(map_round_status_to_response(status, view))
}
