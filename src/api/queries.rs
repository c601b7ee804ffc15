use serde::{Deserialize, Serialize};

use crate::domain::{MatchId, MatchState, Phase, PlayerId, Room};
use crate::engine::RandomSource;

use super::dto::{MatchViewDto, PlayerInfoDto, RoomViewDto, SubmissionDto};

/// Запросы "только чтение".
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Query {
    /// Состояние матча глазами игрока.
    GetMatch { match_id: MatchId, viewer: PlayerId },

    /// Комнаты, куда можно войти.
    ListOpenRooms,

    /// Идущие матчи игрока.
    InProgressFor { player_id: PlayerId },
}

/// Результат запроса "только чтение".
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum QueryResponse {
    Match(MatchViewDto),
    Rooms(Vec<RoomViewDto>),
}

/// Сформировать DTO матча для игрока `viewer`.
///
/// Рука отдаётся только самому `viewer`. Сыгранные карты раскрываются,
/// только когда сыграли все грешники, и в случайном порядке.
pub fn build_match_view<R: RandomSource>(
    state: &MatchState,
    viewer: PlayerId,
    rng: &mut R,
) -> MatchViewDto {
    MatchViewDto {
        id: state.id,
        phase: state.phase,
        players: build_players_dto(state),
        current_czar_id: state.current_czar().map(|p| p.id()),
        black_card_in_play: state.black_card_in_play.clone(),
        black_cards_left: state.black_deck.len(),
        white_cards_left: state.white_deck.len(),
        revealed_submissions: build_revealed_submissions(state, rng),
        viewer_private_hand: state
            .player(viewer)
            .map(|p| p.hand.clone())
            .unwrap_or_default(),
        curr_round: state.curr_round,
        max_rounds: state.max_rounds,
        version: state.version,
    }
}

/// Собрать DTO игроков матча.
fn build_players_dto(state: &MatchState) -> Vec<PlayerInfoDto> {
    state
        .players
        .iter()
        .map(|p| PlayerInfoDto {
            id: p.id(),
            name: p.profile.name.clone(),
            hand_size: p.hand.len(),
            white_cards_in_play_count: p.white_cards_in_play.len(),
            points: p.points.clone(),
        })
        .collect()
}

fn build_revealed_submissions<R: RandomSource>(
    state: &MatchState,
    rng: &mut R,
) -> Option<Vec<SubmissionDto>> {
    if state.phase != Phase::CzarChoosingWinner || !state.all_sinners_played() {
        return None;
    }

    let mut plays: Vec<SubmissionDto> = state
        .sinners()
        .map(|(_, p)| SubmissionDto {
            player_id: p.id(),
            white_cards: p.white_cards_in_play.clone(),
        })
        .collect();
    rng.shuffle(&mut plays);
    Some(plays)
}

/// DTO комнаты для лобби.
pub fn build_room_view(room: &Room) -> RoomViewDto {
    RoomViewDto {
        room_id: room.id,
        name: room.name.clone(),
        owner_id: room.owner.id,
        players: room.participants.iter().map(|p| p.name.clone()).collect(),
        has_password: room.password.is_some(),
        started: room.started,
        finished: room.finished,
    }
}
