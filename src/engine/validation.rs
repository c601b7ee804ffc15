use crate::domain::{MatchState, Phase};
use crate::engine::errors::EngineError;

/// Проверка, может ли игрок с индексом `player_index` сыграть карты прямо сейчас.
///
/// Порядок проверок важен: он определяет, какую ошибку увидит клиент.
pub fn validate_play(state: &MatchState, player_index: usize) -> Result<usize, EngineError> {
    if state.is_finished() {
        return Err(EngineError::AlreadyFinished);
    }

    let player = state
        .players
        .get(player_index)
        .ok_or(EngineError::InvalidPlayer(player_index))?;

    if player_index == state.curr_czar_index {
        return Err(EngineError::CzarCannotPlay);
    }

    if player.has_played() {
        return Err(EngineError::AlreadyPlayed);
    }

    if state.phase != Phase::SinnersPlaying {
        return Err(EngineError::WrongPhase {
            expected: Phase::SinnersPlaying,
            actual: state.phase,
        });
    }

    state
        .blanks_required()
        .ok_or(EngineError::Internal("нет чёрной карты в игре"))
}

/// Позиции в руке: ровно `expected` штук, все в диапазоне, без повторов.
pub fn validate_card_indexes(
    indexes: &[usize],
    hand_len: usize,
    expected: usize,
) -> Result<(), EngineError> {
    if indexes.len() != expected {
        return Err(EngineError::WrongCardCount {
            expected,
            got: indexes.len(),
        });
    }

    let mut seen = vec![false; hand_len];
    for &idx in indexes {
        match seen.get_mut(idx) {
            None => return Err(EngineError::InvalidCardIndex(idx)),
            Some(true) => return Err(EngineError::DuplicateCardIndex(idx)),
            Some(flag) => *flag = true,
        }
    }

    Ok(())
}

/// Проверки перед выбором победителя.
pub fn validate_judging(state: &MatchState) -> Result<(), EngineError> {
    if state.is_finished() {
        return Err(EngineError::AlreadyFinished);
    }

    if state.phase != Phase::CzarChoosingWinner {
        return Err(EngineError::WrongPhase {
            expected: Phase::CzarChoosingWinner,
            actual: state.phase,
        });
    }

    if !state.all_sinners_played() {
        return Err(EngineError::IncompleteRound);
    }

    Ok(())
}
