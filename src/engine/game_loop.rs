use tracing::debug;

use crate::domain::{MatchState, Phase, Player, PlayerId};
use crate::engine::errors::EngineError;
use crate::engine::options::{apply_options, MatchOption};
use crate::engine::validation::{validate_card_indexes, validate_judging, validate_play};
use crate::engine::RandomSource;
use crate::infra::rng::distinct_random_indices;

/// Меньше трёх игроков играть нельзя: один царь и минимум два грешника.
pub const MIN_PLAYERS: usize = 3;

/// Что стало с раундом после операции.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundStatus {
    /// Ждём карты от остальных грешников.
    AwaitingSinners,
    /// Все сыграли – ход царя.
    CzarChoosing,
    /// Победитель выбран, начался новый раунд.
    NextRound { round: u32 },
    /// Матч окончен.
    Finished,
}

/// Старт матча:
/// - рассаживает игроков;
/// - применяет опции (колоды, размер руки, царь, лимит раундов);
/// - раздаёт каждому `hand_size` белых карт;
/// - открывает первую чёрную карту (раунд 1).
///
/// При ошибке `state` не меняется.
pub fn initialize<R: RandomSource>(
    state: &mut MatchState,
    players: Vec<Player>,
    options: impl IntoIterator<Item = MatchOption>,
    rng: &mut R,
) -> Result<(), EngineError> {
    if state.is_initialized() {
        return Err(EngineError::AlreadyInitialized);
    }
    if players.len() < MIN_PLAYERS {
        return Err(EngineError::InsufficientPlayers { got: players.len() });
    }

    let mut next = state.clone();
    next.players = players;
    apply_options(&mut next, options, rng);

    if next.white_deck.is_empty() || next.black_deck.is_empty() {
        return Err(EngineError::EmptyDeck);
    }
    if next.white_deck.len() < next.cards_needed_to_refill() {
        return Err(EngineError::EmptyDeck);
    }
    // Иначе раунд с такой картой никто не сможет сыграть.
    if let Some(blanks) = next.black_deck.iter().map(|c| c.blanks_required).max() {
        if blanks > next.hand_size {
            return Err(EngineError::HandTooSmall {
                hand_size: next.hand_size,
                blanks,
            });
        }
    }

    deal_hands(&mut next)?;
    put_black_card_in_play(&mut next)?;

    debug!(
        match_id = next.id,
        players = next.players.len(),
        hand_size = next.hand_size,
        czar = next.curr_czar_index,
        "match initialized"
    );

    *state = next;
    Ok(())
}

/// Грешник кладёт карты из руки по позициям `card_indexes`.
///
/// Либо переезжают все карты, либо ни одной. Если после этого все грешники
/// сыграли, фаза переходит в `CzarChoosingWinner`.
pub fn play_white_cards(
    state: &mut MatchState,
    player_index: usize,
    card_indexes: &[usize],
) -> Result<RoundStatus, EngineError> {
    let blanks = validate_play(state, player_index)?;
    let hand_len = state.players[player_index].hand.len();
    validate_card_indexes(card_indexes, hand_len, blanks)?;

    let player = &mut state.players[player_index];
    let cards = player.take_cards_from_hand(card_indexes);
    player.white_cards_in_play.extend(cards);

    if state.all_sinners_played() {
        state.phase = Phase::CzarChoosingWinner;
        return Ok(RoundStatus::CzarChoosing);
    }

    Ok(RoundStatus::AwaitingSinners)
}

/// То же, что `play_white_cards`, но позиции выбираются случайно (боты, тесты).
pub fn play_random_white_cards<R: RandomSource>(
    state: &mut MatchState,
    player_index: usize,
    rng: &mut R,
) -> Result<RoundStatus, EngineError> {
    let blanks = validate_play(state, player_index)?;
    let hand_len = state.players[player_index].hand.len();

    let indexes = distinct_random_indices(rng, blanks, 0, hand_len).map_err(|_| {
        EngineError::NotEnoughCards {
            needed: blanks,
            in_hand: hand_len,
        }
    })?;

    debug!(
        match_id = state.id,
        player_index,
        ?indexes,
        "random white cards"
    );

    play_white_cards(state, player_index, &indexes)
}

/// Решение царя: чёрная карта уходит победителю, сыгранные белые – в сброс.
///
/// Дальше либо конец матча (лимит раундов или пустая колода), либо
/// следующий царь, новая чёрная карта и добор рук.
pub fn give_black_card_to_winner(
    state: &mut MatchState,
    winner_id: PlayerId,
) -> Result<RoundStatus, EngineError> {
    validate_judging(state)?;

    let winner_index = state
        .player_index(winner_id)
        .ok_or(EngineError::UnknownWinner(winner_id))?;

    let black = state
        .black_card_in_play
        .take()
        .ok_or(EngineError::Internal("нет чёрной карты в игре"))?;
    state.players[winner_index].points.push(black);
    discard_cards_in_play(state);

    if round_limit_reached(state) || decks_exhausted(state) {
        state.phase = Phase::Finished;
        debug!(match_id = state.id, round = state.curr_round, "match finished");
        return Ok(RoundStatus::Finished);
    }

    next_czar(state);

    match put_black_card_in_play(state) {
        Ok(()) => {}
        Err(EngineError::EmptyDeck) => {
            state.phase = Phase::Finished;
            return Ok(RoundStatus::Finished);
        }
        Err(e) => return Err(e),
    }
    deal_hands(state)?;

    Ok(RoundStatus::NextRound {
        round: state.curr_round,
    })
}

/// Принудительное завершение матча.
///
/// Нераскрытая чёрная карта возвращается наверх колоды, сыгранные белые – в сброс.
pub fn end(state: &mut MatchState) -> Result<(), EngineError> {
    if state.is_finished() {
        return Err(EngineError::AlreadyFinished);
    }

    if let Some(black) = state.black_card_in_play.take() {
        state.black_deck.put_on_top(black);
    }
    discard_cards_in_play(state);
    state.phase = Phase::Finished;

    Ok(())
}

fn round_limit_reached(state: &MatchState) -> bool {
    state.max_rounds > 0 && state.curr_round >= state.max_rounds
}

/// Новый раунд невозможен: нечего открыть или нечем добрать руки.
fn decks_exhausted(state: &MatchState) -> bool {
    state.black_deck.is_empty()
        || state.white_deck.is_empty()
        || state.white_deck.len() < state.cards_needed_to_refill()
}

/// Следующий царь по кругу.
fn next_czar(state: &mut MatchState) {
    if state.players.is_empty() {
        return;
    }
    state.curr_czar_index = (state.curr_czar_index + 1) % state.players.len();
}

/// Открыть чёрную карту: новый раунд, фаза `SinnersPlaying`.
fn put_black_card_in_play(state: &mut MatchState) -> Result<(), EngineError> {
    if state.black_card_in_play.is_some() {
        return Err(EngineError::Internal("чёрная карта уже в игре"));
    }
    if state.is_finished() {
        return Err(EngineError::AlreadyFinished);
    }

    let card = state.black_deck.draw_one().ok_or(EngineError::EmptyDeck)?;
    state.black_card_in_play = Some(card);
    state.phase = Phase::SinnersPlaying;
    state.curr_round += 1;

    Ok(())
}

/// Добрать всем руки до `hand_size`.
fn deal_hands(state: &mut MatchState) -> Result<(), EngineError> {
    let hand_size = state.hand_size;
    for player in state.players.iter_mut() {
        while player.hand.len() < hand_size {
            let card = state.white_deck.draw_one().ok_or(EngineError::EmptyDeck)?;
            player.hand.push(card);
        }
    }
    Ok(())
}

/// Все сыгранные белые карты уходят в сброс.
fn discard_cards_in_play(state: &mut MatchState) {
    for player in state.players.iter_mut() {
        state.discard_pile.append(&mut player.white_cards_in_play);
    }
}
