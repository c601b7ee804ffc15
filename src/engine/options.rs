use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{BlackCard, BlackDeck, MatchState, WhiteCard, WhiteDeck};
use crate::engine::RandomSource;

/// Одна настройка матча. Применяется к свежему `MatchState` до раздачи.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum MatchOption {
    /// Заменить белую колоду (карты будут перемешаны).
    WhiteDeck(Vec<WhiteCard>),
    /// Заменить чёрную колоду (карты будут перемешаны).
    BlackDeck(Vec<BlackCard>),
    HandSize(usize),
    /// Случайный стартовый царь. Без игроков – ничего не делает.
    RandomStartingCzar,
    /// Лимит раундов, 0 – без лимита.
    MaxRounds(u32),
}

/// Упорядоченный список настроек. Порядок добавления = порядок применения.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MatchOptions {
    pub items: Vec<MatchOption>,
}

impl MatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn white_deck(mut self, cards: Vec<WhiteCard>) -> Self {
        self.items.push(MatchOption::WhiteDeck(cards));
        self
    }

    pub fn black_deck(mut self, cards: Vec<BlackCard>) -> Self {
        self.items.push(MatchOption::BlackDeck(cards));
        self
    }

    pub fn hand_size(mut self, size: usize) -> Self {
        self.items.push(MatchOption::HandSize(size));
        self
    }

    pub fn random_starting_czar(mut self) -> Self {
        self.items.push(MatchOption::RandomStartingCzar);
        self
    }

    pub fn max_rounds(mut self, max: u32) -> Self {
        self.items.push(MatchOption::MaxRounds(max));
        self
    }

    pub fn push(&mut self, option: MatchOption) {
        self.items.push(option);
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchOption> {
        self.items.iter()
    }
}

impl IntoIterator for MatchOptions {
    type Item = MatchOption;
    type IntoIter = std::vec::IntoIter<MatchOption>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl From<Vec<MatchOption>> for MatchOptions {
    fn from(items: Vec<MatchOption>) -> Self {
        Self { items }
    }
}

/// Применить настройки по порядку.
pub fn apply_options<R: RandomSource>(
    state: &mut MatchState,
    options: impl IntoIterator<Item = MatchOption>,
    rng: &mut R,
) {
    for option in options {
        apply_option(state, option, rng);
    }
}

fn apply_option<R: RandomSource>(state: &mut MatchState, option: MatchOption, rng: &mut R) {
    match option {
        MatchOption::WhiteDeck(cards) => {
            let mut deck = WhiteDeck::from_cards(cards);
            rng.shuffle(deck.as_mut_slice());
            state.white_deck = deck;
        }
        MatchOption::BlackDeck(cards) => {
            let mut deck = BlackDeck::from_cards(cards);
            rng.shuffle(deck.as_mut_slice());
            state.black_deck = deck;
        }
        MatchOption::HandSize(size) => state.hand_size = size,
        MatchOption::RandomStartingCzar => {
            if state.players.is_empty() {
                warn!(match_id = state.id, "RandomStartingCzar applied to a match without players");
                return;
            }
            state.curr_czar_index = rng.index(state.players.len());
        }
        MatchOption::MaxRounds(max) => state.max_rounds = max,
    }
}
