use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::domain::card::{BlackCard, WhiteCard};

/// Колода карт. В домене – просто упорядоченная стопка, карты берутся сверху (спереди).
/// Перемешивание делает engine (через RNG из infra), НЕ здесь.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Deck<C> {
    pub cards: VecDeque<C>,
}

pub type WhiteDeck = Deck<WhiteCard>;
pub type BlackDeck = Deck<BlackCard>;

impl<C> Deck<C> {
    /// Пустая колода.
    pub fn new() -> Self {
        Self {
            cards: VecDeque::new(),
        }
    }

    /// Колода в том порядке, в котором пришли карты (первая – верхняя).
    pub fn from_cards(cards: Vec<C>) -> Self {
        Self {
            cards: cards.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Взять одну карту сверху колоды.
    pub fn draw_one(&mut self) -> Option<C> {
        self.cards.pop_front()
    }

    /// Вернуть карту наверх колоды.
    pub fn put_on_top(&mut self, card: C) {
        self.cards.push_front(card);
    }

    /// Карты одним срезом – нужно для перемешивания через RandomSource.
    pub fn as_mut_slice(&mut self) -> &mut [C] {
        self.cards.make_contiguous()
    }

    pub fn iter(&self) -> impl Iterator<Item = &C> {
        self.cards.iter()
    }
}

impl<C> Default for Deck<C> {
    fn default() -> Self {
        Self::new()
    }
}
