use core::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::card::{BlackCard, WhiteCard};
use crate::domain::deck::{BlackDeck, WhiteDeck};
use crate::domain::player::Player;
use crate::domain::{MatchId, PlayerId};

/// Фаза раунда.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Грешники выбирают и кладут белые карты.
    SinnersPlaying,
    /// Все сыграли, царь выбирает победителя.
    CzarChoosingWinner,
    /// Матч окончен. Терминальная фаза.
    Finished,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::SinnersPlaying => "SinnersPlaying",
            Phase::CzarChoosingWinner => "CzarChoosingWinner",
            Phase::Finished => "Finished",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Полное состояние одного матча.
///
/// Меняется только через операции engine. Каждая карта в любой момент лежит
/// ровно в одном месте: колода, рука, стол (`white_cards_in_play`),
/// сброс или очки игрока.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchState {
    pub id: MatchId,
    pub phase: Phase,

    /// Порядок игроков задаёт очередь царя.
    pub players: Vec<Player>,

    pub black_deck: BlackDeck,
    pub white_deck: WhiteDeck,

    /// Текущая чёрная карта. None – карты в игре нет.
    pub black_card_in_play: Option<BlackCard>,

    /// Отыгранные белые карты, вышедшие из оборота.
    pub discard_pile: Vec<WhiteCard>,

    /// Сколько карт держит на руке каждый игрок.
    pub hand_size: usize,

    /// Индекс царя в `players`.
    pub curr_czar_index: usize,

    pub curr_round: u32,
    /// 0 – без ограничения.
    pub max_rounds: u32,

    /// Номер закоммиченной версии, растёт на каждой успешной мутации.
    pub version: u64,
}

impl MatchState {
    /// Пустое состояние: колоды пусты, игроков нет, царь 0, раундов без лимита.
    pub fn new(id: MatchId, hand_size: usize) -> Self {
        Self {
            id,
            phase: Phase::SinnersPlaying,
            players: Vec::new(),
            black_deck: BlackDeck::new(),
            white_deck: WhiteDeck::new(),
            black_card_in_play: None,
            discard_pile: Vec::new(),
            hand_size,
            curr_czar_index: 0,
            curr_round: 0,
            max_rounds: 0,
            version: 0,
        }
    }

    /// Инициализация уже была (первая чёрная карта вытянута).
    pub fn is_initialized(&self) -> bool {
        self.curr_round > 0
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn current_czar(&self) -> Option<&Player> {
        self.players.get(self.curr_czar_index)
    }

    pub fn is_czar(&self, player_id: PlayerId) -> bool {
        self.current_czar().map(|p| p.id() == player_id).unwrap_or(false)
    }

    pub fn player_index(&self, player_id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id() == player_id)
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id() == player_id)
    }

    pub fn blanks_required(&self) -> Option<usize> {
        self.black_card_in_play.as_ref().map(|c| c.blanks_required)
    }

    /// Все игроки, кроме царя, вместе с индексами.
    pub fn sinners(&self) -> impl Iterator<Item = (usize, &Player)> {
        let czar = self.curr_czar_index;
        self.players
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != czar)
    }

    /// Каждый грешник сыграл ровно `blanks_required` карт.
    pub fn all_sinners_played(&self) -> bool {
        match self.blanks_required() {
            Some(blanks) => self
                .sinners()
                .all(|(_, p)| p.white_cards_in_play.len() == blanks),
            None => false,
        }
    }

    /// Сколько белых карт нужно, чтобы добрать всем руки до `hand_size`.
    pub fn cards_needed_to_refill(&self) -> usize {
        self.players
            .iter()
            .map(|p| self.hand_size.saturating_sub(p.hand.len()))
            .sum()
    }
}
