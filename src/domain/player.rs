use serde::{Deserialize, Serialize};

use crate::domain::card::{BlackCard, WhiteCard};
use crate::domain::PlayerId;

/// Базовый профиль игрока – то, что не зависит от конкретного матча.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerProfile {
    pub id: PlayerId,
    pub name: String,
}

impl PlayerProfile {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Место игрока в конкретном матче.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Player {
    pub profile: PlayerProfile,
    /// Рука – видна только самому игроку.
    pub hand: Vec<WhiteCard>,
    /// Карты, сыгранные в текущем раунде (пусто между раундами).
    pub white_cards_in_play: Vec<WhiteCard>,
    /// Выигранные чёрные карты, по одной за раунд.
    pub points: Vec<BlackCard>,
}

impl Player {
    pub fn new(profile: PlayerProfile) -> Self {
        Self {
            profile,
            hand: Vec::new(),
            white_cards_in_play: Vec::new(),
            points: Vec::new(),
        }
    }

    pub fn id(&self) -> PlayerId {
        self.profile.id
    }

    pub fn has_played(&self) -> bool {
        !self.white_cards_in_play.is_empty()
    }

    /// Вынуть карты из руки по позициям, в порядке позиций.
    ///
    /// Позиции должны быть уже проверены (в диапазоне, без повторов) –
    /// см. `engine::validation::validate_card_indexes`.
    pub fn take_cards_from_hand(&mut self, indexes: &[usize]) -> Vec<WhiteCard> {
        let mut slots: Vec<Option<WhiteCard>> =
            std::mem::take(&mut self.hand).into_iter().map(Some).collect();

        let taken = indexes
            .iter()
            .filter_map(|&i| slots.get_mut(i).and_then(Option::take))
            .collect();

        self.hand = slots.into_iter().flatten().collect();
        taken
    }
}
