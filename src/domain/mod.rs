//! Доменная модель игры: карты, колоды, игроки, состояние матча, комнаты лобби.

pub mod card;
pub mod deck;
pub mod match_state;
pub mod player;
pub mod room;

// Базовые идентификаторы.
pub type PlayerId = u64;
pub type MatchId = u64;
pub type RoomId = u64;

// Удобные реэкспорты, чтобы в других модулях писать crate::domain::WhiteCard и т.п.
pub use card::*;
pub use deck::*;
pub use match_state::*;
pub use player::*;
pub use room::*;
