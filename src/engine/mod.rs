//! Движок матча: правила, раздача, розыгрыш карт, выбор победителя, конец матча.
//!
//! Основные операции (над одним `MatchState`):
//!   - `initialize` – рассадить игроков, применить опции, раздать руки, открыть первую чёрную карту
//!   - `play_white_cards` / `play_random_white_cards` – ход грешника
//!   - `give_black_card_to_winner` – решение царя и переход к следующему раунду
//!   - `end` – принудительное завершение
//!
//! `MatchManager` поверх этого сериализует мутации по матчу, сохраняет и рассылает снапшоты.

pub mod errors;
pub mod game_loop;
pub mod match_manager;
pub mod options;
pub mod validation;

pub use errors::{EngineError, ErrorKind};
pub use game_loop::{
    end, give_black_card_to_winner, initialize, play_random_white_cards, play_white_cards,
    RoundStatus,
};
pub use match_manager::{ManagerError, MatchAction, MatchManager};
pub use options::{apply_options, MatchOption, MatchOptions};

/// RNG интерфейс для engine.
/// Реализации лежат в infra (обёртка над `rand`).
pub trait RandomSource {
    fn shuffle<T>(&mut self, slice: &mut [T]);

    /// Равномерный индекс из `0..upper`. `upper` > 0.
    fn index(&mut self, upper: usize) -> usize;
}
