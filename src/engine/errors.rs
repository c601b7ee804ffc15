use crate::domain::{Phase, PlayerId};

use thiserror::Error;

/// Класс ошибки – для внешнего кода, которому неважна конкретная причина.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Действие нарушает правила в текущем состоянии.
    Validation,
    /// Кончилась колода.
    ResourceExhausted,
    /// Матч уже окончен.
    AlreadyFinished,
    /// Нет такого матча.
    NotFound,
    /// Хранилище не приняло изменение.
    Persistence,
}

/// Ошибки движка матча.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Для матча нужно минимум 3 игрока, получено {got}")]
    InsufficientPlayers { got: usize },

    #[error("Колода пуста")]
    EmptyDeck,

    #[error("Матч уже инициализирован")]
    AlreadyInitialized,

    #[error("Игрока с индексом {0} нет в матче")]
    InvalidPlayer(usize),

    #[error("Царь не может играть белые карты")]
    CzarCannotPlay,

    #[error("Игрок уже сыграл карты в этом раунде")]
    AlreadyPlayed,

    #[error("Размер руки {hand_size} меньше пропусков чёрной карты ({blanks})")]
    HandTooSmall { hand_size: usize, blanks: usize },

    #[error("Неверное число карт: нужно {expected}, получено {got}")]
    WrongCardCount { expected: usize, got: usize },

    #[error("На руке {in_hand} карт, а нужно сыграть {needed}")]
    NotEnoughCards { needed: usize, in_hand: usize },

    #[error("Позиции {0} нет в руке")]
    InvalidCardIndex(usize),

    #[error("Позиция {0} указана дважды")]
    DuplicateCardIndex(usize),

    #[error("Действие недопустимо в фазе {actual}, нужна {expected}")]
    WrongPhase { expected: Phase, actual: Phase },

    #[error("Не все грешники сыграли свои карты")]
    IncompleteRound,

    #[error("Игрок {0} не сидит в этом матче")]
    UnknownWinner(PlayerId),

    #[error("Матч уже окончен")]
    AlreadyFinished,

    #[error("Внутренняя ошибка: {0}")]
    Internal(&'static str),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::EmptyDeck => ErrorKind::ResourceExhausted,
            EngineError::AlreadyFinished => ErrorKind::AlreadyFinished,
            _ => ErrorKind::Validation,
        }
    }
}
