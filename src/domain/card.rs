use core::fmt;

use serde::{Deserialize, Serialize};

/// Стабильный идентификатор карты в каталоге.
pub type CardId = u64;

/// Белая карта – ответ, который грешники кладут на стол.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct WhiteCard {
    pub id: CardId,
    pub text: String,
    /// Название дополнения (набора карт), из которого пришла карта.
    pub expansion: String,
}

impl WhiteCard {
    pub fn new(id: CardId, text: impl Into<String>, expansion: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            expansion: expansion.into(),
        }
    }
}

/// Чёрная карта – вопрос/фраза с пропусками, которую открывает царь.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct BlackCard {
    pub id: CardId,
    pub text: String,
    pub expansion: String,
    /// Сколько белых карт должен сыграть каждый грешник.
    pub blanks_required: usize,
}

impl BlackCard {
    pub fn new(
        id: CardId,
        text: impl Into<String>,
        expansion: impl Into<String>,
        blanks_required: usize,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            expansion: expansion.into(),
            blanks_required,
        }
    }

    /// Число пропусков по тексту: каждый `_` – один пропуск, минимум один.
    pub fn blanks_in_text(text: &str) -> usize {
        text.matches('_').count().max(1)
    }
}

impl fmt::Display for WhiteCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl fmt::Display for BlackCard {
    /// Формат вида `Why can't I sleep at night? _ [1]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.text, self.blanks_required)
    }
}
