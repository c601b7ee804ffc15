use std::collections::BTreeMap;

use parking_lot::RwLock;
use tracing::info;

use crate::domain::card::{BlackCard, WhiteCard};
use crate::infra::ids::IdGenerator;

/// Каталог карт: откуда вызывающий код собирает колоды перед стартом матча.
pub trait CardCatalog: Send + Sync {
    fn whites_by_expansion(&self, expansions: &[&str]) -> Vec<WhiteCard>;

    fn blacks_by_expansion(&self, expansions: &[&str]) -> Vec<BlackCard>;

    fn available_expansions(&self) -> Vec<String>;
}

#[derive(Debug, Default)]
struct Expansion {
    whites: Vec<WhiteCard>,
    blacks: Vec<BlackCard>,
}

/// Каталог в памяти. Дополнения хранятся по имени, порядок имён стабильный.
#[derive(Debug, Default)]
pub struct InMemoryCardCatalog {
    ids: IdGenerator,
    expansions: RwLock<BTreeMap<String, Expansion>>,
}

impl InMemoryCardCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_white(&self, text: &str, expansion: &str) -> WhiteCard {
        let card = WhiteCard::new(self.ids.next_card_id(), text, expansion);
        self.expansions
            .write()
            .entry(expansion.to_string())
            .or_default()
            .whites
            .push(card.clone());
        card
    }

    pub fn add_black(&self, text: &str, expansion: &str, blanks: usize) -> BlackCard {
        let card = BlackCard::new(self.ids.next_card_id(), text, expansion, blanks);
        self.expansions
            .write()
            .entry(expansion.to_string())
            .or_default()
            .blacks
            .push(card.clone());
        card
    }

    /// Загрузить дополнение из текста: одна карта на строку.
    ///
    /// Пустые строки и строки, начинающиеся с `#`, пропускаются.
    /// Для чёрных карт число пропусков = число `_` (минимум 1).
    /// Возвращает (белых, чёрных) добавлено.
    pub fn load_expansion(&self, expansion: &str, whites: &str, blacks: &str) -> (usize, usize) {
        let mut white_count = 0;
        for text in card_lines(whites) {
            self.add_white(text, expansion);
            white_count += 1;
        }

        let mut black_count = 0;
        for text in card_lines(blacks) {
            self.add_black(text, expansion, BlackCard::blanks_in_text(text));
            black_count += 1;
        }

        info!(
            expansion,
            whites = white_count,
            blacks = black_count,
            "expansion loaded"
        );
        (white_count, black_count)
    }
}

fn card_lines(data: &str) -> impl Iterator<Item = &str> {
    data.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

impl CardCatalog for InMemoryCardCatalog {
    fn whites_by_expansion(&self, expansions: &[&str]) -> Vec<WhiteCard> {
        let all = self.expansions.read();
        expansions
            .iter()
            .filter_map(|name| all.get(*name))
            .flat_map(|e| e.whites.iter().cloned())
            .collect()
    }

    fn blacks_by_expansion(&self, expansions: &[&str]) -> Vec<BlackCard> {
        let all = self.expansions.read();
        expansions
            .iter()
            .filter_map(|name| all.get(*name))
            .flat_map(|e| e.blacks.iter().cloned())
            .collect()
    }

    fn available_expansions(&self) -> Vec<String> {
        self.expansions.read().keys().cloned().collect()
    }
}
