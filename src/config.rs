use serde::{Deserialize, Serialize};

/// Настройки движка и лобби.
///
/// Все поля имеют значения по умолчанию, поэтому JSON может задавать
/// только то, что нужно поменять.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Размер руки, если опция HandSize не передана.
    pub default_hand_size: usize,
    /// Минимум игроков для старта (не меньше 3 – это правило движка).
    pub min_players: usize,
    /// Допустимые границы опции HandSize.
    pub min_hand_size: usize,
    pub max_hand_size: usize,
    /// Ёмкость очереди одного слушателя в хабе.
    pub listener_buffer: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_hand_size: 10,
            min_players: 3,
            min_hand_size: 1,
            max_hand_size: 20,
            listener_buffer: 32,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn hand_size_allowed(&self, size: usize) -> bool {
        (self.min_hand_size..=self.max_hand_size).contains(&size)
    }
}
