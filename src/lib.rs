//! Движок партийной карточной игры «царь и грешники».
//!
//! Царь открывает чёрную карту, остальные игроки (грешники) кладут белые
//! карты с руки, царь выбирает победителя раунда. Здесь живут:
//! - машина состояний одного матча с колодами и руками (`engine`);
//! - рассылка каждого закоммиченного изменения всем, кто смотрит матч (`broadcast`);
//! - лобби, которое стартует матчи (`lobby`), и внешний API (`api`).

pub mod api;
pub mod broadcast;
pub mod config;
pub mod domain;
pub mod engine;
pub mod infra;
pub mod lobby;
pub mod state;

pub use crate::config::EngineConfig;
pub use crate::state::AppState;
