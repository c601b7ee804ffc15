//! Рассылка закоммиченных снапшотов матча всем, кто за ним следит.
//!
//! - `BroadcastHub` – реестр подписчиков по матчу;
//! - `Subscription` – ручка подписчика, при drop отписывается сама;
//! - `spawn_listener` – задача, которая гонит снапшоты в транспорт.

pub mod hub;
pub mod listener;

pub use hub::{BroadcastHub, PublishReport, Subscription, SubscriptionId, SubscriptionKey};
pub use listener::spawn_listener;
