//! Инфраструктурный слой вокруг движка:
//! - генерация ID;
//! - RNG-реализации для движка и выбор случайных позиций;
//! - абстракция хранения (матчи, комнаты) и in-memory реализации;
//! - каталог карт.

pub mod catalog;
pub mod ids;
pub mod persistence;
pub mod rng;

pub use catalog::*;
pub use ids::*;
pub use persistence::*;
pub use rng::*;
