//! Внешний API движка.
//!
//! Здесь описываются:
//! - команды (commands.rs) – всё, что меняет состояние матча (сыграть карты, выбрать победителя);
//! - запросы (queries.rs) – только чтение;
//! - DTO (dto.rs) – снапшот матча в том виде, в каком его видит клиент;
//! - ошибки (errors.rs) – то, что видит клиент.

pub mod commands;
pub mod dto;
pub mod errors;
pub mod queries;

pub use commands::*;
pub use dto::*;
pub use errors::*;
pub use queries::*;
