// src/lobby/mod.rs

pub mod lifecycle;

pub use lifecycle::{LobbyError, MatchLobby};
