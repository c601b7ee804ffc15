use std::sync::Arc;

use tracing::warn;

use crate::api::{
    build_match_view, build_room_view, execute_command, ApiError, Command, CommandResponse, Query,
    QueryResponse,
};
use crate::broadcast::BroadcastHub;
use crate::config::EngineConfig;
use crate::engine::{MatchManager, RandomSource};
use crate::infra::catalog::InMemoryCardCatalog;
use crate::infra::persistence::{InMemoryMatchStateStore, InMemoryRoomStore, MatchStateStore, RoomStore};
use crate::lobby::MatchLobby;

/// Собранное приложение: хранилища, хаб, менеджер матчей, лобби и каталог.
///
/// Хранилища передаются явно – никаких глобальных синглтонов.
pub struct AppState {
    pub config: EngineConfig,
    pub catalog: Arc<InMemoryCardCatalog>,
    pub manager: Arc<MatchManager>,
    pub lobby: MatchLobby,
}

impl AppState {
    pub fn new(
        config: EngineConfig,
        rooms: Arc<dyn RoomStore>,
        states: Arc<dyn MatchStateStore>,
        catalog: Arc<InMemoryCardCatalog>,
    ) -> Self {
        let hub = BroadcastHub::new(config.listener_buffer);
        let manager = Arc::new(MatchManager::new(Arc::clone(&states), hub));
        let lobby = MatchLobby::new(config.clone(), rooms, states, Arc::clone(&manager));

        Self {
            config,
            catalog,
            manager,
            lobby,
        }
    }

    /// Всё в памяти – для тестов и локального запуска.
    pub fn in_memory(config: EngineConfig) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryRoomStore::new()),
            Arc::new(InMemoryMatchStateStore::new()),
            Arc::new(InMemoryCardCatalog::new()),
        )
    }

    /// Выполнить команду; если матч закончился – закрыть комнату в лобби.
    pub fn handle_command<R: RandomSource>(
        &self,
        command: Command,
        rng: &mut R,
    ) -> Result<CommandResponse, ApiError> {
        let match_id = command.match_id();
        let response = execute_command(&self.manager, command, rng)?;

        if response.is_finished() {
            if let Err(err) = self.lobby.mark_finished(match_id) {
                warn!(match_id, %err, "finished match has no room");
            }
        }

        Ok(response)
    }

    pub fn handle_query<R: RandomSource>(
        &self,
        query: Query,
        rng: &mut R,
    ) -> Result<QueryResponse, ApiError> {
        match query {
            Query::GetMatch { match_id, viewer } => {
                let snapshot = self.manager.snapshot(match_id)?;
                if snapshot.player_index(viewer).is_none() {
                    return Err(ApiError::NotInMatch(viewer));
                }
                Ok(QueryResponse::Match(build_match_view(&snapshot, viewer, rng)))
            }
            Query::ListOpenRooms => {
                let rooms = self.lobby.all_open()?;
                Ok(QueryResponse::Rooms(rooms.iter().map(build_room_view).collect()))
            }
            Query::InProgressFor { player_id } => {
                let rooms = self.lobby.in_progress_for(player_id)?;
                Ok(QueryResponse::Rooms(rooms.iter().map(build_room_view).collect()))
            }
        }
    }
}
