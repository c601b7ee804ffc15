use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::card::CardId;
use crate::domain::{MatchId, RoomId};

/// Простая генерация ID на основе монотонных счётчиков.
/// Используется in-memory хранилищами, каталогом карт и хабом подписок.
#[derive(Debug)]
pub struct IdGenerator {
    match_counter: AtomicU64,
    room_counter: AtomicU64,
    card_counter: AtomicU64,
    subscription_counter: AtomicU64,
}

impl IdGenerator {
    /// Создать генератор с начальным значением 1 для всех сущностей.
    pub fn new() -> Self {
        Self {
            match_counter: AtomicU64::new(1),
            room_counter: AtomicU64::new(1),
            card_counter: AtomicU64::new(1),
            subscription_counter: AtomicU64::new(1),
        }
    }

    #[inline]
    pub fn next_match_id(&self) -> MatchId {
        self.match_counter.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn next_room_id(&self) -> RoomId {
        self.room_counter.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn next_card_id(&self) -> CardId {
        self.card_counter.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn next_subscription_id(&self) -> u64 {
        self.subscription_counter.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
