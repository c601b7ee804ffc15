use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use tracing::{debug, trace};

use crate::domain::MatchId;
use crate::infra::ids::IdGenerator;

pub type SubscriptionId = u64;

/// Полный адрес подписки: матч + id внутри матча.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionKey {
    pub match_id: MatchId,
    pub id: SubscriptionId,
}

/// Итог одной рассылки.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Сколько подписчиков получили снапшот.
    pub delivered: usize,
    /// Очередь подписчика полна – снапшот для него выброшен.
    pub dropped: usize,
    /// Подписчик закрыл канал – удалён из реестра.
    pub pruned: usize,
    /// Версия не новее уже разосланной – ничего не отправлено.
    pub stale: bool,
}

/// Подписчики одного матча.
struct Topic<T> {
    subscribers: HashMap<SubscriptionId, mpsc::Sender<T>>,
    last_version: Option<u64>,
}

impl<T> Default for Topic<T> {
    fn default() -> Self {
        Self {
            subscribers: HashMap::new(),
            last_version: None,
        }
    }
}

struct HubInner<T> {
    ids: IdGenerator,
    /// Ёмкость очереди каждого подписчика.
    capacity: usize,
    topics: Mutex<HashMap<MatchId, Topic<T>>>,
}

impl<T> HubInner<T> {
    fn remove(&self, key: SubscriptionKey) -> bool {
        let mut topics = self.topics.lock();
        let Some(topic) = topics.get_mut(&key.match_id) else {
            return false;
        };
        let removed = topic.subscribers.remove(&key.id).is_some();
        if topic.subscribers.is_empty() {
            topics.remove(&key.match_id);
        }
        if removed {
            debug!(match_id = key.match_id, subscription = key.id, "listener unsubscribed");
        }
        removed
    }
}

/// Реестр слушателей по матчам.
///
/// Доставка неблокирующая: у каждого слушателя своя ограниченная очередь,
/// `publish` делает `try_send` и при полной очереди просто выбрасывает снапшот.
/// Подписка/отписка и рассылка сериализуются на одном мьютексе реестра,
/// независимом от блокировок матчей.
pub struct BroadcastHub<T> {
    inner: Arc<HubInner<T>>,
}

impl<T> Clone for BroadcastHub<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + 'static> BroadcastHub<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                ids: IdGenerator::new(),
                capacity: capacity.max(1),
                topics: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Зарегистрировать нового слушателя матча.
    pub fn subscribe(&self, match_id: MatchId) -> Subscription<T> {
        self.register(match_id, None)
    }

    /// Подписаться, уже имея снапшот версии `version`:
    /// версии не новее неё этому топику больше не рассылаются.
    pub fn subscribe_after(&self, match_id: MatchId, version: u64) -> Subscription<T> {
        self.register(match_id, Some(version))
    }

    fn register(&self, match_id: MatchId, seen: Option<u64>) -> Subscription<T> {
        let (tx, rx) = mpsc::channel(self.inner.capacity);
        let id = self.inner.ids.next_subscription_id();

        {
            let mut topics = self.inner.topics.lock();
            let topic = topics.entry(match_id).or_default();
            topic.last_version = topic.last_version.max(seen);
            topic.subscribers.insert(id, tx);
        }

        debug!(match_id, subscription = id, "listener subscribed");

        Subscription {
            key: SubscriptionKey { match_id, id },
            receiver: rx,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Отписать. Повторный вызов безопасен, вернёт false.
    pub fn unsubscribe(&self, key: SubscriptionKey) -> bool {
        self.inner.remove(key)
    }

    /// Разослать снапшот версии `version` всем текущим слушателям матча.
    ///
    /// Снапшоты с версией не новее последней разосланной отбрасываются,
    /// поэтому слушатель никогда не видит версии в обратном порядке.
    /// Топик живёт, пока у него есть слушатели: без них рассылать некому.
    pub fn publish(&self, match_id: MatchId, version: u64, snapshot: T) -> PublishReport {
        let mut report = PublishReport::default();
        let mut topics = self.inner.topics.lock();
        let Some(topic) = topics.get_mut(&match_id) else {
            return report;
        };

        if topic.last_version.is_some_and(|last| version <= last) {
            report.stale = true;
            trace!(match_id, version, "stale snapshot skipped");
            return report;
        }
        topic.last_version = Some(version);

        let mut closed = Vec::new();
        for (id, tx) in topic.subscribers.iter() {
            match tx.try_send(snapshot.clone()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    report.dropped += 1;
                    debug!(match_id, subscription = *id, version, "listener queue full, snapshot dropped");
                }
                Err(TrySendError::Closed(_)) => closed.push(*id),
            }
        }

        for id in closed {
            topic.subscribers.remove(&id);
            report.pruned += 1;
        }
        if topic.subscribers.is_empty() {
            topics.remove(&match_id);
        }

        report
    }

    /// Сколько слушателей сейчас у матча.
    pub fn subscriber_count(&self, match_id: MatchId) -> usize {
        self.inner
            .topics
            .lock()
            .get(&match_id)
            .map(|t| t.subscribers.len())
            .unwrap_or(0)
    }

    /// Сколько матчей сейчас имеют слушателей.
    pub fn active_topics(&self) -> usize {
        self.inner.topics.lock().len()
    }

    /// Закрыть матч целиком: все подписки получат конец потока.
    pub fn close_topic(&self, match_id: MatchId) -> usize {
        self.inner
            .topics
            .lock()
            .remove(&match_id)
            .map(|t| t.subscribers.len())
            .unwrap_or(0)
    }
}

/// Ручка слушателя. При drop отписывается от хаба.
pub struct Subscription<T> {
    key: SubscriptionKey,
    receiver: mpsc::Receiver<T>,
    hub: Weak<HubInner<T>>,
}

impl<T> Subscription<T> {
    pub fn key(&self) -> SubscriptionKey {
        self.key
    }

    pub fn match_id(&self) -> MatchId {
        self.key.match_id
    }

    /// Следующий снапшот. None – подписка закрыта (отписка или закрытие матча).
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    /// Неблокирующее чтение: None, если очередь пуста или закрыта.
    pub fn try_recv(&mut self) -> Option<T> {
        match self.receiver.try_recv() {
            Ok(snapshot) => Some(snapshot),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Забрать всё, что накопилось в очереди.
    pub fn drain(&mut self) -> Vec<T> {
        let mut out = Vec::new();
        while let Some(snapshot) = self.try_recv() {
            out.push(snapshot);
        }
        out
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.remove(self.key);
        }
    }
}
