use std::future::Future;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::broadcast::hub::Subscription;

/// Запустить задачу, которая передаёт каждый снапшот в транспорт.
///
/// Как только `deliver` вернёт ошибку (клиент отвалился) или подписка
/// закроется, задача завершается и подписка снимается.
pub fn spawn_listener<T, F, Fut, E>(mut subscription: Subscription<T>, mut deliver: F) -> JoinHandle<()>
where
    T: Send + 'static,
    F: FnMut(T) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    tokio::spawn(async move {
        let key = subscription.key();
        while let Some(snapshot) = subscription.recv().await {
            if let Err(err) = deliver(snapshot).await {
                debug!(
                    match_id = key.match_id,
                    subscription = key.id,
                    %err,
                    "listener transport closed"
                );
                break;
            }
        }
        drop(subscription);
    })
}
