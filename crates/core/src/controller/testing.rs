//! Test doubles for driving the controller without a real network.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use url::Url;

use super::{CacheController, ControllerConfig, PartitionNames};
use crate::Error;
use crate::cache::{CacheStorage, RequestKey};
use crate::http::{Method, Request, Response};
use crate::network::Network;

pub(crate) const ORIGIN: &str = "https://legallyup.test";

pub(crate) fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

pub(crate) fn config() -> ControllerConfig {
    ControllerConfig {
        version: "v1".into(),
        origin: Url::parse(ORIGIN).unwrap(),
        names: PartitionNames::new("legallyup", "v1"),
        static_assets: vec!["/".into(), "/favicon.ico".into(), "/vite.svg".into()],
        preserve_legacy_cache: true,
    }
}

/// Open `partition` and store one entry in it.
pub(crate) async fn seed(storage: &dyn CacheStorage, partition: &str, key: &RequestKey, response: Response) {
    storage.open(partition).await.unwrap();
    storage.put(partition, key, &response).await.unwrap();
}

pub(crate) fn controller(storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> CacheController {
    CacheController::new(config(), storage, network)
}

#[derive(Clone)]
enum Route {
    Respond(Response),
    Fail,
    /// Respond only once the paired `Notify` fires.
    Gated(Response, Arc<Notify>),
}

/// Scripted network. Unknown URLs behave as if offline.
#[derive(Default)]
pub(crate) struct FakeNetwork {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<(Method, String)>>,
}

impl FakeNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, path: &str, response: Response) {
        self.routes
            .lock()
            .unwrap()
            .insert(url(path).to_string(), Route::Respond(response));
    }

    pub(crate) fn fail(&self, path: &str) {
        self.routes.lock().unwrap().insert(url(path).to_string(), Route::Fail);
    }

    pub(crate) fn gated(&self, path: &str, response: Response) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.routes
            .lock()
            .unwrap()
            .insert(url(path).to_string(), Route::Gated(response, Arc::clone(&gate)));
        gate
    }

    pub(crate) fn calls_to(&self, path: &str) -> usize {
        let target = url(path).to_string();
        self.calls.lock().unwrap().iter().filter(|(_, u)| *u == target).count()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let target = request.url.to_string();
        self.calls
            .lock()
            .unwrap()
            .push((request.method.clone(), target.clone()));
        let route = self.routes.lock().unwrap().get(&target).cloned();

        match route {
            Some(Route::Respond(response)) => Ok(response.with_url(target)),
            Some(Route::Gated(response, gate)) => {
                gate.notified().await;
                Ok(response.with_url(target))
            }
            Some(Route::Fail) | None => Err(Error::Network(format!("failed to fetch {target}"))),
        }
    }
}
