/// Character pool fetching.
///
/// A batch of random ids is requested from the character API in one call
/// (`<base>/<id>,<id>,...`). The blocking HTTP call runs on a single worker
/// thread so the frame loop never waits on the network; results come back
/// over a channel stamped with the epoch that asked for them.
///
/// There is no automatic retry. A failed fetch leaves the pool empty and the
/// player can restart to ask again.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use rand::Rng;
use thiserror::Error;

use crate::config::ApiConfig;
use crate::domain::character::{decode_batch, Character};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered {status}")]
    Status { url: String, status: u16 },
    #[error("malformed character payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("fetch worker is not running")]
    WorkerGone,
}

/// Anything that can produce characters for a list of ids.
pub trait CharacterSource: Send + 'static {
    fn fetch(&self, ids: &[u32]) -> Result<Vec<Character>, FetchError>;
}

// ══════════════════════════════════════════════════════════════
// HTTP source
// ══════════════════════════════════════════════════════════════

pub struct HttpSource {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(cfg: &ApiConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(cfg.timeout)
            .user_agent(concat!("rickquiz/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(HttpSource {
            client,
            base_url: cfg.base_url.clone(),
        })
    }
}

impl CharacterSource for HttpSource {
    fn fetch(&self, ids: &[u32]) -> Result<Vec<Character>, FetchError> {
        let url = batch_url(&self.base_url, ids);
        tracing::debug!(%url, "fetching characters");

        let http = |source| FetchError::Http { url: url.clone(), source };
        let response = self.client.get(&url).send().map_err(http)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url: url.clone(), status: status.as_u16() });
        }
        let body = response.text().map_err(http)?;
        Ok(decode_batch(&body)?)
    }
}

pub fn batch_url(base_url: &str, ids: &[u32]) -> String {
    let joined: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    format!("{}/{}", base_url.trim_end_matches('/'), joined.join(","))
}

/// `count` distinct ids in `1..=max_id` (fewer if `max_id < count`).
pub fn random_ids<R: Rng + ?Sized>(rng: &mut R, count: usize, max_id: u32) -> Vec<u32> {
    let amount = count.min(max_id as usize);
    rand::seq::index::sample(rng, max_id as usize, amount)
        .into_iter()
        .map(|i| i as u32 + 1)
        .collect()
}

// ══════════════════════════════════════════════════════════════
// Background loader
// ══════════════════════════════════════════════════════════════

pub struct PoolReply {
    pub epoch: u64,
    pub result: Result<Vec<Character>, FetchError>,
}

/// Owns the fetch worker. Dropping the loader closes the request channel,
/// which ends the worker loop.
pub struct PoolLoader {
    requests: Option<Sender<u64>>,
    replies: Receiver<PoolReply>,
    worker: Option<JoinHandle<()>>,
}

impl PoolLoader {
    pub fn spawn<S: CharacterSource>(source: S, batch_size: usize, max_id: u32) -> Self {
        let (req_tx, req_rx) = mpsc::channel::<u64>();
        let (reply_tx, reply_rx) = mpsc::channel::<PoolReply>();

        let worker = thread::Builder::new()
            .name("pool-loader".into())
            .spawn(move || {
                let mut rng = rand::thread_rng();
                for epoch in req_rx {
                    let ids = random_ids(&mut rng, batch_size, max_id);
                    let result = source.fetch(&ids);
                    if reply_tx.send(PoolReply { epoch, result }).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| tracing::error!("could not start fetch worker: {e}"))
            .ok();

        PoolLoader {
            requests: Some(req_tx),
            replies: reply_rx,
            worker,
        }
    }

    /// Queue a fetch for `epoch`. If the worker is gone the failure is
    /// returned immediately so the caller can surface it.
    pub fn request(&self, epoch: u64) -> Result<(), FetchError> {
        match &self.requests {
            Some(tx) if self.worker.is_some() => tx.send(epoch).map_err(|_| FetchError::WorkerGone),
            _ => Err(FetchError::WorkerGone),
        }
    }

    /// Next finished fetch, if any. Never blocks.
    pub fn try_recv(&self) -> Option<PoolReply> {
        match self.replies.try_recv() {
            Ok(reply) => Some(reply),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => None,
        }
    }
}

impl Drop for PoolLoader {
    fn drop(&mut self) {
        self.requests.take();
        // A fetch in flight finishes on its own; don't hold up exit for it.
        self.worker.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::question::tests::pool;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::time::{Duration, Instant};

    #[test]
    fn batch_url_joins_ids() {
        assert_eq!(
            batch_url("https://rickandmortyapi.com/api/character/", &[1, 183, 42]),
            "https://rickandmortyapi.com/api/character/1,183,42"
        );
    }

    #[test]
    fn random_ids_are_distinct_and_in_range() {
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..50 {
            let mut ids = random_ids(&mut rng, 12, 826);
            assert_eq!(ids.len(), 12);
            assert!(ids.iter().all(|id| (1..=826).contains(id)));
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), 12);
        }
        assert_eq!(random_ids(&mut rng, 12, 3).len(), 3);
    }

    struct Canned(usize);

    impl CharacterSource for Canned {
        fn fetch(&self, ids: &[u32]) -> Result<Vec<Character>, FetchError> {
            assert_eq!(ids.len(), self.0);
            Ok(pool(ids.len() as u32))
        }
    }

    struct Broken;

    impl CharacterSource for Broken {
        fn fetch(&self, _ids: &[u32]) -> Result<Vec<Character>, FetchError> {
            Err(FetchError::Status { url: "x".into(), status: 500 })
        }
    }

    fn wait_for(loader: &PoolLoader) -> PoolReply {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(reply) = loader.try_recv() {
                return reply;
            }
            assert!(Instant::now() < deadline, "loader never replied");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn loader_replies_with_requesting_epoch() {
        let loader = PoolLoader::spawn(Canned(12), 12, 826);
        assert!(loader.try_recv().is_none());
        loader.request(3).unwrap();
        let reply = wait_for(&loader);
        assert_eq!(reply.epoch, 3);
        assert_eq!(reply.result.unwrap().len(), 12);
    }

    #[test]
    fn loader_forwards_failures() {
        let loader = PoolLoader::spawn(Broken, 12, 826);
        loader.request(0).unwrap();
        let reply = wait_for(&loader);
        assert!(matches!(reply.result, Err(FetchError::Status { status: 500, .. })));
    }

    /// Serve exactly one HTTP response on a loopback port.
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let response = format!(
                    "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}/api/character")
    }

    fn source_for(base_url: String) -> HttpSource {
        HttpSource::new(&ApiConfig {
            base_url,
            batch_size: 2,
            max_character_id: 826,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn http_source_decodes_array() {
        let base = serve_once(
            "HTTP/1.1 200 OK",
            r#"[{"id":1,"name":"Rick Sanchez","status":"Alive","species":"Human","origin":{"name":"Earth (C-137)"},"image":"a.jpeg"},{"id":2,"name":"Morty Smith"}]"#,
        );
        let list = source_for(base).fetch(&[1, 2]).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name, "Rick Sanchez");
        assert_eq!(list[1].name, "Morty Smith");
    }

    #[test]
    fn http_source_normalizes_single_object() {
        let base = serve_once("HTTP/1.1 200 OK", r#"{"id":7,"name":"Abradolf Lincler"}"#);
        let list = source_for(base).fetch(&[7]).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, 7);
    }

    #[test]
    fn http_source_reports_status_and_garbage() {
        let base = serve_once("HTTP/1.1 404 Not Found", r#"{"error":"Character not found"}"#);
        assert!(matches!(
            source_for(base).fetch(&[9999]),
            Err(FetchError::Status { status: 404, .. })
        ));

        let base = serve_once("HTTP/1.1 200 OK", "<html>oops</html>");
        assert!(matches!(source_for(base).fetch(&[1]), Err(FetchError::Decode(_))));
    }
}
