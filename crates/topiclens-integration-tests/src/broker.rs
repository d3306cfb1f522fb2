//! In-process scripted broker for integration tests
//!
//! Speaks the same length-prefixed postcard protocol as a real broker and
//! keeps all state in memory: seedable per-partition offsets, an
//! active-reader gauge for leak assertions, and injectable faults (response
//! delays, dropped connections).

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::time::sleep;
use topiclens_protocol::{ErrorCode, OffsetSpec, PartitionLayout, Request, Response};
use tracing::debug;

/// Offset state of one partition
#[derive(Debug, Clone)]
pub struct PartitionState {
    /// First available offset
    pub earliest: u64,
    /// Next offset to be assigned
    pub latest: u64,
    /// Committed read position, if any reader ever established one
    pub committed: Option<u64>,
}

impl PartitionState {
    /// A partition with the given offset range and no established position
    pub fn new(earliest: u64, latest: u64) -> Self {
        Self {
            earliest,
            latest,
            committed: None,
        }
    }

    /// Set the committed read position
    pub fn with_committed(mut self, position: u64) -> Self {
        self.committed = Some(position);
        self
    }
}

#[derive(Debug, Default)]
struct Faults {
    /// Delay every describe response by this much
    describe_delay: Option<Duration>,
    /// Delay list-offsets responses for this reference point
    list_offsets_delay: Option<(OffsetSpec, Duration)>,
    /// Execute the next delete but close the connection without responding
    drop_after_next_delete: bool,
}

#[derive(Debug, Default)]
struct BrokerState {
    topics: Mutex<HashMap<String, Vec<PartitionState>>>,
    faults: Mutex<Faults>,
    active_readers: AtomicUsize,
    requests_served: AtomicU64,
}

/// A scripted broker listening on a random local port
pub struct ScriptedBroker {
    addr: SocketAddr,
    state: Arc<BrokerState>,
    accept_task: tokio::task::JoinHandle<()>,
}

impl ScriptedBroker {
    /// Bind to a random local port and start serving
    pub async fn start() -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(BrokerState::default());

        let accept_state = state.clone();
        let accept_task = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, peer)) => {
                        debug!(%peer, "broker accepted connection");
                        let state = accept_state.clone();
                        tokio::spawn(async move {
                            let _ = serve_connection(stream, state).await;
                        });
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            addr,
            state,
            accept_task,
        })
    }

    /// Address clients should bootstrap from
    pub fn address(&self) -> String {
        self.addr.to_string()
    }

    /// Seed a topic with explicit partition states
    pub async fn seed_topic(&self, name: &str, partitions: Vec<PartitionState>) {
        self.state
            .topics
            .lock()
            .await
            .insert(name.to_string(), partitions);
    }

    /// Whether a topic currently exists
    pub async fn topic_exists(&self, name: &str) -> bool {
        self.state.topics.lock().await.contains_key(name)
    }

    /// Readers currently assigned and not yet released
    pub fn active_readers(&self) -> usize {
        self.state.active_readers.load(Ordering::SeqCst)
    }

    /// Total requests handled so far
    pub fn requests_served(&self) -> u64 {
        self.state.requests_served.load(Ordering::SeqCst)
    }

    /// Delay every describe response
    pub async fn delay_describe(&self, delay: Duration) {
        self.state.faults.lock().await.describe_delay = Some(delay);
    }

    /// Delay list-offsets responses for one reference point
    pub async fn delay_list_offsets(&self, spec: OffsetSpec, delay: Duration) {
        self.state.faults.lock().await.list_offsets_delay = Some((spec, delay));
    }

    /// Execute the next delete, then drop the connection before the
    /// acknowledgment reaches the client (simulates a lost ack)
    pub async fn drop_connection_after_next_delete(&self) {
        self.state.faults.lock().await.drop_after_next_delete = true;
    }
}

impl Drop for ScriptedBroker {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

/// Per-connection session; a reader assignment lasts until the socket
/// closes.
#[derive(Default)]
struct Session {
    reader: Option<(String, Vec<u32>)>,
}

async fn serve_connection(mut stream: TcpStream, state: Arc<BrokerState>) -> anyhow::Result<()> {
    let mut session = Session::default();

    let result = async {
        loop {
            let mut len_buf = [0u8; 4];
            if stream.read_exact(&mut len_buf).await.is_err() {
                return Ok(());
            }
            let len = u32::from_be_bytes(len_buf) as usize;
            let mut buf = vec![0u8; len];
            stream.read_exact(&mut buf).await?;

            let request = Request::from_bytes(&buf)?;
            state.requests_served.fetch_add(1, Ordering::SeqCst);

            let response = match handle_request(request, &state, &mut session).await {
                Some(response) => response,
                // Scripted connection drop: stop responding entirely.
                None => return Ok(()),
            };

            let bytes = response.to_bytes()?;
            stream.write_all(&(bytes.len() as u32).to_be_bytes()).await?;
            stream.write_all(&bytes).await?;
            stream.flush().await?;
        }
    }
    .await;

    // Release the reader assignment on every exit path.
    if session.reader.is_some() {
        state.active_readers.fetch_sub(1, Ordering::SeqCst);
    }

    result
}

async fn handle_request(
    request: Request,
    state: &BrokerState,
    session: &mut Session,
) -> Option<Response> {
    match request {
        Request::CreateTopic { name, partitions } => {
            let count = partitions.filter(|&p| p > 0).unwrap_or(1);
            let mut topics = state.topics.lock().await;
            if topics.contains_key(&name) {
                return Some(error(ErrorCode::TopicAlreadyExists, "topic already exists"));
            }
            topics.insert(
                name.clone(),
                vec![PartitionState::new(0, 0); count as usize],
            );
            Some(Response::TopicCreated {
                name,
                partitions: count,
            })
        }

        Request::DeleteTopic { name } => {
            let drop_connection = {
                let mut faults = state.faults.lock().await;
                std::mem::take(&mut faults.drop_after_next_delete)
            };

            let removed = state.topics.lock().await.remove(&name).is_some();
            if drop_connection {
                // The delete happened, but the client never hears about it.
                return None;
            }
            if removed {
                Some(Response::TopicDeleted)
            } else {
                Some(error(ErrorCode::UnknownTopic, "no such topic"))
            }
        }

        Request::ListTopics => {
            let names = state.topics.lock().await.keys().cloned().collect();
            Some(Response::Topics { names })
        }

        Request::DescribeTopic { name } => {
            let delay = state.faults.lock().await.describe_delay;
            if let Some(delay) = delay {
                sleep(delay).await;
            }

            let topics = state.topics.lock().await;
            let Some(partitions) = topics.get(&name) else {
                return Some(error(ErrorCode::UnknownTopic, "no such topic"));
            };
            Some(Response::TopicLayout(PartitionLayout {
                name,
                partitions: (0..partitions.len() as u32).collect(),
            }))
        }

        Request::ListOffsets {
            topic,
            partitions,
            spec,
        } => {
            let delay = state.faults.lock().await.list_offsets_delay;
            if let Some((delayed_spec, delay)) = delay {
                if delayed_spec == spec {
                    sleep(delay).await;
                }
            }

            let topics = state.topics.lock().await;
            let Some(states) = topics.get(&topic) else {
                return Some(error(ErrorCode::UnknownTopic, "no such topic"));
            };

            let mut offsets = HashMap::new();
            for partition in partitions {
                let Some(p) = states.get(partition as usize) else {
                    return Some(error(ErrorCode::Internal, "unknown partition"));
                };
                let offset = match spec {
                    OffsetSpec::Earliest => p.earliest,
                    OffsetSpec::Latest => p.latest,
                };
                offsets.insert(partition, offset);
            }
            Some(Response::Offsets { offsets })
        }

        Request::AssignReader { topic, partitions } => {
            let topics = state.topics.lock().await;
            let Some(states) = topics.get(&topic) else {
                return Some(error(ErrorCode::UnknownTopic, "no such topic"));
            };
            if partitions.iter().any(|&p| p as usize >= states.len()) {
                return Some(error(ErrorCode::Internal, "unknown partition"));
            }
            drop(topics);

            state.active_readers.fetch_add(1, Ordering::SeqCst);
            session.reader = Some((topic, partitions));
            Some(Response::ReaderAssigned)
        }

        Request::FetchPositions => {
            let Some((topic, partitions)) = session.reader.clone() else {
                return Some(error(ErrorCode::NoReaderAssigned, "assign a reader first"));
            };

            let topics = state.topics.lock().await;
            let Some(states) = topics.get(&topic) else {
                return Some(error(ErrorCode::UnknownTopic, "topic deleted mid-read"));
            };

            let positions = partitions
                .iter()
                .map(|&p| (p, states.get(p as usize).and_then(|s| s.committed)))
                .collect();
            Some(Response::Positions { positions })
        }

        Request::Ping => Some(Response::Pong),
    }
}

fn error(code: ErrorCode, message: &str) -> Response {
    Response::Error {
        code,
        message: message.to_string(),
    }
}
