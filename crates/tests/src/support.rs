//! 测试基础设施：ingestion API 替身、TCP 考勤终端模拟器、调度器构建

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use bytes::Bytes;
use chrono::{NaiveDate, NaiveDateTime};
use contracts::{BranchDirectory, DeliveryMode, IngestionSettings, PunchRecord};
use device::zk::packet::{
    self, Packet, CMD_ACK_OK, CMD_ACK_UNAUTH, CMD_CONNECT, CMD_DATA, CMD_DATA_WRRQ, CMD_EXIT,
    CMD_FREE_DATA, PREFIX_LEN,
};
use device::zk::record::encode_records;
use device::DeviceConnector;
use forwarder::{AnySender, MeteredSender};
use poller::{CycleConfig, FetchCycle, FleetScheduler, SchedulerConfig, WatermarkStore};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Seconds after 2024-05-01 08:00:00
pub fn ts(seconds: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
        + chrono::Duration::seconds(seconds)
}

pub fn punch(user: &str, seconds: i64) -> PunchRecord {
    PunchRecord::new(user, ts(seconds))
}

/// ingestion API 替身，记录每个收到的 JSON body
#[derive(Default)]
pub struct IngestState {
    batches: Mutex<Vec<Value>>,
    failures_left: AtomicUsize,
}

pub struct IngestServer {
    pub url: String,
    state: Arc<IngestState>,
}

impl IngestServer {
    pub async fn start() -> Self {
        let state = Arc::new(IngestState::default());
        let app = Router::new()
            .route("/punches", post(ingest))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{addr}/punches"),
            state,
        }
    }

    /// 接下来的 `count` 个请求返回 500
    pub fn fail_next(&self, count: usize) {
        self.state.failures_left.store(count, Ordering::SeqCst);
    }

    /// 已接受的 batch
    pub fn batches(&self) -> Vec<Value> {
        self.state.batches.lock().unwrap().clone()
    }
}

async fn ingest(State(state): State<Arc<IngestState>>, Json(body): Json<Value>) -> StatusCode {
    let failing = state
        .failures_left
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
        .is_ok();
    if failing {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    state.batches.lock().unwrap().push(body);
    StatusCode::OK
}

/// 从 batch JSON 中取出 recordTime 列表
pub fn record_times(batch: &Value) -> Vec<String> {
    batch["punches"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["recordTime"].as_str().unwrap().to_string())
        .collect()
}

/// 说 TCP 考勤协议的终端模拟器
pub struct FakeTerminal {
    pub port: u16,
    records: Arc<Mutex<Vec<PunchRecord>>>,
    exits: Arc<AtomicUsize>,
}

impl FakeTerminal {
    const SESSION: u16 = 0x4a21;

    pub async fn start(records: Vec<PunchRecord>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let records = Arc::new(Mutex::new(records));
        let exits = Arc::new(AtomicUsize::new(0));

        let (shared_records, shared_exits) = (Arc::clone(&records), Arc::clone(&exits));
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve_session(
                    stream,
                    Arc::clone(&shared_records),
                    Arc::clone(&shared_exits),
                ));
            }
        });

        Self {
            port,
            records,
            exits,
        }
    }

    pub fn push(&self, records: impl IntoIterator<Item = PunchRecord>) {
        self.records.lock().unwrap().extend(records);
    }

    /// 收到 EXIT 的会话数
    pub fn exits(&self) -> usize {
        self.exits.load(Ordering::SeqCst)
    }
}

async fn serve_session(
    mut stream: TcpStream,
    records: Arc<Mutex<Vec<PunchRecord>>>,
    exits: Arc<AtomicUsize>,
) {
    loop {
        let mut prefix = [0u8; PREFIX_LEN];
        if stream.read_exact(&mut prefix).await.is_err() {
            return;
        }
        let Ok(len) = packet::parse_prefix(&prefix) else {
            return;
        };
        let mut body = vec![0u8; len];
        if stream.read_exact(&mut body).await.is_err() {
            return;
        }
        let Ok(request) = Packet::parse(Bytes::from(body)) else {
            return;
        };

        let (command, data) = match request.command {
            CMD_CONNECT | CMD_FREE_DATA | CMD_EXIT => (CMD_ACK_OK, Vec::new()),
            CMD_DATA_WRRQ => {
                let snapshot = records.lock().unwrap().clone();
                (CMD_DATA, encode_records(&snapshot))
            }
            _ => (CMD_ACK_UNAUTH, Vec::new()),
        };
        let frame = packet::encode(command, FakeTerminal::SESSION, request.reply_id, &data);
        if stream.write_all(&frame).await.is_err() {
            return;
        }

        if request.command == CMD_EXIT {
            exits.fetch_add(1, Ordering::SeqCst);
            return;
        }
    }
}

pub type GatewayScheduler<D, C> = FleetScheduler<D, C, MeteredSender<AnySender>>;

/// 按生产路径组装调度器：真实 HttpSender + 给定 directory / connector
pub fn build_gateway<D, C>(
    directory: D,
    connector: C,
    ingest_url: &str,
    mode: DeliveryMode,
) -> GatewayScheduler<D, C>
where
    D: BranchDirectory,
    C: DeviceConnector + 'static,
{
    let settings = IngestionSettings {
        url: ingest_url.to_string(),
        timeout_ms: 2_000,
        ..Default::default()
    };
    let sender = forwarder::create_sender(&settings).unwrap();
    let cycle = FetchCycle::new(
        Arc::new(WatermarkStore::new()),
        Arc::new(sender),
        CycleConfig {
            mode,
            ..Default::default()
        },
    );
    FleetScheduler::new(directory, connector, cycle, SchedulerConfig::default())
}
