//! Mock 考勤终端
//!
//! 用于单元测试与 dry-run 的 mock 实现，支持注入失败场景。

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use contracts::{Branch, PunchRecord};
use tracing::instrument;

use crate::client::{DeviceClient, DeviceConnector};
use crate::error::{DeviceError, Result};

/// Mock 终端内部状态
#[derive(Debug, Default)]
struct MockDeviceState {
    /// 终端当前保存的全部记录（设备顺序）
    records: Vec<PunchRecord>,
    /// connect 时失败
    fail_connect: bool,
    /// fetch_records 时失败
    fail_fetch: bool,
    /// disconnect 时失败
    fail_disconnect: bool,
    /// fetch_records 前的人为延迟
    fetch_delay: Option<Duration>,
    /// disconnect 前的人为延迟
    disconnect_delay: Option<Duration>,
    /// 调用计数
    connects: usize,
    fetches: usize,
    disconnects: usize,
}

/// Mock 终端句柄
///
/// Clone 之后共享同一份状态，测试可以在两次 fetch cycle 之间追加记录。
#[derive(Debug, Clone, Default)]
pub struct MockDevice {
    state: Arc<Mutex<MockDeviceState>>,
}

impl MockDevice {
    /// 创建空终端
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用初始记录创建终端
    pub fn with_records(records: Vec<PunchRecord>) -> Self {
        let device = Self::new();
        device.push_records(records);
        device
    }

    /// 追加记录（模拟新的打卡）
    pub fn push_records(&self, records: impl IntoIterator<Item = PunchRecord>) {
        self.state.lock().unwrap().records.extend(records);
    }

    /// 替换全部记录
    pub fn set_records(&self, records: Vec<PunchRecord>) {
        self.state.lock().unwrap().records = records;
    }

    pub fn set_fail_connect(&self, fail: bool) {
        self.state.lock().unwrap().fail_connect = fail;
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.state.lock().unwrap().fail_fetch = fail;
    }

    pub fn set_fail_disconnect(&self, fail: bool) {
        self.state.lock().unwrap().fail_disconnect = fail;
    }

    pub fn set_fetch_delay(&self, delay: Option<Duration>) {
        self.state.lock().unwrap().fetch_delay = delay;
    }

    pub fn set_disconnect_delay(&self, delay: Option<Duration>) {
        self.state.lock().unwrap().disconnect_delay = delay;
    }

    /// connect 调用次数
    pub fn connect_count(&self) -> usize {
        self.state.lock().unwrap().connects
    }

    /// fetch_records 调用次数
    pub fn fetch_count(&self) -> usize {
        self.state.lock().unwrap().fetches
    }

    /// disconnect 调用次数
    pub fn disconnect_count(&self) -> usize {
        self.state.lock().unwrap().disconnects
    }
}

/// 一次 fetch cycle 使用的 mock 会话
pub struct MockDeviceClient {
    address: String,
    /// None 表示该地址没有注册终端（不可达）
    device: Option<MockDevice>,
    connected: bool,
}

impl MockDeviceClient {
    pub fn new(address: impl Into<String>, device: Option<MockDevice>) -> Self {
        Self {
            address: address.into(),
            device,
            connected: false,
        }
    }

    fn device(&self) -> Result<&MockDevice> {
        self.device
            .as_ref()
            .ok_or_else(|| DeviceError::connection(&self.address, "no route to host"))
    }
}

impl DeviceClient for MockDeviceClient {
    #[instrument(name = "mock_device_connect", skip(self), fields(address = %self.address))]
    async fn connect(&mut self) -> Result<()> {
        let device = self.device()?;
        {
            let mut state = device.state.lock().unwrap();
            state.connects += 1;
            if state.fail_connect {
                return Err(DeviceError::connection(&self.address, "mock failure"));
            }
        }
        self.connected = true;
        Ok(())
    }

    #[instrument(name = "mock_device_fetch_records", skip(self), fields(address = %self.address))]
    async fn fetch_records(&mut self) -> Result<Vec<PunchRecord>> {
        if !self.connected {
            return Err(DeviceError::retrieval(&self.address, "not connected"));
        }
        let device = self.device()?.clone();

        let delay = device.state.lock().unwrap().fetch_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = device.state.lock().unwrap();
        state.fetches += 1;
        if state.fail_fetch {
            return Err(DeviceError::retrieval(&self.address, "mock failure"));
        }
        Ok(state.records.clone())
    }

    #[instrument(name = "mock_device_disconnect", skip(self), fields(address = %self.address))]
    async fn disconnect(&mut self) -> Result<()> {
        // 幂等：未连接时直接返回 Ok
        if !self.connected {
            return Ok(());
        }
        self.connected = false;

        let device = self.device()?.clone();
        let delay = device.state.lock().unwrap().disconnect_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = device.state.lock().unwrap();
        state.disconnects += 1;
        if state.fail_disconnect {
            return Err(DeviceError::disconnection(&self.address, "mock failure"));
        }
        Ok(())
    }
}

/// Mock 终端注册表，按地址分发 `MockDeviceClient`
#[derive(Debug, Default)]
pub struct MockConnector {
    devices: Mutex<HashMap<String, MockDevice>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// 在地址上注册一个空终端并返回其句柄
    pub fn register(&self, address: impl Into<String>) -> MockDevice {
        let device = MockDevice::new();
        self.attach(address, device.clone());
        device
    }

    /// 在地址上挂载已有终端
    pub fn attach(&self, address: impl Into<String>, device: MockDevice) {
        self.devices.lock().unwrap().insert(address.into(), device);
    }

    /// 获取已注册终端
    pub fn device(&self, address: &str) -> Option<MockDevice> {
        self.devices.lock().unwrap().get(address).cloned()
    }
}

impl DeviceConnector for MockConnector {
    type Client = MockDeviceClient;

    fn client_for(&self, branch: &Branch) -> MockDeviceClient {
        MockDeviceClient::new(&branch.address, self.device(&branch.address))
    }
}
