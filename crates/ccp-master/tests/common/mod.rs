//! A scripted slave station on a virtual bus.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use ccp_master::sim::{BusNode, VirtualBus};
use ccp_master::{CanFrame, ConnectionConfig, Transport};
use ccp_protocol::*;
use parking_lot::Mutex;

pub const SEED: [u8; 4] = [0xDE, 0xAD, 0xBE, 0xEF];
pub const KEY: [u8; 4] = [0x21, 0x52, 0x41, 0x10];
pub const ACTIVE_PAGE: u32 = 0x0001_0000;

/// Route test logs through the test harness; `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// How the slave deviates from a well-behaved ECU.
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Opcodes answered with the given return code.
    pub reject: HashMap<u8, u8>,
    /// Opcodes never answered.
    pub silent: HashSet<u8>,
    /// Added to the echoed counter.
    pub counter_skew: u8,
    /// Delay before answering.
    pub delay: Duration,
}

#[derive(Debug, Default)]
struct SlaveState {
    mta: [(u8, u32); 2],
    memory: BTreeMap<u32, u8>,
    status: u8,
    unlocked: u8,
}

impl SlaveState {
    fn write(&mut self, data: &[u8]) {
        let (_, address) = self.mta[0];
        for (i, byte) in data.iter().enumerate() {
            self.memory.insert(address + i as u32, *byte);
        }
        self.mta[0].1 = address + data.len() as u32;
    }

    fn read(&self, address: u32, size: u8) -> Vec<u8> {
        (0..size as u32)
            .map(|i| self.memory.get(&(address + i)).copied().unwrap_or(0))
            .collect()
    }

    fn mta0_position(&self) -> Vec<u8> {
        let (ext, address) = self.mta[0];
        let mut out = vec![ext];
        out.extend_from_slice(&address.to_be_bytes());
        out
    }

    fn respond(&mut self, data: &[u8]) -> (u8, Vec<u8>) {
        let opcode = data[0];
        let p = &data[2..];
        let ack = |payload: Vec<u8>| (RET_ACKNOWLEDGE, payload);
        match opcode {
            CMD_GET_CCP_VERSION => ack(vec![CCP_VERSION_MAJOR, CCP_VERSION_MINOR]),
            CMD_EXCHANGE_ID => ack(vec![4, 0, RESOURCE_CAL | RESOURCE_DAQ | RESOURCE_PGM, RESOURCE_PGM]),
            CMD_SET_MTA => {
                let slot = p[0] as usize & 1;
                let address = u32::from_le_bytes([p[2], p[3], p[4], p[5]]);
                self.mta[slot] = (p[1], address);
                ack(vec![])
            }
            CMD_DNLOAD | CMD_PROGRAM => {
                let size = p[0] as usize;
                self.write(&p[1..1 + size]);
                ack(self.mta0_position())
            }
            CMD_DNLOAD_6 | CMD_PROGRAM_6 => {
                self.write(&p[..6]);
                ack(self.mta0_position())
            }
            CMD_UPLOAD => {
                let (_, address) = self.mta[0];
                let data = self.read(address, p[0]);
                self.mta[0].1 = address + p[0] as u32;
                ack(data)
            }
            CMD_SHORT_UP => {
                let address = u32::from_be_bytes([p[2], p[3], p[4], p[5]]);
                ack(self.read(address, p[0]))
            }
            CMD_GET_SEED => {
                let mut out = vec![1];
                out.extend_from_slice(&SEED);
                ack(out)
            }
            CMD_UNLOCK => {
                if p[..4] == KEY {
                    self.unlocked |= RESOURCE_PGM | RESOURCE_CAL;
                    ack(vec![self.unlocked])
                } else {
                    (RET_ACCESS_DENIED, vec![])
                }
            }
            CMD_GET_DAQ_SIZE => ack(vec![3, 0x10]),
            CMD_SET_S_STATUS => {
                self.status = p[0];
                ack(vec![])
            }
            CMD_GET_S_STATUS => ack(vec![self.status, 0]),
            CMD_BUILD_CHKSUM => ack(vec![2, 0xAB, 0xCD]),
            CMD_GET_ACTIVE_CAL_PAGE => {
                let mut out = vec![0];
                out.extend_from_slice(&ACTIVE_PAGE.to_be_bytes());
                ack(out)
            }
            CMD_DISCONNECT => {
                self.unlocked = 0;
                ack(vec![])
            }
            _ => ack(vec![]),
        }
    }
}

/// A slave answering on its own thread until dropped.
pub struct Slave {
    pub config: ConnectionConfig,
    received: Arc<Mutex<Vec<CanFrame>>>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Slave {
    pub fn spawn(bus: &VirtualBus, config: ConnectionConfig) -> Self {
        Self::spawn_with_faults(bus, config, Faults::default())
    }

    pub fn spawn_with_faults(bus: &VirtualBus, config: ConnectionConfig, faults: Faults) -> Self {
        let node = bus.node();
        let received = Arc::new(Mutex::new(Vec::new()));
        let stop = Arc::new(AtomicBool::new(false));
        let handle = {
            let config = config.clone();
            let received = Arc::clone(&received);
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || run(node, config, faults, received, stop))
        };
        Slave {
            config,
            received,
            stop,
            handle: Some(handle),
        }
    }

    /// Command frames addressed to this slave so far.
    pub fn received(&self) -> Vec<CanFrame> {
        self.received.lock().clone()
    }
}

impl Drop for Slave {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run(
    node: BusNode,
    config: ConnectionConfig,
    faults: Faults,
    received: Arc<Mutex<Vec<CanFrame>>>,
    stop: Arc<AtomicBool>,
) {
    let mut state = SlaveState::default();
    while !stop.load(Ordering::Acquire) {
        let frame = match node.receive(Some(Duration::from_millis(5))) {
            Ok(Some(frame)) if frame.id == config.cro_id => frame,
            Ok(_) => continue,
            Err(_) => return,
        };
        received.lock().push(frame);

        let data = frame.data();
        let (opcode, counter) = (data[0], data[1]);
        if faults.silent.contains(&opcode) {
            continue;
        }
        let (code, payload) = match faults.reject.get(&opcode) {
            Some(code) => (*code, vec![]),
            None => state.respond(data),
        };
        if !faults.delay.is_zero() {
            std::thread::sleep(faults.delay);
        }

        let response = ResponseFrame::new(code, counter.wrapping_add(faults.counter_skew), &payload)
            .expect("slave response fits a frame");
        let reply = CanFrame::new(config.dto_id, &response.to_bytes()).expect("8 bytes");
        if node.send(&reply).is_err() {
            return;
        }
    }
}

pub fn engine_ecu() -> ConnectionConfig {
    ConnectionConfig::new("engine_ecu", 0x0039, 0x7E0, 0x7E1)
}

pub fn gearbox() -> ConnectionConfig {
    ConnectionConfig::new("gearbox", 0x0040, 0x7E2, 0x7E3)
}

/// A master on its own bus node, with timeouts loose enough for a loaded
/// test machine.
pub fn master(bus: &VirtualBus) -> ccp_master::Master<BusNode> {
    let mut config = ccp_master::MasterConfig::default();
    for code in CommandCode::ALL {
        config.timeouts.insert(code, 1_000);
    }
    ccp_master::Master::with_config(Arc::new(bus.node()), config).expect("valid config")
}
