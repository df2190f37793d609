//! Loading a master from a YAML file.

mod common;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use ccp_master::sim::VirtualBus;
use ccp_master::{CcpError, ConfigError, Master, MasterConfig};
use ccp_protocol::CommandCode;
use common::Slave;

const CONFIG: &str = r#"
poll_interval_ms: 1
timeouts:
  CONNECT: 500
  TEST: 500
connections:
  - name: engine_ecu
    station_address: 0x0039
    cro_id: 0x7E0
    dto_id: 0x7E1
"#;

#[test]
fn test_load_and_open_named() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();

    let config = MasterConfig::load(file.path()).unwrap();
    assert_eq!(config.timeout_table().get(CommandCode::Connect), Duration::from_millis(500));

    let bus = VirtualBus::new();
    let connection = config.connection("engine_ecu").unwrap().clone();
    let _slave = Slave::spawn(&bus, connection);
    let master = Master::with_config(Arc::new(bus.node()), config).unwrap();
    assert_eq!(master.engine().timeout(CommandCode::Move), Duration::from_secs(30));

    let ecu = master.open_named("engine_ecu").unwrap();
    ecu.connect().unwrap();
    assert!(ecu.state().connected);

    assert!(matches!(
        master.open_named("gearbox"),
        Err(CcpError::Config(ConfigError::Invalid(_)))
    ));
}

#[test]
fn test_load_missing_file() {
    let err = MasterConfig::load("/nonexistent/ccp.yaml").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_invalid_config_is_rejected_by_master() {
    let bus = VirtualBus::new();
    let config = MasterConfig {
        poll_interval_ms: 0,
        ..Default::default()
    };
    assert!(matches!(
        Master::with_config(Arc::new(bus.node()), config),
        Err(CcpError::Config(_))
    ));
}
