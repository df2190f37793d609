//! Several sessions sharing one transport.

mod common;

use std::sync::Arc;
use std::thread;

use ccp_master::router::MAILBOX_DEPTH;
use ccp_master::sim::VirtualBus;
use ccp_master::{CanFrame, Transport};
use ccp_protocol::*;
use common::{engine_ecu, gearbox, init_tracing, master, Slave};

#[test]
fn test_parallel_sessions_keep_their_responses() {
    init_tracing();
    let bus = VirtualBus::new();
    let ecu_slave = Slave::spawn(&bus, engine_ecu());
    let gearbox_slave = Slave::spawn(&bus, gearbox());
    let master = master(&bus);

    let ecu = master.open(engine_ecu()).unwrap();
    let gbx = master.open(gearbox()).unwrap();

    thread::scope(|scope| {
        for (session, base) in [(&ecu, 0x1000u32), (&gbx, 0x2000u32)] {
            scope.spawn(move || {
                session.connect().unwrap();
                for i in 0..50u32 {
                    let address = base + i * 4;
                    session.set_mta(MtaSlot::Mta0, MemoryAddress::new(0, address)).unwrap();
                    let position = session.dnload(&address.to_be_bytes()).unwrap();
                    assert_eq!(position.address, address + 4);
                    session.set_mta(MtaSlot::Mta0, MemoryAddress::new(0, address)).unwrap();
                    assert_eq!(session.upload(4).unwrap(), address.to_be_bytes().to_vec());
                }
            });
        }
    });

    assert_eq!(ecu_slave.received().len(), 201);
    assert_eq!(gearbox_slave.received().len(), 201);
    assert!(ecu.last_error().is_none());
    assert!(gbx.last_error().is_none());
}

#[test]
fn test_one_session_from_many_threads() {
    let bus = VirtualBus::new();
    let slave = Slave::spawn(&bus, engine_ecu());
    let master = master(&bus);
    let ecu = Arc::new(master.open(engine_ecu()).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let ecu = Arc::clone(&ecu);
            thread::spawn(move || {
                for _ in 0..25 {
                    ecu.test(0x39).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut counters: Vec<u8> = slave.received().iter().map(|f| f.data()[1]).collect();
    counters.sort_unstable();
    assert_eq!(counters, (0..100).collect::<Vec<u8>>());
}

#[test]
fn test_idle_session_ignores_traffic_received_meanwhile() {
    init_tracing();
    let bus = VirtualBus::new();
    let _ecu_slave = Slave::spawn(&bus, engine_ecu());
    let _gearbox_slave = Slave::spawn(&bus, gearbox());
    let master = master(&bus);
    let ecu = master.open(engine_ecu()).unwrap();
    let gbx = master.open(gearbox()).unwrap();

    // Unsolicited frames on the gearbox response identifier, e.g. a DAQ stream.
    let streamer = bus.node();
    let dto_id = gbx.connection().dto_id();
    for i in 0..500u32 {
        let stale = ResponseFrame::new(0x00, 0xAA, &i.to_be_bytes()).unwrap();
        streamer.send(&CanFrame::new(dto_id, &stale.to_bytes()).unwrap()).unwrap();
    }

    // The engine session's polls file them for the idle gearbox session.
    for _ in 0..10 {
        ecu.test(0x39).unwrap();
    }
    assert_eq!(master.engine().router().queued(dto_id), MAILBOX_DEPTH);

    for _ in 0..5 {
        gbx.test(0x40).unwrap();
    }
    assert!(gbx.last_error().is_none());
    assert_eq!(master.engine().router().queued(dto_id), 0);
}
