//! Start/end-of-audit exchanges against a scripted monitor.

use cmdaudit_audit_capture::{AuditError, Auditor, CommandLaunch, Finalize, MonitorPhase, Startup};
use cmdaudit_audit_types::{BaseDirResolver, Op, PathAction, WireError, WireRecord};
use cmdaudit_common_config::{MemoryProperties, Property, PropertyStore};
use cmdaudit_test_utils::{assert_err, assert_ok, unused_port, MonitorDouble};
use std::sync::Arc;

fn launch() -> CommandLaunch {
    CommandLaunch {
        pid: 100,
        exe: "/usr/bin/cc".to_string(),
        line: "cc -c /src/a.c -o /build/a.o".to_string(),
        rwd: "/src".to_string(),
        host: "buildhost".to_string(),
        env: Vec::new(),
    }
}

fn monitored(port: u16) -> MemoryProperties {
    MemoryProperties::new()
        .with(Property::Depth, "1")
        .with(Property::Pcmdid, "1")
        .with(Property::MonitorPort, port.to_string())
        .with(Property::MonitorConnectTimeout, "5")
}

fn auditor(store: MemoryProperties) -> Auditor {
    assert_ok!(Auditor::builder(store)
        .resolver(BaseDirResolver::new("/src"))
        .build())
}

/// Path actions of the given ops, in arrival order.
fn actions(records: &[WireRecord]) -> Vec<&PathAction> {
    records
        .iter()
        .filter_map(|r| match r {
            WireRecord::Action(a) => Some(a),
            _ => None,
        })
        .collect()
}

#[test]
fn test_read_write_then_exit() {
    let monitor = MonitorDouble::ok();
    let auditor = auditor(monitored(monitor.port()));

    assert_eq!(assert_ok!(auditor.initialize(&launch())), Startup::Continue);
    assert_eq!(auditor.phase(), MonitorPhase::Open);
    assert_ok!(auditor.record("open", "/src/a.c", None, 3, Op::Read));
    assert_ok!(auditor.record("open", "/build/a.o", None, 4, Op::Write));
    assert_ok!(auditor.finalize(Finalize::Exiting { status: 0 }));

    assert_eq!(monitor.connections().len(), 2);
    let soa = monitor.records(0);
    assert!(matches!(&soa[..], [WireRecord::Start { aggregated: false, header }] if header.cmdid == 100));

    let eoa = monitor.records(1);
    let pas = actions(&eoa);
    assert_eq!(pas[0].op, Op::Exec);
    let calls: Vec<_> = pas.iter().filter(|a| a.op != Op::Exec).collect();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].op, Op::Read);
    assert_eq!(calls[0].state.primary().as_str(), "/src/a.c");
    assert!(calls[0].timestamp.is_none());
    assert_eq!(calls[1].op, Op::Write);
    assert_eq!(calls[1].state.primary().as_str(), "/build/a.o");
    assert!(calls[1].timestamp.is_some());
    assert!(pas.iter().all(|a| a.pid == 100 && a.ppid == 1 && a.depth == 1));

    match eoa.last() {
        Some(WireRecord::End { status, header }) => {
            assert_eq!(*status, 0);
            assert_eq!(header.cmdid, 100);
            assert!(header.recycled.is_none());
        }
        other => panic!("expected EOA last, got {:?}", other),
    }
    assert_eq!(auditor.phase(), MonitorPhase::Closed);
    assert!(auditor.current_record().is_none());
}

#[test]
fn test_recycle_exits_zero_without_actions() {
    let monitor = MonitorDouble::spawn(["RECYCLE,4711"]);
    let auditor = auditor(monitored(monitor.port()));

    assert_eq!(assert_ok!(auditor.initialize(&launch())), Startup::Exit(0));
    assert!(auditor.current_record().is_none());
    // Nothing is left to attach further activity to.
    assert_ok!(auditor.record("open", "/build/a.o", None, 4, Op::Write));

    let all = monitor.all_records();
    assert!(actions(&all).is_empty());
    match all.last() {
        Some(WireRecord::End { status, header }) => {
            assert_eq!(*status, 0);
            assert_eq!(header.recycled.as_deref(), Some("4711"));
        }
        other => panic!("expected EOA, got {:?}", other),
    }
}

#[test]
fn test_bare_recycle_answer_is_the_prior_id() {
    let monitor = MonitorDouble::spawn(["12345"]);
    let auditor = auditor(monitored(monitor.port()));
    assert_eq!(assert_ok!(auditor.initialize(&launch())), Startup::Exit(0));
    match monitor.all_records().last() {
        Some(WireRecord::End { header, .. }) => assert_eq!(header.recycled.as_deref(), Some("12345")),
        other => panic!("expected EOA, got {:?}", other),
    }
}

#[test]
fn test_failure_exits_two() {
    let monitor = MonitorDouble::spawn(["FAILURE"]);
    let auditor = auditor(monitored(monitor.port()));

    assert_eq!(assert_ok!(auditor.initialize(&launch())), Startup::Exit(2));
    let all = monitor.all_records();
    assert!(matches!(all.last(), Some(WireRecord::End { status: 2, .. })));
}

#[test]
fn test_empty_ack_is_protocol_error() {
    let monitor = MonitorDouble::spawn([""]);
    let auditor = auditor(monitored(monitor.port()));
    let err = assert_err!(auditor.initialize(&launch()));
    assert!(matches!(err, AuditError::Wire(WireError::EmptyAck)));
    assert_eq!(err.exit_status(), 2);
}

#[test]
fn test_unreachable_monitor_is_fatal() {
    let auditor = auditor(monitored(unused_port()));
    let err = assert_err!(auditor.initialize(&launch()));
    assert!(matches!(err, AuditError::Connect { .. }));
}

#[test]
fn test_ok_aggregated_marks_descendants() {
    let monitor = MonitorDouble::spawn(["OK-AGGREGATED"]);
    let store = Arc::new(monitored(monitor.port()).with(Property::AggregatedSubcmd, "0"));
    let auditor = assert_ok!(Auditor::builder(SharedStore(Arc::clone(&store))).build());

    assert_eq!(assert_ok!(auditor.initialize(&launch())), Startup::Continue);
    assert_eq!(store.get(Property::AggregatedSubcmd).as_deref(), Some("1"));
}

#[test]
fn test_aggregated_subcommand_uses_lowercase_marker() {
    let monitor = MonitorDouble::ok();
    let store = monitored(monitor.port()).with(Property::AggregatedSubcmd, "1");
    let auditor = auditor(store);
    assert_ok!(auditor.initialize(&launch()));

    assert!(monitor.connections()[0].starts_with("<sOA>"));
    assert!(matches!(monitor.records(0)[0], WireRecord::Start { aggregated: true, .. }));
}

#[test]
fn test_disallowed_write_is_fatal_and_not_recorded() {
    let monitor = MonitorDouble::ok();
    let store = monitored(monitor.port()).with(Property::AllowedWritePathRe, "^/build/");
    let auditor = auditor(store);
    assert_ok!(auditor.initialize(&launch()));
    let before = auditor.current_record().map(|r| r.action_count());

    let err = assert_err!(auditor.record("open", "/etc/passwd", None, 5, Op::Write));
    assert!(matches!(err, AuditError::DisallowedWrite { ref path, .. } if path == "/etc/passwd"));
    assert_eq!(auditor.current_record().map(|r| r.action_count()), before);

    assert_ok!(auditor.record("open", "/etc/passwd", None, 5, Op::Read));
    assert_ok!(auditor.record("mkdir", "/build/obj", None, -1, Op::Mkdir));
    assert_eq!(
        auditor.current_record().map(|r| r.action_count()),
        before.map(|n| n + 2)
    );
}

#[test]
fn test_inactive_command_touches_nothing() {
    let monitor = MonitorDouble::ok();
    let store = monitored(monitor.port()).with(Property::ActivationProgRe, "^/usr/bin/cc$");
    let auditor = auditor(store);
    let mut ld = launch();
    ld.exe = "/usr/bin/ld".to_string();

    assert_eq!(assert_ok!(auditor.initialize(&ld)), Startup::Inactive);
    for op in [Op::Read, Op::Write, Op::Unlink, Op::Mkdir] {
        assert_ok!(auditor.record("call", "/build/x", None, -1, op));
    }
    assert_ok!(auditor.flush());
    assert_ok!(auditor.finalize(Finalize::Exiting { status: 0 }));

    assert!(monitor.connections().is_empty());
    assert!(auditor.staging_fd().is_none());
}

#[test]
fn test_done_token_for_inactive_top_level() {
    let monitor = MonitorDouble::ok();
    let store = monitored(monitor.port())
        .with(Property::Depth, "0")
        .with(Property::NotifyDone, "1")
        .with(Property::ActivationProgRe, "^/nothing$");
    let auditor = auditor(store);

    assert_eq!(assert_ok!(auditor.initialize(&launch())), Startup::Inactive);
    assert_ok!(auditor.finalize(Finalize::Exiting { status: 0 }));
    assert_eq!(monitor.connections(), vec!["{DONE}\n".to_string()]);
}

#[test]
fn test_soa_precedes_child_soa() {
    let monitor = MonitorDouble::ok();
    let parent = auditor(monitored(monitor.port()));
    assert_ok!(parent.initialize(&launch()));

    let child_store = monitored(monitor.port()).with(Property::Pcmdid, "100");
    let child = auditor(child_store);
    let mut child_launch = launch();
    child_launch.pid = 101;
    child_launch.exe = "/usr/bin/as".to_string();
    assert_ok!(child.initialize(&child_launch));
    assert_ok!(child.finalize(Finalize::Exiting { status: 0 }));
    assert_ok!(parent.finalize(Finalize::Exiting { status: 0 }));

    let starts: Vec<u64> = monitor
        .all_records()
        .iter()
        .filter_map(|r| match r {
            WireRecord::Start { header, .. } => Some(header.cmdid),
            _ => None,
        })
        .collect();
    assert_eq!(starts, vec![100, 101]);

    let ends: Vec<u64> = monitor
        .all_records()
        .iter()
        .filter_map(|r| match r {
            WireRecord::End { header, .. } => Some(header.cmdid),
            _ => None,
        })
        .collect();
    assert_eq!(ends, vec![101, 100]);
}

/// A store shared with the test so it can observe in-place updates.
struct SharedStore(Arc<MemoryProperties>);

impl PropertyStore for SharedStore {
    fn get(&self, key: Property) -> Option<String> {
        self.0.get(key)
    }

    fn modify(&self, key: Property, value: &str) -> cmdaudit_common_config::ConfigResult<()> {
        self.0.modify(key, value)
    }
}
