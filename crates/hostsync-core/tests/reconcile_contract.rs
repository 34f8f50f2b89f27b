//! Contract tests: record resolution
//!
//! Constraints verified:
//! - A free host results in exactly one creation call and zero patches
//! - An identical record results in zero mutation calls
//! - A changed address results in exactly one PATCH
//! - Name matches outrank address matches
//! - The create-rejected fallback adopts the record found by address
//! - Multiple name matches and unresolvable hosts fail per host, never
//!   aborting the run
//! - Duplicate hostnames abort before any IPAM call

mod common;

use common::*;
use hostsync_core::{Action, Reconciler};

#[tokio::test]
async fn free_host_issues_single_create_and_no_patch() {
    let ipam = MockIpam::new();
    let mut reconciler = Reconciler::new(Box::new(ipam.clone()));

    let hosts = vec![host("printer", "10.0.0.10", "AA:BB:CC:DD:EE:FF")];
    let report = reconciler.run(&hosts).await.unwrap();

    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].action, Action::Created);

    let calls = ipam.calls();
    assert_eq!(calls.create_ip, 1);
    assert_eq!(calls.update_ip, 0);

    let records = ipam.ip_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].address, "10.0.0.10/24");
    assert_eq!(records[0].dns_name, "printer");
}

#[tokio::test]
async fn identical_record_is_unchanged_with_zero_mutations() {
    let ipam = MockIpam::new();
    ipam.seed_ip(ip_record(5, "10.0.0.10/24", "printer"));
    let mut reconciler = Reconciler::new(Box::new(ipam.clone()));

    let hosts = vec![host("printer", "10.0.0.10", "AA:BB:CC:DD:EE:FF")];
    let report = reconciler.run(&hosts).await.unwrap();

    assert_eq!(report.outcomes[0].action, Action::Unchanged);
    assert_eq!(report.unchanged(), 1);

    let calls = ipam.calls();
    assert_eq!(calls.create_ip, 0);
    assert_eq!(calls.update_ip, 0);
    assert_eq!(calls.patch_interface, 0);
}

#[tokio::test]
async fn changed_address_issues_single_patch() {
    let ipam = MockIpam::new();
    ipam.seed_ip(ip_record(5, "10.0.0.99/24", "printer"));
    let mut reconciler = Reconciler::new(Box::new(ipam.clone()));

    let hosts = vec![host("printer", "10.0.0.10", "")];
    let report = reconciler.run(&hosts).await.unwrap();

    assert_eq!(report.outcomes[0].action, Action::Updated);

    let calls = ipam.calls();
    assert_eq!(calls.create_ip, 0);
    assert_eq!(calls.update_ip, 1);

    let records = ipam.ip_records();
    assert_eq!(records[0].address, "10.0.0.10/24");
    assert_eq!(records[0].dns_name, "printer");
}

#[tokio::test]
async fn name_match_outranks_address_match() {
    let ipam = MockIpam::new();
    // Record 1 carries the name with a stale address; record 2 happens to
    // hold the host's current address under another name.
    ipam.seed_ip(ip_record(1, "10.0.0.1/24", "printer"));
    ipam.seed_ip(ip_record(2, "10.0.0.10/24", "scanner"));
    let mut reconciler = Reconciler::new(Box::new(ipam.clone()));

    let hosts = vec![host("printer", "10.0.0.10", "")];
    let report = reconciler.run(&hosts).await.unwrap();

    assert_eq!(report.outcomes[0].action, Action::Updated);

    let records = ipam.ip_records();
    let by_name = records.iter().find(|r| r.id == 1).unwrap();
    let by_addr = records.iter().find(|r| r.id == 2).unwrap();
    assert_eq!(by_name.address, "10.0.0.10/24");
    assert_eq!(by_addr.dns_name, "scanner");
}

#[tokio::test]
async fn name_match_is_case_insensitive() {
    let ipam = MockIpam::new();
    ipam.seed_ip(ip_record(5, "10.0.0.10/24", "Printer"));
    let mut reconciler = Reconciler::new(Box::new(ipam.clone()));

    let hosts = vec![host("printer", "10.0.0.10", "")];
    let report = reconciler.run(&hosts).await.unwrap();

    assert_eq!(report.outcomes[0].action, Action::Unchanged);
    assert_eq!(ipam.calls().create_ip, 0);
}

#[tokio::test]
async fn rejected_create_adopts_record_matched_by_address() {
    let ipam = MockIpam::new();
    ipam.seed_ip(ip_record(9, "10.0.0.10/24", "old-name"));
    ipam.reject_ip_creates();
    let mut reconciler = Reconciler::new(Box::new(ipam.clone()));

    // No name match ("printer" != "old-name"), so a create is attempted,
    // rejected, and the address-matched record is adopted.
    let hosts = vec![host("printer", "10.0.0.10", "")];
    let report = reconciler.run(&hosts).await.unwrap();

    assert_eq!(report.outcomes[0].action, Action::Updated);

    let calls = ipam.calls();
    assert_eq!(calls.create_ip, 1);
    assert_eq!(calls.update_ip, 1);

    let records = ipam.ip_records();
    assert_eq!(records[0].dns_name, "printer");
}

#[tokio::test]
async fn unresolvable_host_fails_without_stopping_the_run() {
    let ipam = MockIpam::new();
    ipam.seed_ip(ip_record(5, "10.0.0.10/24", "printer"));
    ipam.reject_ip_creates();
    let mut reconciler = Reconciler::new(Box::new(ipam.clone()));

    // "ghost" cannot be created and matches nothing by address; "printer"
    // reconciles fine right after it.
    let hosts = vec![host("ghost", "10.0.0.50", ""), host("printer", "10.0.0.10", "")];
    let report = reconciler.run(&hosts).await.unwrap();

    assert!(matches!(report.outcomes[0].action, Action::Failed(_)));
    assert_eq!(report.outcomes[1].action, Action::Unchanged);
    assert!(report.has_failures());
    assert_eq!(report.failed(), 1);

    // The failed host never reached the interface step.
    assert_eq!(ipam.calls().get_interface, 0);
}

#[tokio::test]
async fn multiple_name_matches_fail_the_host_explicitly() {
    let ipam = MockIpam::new();
    ipam.seed_ip(ip_record(1, "10.0.0.1/24", "printer"));
    ipam.seed_ip(ip_record(2, "10.0.0.2/24", "printer"));
    let mut reconciler = Reconciler::new(Box::new(ipam.clone()));

    let hosts = vec![host("printer", "10.0.0.10", ""), host("scanner", "10.0.0.20", "")];
    let report = reconciler.run(&hosts).await.unwrap();

    match &report.outcomes[0].action {
        Action::Failed(reason) => assert!(reason.contains("multiple"), "reason: {reason}"),
        other => panic!("expected Failed, got {other:?}"),
    }
    // Ambiguity must not guess: neither candidate record was touched.
    assert_eq!(ipam.calls().update_ip, 0);
    // The run continued and created the second host.
    assert_eq!(report.outcomes[1].action, Action::Created);
    assert_eq!(ipam.calls().create_ip, 1);
}

#[tokio::test]
async fn duplicate_hostnames_abort_before_any_ipam_call() {
    let ipam = MockIpam::new();
    let mut reconciler = Reconciler::new(Box::new(ipam.clone()));

    let hosts = vec![host("printer", "10.0.0.10", ""), host("printer", "10.0.0.11", "")];
    let err = reconciler.run(&hosts).await.unwrap_err();

    assert!(matches!(err, hostsync_core::Error::DuplicateHostnames(_)));
    assert_eq!(ipam.calls().total(), 0, "IPAM must be left untouched");
}

#[tokio::test]
async fn failed_inventory_fetch_is_fatal() {
    let ipam = MockIpam::new();
    ipam.fail_ip_list();
    let mut reconciler = Reconciler::new(Box::new(ipam.clone()));

    let hosts = vec![host("printer", "10.0.0.10", "")];
    let err = reconciler.run(&hosts).await.unwrap_err();

    assert!(matches!(err, hostsync_core::Error::Api { status: 502, .. }));
    assert_eq!(ipam.calls().create_ip, 0);
    assert_eq!(ipam.calls().update_ip, 0);
}

#[tokio::test]
async fn empty_host_list_reports_nothing() {
    let ipam = MockIpam::new();
    let mut reconciler = Reconciler::new(Box::new(ipam.clone()));

    let report = reconciler.run(&[]).await.unwrap();
    assert!(report.outcomes.is_empty());
    assert!(!report.has_failures());
    assert_eq!(ipam.calls().list_ip, 1);
}
