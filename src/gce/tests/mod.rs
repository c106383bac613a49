//! Unit tests for the Compute Engine provider.

use crate::config::PlacementPolicy;
use crate::gce::{GceError, GceProvider};
use crate::test_support::{FakeCompute, compute_instance, gce_config};

const PROXY_PORT: u16 = 3128;

fn provider(region: &str, api: FakeCompute) -> GceProvider<FakeCompute> {
    GceProvider::with_api(gce_config(region), PROXY_PORT, api)
        .unwrap_or_else(|err| panic!("provider should build: {err}"))
}

#[test]
fn construction_rejects_zero_port() {
    let err = GceProvider::with_api(gce_config("europe-west1-b"), 0, FakeCompute::new())
        .expect_err("zero port should be rejected");
    assert!(matches!(err, GceError::Config(ref message) if message.contains("instance port")));
}

#[test]
fn construction_rejects_incomplete_configuration() {
    let config = crate::GceConfig {
        project_id: String::new(),
        ..gce_config("europe-west1-b")
    };
    let err = GceProvider::with_api(config, PROXY_PORT, FakeCompute::new())
        .expect_err("missing project should be rejected");
    assert!(matches!(err, GceError::Config(ref message) if message.contains("GCE_PROJECT_ID")));
}

#[test]
fn live_construction_validates_before_reading_the_key() {
    let config = crate::GceConfig {
        private_key: String::new(),
        ..gce_config("europe-west1-b")
    };
    let err = GceProvider::new(config, PROXY_PORT).expect_err("empty key should be rejected");
    assert!(
        matches!(err, GceError::Config(ref message) if message.contains("GCE_PRIVATE_KEY")),
        "unexpected error: {err}"
    );
}

#[test]
fn live_construction_rejects_zero_port() {
    let err = GceProvider::new(gce_config("europe-west1-b"), 0)
        .expect_err("zero port should be rejected");
    assert!(matches!(err, GceError::Config(ref message) if message.contains("instance port")));
}

#[test]
fn placement_follows_region_setting() {
    assert_eq!(
        provider("random", FakeCompute::new()).placement(),
        &PlacementPolicy::Random
    );
    assert_eq!(
        provider("us-west1-a", FakeCompute::new()).placement(),
        &PlacementPolicy::Zone(String::from("us-west1-a"))
    );
}

#[test]
fn pipeline_filters_apply_in_order() {
    use crate::gce::fetch::{exclude_exiting, exclude_out_of_scope, summarize};

    let vms = summarize(vec![
        compute_instance("1", "proxy-a", "RUNNING", "z1", Some("1.1.1.1"), &[]),
        compute_instance("2", "proxy-b", "STOPPING", "z1", None, &[]),
        compute_instance("3", "proxy-c", "TERMINATED", "z1", None, &[]),
        compute_instance("4", "other-proxy-d", "RUNNING", "z1", None, &[]),
        compute_instance("5", "proxy-e", "MYSTERY", "z1", None, &["x"]),
    ]);
    let kept = exclude_out_of_scope(exclude_exiting(vms), "proxy");
    let names = kept.iter().map(|vm| vm.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["proxy-a", "proxy-e"]);
}

mod create;
