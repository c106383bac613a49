//! Tests for batch instance creation.

use crate::gce::GceError;
use crate::provider::{ErrorKind, Provider, ProviderError};
use crate::test_support::{ComputeCall, FakeCompute, compute_zone};

use super::provider;

#[tokio::test]
async fn random_placement_draws_from_up_zones() {
    let api = FakeCompute::new().with_zones([
        compute_zone("z1", "UP"),
        compute_zone("z2", "UP"),
        compute_zone("z3", "DOWN"),
    ]);
    let created = provider("random", api.clone())
        .create_instances(3)
        .await
        .unwrap_or_else(|err| panic!("create: {err}"));

    let inserts = api.inserts();
    assert_eq!(inserts.len(), 3);
    assert_eq!(created.len(), 3);
    assert!(
        inserts
            .iter()
            .all(|request| request.zone == "z1" || request.zone == "z2"),
        "zones: {inserts:?}"
    );
    assert_eq!(api.count_calls(|call| *call == ComputeCall::ListZones), 1);
    for (request, instance) in inserts.iter().zip(&created) {
        assert_eq!(request.name, instance.name);
        assert_eq!(request.zone, instance.region);
    }
}

#[tokio::test]
async fn explicit_zone_places_every_instance_there() {
    let api = FakeCompute::new();
    let created = provider("europe-north1-a", api.clone())
        .create_instances(4)
        .await
        .unwrap_or_else(|err| panic!("create: {err}"));

    assert_eq!(created.len(), 4);
    assert!(created.iter().all(|instance| instance.region == "europe-north1-a"));
    assert_eq!(api.count_calls(|call| *call == ComputeCall::ListZones), 0);
}

#[tokio::test]
async fn requests_carry_image_tags_machine_type_and_http() {
    let api = FakeCompute::new();
    provider("europe-north1-a", api.clone())
        .create_instances(2)
        .await
        .unwrap_or_else(|err| panic!("create: {err}"));

    let inserts = api.inserts();
    assert_eq!(inserts.len(), 2);
    for request in &inserts {
        assert!(request.name.starts_with("proxy-"), "name: {}", request.name);
        assert_eq!(
            request.source_image,
            "projects/test-project/global/images/forward-proxy"
        );
        assert_eq!(request.machine_type, "n1-standard-1");
        assert_eq!(
            request.tags,
            vec![String::from("my-proxies"), String::from("my-instances")]
        );
        assert!(request.allow_http);
    }
    assert_ne!(inserts[0].name, inserts[1].name);
}

#[tokio::test]
async fn created_instances_show_up_in_next_listing() {
    let api = FakeCompute::new();
    let adapter = provider("europe-north1-a", api);
    let created = adapter
        .create_instances(2)
        .await
        .unwrap_or_else(|err| panic!("create: {err}"));
    let models = adapter
        .models()
        .await
        .unwrap_or_else(|err| panic!("models: {err}"));

    let mut created_names = created
        .iter()
        .map(|instance| instance.name.clone())
        .collect::<Vec<_>>();
    let mut listed_names = models
        .iter()
        .map(|model| model.name.clone())
        .collect::<Vec<_>>();
    created_names.sort();
    listed_names.sort();
    assert_eq!(created_names, listed_names);
}

#[tokio::test]
async fn zero_count_issues_no_requests() {
    let api = FakeCompute::new();
    let created = provider("random", api.clone())
        .create_instances(0)
        .await
        .unwrap_or_else(|err| panic!("create: {err}"));
    assert!(created.is_empty());
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn random_placement_without_up_zones_fails_before_inserting() {
    let api = FakeCompute::new().with_zones([compute_zone("z1", "DOWN")]);
    let err = provider("random", api.clone())
        .create_instances(2)
        .await
        .expect_err("creation should fail");
    assert_eq!(err, GceError::NoZonesAvailable);
    assert!(api.inserts().is_empty());
}

#[tokio::test]
async fn zone_listing_failure_propagates() {
    let api = FakeCompute::new();
    api.fail_list_zones(GceError::Transport {
        url: String::from("https://compute.googleapis.com"),
        message: String::from("connection reset"),
    });
    let err = provider("random", api.clone())
        .create_instances(1)
        .await
        .expect_err("creation should fail");
    assert!(matches!(err, GceError::Transport { .. }));
    assert!(api.inserts().is_empty());
}

#[tokio::test]
async fn partial_failure_keeps_created_instances_and_reports_them() {
    let api = FakeCompute::new();
    api.fail_inserts_after(2);
    let err = provider("europe-north1-a", api.clone())
        .create_instances(3)
        .await
        .expect_err("third insert should fail");

    assert_eq!(api.inserts().len(), 3, "every request is issued");
    let GceError::PartialCreate {
        requested,
        ref created,
        ref failure,
    } = err
    else {
        panic!("expected PartialCreate, got {err:?}");
    };
    assert_eq!(requested, 3);
    assert_eq!(created.len(), 2);
    assert!(matches!(**failure, GceError::Api { status: 403, .. }));
    assert_eq!(err.kind(), ErrorKind::BackendUnavailable);

    let mut remaining = api.instance_names();
    let mut expected = created.clone();
    remaining.sort();
    expected.sort();
    assert_eq!(remaining, expected, "no rollback of accepted instances");
}
