//! End-to-end scenarios through the dispatcher and the mock driver

use nimbus_driver::{
    Collection, CreateParams, Credentials, Dispatcher, ErrorKind, FilterPredicate, ImageParams,
    InstanceParams, ProfileConfiguration, ProfilePredicate, ProfileSelection, PropertyValue,
    SnapshotParams, VolumeParams,
};
use nimbus_driver_mock::{MOCK_PASSWORD, MOCK_USER, MockDriver, STORAGE_QUOTA_GB};
use std::sync::Arc;

fn setup() -> (Dispatcher, Arc<MockDriver>, Credentials) {
    let driver = Arc::new(MockDriver::new().unwrap());
    let dispatcher = Dispatcher::new(driver.clone());
    (dispatcher, driver, Credentials::new(MOCK_USER, MOCK_PASSWORD))
}

#[tokio::test]
async fn test_instance_lifecycle_round_trip() {
    let (dispatcher, _, credentials) = setup();

    let params = InstanceParams::new("img1")
        .with_realm("eu")
        .with_profile(ProfileSelection::new("m1-large").with("cpu", 4))
        .with_user_name("web-1");
    let created = dispatcher
        .create(&credentials, CreateParams::Instance(params))
        .await
        .unwrap();
    assert_eq!(created.state.as_deref(), Some("pending"));
    assert!(created.actions.is_empty());
    let configuration: std::collections::BTreeMap<String, PropertyValue> =
        created.get_attribute("hardware_configuration").unwrap();
    assert_eq!(configuration.get("cpu"), Some(&PropertyValue::Int(4)));
    assert_eq!(configuration.get("memory"), Some(&PropertyValue::Int(10240)));

    let running = dispatcher
        .get(&credentials, Collection::Instances, &created.id)
        .await
        .unwrap();
    assert_eq!(running.state.as_deref(), Some("running"));
    assert_eq!(running.actions, vec!["reboot", "stop"]);

    let err = dispatcher
        .act(&credentials, Collection::Instances, &created.id, "destroy")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::IllegalTransition);

    let stopping = dispatcher
        .act(&credentials, Collection::Instances, &created.id, "stop")
        .await
        .unwrap();
    assert_eq!(stopping.state.as_deref(), Some("stopping"));

    let stopped = dispatcher
        .get(&credentials, Collection::Instances, &created.id)
        .await
        .unwrap();
    assert_eq!(stopped.state.as_deref(), Some("stopped"));
    assert_eq!(stopped.actions, vec!["start", "destroy"]);

    let finished = dispatcher
        .act(&credentials, Collection::Instances, &created.id, "destroy")
        .await
        .unwrap();
    assert_eq!(finished.state.as_deref(), Some("finish"));
    assert!(finished.actions.is_empty());

    let err = dispatcher
        .get(&credentials, Collection::Instances, &created.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_list_filters() {
    let (dispatcher, _, credentials) = setup();

    let stopped = dispatcher
        .list(
            &credentials,
            Collection::Instances,
            &FilterPredicate::new().with("state", "stopped"),
        )
        .await
        .unwrap();
    let ids: Vec<&str> = stopped.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["inst1"]);

    let all = dispatcher
        .list(&credentials, Collection::Instances, &FilterPredicate::new())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let either = dispatcher
        .list(
            &credentials,
            Collection::Images,
            &FilterPredicate::new().with_any("id", ["img1", "img3"]),
        )
        .await
        .unwrap();
    assert_eq!(either.len(), 2);

    let by_owner = dispatcher
        .list(
            &credentials,
            Collection::Images,
            &FilterPredicate::from_options([("owner_id", "mockuser"), ("architecture", "")]),
        )
        .await
        .unwrap();
    let ids: Vec<&str> = by_owner.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["img3"]);
}

#[tokio::test]
async fn test_features_are_enforced() {
    let (dispatcher, _, credentials) = setup();

    let long_name = "x".repeat(51);
    let err = dispatcher
        .create(
            &credentials,
            CreateParams::Instance(InstanceParams::new("img1").with_user_name(long_name)),
        )
        .await
        .unwrap_err();
    assert_eq!(err.status, 400);

    let image = dispatcher
        .create(
            &credentials,
            CreateParams::Image(ImageParams {
                instance_id: "inst0".to_string(),
                name: Some("golden".to_string()),
                description: None,
            }),
        )
        .await
        .unwrap();
    assert_eq!(image.get_attribute::<String>("name").as_deref(), Some("golden"));

    let features = dispatcher
        .declarations()
        .capabilities()
        .features(Collection::Instances);
    assert_eq!(features, vec!["realm_filter", "user_data", "user_name"]);
}

#[tokio::test]
async fn test_backend_errors_are_uniform() {
    let (dispatcher, driver, credentials) = setup();

    let err = dispatcher
        .list(
            &Credentials::new("mockuser", "nope"),
            Collection::Realms,
            &FilterPredicate::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unauthorized);

    let err = dispatcher
        .destroy(&credentials, Collection::StorageVolumes, "vol9")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = dispatcher
        .create(
            &credentials,
            CreateParams::StorageVolume(VolumeParams {
                capacity: Some(STORAGE_QUOTA_GB),
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    driver.store().fail_next("upstream request timed out").await;
    let err = dispatcher
        .get(&credentials, Collection::Realms, "us")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Timeout);
    assert_eq!(err.message, "upstream request timed out");

    driver.store().fail_next("disk array degraded").await;
    let err = dispatcher
        .list(&credentials, Collection::Realms, &FilterPredicate::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ProviderError);
}

#[tokio::test]
async fn test_volume_and_snapshot() {
    let (dispatcher, _, credentials) = setup();

    let volume = dispatcher
        .create(
            &credentials,
            CreateParams::StorageVolume(VolumeParams {
                capacity: Some(10),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
    assert_eq!(volume.state.as_deref(), Some("creating"));

    let available = dispatcher
        .get(&credentials, Collection::StorageVolumes, &volume.id)
        .await
        .unwrap();
    assert_eq!(available.state.as_deref(), Some("available"));
    assert_eq!(available.actions, vec!["attach", "destroy"]);

    let attached = dispatcher
        .act(&credentials, Collection::StorageVolumes, &volume.id, "attach")
        .await
        .unwrap();
    assert_eq!(attached.state.as_deref(), Some("in-use"));
    assert_eq!(attached.actions, vec!["detach"]);

    let snapshot = dispatcher
        .create(
            &credentials,
            CreateParams::StorageSnapshot(SnapshotParams {
                volume_id: volume.id.clone(),
            }),
        )
        .await
        .unwrap();
    assert!(snapshot.actions.is_empty());
    assert_eq!(snapshot.state.as_deref(), Some("COMPLETED"));
}

#[tokio::test]
async fn test_profiles_and_states() {
    let (dispatcher, _, credentials) = setup();

    let small = dispatcher.hardware_profiles(&ProfilePredicate::new().with("id", "m1-small"));
    assert_eq!(small.len(), 1);
    let configuration: ProfileConfiguration = small[0]
        .configure(&Default::default())
        .unwrap();
    assert_eq!(configuration.get_int("memory"), Some(1740));

    let states = dispatcher.states(Collection::Instances).unwrap();
    let names: Vec<&str> = states.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["start", "pending", "running", "stopping", "stopped", "finish"]
    );
    assert!(states.iter().any(|s| s.name == "finish" && s.terminal));

    let err = dispatcher.states(Collection::Realms).unwrap_err();
    assert_eq!(err.status, 501);

    let status = dispatcher.check_auth(&credentials).await.unwrap();
    assert!(status.authenticated);
}
