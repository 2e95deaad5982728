//! Behavioural coverage for the reconciliation state machine.

use std::sync::Arc;

use mockall::Sequence;
use rstest::{fixture, rstest};

use super::UserReconciliationService;
use crate::domain::ports::{
    GrafanaApiError, MockGrafanaUserApi, PasswordProbe, UserLookup, UserReconciliation,
};
use crate::domain::{
    DesiredUser, DesiredUserInput, MutationKind, ReconcileError, RemoteUser, RemoteUserId,
    UserAttributes,
};

const REMOTE_ID: i64 = 7;

fn desired(state: &str) -> DesiredUser {
    DesiredUser::try_from_input(DesiredUserInput {
        login: Some("test1".to_owned()),
        name: Some("Test User".to_owned()),
        email: Some("t@example.com".to_owned()),
        state: Some(state.to_owned()),
        password: Some("p".to_owned()),
    })
    .expect("fixture input is valid")
}

#[fixture]
fn present() -> DesiredUser {
    desired("present")
}

#[fixture]
fn absent() -> DesiredUser {
    desired("absent")
}

fn remote(name: &str, email: &str) -> RemoteUser {
    RemoteUser {
        id: RemoteUserId::new(REMOTE_ID),
        attributes: UserAttributes {
            login: "test1".to_owned(),
            name: name.to_owned(),
            email: email.to_owned(),
        },
    }
}

fn matching_remote() -> RemoteUser {
    remote("Test User", "t@example.com")
}

fn expect_lookup(api: &mut MockGrafanaUserApi, lookup: UserLookup) {
    api.expect_lookup_user()
        .withf(|login| login == "test1")
        .times(1)
        .return_once(move |_| Ok(lookup));
}

fn expect_no_mutations(api: &mut MockGrafanaUserApi) {
    api.expect_delete_user().times(0);
    api.expect_create_user().times(0);
    api.expect_reset_password().times(0);
    api.expect_update_user().times(0);
}

fn service(api: MockGrafanaUserApi) -> UserReconciliationService<MockGrafanaUserApi> {
    UserReconciliationService::new(Arc::new(api))
}

#[rstest]
#[tokio::test]
async fn absent_user_that_does_not_exist_is_left_alone(absent: DesiredUser) {
    let mut api = MockGrafanaUserApi::new();
    expect_lookup(&mut api, UserLookup::NotFound);
    api.expect_probe_password().times(0);
    expect_no_mutations(&mut api);

    let outcome = service(api)
        .reconcile(&absent)
        .await
        .expect("no-op should succeed");

    assert!(!outcome.changed);
}

#[rstest]
#[tokio::test]
async fn absent_user_that_exists_is_deleted_by_id(absent: DesiredUser) {
    let mut api = MockGrafanaUserApi::new();
    expect_lookup(&mut api, UserLookup::Found(matching_remote()));
    api.expect_probe_password().times(0);
    api.expect_delete_user()
        .withf(|id| *id == RemoteUserId::new(REMOTE_ID))
        .times(1)
        .return_once(|_| Ok(()));
    api.expect_create_user().times(0);
    api.expect_reset_password().times(0);
    api.expect_update_user().times(0);

    let outcome = service(api)
        .reconcile(&absent)
        .await
        .expect("delete should succeed");

    assert!(outcome.changed);
}

#[rstest]
#[tokio::test]
async fn missing_user_is_created_with_the_full_desired_payload(present: DesiredUser) {
    let expected = present.attributes().clone();
    let mut api = MockGrafanaUserApi::new();
    expect_lookup(&mut api, UserLookup::NotFound);
    api.expect_probe_password().times(0);
    api.expect_create_user()
        .withf(move |attributes, password| *attributes == expected && password == "p")
        .times(1)
        .return_once(|_, _| Ok(()));
    api.expect_delete_user().times(0);
    api.expect_reset_password().times(0);
    api.expect_update_user().times(0);

    let outcome = service(api)
        .reconcile(&present)
        .await
        .expect("create should succeed");

    assert!(outcome.changed);
}

#[rstest]
#[tokio::test]
async fn converged_user_issues_no_mutations(present: DesiredUser) {
    let mut api = MockGrafanaUserApi::new();
    expect_lookup(&mut api, UserLookup::Found(matching_remote()));
    api.expect_probe_password()
        .withf(|login, password| login == "test1" && password == "p")
        .times(1)
        .return_once(|_, _| Ok(PasswordProbe::Accepted));
    expect_no_mutations(&mut api);

    let outcome = service(api)
        .reconcile(&present)
        .await
        .expect("converged run should succeed");

    assert!(!outcome.changed);
}

#[rstest]
#[case::login("old-login", "Test User", "t@example.com")]
#[case::name("test1", "Old Name", "t@example.com")]
#[case::email("test1", "Test User", "old@example.com")]
#[case::all("old-login", "Old Name", "old@example.com")]
#[tokio::test]
async fn any_attribute_difference_triggers_one_full_update(
    present: DesiredUser,
    #[case] remote_login: &str,
    #[case] remote_name: &str,
    #[case] remote_email: &str,
) {
    let current = RemoteUser {
        id: RemoteUserId::new(REMOTE_ID),
        attributes: UserAttributes {
            login: remote_login.to_owned(),
            name: remote_name.to_owned(),
            email: remote_email.to_owned(),
        },
    };
    let expected = present.attributes().clone();
    let mut api = MockGrafanaUserApi::new();
    expect_lookup(&mut api, UserLookup::Found(current));
    api.expect_probe_password()
        .times(1)
        .return_once(|_, _| Ok(PasswordProbe::Accepted));
    api.expect_update_user()
        .withf(move |id, attributes| {
            *id == RemoteUserId::new(REMOTE_ID) && *attributes == expected
        })
        .times(1)
        .return_once(|_, _| Ok(()));
    api.expect_delete_user().times(0);
    api.expect_create_user().times(0);
    api.expect_reset_password().times(0);

    let outcome = service(api)
        .reconcile(&present)
        .await
        .expect("update should succeed");

    assert!(outcome.changed);
}

#[rstest]
#[tokio::test]
async fn wrong_password_is_reset_without_touching_matching_attributes(present: DesiredUser) {
    let mut seq = Sequence::new();
    let mut api = MockGrafanaUserApi::new();
    expect_lookup(&mut api, UserLookup::Found(matching_remote()));
    api.expect_probe_password()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_, _| Ok(PasswordProbe::Rejected));
    api.expect_reset_password()
        .withf(|id, password| *id == RemoteUserId::new(REMOTE_ID) && password == "p")
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_, _| Ok(()));
    api.expect_update_user().times(0);
    api.expect_delete_user().times(0);
    api.expect_create_user().times(0);

    let outcome = service(api)
        .reconcile(&present)
        .await
        .expect("reset should succeed");

    assert!(outcome.changed);
}

#[rstest]
#[tokio::test]
async fn password_reset_precedes_attribute_update(present: DesiredUser) {
    let mut seq = Sequence::new();
    let mut api = MockGrafanaUserApi::new();
    expect_lookup(&mut api, UserLookup::Found(remote("Old Name", "t@example.com")));
    api.expect_probe_password()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_, _| Ok(PasswordProbe::Rejected));
    api.expect_reset_password()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_, _| Ok(()));
    api.expect_update_user()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_, _| Ok(()));

    let outcome = service(api)
        .reconcile(&present)
        .await
        .expect("reset and update should succeed");

    assert!(outcome.changed);
}

#[rstest]
#[case::present(desired("present"))]
#[case::absent(desired("absent"))]
#[tokio::test]
async fn rejected_admin_credentials_halt_before_any_mutation(#[case] target: DesiredUser) {
    let mut api = MockGrafanaUserApi::new();
    api.expect_lookup_user()
        .times(1)
        .return_once(|_| Err(GrafanaApiError::unauthorized("Invalid username or password")));
    api.expect_probe_password().times(0);
    expect_no_mutations(&mut api);

    let error = service(api)
        .reconcile(&target)
        .await
        .expect_err("auth failure must halt");

    assert_eq!(
        error,
        ReconcileError::Auth {
            message: "Invalid username or password".to_owned()
        }
    );
}

#[rstest]
#[case::transport(GrafanaApiError::transport("connection refused"))]
#[case::timeout(GrafanaApiError::timeout("deadline elapsed"))]
#[tokio::test]
async fn unreachable_grafana_is_a_transport_error(
    present: DesiredUser,
    #[case] failure: GrafanaApiError,
) {
    let mut api = MockGrafanaUserApi::new();
    api.expect_lookup_user()
        .times(1)
        .return_once(move |_| Err(failure));
    expect_no_mutations(&mut api);

    let error = service(api)
        .reconcile(&present)
        .await
        .expect_err("transport failure must halt");

    assert!(matches!(error, ReconcileError::Transport { .. }));
}

#[rstest]
#[tokio::test]
async fn unrecognised_lookup_body_is_fatal(present: DesiredUser) {
    let mut api = MockGrafanaUserApi::new();
    api.expect_lookup_user()
        .times(1)
        .return_once(|_| Err(GrafanaApiError::unexpected_response("lookup body: {}")));
    api.expect_probe_password().times(0);
    expect_no_mutations(&mut api);

    let error = service(api)
        .reconcile(&present)
        .await
        .expect_err("unknown shape must halt");

    assert_eq!(
        error,
        ReconcileError::UnexpectedResponse {
            message: "lookup body: {}".to_owned()
        }
    );
}

#[rstest]
#[tokio::test]
async fn unrecognised_probe_response_halts_without_resetting(present: DesiredUser) {
    let mut api = MockGrafanaUserApi::new();
    expect_lookup(&mut api, UserLookup::Found(matching_remote()));
    api.expect_probe_password()
        .times(1)
        .return_once(|_, _| Err(GrafanaApiError::unexpected_response("probe body: []")));
    expect_no_mutations(&mut api);

    let error = service(api)
        .reconcile(&present)
        .await
        .expect_err("unknown probe shape must halt");

    assert!(matches!(error, ReconcileError::UnexpectedResponse { .. }));
}

#[rstest]
#[tokio::test]
async fn failed_reset_halts_before_attribute_update(present: DesiredUser) {
    let mut api = MockGrafanaUserApi::new();
    expect_lookup(&mut api, UserLookup::Found(remote("Old Name", "t@example.com")));
    api.expect_probe_password()
        .times(1)
        .return_once(|_, _| Ok(PasswordProbe::Rejected));
    api.expect_reset_password()
        .times(1)
        .return_once(|_, _| Err(GrafanaApiError::rejected(500_u16, "boom")));
    api.expect_update_user().times(0);

    let error = service(api)
        .reconcile(&present)
        .await
        .expect_err("failed reset must halt");

    assert_eq!(
        error,
        ReconcileError::mutation(
            MutationKind::ResetPassword,
            "grafana rejected the request with status 500: boom"
        )
    );
}

#[rstest]
#[tokio::test]
async fn failed_create_surfaces_the_remote_content(present: DesiredUser) {
    let mut api = MockGrafanaUserApi::new();
    expect_lookup(&mut api, UserLookup::NotFound);
    api.expect_create_user().times(1).return_once(|_, _| {
        Err(GrafanaApiError::rejected(
            412_u16,
            "{\"message\":\"User with same email address already exists\"}",
        ))
    });

    let error = service(api)
        .reconcile(&present)
        .await
        .expect_err("failed create must halt");

    match error {
        ReconcileError::Mutation { operation, message } => {
            assert_eq!(operation, MutationKind::Create);
            assert!(message.contains("User with same email address already exists"));
        }
        other => panic!("expected a mutation error, got {other:?}"),
    }
}

#[rstest]
#[case::create(desired("present"), UserLookup::NotFound)]
#[case::delete(desired("absent"), UserLookup::Found(matching_remote()))]
#[case::reset_and_update(desired("present"), UserLookup::Found(remote("Old", "old@example.com")))]
#[tokio::test]
async fn check_mode_reports_changes_without_mutating(
    #[case] target: DesiredUser,
    #[case] lookup: UserLookup,
) {
    let mut api = MockGrafanaUserApi::new();
    expect_lookup(&mut api, lookup);
    api.expect_probe_password()
        .returning(|_, _| Ok(PasswordProbe::Rejected));
    expect_no_mutations(&mut api);

    let outcome = service(api)
        .with_check_mode(true)
        .reconcile(&target)
        .await
        .expect("check mode should succeed");

    assert!(outcome.changed);
}

#[rstest]
#[tokio::test]
async fn check_mode_reports_no_change_for_converged_user(present: DesiredUser) {
    let mut api = MockGrafanaUserApi::new();
    expect_lookup(&mut api, UserLookup::Found(matching_remote()));
    api.expect_probe_password()
        .times(1)
        .return_once(|_, _| Ok(PasswordProbe::Accepted));
    expect_no_mutations(&mut api);

    let outcome = service(api)
        .with_check_mode(true)
        .reconcile(&present)
        .await
        .expect("check mode should succeed");

    assert!(!outcome.changed);
}
