//! Service-level tests on in-memory SQLite with migrations applied.

mod common;

use std::sync::Arc;

use anyhow::Result;
use serde_json::json;
use uuid::Uuid;

use common::{test_module, FakeProvider};
use survey_savvy::contract::model::{
    AccountCreation, Identity, NewAccount, NewPayment, NewSurvey, Role, SurveyPatch,
    UpdateOutcome,
};
use survey_savvy::domain::error::DomainError;

fn new_account(email: &str) -> NewAccount {
    NewAccount {
        email: email.to_string(),
        name: Some("Test User".to_string()),
        image: None,
    }
}

fn identity(email: &str) -> Identity {
    Identity {
        email: Some(email.to_string()),
        name: None,
    }
}

#[tokio::test]
async fn duplicate_account_creation_keeps_one_record() -> Result<()> {
    let module = test_module(Arc::new(FakeProvider::default())).await;
    let accounts = module.accounts();

    let first = accounts.create_account(new_account("ada@example.com")).await?;
    assert!(matches!(first, AccountCreation::Created(_)));

    let second = accounts.create_account(new_account("ada@example.com")).await?;
    assert_eq!(second, AccountCreation::AlreadyExists);

    let all = accounts.list_accounts().await?;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].role, Role::Default);
    Ok(())
}

#[tokio::test]
async fn account_creation_rejects_bad_email() {
    let module = test_module(Arc::new(FakeProvider::default())).await;
    let err = module
        .accounts()
        .create_account(new_account("nobody"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));
}

#[tokio::test]
async fn require_admin_checks_identity_and_role() -> Result<()> {
    let module = test_module(Arc::new(FakeProvider::default())).await;
    let accounts = module.accounts();

    assert!(matches!(
        accounts.require_admin(&Identity::default()).await,
        Err(DomainError::Forbidden)
    ));
    assert!(matches!(
        accounts.require_admin(&identity("ghost@example.com")).await,
        Err(DomainError::Forbidden)
    ));

    let AccountCreation::Created(id) = accounts
        .create_account(new_account("boss@example.com"))
        .await?
    else {
        panic!("expected a new account");
    };
    assert!(matches!(
        accounts.require_admin(&identity("boss@example.com")).await,
        Err(DomainError::Forbidden)
    ));

    let outcome = accounts.set_role(id, Role::Admin).await?;
    assert_eq!(outcome, UpdateOutcome::matched(true));
    accounts.require_admin(&identity("boss@example.com")).await?;
    Ok(())
}

#[tokio::test]
async fn role_lookup_is_self_only() -> Result<()> {
    let module = test_module(Arc::new(FakeProvider::default())).await;
    let accounts = module.accounts();
    accounts.create_account(new_account("ada@example.com")).await?;

    let role = accounts
        .role_of(&identity("ada@example.com"), "ada@example.com")
        .await?;
    assert_eq!(role, Role::Default);

    assert!(matches!(
        accounts
            .role_of(&identity("eve@example.com"), "ada@example.com")
            .await,
        Err(DomainError::Forbidden)
    ));
    assert!(matches!(
        accounts
            .role_of(&identity("new@example.com"), "new@example.com")
            .await,
        Err(DomainError::AccountNotFound { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn set_role_and_delete_report_counts() -> Result<()> {
    let module = test_module(Arc::new(FakeProvider::default())).await;
    let accounts = module.accounts();

    assert_eq!(
        accounts.set_role(Uuid::new_v4(), Role::Admin).await?,
        UpdateOutcome::unmatched()
    );
    assert_eq!(accounts.delete_account(Uuid::new_v4()).await?, 0);

    let AccountCreation::Created(id) = accounts
        .create_account(new_account("ada@example.com"))
        .await?
    else {
        panic!("expected a new account");
    };
    assert_eq!(
        accounts.set_role(id, Role::Default).await?,
        UpdateOutcome::matched(false)
    );
    assert_eq!(
        accounts.set_role(id, Role::Surveyor).await?,
        UpdateOutcome::matched(true)
    );
    assert_eq!(accounts.delete_account(id).await?, 1);
    assert!(accounts.list_accounts().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn survey_creation_applies_defaults() -> Result<()> {
    let module = test_module(Arc::new(FakeProvider::default())).await;
    let surveys = module.surveys();

    let mut draft = NewSurvey {
        title: Some("Office lunch".to_string()),
        ..Default::default()
    };
    draft
        .attributes
        .insert("options".to_string(), json!(["pizza", "salad"]));
    let id = surveys.create_survey(draft).await?;

    let all = surveys.list_surveys().await?;
    assert_eq!(all.len(), 1);
    let survey = &all[0];
    assert_eq!(survey.id, id);
    assert_eq!(survey.status, "pending");
    assert_eq!(
        (survey.vote_yes, survey.vote_no, survey.likes, survey.dislikes),
        (0, 0, 0, 0)
    );
    assert_eq!(survey.attributes["options"], json!(["pizza", "salad"]));
    Ok(())
}

#[tokio::test]
async fn empty_patch_matches_without_modifying() -> Result<()> {
    let module = test_module(Arc::new(FakeProvider::default())).await;
    let surveys = module.surveys();
    let id = surveys.create_survey(NewSurvey::default()).await?;

    let outcome = surveys.update_survey(id, SurveyPatch::default()).await?;
    assert_eq!(outcome, UpdateOutcome::matched(false));

    let missing = surveys
        .update_survey(Uuid::new_v4(), SurveyPatch::default())
        .await?;
    assert_eq!(missing, UpdateOutcome::unmatched());
    Ok(())
}

#[tokio::test]
async fn comment_patch_appends_exactly_one_comment() -> Result<()> {
    let module = test_module(Arc::new(FakeProvider::default())).await;
    let surveys = module.surveys();
    let id = surveys.create_survey(NewSurvey::default()).await?;

    let patch = SurveyPatch {
        comment_text: Some("nice".to_string()),
        user_id: Some("u1".to_string()),
        ..Default::default()
    };
    let outcome = surveys.update_survey(id, patch).await?;
    assert_eq!(outcome, UpdateOutcome::matched(true));

    let survey = surveys.list_surveys().await?.remove(0);
    assert_eq!(survey.comments.len(), 1);
    assert_eq!(survey.comments[0].text, "nice");
    assert_eq!(survey.comments[0].user_id.as_deref(), Some("u1"));
    assert!(survey.voters.is_empty());
    assert!(survey.reports.is_empty());
    Ok(())
}

#[tokio::test]
async fn patch_sets_counters_and_appends_in_order() -> Result<()> {
    let module = test_module(Arc::new(FakeProvider::default())).await;
    let surveys = module.surveys();
    let id = surveys.create_survey(NewSurvey::default()).await?;

    for (n, voter) in ["a@example.com", "b@example.com"].into_iter().enumerate() {
        let patch = SurveyPatch {
            vote_yes: Some(n as i64 + 1),
            voter_name: Some(format!("Voter {n}")),
            voter_email: Some(voter.to_string()),
            voted: Some("yes".to_string()),
            date: Some("2024-05-01".to_string()),
            ..Default::default()
        };
        surveys.update_survey(id, patch).await?;
    }

    let report = SurveyPatch {
        reason: Some("spam".to_string()),
        reported_by: Some("c@example.com".to_string()),
        status: Some("unpublished".to_string()),
        likes: Some(0),
        ..Default::default()
    };
    assert_eq!(
        surveys.update_survey(id, report).await?,
        UpdateOutcome::matched(true)
    );

    let survey = surveys.list_surveys().await?.remove(0);
    assert_eq!(survey.vote_yes, 2);
    assert_eq!(survey.status, "unpublished");
    let emails: Vec<_> = survey.voters.iter().map(|v| v.voter_email.as_str()).collect();
    assert_eq!(emails, ["a@example.com", "b@example.com"]);
    assert_eq!(survey.reports.len(), 1);
    assert_eq!(survey.reports[0].reason, "spam");
    Ok(())
}

#[tokio::test]
async fn incomplete_voter_or_report_is_not_appended() -> Result<()> {
    let module = test_module(Arc::new(FakeProvider::default())).await;
    let surveys = module.surveys();
    let id = surveys.create_survey(NewSurvey::default()).await?;

    let patch = SurveyPatch {
        voter_name: Some("Ada".to_string()),
        voter_email: Some("ada@example.com".to_string()),
        reason: Some("spam".to_string()),
        ..Default::default()
    };
    assert_eq!(
        surveys.update_survey(id, patch).await?,
        UpdateOutcome::matched(false)
    );

    let survey = surveys.list_surveys().await?.remove(0);
    assert!(survey.voters.is_empty());
    assert!(survey.reports.is_empty());
    Ok(())
}

#[tokio::test]
async fn unchanged_scalar_is_not_a_modification() -> Result<()> {
    let module = test_module(Arc::new(FakeProvider::default())).await;
    let surveys = module.surveys();
    let id = surveys.create_survey(NewSurvey::default()).await?;

    let patch = SurveyPatch {
        status: Some("pending".to_string()),
        likes: Some(0),
        ..Default::default()
    };
    assert_eq!(
        surveys.update_survey(id, patch).await?,
        UpdateOutcome::matched(false)
    );
    Ok(())
}

#[tokio::test]
async fn listing_is_stable_without_writes() -> Result<()> {
    let module = test_module(Arc::new(FakeProvider::default())).await;
    let surveys = module.surveys();
    for title in ["one", "two", "three"] {
        surveys
            .create_survey(NewSurvey {
                title: Some(title.to_string()),
                ..Default::default()
            })
            .await?;
    }

    let first = surveys.list_surveys().await?;
    let second = surveys.list_surveys().await?;
    assert_eq!(first, second);
    let titles: Vec<_> = first.iter().filter_map(|s| s.title.as_deref()).collect();
    assert_eq!(titles, ["one", "two", "three"]);
    Ok(())
}

#[tokio::test]
async fn payment_intent_uses_minor_units_and_configured_currency() -> Result<()> {
    let provider = Arc::new(FakeProvider::default());
    let module = test_module(provider.clone()).await;

    let secret = module.payments().create_payment_intent(19.99).await?;
    assert_eq!(secret, "pi_1999_secret_test");
    assert_eq!(provider.calls(), vec![(1999, "usd".to_string())]);

    let err = module
        .payments()
        .create_payment_intent(-3.0)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));
    assert_eq!(provider.calls().len(), 1);
    Ok(())
}

#[tokio::test]
async fn provider_failure_surfaces_as_domain_error() {
    let module = test_module(Arc::new(FakeProvider::failing())).await;
    let err = module
        .payments()
        .create_payment_intent(5.0)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::PaymentProvider { .. }));
}

#[tokio::test]
async fn payments_are_recorded_verbatim() -> Result<()> {
    let module = test_module(Arc::new(FakeProvider::default())).await;
    let payments = module.payments();

    let mut draft = NewPayment {
        email: Some("ada@example.com".to_string()),
        price: Some(19.99),
        transaction_id: Some("pi_123".to_string()),
        ..Default::default()
    };
    draft.attributes.insert("plan".to_string(), json!("pro"));
    let id = payments.record_payment(draft.clone()).await?;
    payments.record_payment(draft).await?;

    let all = payments.list_payments().await?;
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, id);
    assert_eq!(all[0].price, Some(19.99));
    assert_eq!(all[0].transaction_id.as_deref(), Some("pi_123"));
    assert_eq!(all[0].attributes["plan"], json!("pro"));
    Ok(())
}

#[tokio::test]
async fn concurrent_patches_on_a_file_database_all_apply() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let dsn = format!(
        "sqlite://{}",
        dir.path()
            .join("savvy.db")
            .to_string_lossy()
            .replace('\\', "/")
    );
    let handle = savvy_db::DbHandle::connect(&dsn, savvy_db::ConnectOpts::default()).await?;
    survey_savvy::SurveySavvy::migrate(handle.seaorm()).await?;
    let module = survey_savvy::SurveySavvy::with_provider(
        handle.sea(),
        &common::test_config(),
        Arc::new(FakeProvider::default()),
    )?;

    let id = module.surveys().create_survey(NewSurvey::default()).await?;

    let tasks: Vec<_> = (0..8i64)
        .map(|i| {
            let module = module.clone();
            tokio::spawn(async move {
                module
                    .surveys()
                    .update_survey(
                        id,
                        SurveyPatch {
                            likes: Some(i + 1),
                            comment_text: Some(format!("comment {i}")),
                            user_id: Some(format!("u{i}")),
                            ..Default::default()
                        },
                    )
                    .await
            })
        })
        .collect();

    for task in tasks {
        let outcome = task.await??;
        assert_eq!(outcome.matched, 1);
        assert_eq!(outcome.modified, 1);
    }

    let surveys = module.surveys().list_surveys().await?;
    assert_eq!(surveys.len(), 1);
    assert_eq!(surveys[0].comments.len(), 8);
    assert!((1..=8).contains(&surveys[0].likes));

    handle.close().await;
    Ok(())
}
