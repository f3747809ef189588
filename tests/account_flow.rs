mod common;

use std::sync::Arc;

use axum_booking_api::{
    dto::{
        auth::{AppleLoginRequest, CheckEmailRequest, LoginRequest, RegisterRequest, SetRoleRequest},
        notification::PushTokenRequest,
        search::SaveSearchRequest,
    },
    error::AppError,
    identity::ExternalIdentity,
    middleware::auth::decode_token,
    models::Role,
    services::{auth_service, notification_service, search_service},
};
use serde_json::json;

use common::{StaticIdentityVerifier, setup, setup_with_identity, unique_email};

fn register(email: &str, role: &str) -> RegisterRequest {
    RegisterRequest {
        name: Some("Lucia".into()),
        last_name: Some("Gomez".into()),
        email: Some(email.to_string()),
        password: Some("secret123".into()),
        role: Some(role.into()),
    }
}

#[tokio::test]
async fn register_login_and_manage_the_account() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;
    let email = unique_email("lucia");

    let registered = auth_service::register_user(state, register(&email.to_uppercase(), "client"))
        .await?
        .data
        .unwrap();
    assert_eq!(registered.user.email, email);
    assert_eq!(registered.user.role, Some(Role::Client));

    let err = auth_service::register_user(state, register(&email, "client"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = auth_service::login_user(
        state,
        LoginRequest {
            email: email.clone(),
            password: "wrong-password".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let session = auth_service::login_user(
        state,
        LoginRequest {
            email: email.clone(),
            password: "secret123".into(),
        },
    )
    .await?
    .data
    .unwrap();
    let caller = decode_token(&state.jwt_secret, &session.token)?;
    assert_eq!(caller.user_id, registered.user.id);

    let exists = auth_service::check_email(
        state,
        CheckEmailRequest {
            email: Some(email.clone()),
        },
    )
    .await?
    .data
    .unwrap();
    assert!(exists.exists);

    let switched = auth_service::set_role(
        state,
        &caller,
        SetRoleRequest {
            role: "business".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(switched.user.role, Some(Role::Business));
    assert_eq!(
        decode_token(&state.jwt_secret, &switched.token)?.role,
        Some(Role::Business)
    );

    notification_service::save_push_token(
        state,
        &caller,
        PushTokenRequest {
            token: Some("ExponentPushToken[abc]".into()),
        },
    )
    .await?;
    let err =
        notification_service::save_push_token(state, &caller, PushTokenRequest { token: None })
            .await
            .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let me = auth_service::me(state, &caller).await?.data.unwrap();
    assert_eq!(me.name, "Lucia");

    auth_service::delete_account(state, &caller).await?;
    let err = auth_service::me(state, &caller).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound("User")));
    Ok(())
}

#[tokio::test]
async fn concurrent_sign_ups_for_one_email_yield_one_account() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let email = unique_email("race");

    let mut sign_ups = tokio::task::JoinSet::new();
    for _ in 0..8 {
        let state = app.state.clone();
        let request = register(&email, "client");
        sign_ups.spawn(async move { auth_service::register_user(&state, request).await });
    }

    let mut created = 0;
    while let Some(outcome) = sign_ups.join_next().await {
        match outcome? {
            Ok(_) => created += 1,
            Err(AppError::Conflict(message)) => assert_eq!(message, "Email is already taken"),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(created, 1);
    Ok(())
}

#[tokio::test]
async fn apple_sign_in_creates_then_finds_the_account() -> anyhow::Result<()> {
    let email = unique_email("apple");
    let subject = format!("apple-{}", uuid::Uuid::new_v4());
    let verifier = Arc::new(StaticIdentityVerifier {
        token: "good-token".into(),
        identity: ExternalIdentity {
            subject: subject.clone(),
            email: Some(email.clone()),
        },
    });
    let Some(app) = setup_with_identity(verifier).await? else {
        return Ok(());
    };
    let state = &app.state;

    let request = || AppleLoginRequest {
        identity_token: "good-token".into(),
        name: Some("Marta".into()),
        last_name: None,
        role: None,
    };

    let first = auth_service::apple_login(state, request()).await?.data.unwrap();
    assert!(first.is_new_user);
    assert_eq!(first.user.email, email);
    assert_eq!(first.user.role, None);

    let second = auth_service::apple_login(state, request()).await?.data.unwrap();
    assert!(!second.is_new_user);
    assert_eq!(second.user.id, first.user.id);

    let err = auth_service::apple_login(
        state,
        AppleLoginRequest {
            identity_token: "forged".into(),
            ..request()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    Ok(())
}

#[tokio::test]
async fn recent_searches_are_refreshed_not_duplicated() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;
    let user = common::create_user(state, Role::Client, "traveller").await?;

    let search = || -> SaveSearchRequest {
        serde_json::from_value(json!({
            "from": "Barcelona",
            "to": "Lisbon",
            "fromEntityId": "27548283",
            "toEntityId": "27544072",
            "departure": "2026-12-01",
            "return": "2026-12-08",
            "cabinClass": "economy",
            "passengers": { "adult": 2 }
        }))
        .unwrap()
    };

    let first = search_service::save_search(state, Some(&user), search())
        .await?
        .data
        .unwrap();
    let second = search_service::save_search(state, Some(&user), search())
        .await?
        .data
        .unwrap();
    assert_eq!(first.id, second.id);
    assert!(second.created_at >= first.created_at);
    assert_eq!(second.adults, 2);

    let recent = search_service::recent_searches(state, &user)
        .await?
        .data
        .unwrap();
    assert_eq!(recent.len(), 1);

    search_service::delete_search(state, &user, first.id).await?;
    let err = search_service::delete_search(state, &user, first.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound("Search")));
    Ok(())
}
