mod common;

use axum_booking_api::{
    dto::booking::CreateBookingRequest,
    error::AppError,
    models::{BookingStatus, Role},
    services::booking_service,
};
use serde_json::json;
use uuid::Uuid;

use common::{count, create_salon, create_user, set_push_token, setup};

fn booking_request(business_id: Uuid, services: serde_json::Value) -> CreateBookingRequest {
    serde_json::from_value(json!({
        "business_id": business_id,
        "datetime": "2026-11-02T10:00:00Z",
        "services": services,
        "total_price": 25
    }))
    .unwrap()
}

// Owner creates a salon, a client books a cut, both sides can see it.
#[tokio::test]
async fn client_books_a_service_and_both_sides_see_it() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let owner = create_user(state, Role::Business, "owner").await?;
    let client = create_user(state, Role::Client, "client").await?;
    set_push_token(state, &client, "ExponentPushToken[client]").await?;
    set_push_token(state, &owner, "ExponentPushToken[owner]").await?;
    let business_id = create_salon(state, &owner).await?;

    let created = booking_service::create_booking(
        state,
        &client,
        booking_request(business_id, json!([{ "title": "cut", "price": 20, "time": 30 }])),
    )
    .await?
    .data
    .expect("booking id");

    let booking = booking_service::get_booking(state, created.booking_id)
        .await?
        .data
        .expect("booking");
    assert_eq!(booking.business.name, "Fade Room");
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(booking.service.len(), 1);
    assert_eq!(booking.service[0].title, "Cut");
    assert_eq!(booking.service[0].description.as_deref(), Some("Scissor cut"));

    let mine = booking_service::list_client_bookings(state, &client)
        .await?
        .data
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, created.booking_id);

    let owned = booking_service::list_owner_bookings(state, &owner)
        .await?
        .data
        .unwrap();
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].client.id, client.user_id);

    let clients = booking_service::list_business_clients(state, &owner, business_id)
        .await?
        .data
        .unwrap();
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0].id, client.user_id);

    let to_client = app.notifier.wait_for("ExponentPushToken[client]", 1).await;
    assert_eq!(to_client[0].title, "Booking confirmed");
    let to_owner = app.notifier.wait_for("ExponentPushToken[owner]", 1).await;
    assert_eq!(to_owner[0].title, "New booking");
    Ok(())
}

#[tokio::test]
async fn line_items_keep_the_submitted_price_and_time() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let owner = create_user(state, Role::Business, "owner").await?;
    let client = create_user(state, Role::Client, "client").await?;
    let business_id = create_salon(state, &owner).await?;

    // catalog says Cut is 20 / 30 min and Wash is 5 / 10 min
    let created = booking_service::create_booking(
        state,
        &client,
        booking_request(
            business_id,
            json!([
                { "title": "Cut", "price": "18", "time": 45 },
                { "title": "WASH", "price": 7, "time": 10 }
            ]),
        ),
    )
    .await?
    .data
    .unwrap();

    let booking = booking_service::get_booking(state, created.booking_id)
        .await?
        .data
        .unwrap();
    let booked: Vec<_> = booking
        .service
        .iter()
        .map(|s| (s.title.as_str(), s.price, s.time))
        .collect();
    assert_eq!(booked, vec![("Cut", 18, 45), ("Wash", 7, 10)]);
    assert_eq!(
        count(
            state,
            "SELECT COUNT(*) FROM booking_services WHERE booking_id = $1",
            created.booking_id
        )
        .await?,
        2
    );
    Ok(())
}

#[tokio::test]
async fn line_items_outlive_catalog_changes() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let owner = create_user(state, Role::Business, "owner").await?;
    let client = create_user(state, Role::Client, "client").await?;
    let business_id = create_salon(state, &owner).await?;

    let created = booking_service::create_booking(
        state,
        &client,
        booking_request(business_id, json!([{ "title": "Cut", "price": 20, "time": 30 }])),
    )
    .await?
    .data
    .unwrap();

    sqlx::query(
        "UPDATE services SET title = 'Skin Fade', description = NULL \
         WHERE title = 'Cut' AND category_id IN \
         (SELECT id FROM service_categories WHERE business_id = $1)",
    )
    .bind(business_id)
    .execute(&state.pool)
    .await?;
    let booking = booking_service::get_booking(state, created.booking_id)
        .await?
        .data
        .unwrap();
    assert_eq!(booking.service[0].title, "Cut");
    assert_eq!(booking.service[0].description.as_deref(), Some("Scissor cut"));

    sqlx::query(
        "DELETE FROM services WHERE category_id IN \
         (SELECT id FROM service_categories WHERE business_id = $1)",
    )
    .bind(business_id)
    .execute(&state.pool)
    .await?;
    let booking = booking_service::get_booking(state, created.booking_id)
        .await?
        .data
        .unwrap();
    assert_eq!(booking.service.len(), 1);
    assert_eq!(booking.service[0].title, "Cut");
    assert_eq!(booking.service[0].price, 20);
    Ok(())
}

#[tokio::test]
async fn unknown_title_writes_nothing() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let owner = create_user(state, Role::Business, "owner").await?;
    let client = create_user(state, Role::Client, "client").await?;
    let business_id = create_salon(state, &owner).await?;

    let err = booking_service::create_booking(
        state,
        &client,
        booking_request(
            business_id,
            json!([
                { "title": "Cut", "price": 20, "time": 30 },
                { "title": "Massage", "price": 40, "time": 60 }
            ]),
        ),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref m) if m == "Service not found: Massage"));

    assert_eq!(
        count(
            state,
            "SELECT COUNT(*) FROM bookings WHERE business_id = $1",
            business_id
        )
        .await?,
        0
    );
    assert_eq!(
        count(
            state,
            "SELECT COUNT(*) FROM booking_services bs \
             JOIN bookings b ON b.id = bs.booking_id WHERE b.user_id = $1",
            client.user_id
        )
        .await?,
        0
    );
    Ok(())
}

#[tokio::test]
async fn booking_an_unknown_business_is_not_found() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let client = create_user(&app.state, Role::Client, "client").await?;

    let err = booking_service::create_booking(
        &app.state,
        &client,
        booking_request(Uuid::new_v4(), json!([{ "title": "Cut", "price": 20, "time": 30 }])),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound("Business")));
    Ok(())
}

#[tokio::test]
async fn cancelling_twice_is_rejected_and_strangers_are_forbidden() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let owner = create_user(state, Role::Business, "owner").await?;
    let client = create_user(state, Role::Client, "client").await?;
    let stranger = create_user(state, Role::Client, "stranger").await?;
    let business_id = create_salon(state, &owner).await?;

    let booking_id = booking_service::create_booking(
        state,
        &client,
        booking_request(business_id, json!([{ "title": "Cut", "price": 20, "time": 30 }])),
    )
    .await?
    .data
    .unwrap()
    .booking_id;

    let err = booking_service::cancel_booking(state, &stranger, booking_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let cancelled = booking_service::cancel_booking(state, &owner, booking_id)
        .await?
        .data
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);

    let err = booking_service::cancel_booking(state, &client, booking_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let booking = booking_service::get_booking(state, booking_id)
        .await?
        .data
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Cancelled);

    let err = booking_service::cancel_booking(state, &client, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound("Booking")));
    Ok(())
}

#[tokio::test]
async fn client_list_of_another_owner_is_forbidden() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let owner = create_user(state, Role::Business, "owner").await?;
    let other = create_user(state, Role::Business, "other").await?;
    let business_id = create_salon(state, &owner).await?;

    let err = booking_service::list_business_clients(state, &other, business_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    Ok(())
}
