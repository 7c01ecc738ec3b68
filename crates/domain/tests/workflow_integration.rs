//! Integration tests for the booking workflow.
//!
//! These tests drive the workflow engine and admin gateway against the
//! in-memory store, checking the room/booking/payment lockstep, race safety
//! and rollback on mid-transaction failure.

use common::{BookingId, BookingStatus, Caller, Money, PaymentId, RoomId, RoomStatus, UserId};
use domain::{
    AdminGateway, BookingQueries, BookingWorkflow, ErrorCategory, PaymentClaim, WorkflowError,
};
use entity_store::{
    EntityStore, FaultPoint, InMemoryStore, NewLocation, NewRoom, NewUser, Room, RoomDetails,
};

struct Fixture {
    store: InMemoryStore,
    workflow: BookingWorkflow<InMemoryStore>,
    gateway: AdminGateway<InMemoryStore>,
    admin: Caller,
    customer: Caller,
    other_customer: Caller,
    room: Room,
}

/// Seeds admin user 1, customers 2..=7 and room R101 priced 10000.
async fn fixture() -> Fixture {
    let store = InMemoryStore::new();

    let admin = store
        .insert_user(NewUser::admin("Admin", "admin@example.com"))
        .await
        .unwrap();
    let mut customers = Vec::new();
    for n in 2..=7 {
        let user = store
            .insert_user(NewUser::customer(
                format!("Customer {n}"),
                format!("customer{n}@example.com"),
            ))
            .await
            .unwrap();
        customers.push(user);
    }

    let location = store
        .insert_location(NewLocation {
            name: "Sunrise PG".to_string(),
            description: "Close to the tech park".to_string(),
            address: "7 Outer Ring Road".to_string(),
            maps_url: "https://maps.example.com/sunrise".to_string(),
            thumbnail_url: None,
            price_range_start: Money::from_minor(8000),
            price_range_end: Money::from_minor(12000),
        })
        .await
        .unwrap();
    let room = store
        .insert_room(NewRoom {
            location_id: location.id,
            room_number: "R101".to_string(),
            price: Money::from_minor(10000),
            with_attached_bath: true,
        })
        .await
        .unwrap();

    let workflow = BookingWorkflow::new(store.clone());
    let gateway = AdminGateway::new(workflow.clone());

    Fixture {
        store,
        workflow,
        gateway,
        admin: Caller::admin(admin.id),
        customer: Caller::customer(UserId::new(7)),
        other_customer: Caller::customer(UserId::new(2)),
        room,
    }
}

fn claim(reference: &str) -> PaymentClaim {
    PaymentClaim::parse(10000, reference, None).unwrap()
}

impl Fixture {
    async fn book(&self) -> BookingId {
        self.workflow
            .submit_booking(self.customer.user_id, self.room.id, claim("UPI123"), None)
            .await
            .unwrap()
            .booking_id
    }

    async fn latest_payment(&self, booking_id: BookingId) -> PaymentId {
        self.store.payments_by_booking(booking_id).await.unwrap()[0].id
    }

    async fn room_status(&self) -> RoomStatus {
        self.store.get_room(self.room.id).await.unwrap().unwrap().status
    }

    async fn booking_status(&self, booking_id: BookingId) -> BookingStatus {
        self.store
            .get_booking(booking_id)
            .await
            .unwrap()
            .unwrap()
            .status
    }

    /// Booked rooms have exactly one confirmed booking, pending rooms exactly
    /// one pending booking, available rooms none active.
    async fn assert_room_booking_lockstep(&self) {
        let bookings = self.store.bookings_by_room(self.room.id).await.unwrap();
        let count = |status| bookings.iter().filter(|b| b.status == status).count();
        let (pending, confirmed) = (count(BookingStatus::Pending), count(BookingStatus::Confirmed));

        match self.room_status().await {
            RoomStatus::Available => assert_eq!((pending, confirmed), (0, 0)),
            RoomStatus::Pending => assert_eq!((pending, confirmed), (1, 0)),
            RoomStatus::Booked => assert_eq!((pending, confirmed), (0, 1)),
        }
    }
}

mod submit_booking {
    use super::*;

    #[tokio::test]
    async fn available_room_is_held_pending() {
        let fx = fixture().await;

        let receipt = fx
            .workflow
            .submit_booking(
                UserId::new(7),
                fx.room.id,
                claim("UPI123"),
                Some("Need a quiet room".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(receipt.booking_id, BookingId::new(1));
        assert_eq!(receipt.status, BookingStatus::Pending);
        assert_eq!(fx.room_status().await, RoomStatus::Pending);

        let payments = fx.store.payments_by_booking(receipt.booking_id).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].id, PaymentId::new(1));
        assert_eq!(payments[0].amount, Money::from_minor(10000));
        assert_eq!(payments[0].upi_reference, "UPI123");
        assert!(!payments[0].verified);

        let booking = fx.store.get_booking(receipt.booking_id).await.unwrap().unwrap();
        assert_eq!(booking.user_id, UserId::new(7));
        assert_eq!(booking.notes.as_deref(), Some("Need a quiet room"));
        fx.assert_room_booking_lockstep().await;
    }

    #[tokio::test]
    async fn pending_room_is_not_available() {
        let fx = fixture().await;
        fx.book().await;

        let result = fx
            .workflow
            .submit_booking(fx.other_customer.user_id, fx.room.id, claim("UPI999"), None)
            .await;

        assert!(matches!(
            result,
            Err(WorkflowError::RoomNotAvailable {
                status: RoomStatus::Pending,
                ..
            })
        ));
        assert_eq!(fx.store.booking_count().await, 1);
        assert_eq!(fx.store.payment_count().await, 1);
    }

    #[tokio::test]
    async fn unknown_room_is_not_found() {
        let fx = fixture().await;

        let result = fx
            .workflow
            .submit_booking(fx.customer.user_id, RoomId::new(404), claim("UPI123"), None)
            .await;

        assert!(matches!(result, Err(WorkflowError::RoomNotFound(_))));
        assert_eq!(fx.store.booking_count().await, 0);
    }

    #[tokio::test]
    async fn blank_notes_are_dropped() {
        let fx = fixture().await;

        let receipt = fx
            .workflow
            .submit_booking(
                fx.customer.user_id,
                fx.room.id,
                claim("UPI123"),
                Some("   ".to_string()),
            )
            .await
            .unwrap();

        let booking = fx.store.get_booking(receipt.booking_id).await.unwrap().unwrap();
        assert_eq!(booking.notes, None);
    }

    #[tokio::test]
    async fn concurrent_submissions_have_one_winner() {
        let fx = fixture().await;

        let first = {
            let workflow = fx.workflow.clone();
            let room_id = fx.room.id;
            tokio::spawn(async move {
                workflow
                    .submit_booking(UserId::new(7), room_id, claim("UPI-A"), None)
                    .await
            })
        };
        let second = {
            let workflow = fx.workflow.clone();
            let room_id = fx.room.id;
            tokio::spawn(async move {
                workflow
                    .submit_booking(UserId::new(2), room_id, claim("UPI-B"), None)
                    .await
            })
        };
        let (first, second) = tokio::join!(first, second);
        let results = [first.unwrap(), second.unwrap()];

        let winners = results.iter().filter(|r| r.is_ok()).count();
        let losers = results
            .iter()
            .filter(|r| matches!(r, Err(WorkflowError::RoomNotAvailable { .. })))
            .count();
        assert_eq!((winners, losers), (1, 1));

        assert_eq!(fx.store.booking_count().await, 1);
        assert_eq!(fx.room_status().await, RoomStatus::Pending);
        fx.assert_room_booking_lockstep().await;
    }

    #[tokio::test]
    async fn failure_before_room_update_rolls_back() {
        let fx = fixture().await;
        fx.store.fail_at(FaultPoint::SetRoomStatus);

        let result = fx
            .workflow
            .submit_booking(fx.customer.user_id, fx.room.id, claim("UPI123"), None)
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Transient);
        assert_eq!(fx.store.booking_count().await, 0);
        assert_eq!(fx.store.payment_count().await, 0);
        assert_eq!(fx.room_status().await, RoomStatus::Available);

        // The room is still bookable once the fault has passed.
        fx.book().await;
        assert_eq!(fx.room_status().await, RoomStatus::Pending);
    }

    #[tokio::test]
    async fn failure_at_payment_insert_rolls_back() {
        let fx = fixture().await;
        fx.store.fail_at(FaultPoint::InsertPayment);

        let result = fx
            .workflow
            .submit_booking(fx.customer.user_id, fx.room.id, claim("UPI123"), None)
            .await;

        assert!(matches!(result, Err(WorkflowError::Transient(_))));
        assert_eq!(fx.store.booking_count().await, 0);
        assert_eq!(fx.room_status().await, RoomStatus::Available);
    }
}

mod verify_payment {
    use super::*;

    #[tokio::test]
    async fn verification_confirms_booking_and_books_room() {
        let fx = fixture().await;
        let booking_id = fx.book().await;
        let payment_id = fx.latest_payment(booking_id).await;

        let decision = fx
            .workflow
            .verify_payment(payment_id, UserId::new(1))
            .await
            .unwrap();

        assert_eq!(decision.room_id, fx.room.id);
        assert_eq!(decision.booking_id, booking_id);
        assert_eq!(decision.payment_id, payment_id);

        assert_eq!(fx.booking_status(booking_id).await, BookingStatus::Confirmed);
        assert_eq!(fx.room_status().await, RoomStatus::Booked);
        let payment = fx.store.get_payment(payment_id).await.unwrap().unwrap();
        assert!(payment.verified);
        assert_eq!(payment.verified_by, Some(UserId::new(1)));
        fx.assert_room_booking_lockstep().await;
    }

    #[tokio::test]
    async fn second_verification_is_refused() {
        let fx = fixture().await;
        let booking_id = fx.book().await;
        let payment_id = fx.latest_payment(booking_id).await;
        fx.workflow
            .verify_payment(payment_id, UserId::new(1))
            .await
            .unwrap();
        let second_admin = fx
            .store
            .insert_user(NewUser::admin("Second Admin", "admin2@example.com"))
            .await
            .unwrap();
        let payments_before = fx.store.payment_count().await;

        let result = fx.workflow.verify_payment(payment_id, second_admin.id).await;

        assert!(matches!(
            result,
            Err(WorkflowError::BookingNotPending {
                status: BookingStatus::Confirmed,
                ..
            })
        ));
        assert_eq!(fx.booking_status(booking_id).await, BookingStatus::Confirmed);
        assert_eq!(fx.room_status().await, RoomStatus::Booked);
        let payment = fx.store.get_payment(payment_id).await.unwrap().unwrap();
        assert_eq!(payment.verified_by, Some(UserId::new(1)));
        assert_eq!(fx.store.payment_count().await, payments_before);
        fx.assert_room_booking_lockstep().await;
    }

    #[tokio::test]
    async fn unknown_payment_is_not_found() {
        let fx = fixture().await;

        let result = fx
            .workflow
            .verify_payment(PaymentId::new(99), UserId::new(1))
            .await;

        assert!(matches!(result, Err(WorkflowError::PaymentNotFound(_))));
    }

    #[tokio::test]
    async fn superseded_payment_cannot_be_verified() {
        let fx = fixture().await;
        let booking_id = fx.book().await;
        let first = fx.latest_payment(booking_id).await;

        let receipt = fx
            .workflow
            .submit_payment(booking_id, fx.customer, claim("UPI456"))
            .await
            .unwrap();

        let result = fx.workflow.verify_payment(first, UserId::new(1)).await;
        assert!(matches!(
            result,
            Err(WorkflowError::PaymentSuperseded { latest, .. }) if latest == receipt.payment_id
        ));

        fx.workflow
            .verify_payment(receipt.payment_id, UserId::new(1))
            .await
            .unwrap();
        assert_eq!(fx.room_status().await, RoomStatus::Booked);
    }

    #[tokio::test]
    async fn failure_mid_verification_rolls_back() {
        let fx = fixture().await;
        let booking_id = fx.book().await;
        let payment_id = fx.latest_payment(booking_id).await;
        fx.store.fail_at(FaultPoint::SetRoomStatus);

        let result = fx.workflow.verify_payment(payment_id, UserId::new(1)).await;

        assert!(matches!(result, Err(WorkflowError::Transient(_))));
        assert_eq!(fx.booking_status(booking_id).await, BookingStatus::Pending);
        assert_eq!(fx.room_status().await, RoomStatus::Pending);
        let payment = fx.store.get_payment(payment_id).await.unwrap().unwrap();
        assert!(!payment.verified);
    }
}

mod reject_and_cancel {
    use super::*;

    #[tokio::test]
    async fn rejection_cancels_booking_and_frees_room() {
        let fx = fixture().await;
        let booking_id = fx.book().await;
        let payment_id = fx.latest_payment(booking_id).await;

        let decision = fx
            .workflow
            .reject_payment(payment_id, UserId::new(1), Some("reference not found".into()))
            .await
            .unwrap();

        assert_eq!(decision.booking_id, booking_id);
        assert_eq!(fx.booking_status(booking_id).await, BookingStatus::Cancelled);
        assert_eq!(fx.room_status().await, RoomStatus::Available);
        let payment = fx.store.get_payment(payment_id).await.unwrap().unwrap();
        assert!(!payment.verified);
        fx.assert_room_booking_lockstep().await;

        // The room can be booked again.
        let receipt = fx
            .workflow
            .submit_booking(fx.other_customer.user_id, fx.room.id, claim("UPI777"), None)
            .await
            .unwrap();
        assert_eq!(receipt.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn owner_can_cancel_pending_booking() {
        let fx = fixture().await;
        let booking_id = fx.book().await;

        let booking = fx
            .workflow
            .cancel_booking(booking_id, fx.customer)
            .await
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Cancelled);
        assert_eq!(fx.room_status().await, RoomStatus::Available);
    }

    #[tokio::test]
    async fn stranger_cannot_cancel() {
        let fx = fixture().await;
        let booking_id = fx.book().await;

        let result = fx
            .workflow
            .cancel_booking(booking_id, fx.other_customer)
            .await;

        assert!(matches!(result, Err(WorkflowError::Forbidden(_))));
        assert_eq!(fx.booking_status(booking_id).await, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn confirmed_booking_cannot_be_cancelled() {
        let fx = fixture().await;
        let booking_id = fx.book().await;
        let payment_id = fx.latest_payment(booking_id).await;
        fx.workflow
            .verify_payment(payment_id, UserId::new(1))
            .await
            .unwrap();

        let result = fx.workflow.cancel_booking(booking_id, fx.admin).await;

        assert!(matches!(result, Err(WorkflowError::BookingNotPending { .. })));
        assert_eq!(fx.room_status().await, RoomStatus::Booked);
    }

    #[tokio::test]
    async fn payment_for_someone_elses_booking_is_forbidden() {
        let fx = fixture().await;
        let booking_id = fx.book().await;

        let result = fx
            .workflow
            .submit_payment(booking_id, fx.other_customer, claim("UPI000"))
            .await;

        assert!(matches!(result, Err(WorkflowError::Forbidden(_))));
        assert_eq!(fx.store.payment_count().await, 1);
    }
}

mod admin_gateway {
    use super::*;

    #[tokio::test]
    async fn customers_cannot_verify() {
        let fx = fixture().await;
        let booking_id = fx.book().await;
        let payment_id = fx.latest_payment(booking_id).await;

        let result = fx.gateway.verify_payment(fx.customer, payment_id).await;

        assert!(matches!(result, Err(WorkflowError::Forbidden(_))));
        assert_eq!(fx.booking_status(booking_id).await, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn pending_bookings_are_enriched() {
        let fx = fixture().await;
        let booking_id = fx.book().await;
        fx.workflow
            .submit_payment(booking_id, fx.customer, claim("UPI456"))
            .await
            .unwrap();

        let pending = fx.gateway.list_pending_bookings(fx.admin).await.unwrap();

        assert_eq!(pending.len(), 1);
        let view = &pending[0];
        assert_eq!(view.booking.id, booking_id);
        assert_eq!(view.user.as_ref().unwrap().id, UserId::new(7));
        let room = view.room.as_ref().unwrap();
        assert_eq!(room.room.room_number, "R101");
        assert_eq!(room.pg_location.as_ref().unwrap().name, "Sunrise PG");
        assert_eq!(view.payments.len(), 2);
        assert_eq!(view.active_payment().unwrap().upi_reference, "UPI456");
    }

    #[tokio::test]
    async fn verified_bookings_leave_the_pending_list() {
        let fx = fixture().await;
        let booking_id = fx.book().await;
        let payment_id = fx.latest_payment(booking_id).await;

        fx.gateway
            .verify_payment(fx.admin, payment_id)
            .await
            .unwrap();

        assert!(fx.gateway.list_pending_bookings(fx.admin).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stats_reflect_workflow() {
        let fx = fixture().await;
        let booking_id = fx.book().await;
        let payment_id = fx.latest_payment(booking_id).await;
        fx.gateway
            .reject_payment(fx.admin, payment_id, None)
            .await
            .unwrap();
        fx.book().await;

        let stats = fx.gateway.booking_stats(fx.admin).await.unwrap();
        assert_eq!((stats.total, stats.pending, stats.cancelled), (2, 1, 1));

        let counts = fx.gateway.location_room_counts(fx.admin).await.unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].total_rooms, 1);
        assert_eq!(counts[0].available_rooms, 0);
    }

    #[tokio::test]
    async fn catalogue_maintenance() {
        let fx = fixture().await;

        let room = fx
            .gateway
            .create_room(
                fx.admin,
                NewRoom {
                    location_id: fx.room.location_id,
                    room_number: "R102".to_string(),
                    price: Money::from_minor(9000),
                    with_attached_bath: false,
                },
            )
            .await
            .unwrap();
        assert_eq!(room.status, RoomStatus::Available);

        let updated = fx
            .gateway
            .update_room(
                fx.admin,
                room.id,
                RoomDetails {
                    price: Some(Money::from_minor(9500)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price, Money::from_minor(9500));

        fx.gateway.delete_room(fx.admin, room.id).await.unwrap();
        let result = fx.gateway.delete_room(fx.admin, room.id).await;
        assert!(matches!(result, Err(WorkflowError::RoomNotFound(_))));
    }

    #[tokio::test]
    async fn booked_room_cannot_be_deleted() {
        let fx = fixture().await;
        fx.book().await;

        let result = fx.gateway.delete_room(fx.admin, fx.room.id).await;

        assert!(matches!(result, Err(WorkflowError::RoomInUse(_))));
        assert!(fx.store.get_room(fx.room.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn room_for_unknown_location_is_refused() {
        let fx = fixture().await;

        let result = fx
            .gateway
            .create_room(
                fx.admin,
                NewRoom {
                    location_id: common::LocationId::new(77),
                    room_number: "X1".to_string(),
                    price: Money::from_minor(9000),
                    with_attached_bath: false,
                },
            )
            .await;

        assert!(matches!(result, Err(WorkflowError::LocationNotFound(_))));
    }
}

mod customer_queries {
    use super::*;

    #[tokio::test]
    async fn owner_and_admin_see_booking_details() {
        let fx = fixture().await;
        let booking_id = fx.book().await;
        let queries = BookingQueries::new(fx.store.clone());

        let view = queries.booking_details(fx.customer, booking_id).await.unwrap();
        assert_eq!(view.booking.id, booking_id);
        assert!(queries.booking_details(fx.admin, booking_id).await.is_ok());

        let result = queries.booking_details(fx.other_customer, booking_id).await;
        assert!(matches!(result, Err(WorkflowError::Forbidden(_))));
    }

    #[tokio::test]
    async fn bookings_for_user_lists_only_own() {
        let fx = fixture().await;
        fx.book().await;
        let queries = BookingQueries::new(fx.store.clone());

        assert_eq!(queries.bookings_for_user(fx.customer).await.unwrap().len(), 1);
        assert!(
            queries
                .bookings_for_user(fx.other_customer)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn booking_view_serializes_nested_records() {
        let fx = fixture().await;
        let booking_id = fx.book().await;
        let queries = BookingQueries::new(fx.store.clone());

        let view = queries.booking_details(fx.customer, booking_id).await.unwrap();
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["id"], 1);
        assert_eq!(json["status"], "Pending");
        assert_eq!(json["room"]["roomNumber"], "R101");
        assert_eq!(json["room"]["pgLocation"]["name"], "Sunrise PG");
        assert_eq!(json["payments"][0]["upiReference"], "UPI123");
        assert_eq!(json["payments"][0]["verifiedByAdmin"], false);
    }
}
