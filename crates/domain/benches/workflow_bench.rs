use common::{Money, RoomId, UserId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{BookingWorkflow, PaymentClaim};
use entity_store::{EntityStore, InMemoryStore, NewLocation, NewRoom, NewUser};

async fn seeded_store(rooms: usize) -> (InMemoryStore, UserId, UserId, Vec<RoomId>) {
    let store = InMemoryStore::new();
    let admin = store
        .insert_user(NewUser::admin("Admin", "admin@example.com"))
        .await
        .unwrap();
    let customer = store
        .insert_user(NewUser::customer("Bench", "bench@example.com"))
        .await
        .unwrap();
    let location = store
        .insert_location(NewLocation {
            name: "Bench PG".to_string(),
            description: String::new(),
            address: "1 Bench Street".to_string(),
            maps_url: String::new(),
            thumbnail_url: None,
            price_range_start: Money::from_minor(1000),
            price_range_end: Money::from_minor(20000),
        })
        .await
        .unwrap();

    let mut room_ids = Vec::with_capacity(rooms);
    for n in 0..rooms {
        let room = store
            .insert_room(NewRoom {
                location_id: location.id,
                room_number: format!("B{n}"),
                price: Money::from_minor(10000),
                with_attached_bath: n % 2 == 0,
            })
            .await
            .unwrap();
        room_ids.push(room.id);
    }
    (store, admin.id, customer.id, room_ids)
}

fn claim() -> PaymentClaim {
    PaymentClaim::parse(10000, "UPI-BENCH", None).unwrap()
}

fn bench_submit_booking(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("workflow/submit_booking", |b| {
        b.iter(|| {
            rt.block_on(async {
                let (store, _, customer, rooms) = seeded_store(1).await;
                let workflow = BookingWorkflow::new(store);
                workflow
                    .submit_booking(customer, rooms[0], claim(), None)
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_submit_and_verify(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("workflow/submit_and_verify", |b| {
        b.iter(|| {
            rt.block_on(async {
                let (store, admin, customer, rooms) = seeded_store(1).await;
                let workflow = BookingWorkflow::new(store.clone());
                let receipt = workflow
                    .submit_booking(customer, rooms[0], claim(), None)
                    .await
                    .unwrap();
                let payment = store.payments_by_booking(receipt.booking_id).await.unwrap()[0].id;
                workflow.verify_payment(payment, admin).await.unwrap();
            });
        });
    });
}

fn bench_contended_room(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("workflow/contended_room_10_submitters", |b| {
        b.iter(|| {
            rt.block_on(async {
                let (store, _, customer, rooms) = seeded_store(1).await;
                let workflow = BookingWorkflow::new(store);
                let mut handles = Vec::new();
                for _ in 0..10 {
                    let workflow = workflow.clone();
                    let room = rooms[0];
                    handles.push(tokio::spawn(async move {
                        workflow.submit_booking(customer, room, claim(), None).await
                    }));
                }
                let mut winners = 0;
                for handle in handles {
                    if handle.await.unwrap().is_ok() {
                        winners += 1;
                    }
                }
                assert_eq!(winners, 1);
            });
        });
    });
}

criterion_group!(
    benches,
    bench_submit_booking,
    bench_submit_and_verify,
    bench_contended_room
);
criterion_main!(benches);
