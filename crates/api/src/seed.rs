//! Demo data for local runs.

use common::Money;
use entity_store::{EntityStore, NewLocation, NewRoom, NewUser, StoreError};

struct DemoLocation {
    name: &'static str,
    description: &'static str,
    address: &'static str,
    price_range: (i64, i64),
    rooms: usize,
}

const DEMO_LOCATIONS: &[DemoLocation] = &[
    DemoLocation {
        name: "Green Park PG",
        description: "Modern PG with all basic amenities in a prime location.",
        address: "123 Green Park Road, Bangalore",
        price_range: (8000, 15000),
        rooms: 6,
    },
    DemoLocation {
        name: "Urban Stay PG",
        description: "Premium PG with gym, recreation room and high-speed WiFi.",
        address: "45 Urban Heights, HSR Layout, Bangalore",
        price_range: (10000, 18000),
        rooms: 5,
    },
    DemoLocation {
        name: "Comfort Zone PG",
        description: "Affordable PG with a homely environment and meals.",
        address: "78 Comfort Lane, Koramangala, Bangalore",
        price_range: (7000, 14000),
        rooms: 8,
    },
];

/// What [`seed_demo_data`] inserted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub locations: usize,
    pub rooms: usize,
}

/// Loads an admin, a demo customer and a few locations with rooms.
///
/// Does nothing if the store already holds any location. Even-numbered
/// rooms have an attached bath and are priced at the top of the range.
pub async fn seed_demo_data<S>(store: &S) -> Result<SeedSummary, StoreError>
where
    S: EntityStore + ?Sized,
{
    let mut summary = SeedSummary::default();
    if !store.list_locations().await?.is_empty() {
        tracing::info!("store already holds data, skipping demo seed");
        return Ok(summary);
    }

    let admin = store
        .insert_user(NewUser::admin("Admin User", "admin@example.com"))
        .await?;
    let customer = store
        .insert_user(NewUser::customer("Demo User", "user@example.com"))
        .await?;
    summary.users = 2;
    tracing::info!(admin_id = %admin.id, customer_id = %customer.id, "demo users created");

    for demo in DEMO_LOCATIONS {
        let (low, high) = demo.price_range;
        let location = store
            .insert_location(NewLocation {
                name: demo.name.to_string(),
                description: demo.description.to_string(),
                address: demo.address.to_string(),
                maps_url: format!(
                    "https://maps.google.com/?q={}",
                    demo.address.replace(' ', "+")
                ),
                thumbnail_url: None,
                price_range_start: Money::from_minor(low),
                price_range_end: Money::from_minor(high),
            })
            .await?;
        summary.locations += 1;

        for n in 1..=demo.rooms {
            let with_attached_bath = n % 2 == 0;
            store
                .insert_room(NewRoom {
                    location_id: location.id,
                    room_number: format!("{n:02}"),
                    price: Money::from_minor(if with_attached_bath { high } else { low }),
                    with_attached_bath,
                })
                .await?;
            summary.rooms += 1;
        }
    }

    tracing::info!(
        locations = summary.locations,
        rooms = summary.rooms,
        "demo data seeded"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use entity_store::InMemoryStore;

    use super::*;

    #[tokio::test]
    async fn seeds_once() {
        let store = InMemoryStore::new();

        let first = seed_demo_data(&store).await.unwrap();
        assert_eq!(first.users, 2);
        assert_eq!(first.locations, DEMO_LOCATIONS.len());
        assert_eq!(first.rooms, 19);

        let second = seed_demo_data(&store).await.unwrap();
        assert_eq!(second, SeedSummary::default());
        assert_eq!(store.list_locations().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn admin_is_user_one() {
        let store = InMemoryStore::new();
        seed_demo_data(&store).await.unwrap();

        let admin = store
            .get_user(common::UserId::new(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, common::UserRole::Admin);
    }
}
