use serde::{Deserialize, Serialize};

/// Declares a store-assigned record identifier.
///
/// Every table uses a serial primary key, so identifiers wrap an `i64`. The
/// newtypes keep a booking id from being passed where a room id is expected.
macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates an identifier from its raw value.
            pub fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw value.
            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

record_id!(
    /// Identifier of a registered user (customer or administrator).
    UserId
);

record_id!(
    /// Identifier of a PG location (a property holding rooms).
    LocationId
);

record_id!(
    /// Identifier of a bookable room.
    RoomId
);

record_id!(
    /// Identifier of a booking.
    BookingId
);

record_id!(
    /// Identifier of a payment claim.
    PaymentId
);
