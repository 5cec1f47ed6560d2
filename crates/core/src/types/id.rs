//! Newtype ids for catalog items, users and persisted sales.
//!
//! Every id the backend hands out is an `i32` key. Wrapping each one in its
//! own type keeps an item id from ever being used where a user id belongs.

/// Define an `i32`-backed id newtype.
///
/// The generated type is `Copy`, hashable and ordered, serializes as a bare
/// integer, and (with the `postgres` feature) maps onto an `INTEGER` column.
///
/// # Example
///
/// ```rust
/// # use techshack_core::define_id;
/// define_id!(ShiftId);
///
/// let shift = ShiftId::new(7);
/// assert_eq!(shift.as_i32(), 7);
/// assert_eq!(shift.to_string(), "7");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[cfg_attr(feature = "postgres", derive(::sqlx::Type), sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wrap a raw key.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// The raw key.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(ItemId);
define_id!(UserId);
define_id!(SaleNo);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_serializes_as_bare_integer() {
        let json = serde_json::to_string(&ItemId::new(42)).expect("serialize");
        assert_eq!(json, "42");

        let id: UserId = serde_json::from_str("17").expect("deserialize");
        assert_eq!(id, UserId::new(17));
    }

    #[test]
    fn test_id_ordering_follows_raw_key() {
        assert!(SaleNo::new(1000) < SaleNo::new(1001));
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn test_id_maps_onto_integer_column() {
        use sqlx::{Postgres, Type};

        let int4 = <i32 as Type<Postgres>>::type_info();
        assert!(<SaleNo as Type<Postgres>>::compatible(&int4));
        assert_eq!(<UserId as Type<Postgres>>::type_info(), int4);
    }
}
