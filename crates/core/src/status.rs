//! Status enums mapping to SMALLSERIAL/SMALLINT lookup tables.
//!
//! Each variant's discriminant matches the seed data order (1-based) in the
//! corresponding lookup table, and its name matches the seeded `name` column.

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Resolve a database status ID. Returns `None` for unknown IDs.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some(Self::$variant), )+
                    _ => None,
                }
            }

            /// Seeded lookup-table name (e.g. `"pending"`).
            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $label, )+
                }
            }

            /// Resolve a lookup-table name, as accepted in query filters.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $( $label => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

define_status_enum! {
    /// Loan request lifecycle status.
    LoanRequestStatus {
        Pending = 1 => "pending",
        Approved = 2 => "approved",
        Rejected = 3 => "rejected",
        Canceled = 4 => "canceled",
    }
}

define_status_enum! {
    /// Loan lifecycle status.
    LoanStatus {
        Active = 1 => "active",
        Returned = 2 => "returned",
        LateReturned = 3 => "late_returned",
        Lost = 4 => "lost",
    }
}

define_status_enum! {
    /// Why a penalty was assessed.
    PenaltyReason {
        LateReturn = 1 => "late_return",
        LostItem = 2 => "lost_item",
        DamagedItem = 3 => "damaged_item",
    }
}

define_status_enum! {
    /// Penalty settlement status.
    PaymentStatus {
        Unpaid = 1 => "unpaid",
        Paid = 2 => "paid",
        Waived = 3 => "waived",
    }
}
