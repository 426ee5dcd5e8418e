//! Category and payment-method enumerations.
//!
//! These are stored as kebab-case strings. A value this version does not recognize falls back to
//! the catch-all variant instead of failing the whole document load.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, fallback = $fallback:ident {
            $($variant:ident => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            /// Every variant in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }

            /// Parses the stored representation, mapping unknown values to the catch-all variant.
            pub fn parse(s: &str) -> Self {
                match s {
                    $($text => $name::$variant,)+
                    _ => $name::$fallback,
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$fallback
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok($name::parse(&s))
            }
        }
    };
}

string_enum! {
    /// What kind of work an income entry was earned with.
    IncomeCategory, fallback = OtherIncome {
        Transport => "transport",
        Courier => "courier",
        Relocation => "relocation",
        Storage => "storage",
        Consulting => "consulting",
        Rental => "rental",
        Commission => "commission",
        OtherIncome => "other-income",
    }
}

string_enum! {
    /// Business expense categories.
    ExpenseCategory, fallback = OtherExpense {
        Fuel => "fuel",
        VehicleRepair => "vehicle-repair",
        VehicleInsurance => "vehicle-insurance",
        VehicleLeasing => "vehicle-leasing",
        VehicleTax => "vehicle-tax",
        Tolls => "tolls",
        Parking => "parking",
        Office => "office",
        Telecom => "telecom",
        Insurance => "insurance",
        TaxAdvisor => "tax-advisor",
        Advertising => "advertising",
        Training => "training",
        Tools => "tools",
        Rent => "rent",
        Travel => "travel",
        Hospitality => "hospitality",
        Depreciation => "depreciation",
        OtherExpense => "other-expense",
    }
}

string_enum! {
    PaymentMethod, fallback = Other {
        Cash => "cash",
        BankTransfer => "bank-transfer",
        DebitCard => "debit-card",
        CreditCard => "credit-card",
        Paypal => "paypal",
        Other => "other",
    }
}

macro_rules! impl_from_str {
    ($($name:ident),+) => {
        $(
            impl std::str::FromStr for $name {
                type Err = anyhow::Error;

                /// Strict parse for user input: unknown values are rejected rather than mapped.
                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    $name::ALL
                        .iter()
                        .find(|v| v.as_str() == s)
                        .copied()
                        .ok_or_else(|| {
                            let valid: Vec<&str> = $name::ALL.iter().map(|v| v.as_str()).collect();
                            anyhow::anyhow!("'{s}' is not one of: {}", valid.join(", "))
                        })
                }
            }
        )+
    };
}

impl_from_str!(IncomeCategory, ExpenseCategory, PaymentMethod);
