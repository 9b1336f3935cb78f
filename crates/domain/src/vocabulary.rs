/// Declares a closed string vocabulary: a fieldless enum whose wire spelling
/// is fixed per variant, with `ALL`, `as_str`, `Display` and a validating
/// `FromStr` that rejects anything outside the set.
macro_rules! closed_vocabulary {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident as $kind:literal {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $wire:literal,
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Every member of the vocabulary, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Persisted spelling.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::errors::Error;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($wire => Ok($name::$variant),)+
                    other => Err($crate::errors::Error::InvalidEnumValue {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

pub(crate) use closed_vocabulary;

closed_vocabulary! {
    /// Whether the order is the first fill with us or a recurring refill.
    pub enum FillType as "fill type" {
        FirstFill => "FirstFill",
        ReFill => "ReFill",
    }
}

impl Default for FillType {
    fn default() -> Self {
        Self::FirstFill
    }
}

closed_vocabulary! {
    /// How the patient pays; gates which regions are relevant.
    pub enum PaymentOption as "payment option" {
        PayDirectly => "PayDirectly",
        PayThroughInsurance => "PayThroughInsurance",
    }
}

closed_vocabulary! {
    /// Where the prescription came from.
    pub enum OriginType as "origin type" {
        Transfer => "Transfer",
        FromDoctorDirect => "FromDoctorDirect",
        FromDoctorPaper => "FromDoctorPaper",
    }
}

closed_vocabulary! {
    pub enum YesNo as "yes/no" {
        Yes => "Yes",
        No => "No",
    }
}

closed_vocabulary! {
    pub enum DrugType as "drug type" {
        Generic => "Generic",
        BrandName => "BrandName",
    }
}

closed_vocabulary! {
    pub enum PaymentProvider as "payment provider" {
        Stripe => "Stripe",
        Braintree => "Braintree",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;

    #[test]
    fn test_wire_spelling_round_trips_through_from_str() {
        for option in PaymentOption::ALL {
            assert_eq!(option.as_str().parse::<PaymentOption>().unwrap(), *option);
        }
        for origin in OriginType::ALL {
            assert_eq!(origin.to_string().parse::<OriginType>().unwrap(), *origin);
        }
    }

    #[test]
    fn test_unknown_value_is_rejected() {
        let err = "payDirectly".parse::<PaymentOption>().unwrap_err();
        match err {
            Error::InvalidEnumValue { kind, value } => {
                assert_eq!(kind, "payment option");
                assert_eq!(value, "payDirectly");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_serde_uses_wire_spelling() {
        let json = serde_json::to_string(&FillType::ReFill).unwrap();
        assert_eq!(json, "\"ReFill\"");
        let parsed: YesNo = serde_json::from_str("\"No\"").unwrap();
        assert_eq!(parsed, YesNo::No);
        assert!(serde_json::from_str::<YesNo>("\"no\"").is_err());
    }
}
