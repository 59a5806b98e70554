#[macro_export]
macro_rules! agg_mod {
    [ $( $name:ident $(,)? )+ ] => {
        $(
            pub mod $name;
        )+
    };
}

/// Maps enum variants to their database/wire strings in one place.
/// Emits `as_str`, `Display` and `FromStr` so the same text is used for
/// column binds, JSON payloads and parsing rows back.
#[macro_export]
macro_rules! impl_str_enum {
    ($enum_name:ident, $( $variant:ident => $text:literal ),+ $(,)?) => {
        impl $enum_name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $enum_name::$variant => $text, )+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($enum_name::$variant), )+
                    _ => Err(anyhow::anyhow!("Invalid variant: {}", s)),
                }
            }
        }
    };
}
