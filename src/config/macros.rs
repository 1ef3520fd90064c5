/// Configuration macros
///
/// `config_struct!` declares a config struct with its defaults inline. Every
/// field becomes `pub`, the struct gets serde derives with `#[serde(default)]`
/// and a `Default` impl built from the inline values.
///
/// ```ignore
/// config_struct! {
///     pub struct DashboardConfig {
///         refresh_interval_secs: u64 = 10,
///         stale_after_secs: u64 = 60,
///     }
/// }
/// ```
#[macro_export]
macro_rules! config_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_name:ident: $field_type:ty = $default_value:expr
            ),*
            $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field_name: $field_type,
            )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $(
                        $field_name: $default_value,
                    )*
                }
            }
        }
    };
}
