#[cfg(feature = "binary")]
mod init;

#[cfg(feature = "binary")]
pub use init::{LogError, Logger, LoggerBuilder};

pub use tests::for_tests;

pub mod prelude {
    pub use slog_scope::{debug, error, info, trace, warn};

    pub use slog;
}

#[macro_export]
macro_rules! slog_value_debug {
    ($ty:ty) => {
        impl $crate::prelude::slog::Value for $ty {
            fn serialize(
                &self,
                _: &$crate::prelude::slog::Record,
                key: $crate::prelude::slog::Key,
                serializer: &mut dyn $crate::prelude::slog::Serializer,
            ) -> $crate::prelude::slog::Result<()> {
                serializer.emit_arguments(key, &format_args!("{:?}", self))
            }
        }
    };
}

#[macro_export]
macro_rules! slog_kv_debug {
    ($ty:ty, $key:expr) => {
        impl $crate::prelude::slog::KV for $ty {
            fn serialize(
                &self,
                _: &$crate::prelude::slog::Record,
                serializer: &mut dyn $crate::prelude::slog::Serializer,
            ) -> $crate::prelude::slog::Result<()> {
                serializer.emit_arguments($key, &format_args!("{:?}", self))
            }
        }
    };
}
