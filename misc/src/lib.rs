pub use derive_more;
pub use float_cmp::ApproxEq;
pub use itertools::*;
pub use parking_lot;
pub use rand::{self, prelude::*};
pub use smallvec::{self, *};
pub use thiserror::{self, Error};

pub use logging::{self, prelude::*, slog_kv_debug, slog_value_debug};

// misc imports that annoyingly get resolved to other pub exports of std/core
// https://github.com/intellij-rust/intellij-rust/issues/5654
pub use std::{
    error::Error,
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    hash::Hash,
    iter::{empty, once},
    marker::PhantomData,
};

pub type BoxedResult<T> = Result<T, Box<dyn Error>>;

pub use glam::{self, vec2, vec3, Vec2, Vec3};

#[macro_export]
macro_rules! some_or_continue {
    ($opt:expr) => {
        match $opt {
            Some(v) => v,
            None => continue,
        }
    };
}
