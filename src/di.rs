//! Dependency injection infrastructure.
//!
//! Services and repositories are built from the application [`Context`]
//! through the `FromRef` trait: every context field is extractable, and a
//! service implements `FromRef<Context>` by extracting its own fields.
//!
//! # Example
//!
//! ```ignore
//! use hostsync::di::FromRef;
//!
//! let ctx = Context::from(config).await?;
//! let service = SyncService::from_ref(&ctx);
//! ```
//!
//! [`Context`]: crate::context::Context

/// Trait for extracting a value from a reference to another type.
pub trait FromRef<T> {
    fn from_ref(input: &T) -> Self;
}

/// Blanket implementation: any Clone type can be extracted from itself.
impl<T: Clone> FromRef<T> for T {
    fn from_ref(input: &T) -> Self {
        input.clone()
    }
}

/// Makes each listed field of a context struct extractable via `FromRef`.
///
/// ```ignore
/// provide_fields!(Context {
///     graph: AppGraph,
///     config: Arc<Config>,
/// });
/// ```
#[macro_export]
macro_rules! provide_fields {
    ($ctx:ty { $($field:ident: $ty:ty),+ $(,)? }) => {
        $(
            impl $crate::di::FromRef<$ctx> for $ty {
                fn from_ref(ctx: &$ctx) -> Self {
                    ctx.$field.clone()
                }
            }
        )+
    };
}
