//! Helper macro generating port error enums with snake-case constructors.
//!
//! ```ignore
//! define_port_error! {
//!     pub enum CacheError {
//!         Backend { message: String } => "cache backend failure: {message}",
//!     }
//! }
//! let err = CacheError::backend("timeout");
//! ```
//!
//! Constructor parameters accept `impl Into<FieldType>`, so string fields
//! take `&str` directly.

macro_rules! define_port_error {
    (@ctor $name:ident $variant:ident) => {
        ::paste::paste! {
            #[doc = "Construct [`" $name "::" $variant "`]."]
            #[must_use]
            pub const fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $name:ident $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        ::paste::paste! {
            #[doc = "Construct [`" $name "::" $variant "`]."]
            pub fn [<$variant:snake>]($($field: impl Into<$ty>),*) -> Self {
                Self::$variant { $($field: $field.into()),* }
            }
        }
    };

    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $name $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Generated constructors and messages.
    use rstest::rstest;

    define_port_error! {
        pub enum SampleError {
            Offline => "sample offline",
            Timeout { message: String } => "sample timed out: {message}",
            Partial { message: String, attempts: u32 } => "sample partial: {message} after {attempts}",
        }
    }

    #[rstest]
    fn unit_variants_get_const_constructors() {
        const OFFLINE: SampleError = SampleError::offline();
        assert_eq!(OFFLINE.to_string(), "sample offline");
    }

    #[rstest]
    fn string_fields_accept_str() {
        assert_eq!(
            SampleError::timeout("5s").to_string(),
            "sample timed out: 5s"
        );
    }

    #[rstest]
    fn mixed_fields_keep_their_types() {
        let err = SampleError::partial("redis", 3_u32);
        assert_eq!(err, SampleError::Partial { message: "redis".to_owned(), attempts: 3 });
        assert_eq!(err.to_string(), "sample partial: redis after 3");
    }
}
