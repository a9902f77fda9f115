/// Macro to create a strongly-typed newtype wrapper around `String`.
///
/// This subsystem addresses volumes, groups and subvolumes by name rather
/// than by numeric id, so the generated type wraps `String`. It implements:
/// - `Deref` to `str`, `AsRef<str>`
/// - `From<String>`, `From<&str>`, `Into<String>`
/// - `Display`, `Debug`, `Clone`
/// - `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `Default` (the empty name)
/// - `serde::Serialize` and `serde::Deserialize` (transparent)
#[macro_export]
macro_rules! name_type {
    ($name:ident) => {
        #[derive(
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            Default,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl ::std::ops::Deref for $name {
            type Target = str;

            #[inline]
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.0)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            #[inline]
            fn from(val: String) -> Self {
                Self(val)
            }
        }

        impl From<&str> for $name {
            #[inline]
            fn from(val: &str) -> Self {
                Self(val.to_string())
            }
        }

        impl From<$name> for String {
            #[inline]
            fn from(val: $name) -> Self {
                val.0
            }
        }
    };
}
