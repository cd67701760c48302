#![macro_use]

macro_rules! impl_table_id {
    ($idtype: ident, $integer_type: ty) => {
        impl $idtype {
            /// NULL value for the type
            pub const NULL: $idtype = Self(-1);

            fn new(value: $integer_type) -> Self {
                Self(value)
            }

            /// The underlying integer.
            pub fn raw(self) -> $integer_type {
                self.0
            }

            /// `true` if the id is `NULL`.
            pub fn is_null(&self) -> bool {
                *self == Self::NULL
            }

            /// Index into a table column.
            ///
            /// Only meaningful for ids that have been checked
            /// against the length of the table.
            /// `NULL` maps to `usize::MAX`.
            #[inline]
            pub fn as_index(self) -> usize {
                if self.0 < 0 {
                    usize::MAX
                } else {
                    self.0 as usize
                }
            }
        }

        impl Default for $idtype {
            fn default() -> Self {
                Self::NULL
            }
        }

        impl From<$integer_type> for $idtype {
            fn from(value: $integer_type) -> Self {
                if value >= 0 {
                    Self(value)
                } else {
                    Self::NULL
                }
            }
        }

        impl std::fmt::Display for $idtype {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<$idtype> for usize {
            type Error = $crate::Error;

            fn try_from(value: $idtype) -> Result<Self, Self::Error> {
                usize::try_from(value.0).map_err(|_| {
                    $crate::Error::ConversionError(format!("could not convert {} to usize", value))
                })
            }
        }

        impl TryFrom<usize> for $idtype {
            type Error = $crate::Error;

            fn try_from(value: usize) -> Result<Self, Self::Error> {
                use num_traits::ToPrimitive;
                match value.to_i32() {
                    Some(x) => Ok($idtype::new(x)),
                    None => Err($crate::Error::ConversionError(format!(
                        "could not convert {} to {}",
                        value,
                        stringify!($idtype)
                    ))),
                }
            }
        }

        impl From<$idtype> for $integer_type {
            fn from(item: $idtype) -> Self {
                item.0
            }
        }

        impl PartialEq<$integer_type> for $idtype {
            fn eq(&self, other: &$integer_type) -> bool {
                self.0 == *other
            }
        }

        impl PartialEq<$idtype> for $integer_type {
            fn eq(&self, other: &$idtype) -> bool {
                *self == other.0
            }
        }

        impl PartialOrd<$integer_type> for $idtype {
            fn partial_cmp(&self, other: &$integer_type) -> Option<std::cmp::Ordering> {
                self.0.partial_cmp(other)
            }
        }

        impl PartialOrd<$idtype> for $integer_type {
            fn partial_cmp(&self, other: &$idtype) -> Option<std::cmp::Ordering> {
                self.partial_cmp(&other.0)
            }
        }
    };
}

macro_rules! impl_f64_newtype_comparisons {
    ($newtype: ident) => {
        impl PartialEq for $newtype {
            fn eq(&self, other: &Self) -> bool {
                self.0.total_cmp(&other.0).is_eq()
            }
        }

        impl Eq for $newtype {}

        impl PartialOrd for $newtype {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $newtype {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                self.0.total_cmp(&other.0)
            }
        }

        impl std::hash::Hash for $newtype {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                self.0.to_bits().hash(state)
            }
        }

        impl PartialEq<f64> for $newtype {
            fn eq(&self, other: &f64) -> bool {
                self.0 == *other
            }
        }

        impl PartialEq<$newtype> for f64 {
            fn eq(&self, other: &$newtype) -> bool {
                *self == other.0
            }
        }

        impl PartialOrd<f64> for $newtype {
            fn partial_cmp(&self, other: &f64) -> Option<std::cmp::Ordering> {
                self.0.partial_cmp(other)
            }
        }

        impl PartialOrd<$newtype> for f64 {
            fn partial_cmp(&self, other: &$newtype) -> Option<std::cmp::Ordering> {
                self.partial_cmp(&other.0)
            }
        }

        // -0.0 and 0.0 must be the same key
        impl From<f64> for $newtype {
            fn from(value: f64) -> Self {
                if value == 0.0 {
                    Self(0.0)
                } else {
                    Self(value)
                }
            }
        }

        impl From<i64> for $newtype {
            fn from(value: i64) -> Self {
                Self(value as f64)
            }
        }

        impl From<i32> for $newtype {
            fn from(value: i32) -> Self {
                Self(f64::from(value))
            }
        }

        impl From<$newtype> for f64 {
            fn from(value: $newtype) -> Self {
                value.0
            }
        }

        impl std::fmt::Display for $newtype {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
                write!(f, "{}", self.0)
            }
        }
    };
}
