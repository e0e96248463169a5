//! Newtype IDs for images, categories and annotations.
//!
//! Image ids and category ids are both plain integers in a COCO file, and
//! views take sets of each; newtypes keep the two from being swapped.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            #[inline]
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the underlying u64 value.
            #[inline]
            pub fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of an image in the external annotation store.
    ///
    /// This is the id a sample reports back in its target, never the
    /// positional index a view was asked for.
    ImageId
);

define_id!(
    /// Identifier of a category (class).
    CategoryId
);

define_id!(
    /// Identifier of a single raw annotation record.
    AnnotationId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_debug_names_the_kind() {
        assert_eq!(format!("{:?}", ImageId(7)), "ImageId(7)");
        assert_eq!(format!("{:?}", CategoryId(3)), "CategoryId(3)");
        assert_eq!(CategoryId(3).to_string(), "3");
    }

    #[test]
    fn test_id_ordering_and_hash() {
        use std::collections::HashSet;
        assert!(ImageId(1) < ImageId(2));

        let set: HashSet<CategoryId> = [1u64, 2, 1].into_iter().map(CategoryId::from).collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_id_serializes_transparently() {
        let json = serde_json::to_string(&ImageId(42)).unwrap();
        assert_eq!(json, "42");
        let back: CategoryId = serde_json::from_str("5").unwrap();
        assert_eq!(back, CategoryId(5));
    }
}
