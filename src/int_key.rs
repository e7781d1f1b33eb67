//! Fixed-width integer keys.
//!
//! A key is an opaque handle reinterpreted as an unsigned integer. The table
//! never looks behind it: equality is integer equality and the home slot is
//! `key mod capacity`.

use core::fmt::Debug;

/// An unsigned fixed-width integer usable as a table key.
pub trait IntKey: Copy + Eq + Debug {
    /// Home slot of this key in a table of `capacity` slots.
    ///
    /// `capacity` is never zero.
    fn home_slot(self, capacity: usize) -> usize;
}

macro_rules! impl_int_key_u64 {
    ($($t:ty),*) => {
        $(
            impl IntKey for $t {
                #[inline]
                fn home_slot(self, capacity: usize) -> usize {
                    (self as u64 % capacity as u64) as usize
                }
            }
        )*
    };
}

impl_int_key_u64!(u8, u16, u32, u64, usize);

impl IntKey for u128 {
    #[inline]
    fn home_slot(self, capacity: usize) -> usize {
        (self % capacity as u128) as usize
    }
}
