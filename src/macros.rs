//! # Internal Macros
//!
//! Boilerplate reduction for the on-disk header structs.
//!
//! ## zerocopy_accessors!
//!
//! Generates getter and setter methods for zerocopy struct fields that use
//! the little-endian `U32` wrapper type.
//!
//! ### Usage
//!
//! ```ignore
//! use zerocopy::little_endian::U32;
//!
//! #[repr(C)]
//! struct Header {
//!     parent: U32,
//!     num_cells: U32,
//! }
//!
//! impl Header {
//!     zerocopy_accessors! {
//!         parent: u32,
//!         num_cells: u32,
//!     }
//! }
//!
//! // Generates:
//! // pub fn parent(&self) -> u32 { self.parent.get() }
//! // pub fn set_parent(&mut self, val: u32) { self.parent = U32::new(val); }
//! // pub fn num_cells(&self) -> u32 { self.num_cells.get() }
//! // pub fn set_num_cells(&mut self, val: u32) { self.num_cells = U32::new(val); }
//! ```

/// Generates getter and setter methods for zerocopy little-endian fields.
#[macro_export]
macro_rules! zerocopy_accessors {
    (@impl $field:ident, u32) => {
        ::paste::paste! {
            #[inline]
            pub fn $field(&self) -> u32 {
                self.$field.get()
            }

            #[inline]
            pub fn [<set_ $field>](&mut self, val: u32) {
                self.$field = ::zerocopy::little_endian::U32::new(val);
            }
        }
    };
    ($($field:ident: $ty:tt),* $(,)?) => {
        $( $crate::zerocopy_accessors!(@impl $field, $ty); )*
    };
}
