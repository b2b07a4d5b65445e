//! # Data Module
//!
//! ## Role
//! In-memory representations of the read matrix. This is the core value
//! layer shared by the parser, the DP engine and the reconstruction.
//!
//! ## Design Philosophy
//! - **Zero-cost newtypes:** `Mask` and `Cost` wrap plain integers and
//!   prevent index/arithmetic bugs at compile time with no runtime
//!   overhead.
//! - **Fixed capacity:** a column never holds more than `MAX_COVERAGE`
//!   entries, so the correction mask fits one machine word.
//!
//! ## Sub-modules
//! - `entry`: a single read observation at a column
//! - `column`: an ordered set of entries at one variant position
//! - `fragment`: one input read across its covered columns
//! - `mask`: fixed-width correction bit-mask
//! - `cost`: saturating correction-cost arithmetic

pub mod column;
pub mod cost;
pub mod entry;
pub mod fragment;
pub mod mask;

/// Hard cap on the number of reads covering a single column.
pub const MAX_COVERAGE: usize = 32;

/// Hard cap on the number of corrections applied to a single column.
pub const MAX_CORRECTIONS: usize = 31;
