//! Pure computation for lot accounting: allocation and basis recomputation.

pub mod allocator;
pub mod basis;

pub use allocator::{Allocation, AllocationError, Allocator};
pub use basis::{aggregate_cost_basis, per_share_basis};
