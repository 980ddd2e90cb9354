//! PlanBuilder and IP allocator (spec.md §4.2, §4.4).

pub mod builder;
pub mod ip_allocator;
mod scaffold_plan;

pub use builder::build;
pub use scaffold_plan::{PlannedVm, ScaffoldPlan};
