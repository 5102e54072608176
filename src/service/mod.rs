pub mod allocator;
pub mod ledger;
pub mod month_view;
pub mod payroll;
pub mod registry;
