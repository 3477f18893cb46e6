//! # Sheet plans: table-driven replay.
//!
//! A [`Sheet`] is a header plus rows of `(time, cell_1 .. cell_n)`. Binding it
//! yields a [`Table`], which applies one row at a time through the column
//! setters. Two drivers hold a table:
//!
//! ```text
//!                 ┌─► SheetPlan      rows at t0 + at/rate, once, then finish
//!  Sheet ─bind─► Table
//!                 └─► GaitCyclePlan  rows as cycle knots (at ∈ [0,1]), forever
//! ```
//!
//! Validation happens entirely when a table is bound; replay never fails on
//! the table's shape.

mod gait;
mod replay;
mod table;

pub use gait::{GaitCyclePlan, SheetKnots};
pub use replay::{SheetPlan, SheetReplay};
pub use table::{Row, Sheet, Table, TIME_HEADING};
