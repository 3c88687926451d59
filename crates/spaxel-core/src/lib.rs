//! Derived quantities for spatially-resolved emission-line tables: line
//! ratios, excitation classes, electron densities and gas-phase metallicities.

pub mod common;
pub mod domain;
pub mod modules;
pub mod numerics;

pub use common::SpaxelConfig;
pub use domain::{SpaxelError, SpaxelResult, Table};
pub use modules::{TableAssembler, TableEngine};
