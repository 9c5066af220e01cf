pub mod config;
pub mod dataset;
pub mod error;
pub mod ode;
pub mod plotting;
pub mod sample_table;
pub mod type_lib;
