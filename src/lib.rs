//! Core library for the dojo-tools command line application.
//!
//! The library keeps the gym roster (students and their tuition payments),
//! derives each student's payment status and rolls the records up into the
//! dashboard metrics. IO adapters live under [`dojo::tools::io`], the record
//! types inside [`dojo::tools::model`], status derivation in
//! [`dojo::tools::status`], the rollups in [`dojo::tools::summary`] and the
//! load/register/export flows under [`dojo::tools::dashboard`].

pub mod dojo;

pub use dojo::tools::{
    Result, ToolError, config, dashboard, error, io, model, status, store, summary,
};
