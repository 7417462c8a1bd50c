pub mod form;
pub mod models;
pub mod questions;
pub mod records;
