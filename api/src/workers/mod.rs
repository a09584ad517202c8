//! Background workers

pub mod subscriber;
