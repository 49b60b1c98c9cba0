//! Gift Exchange Core Library
//!
//! Core functionality for gift-exchange ("Secret Santa") groups: computing
//! a giver→receiver assignment in which nobody draws themselves or their
//! partner, and keeping each group's members, couples and current
//! assignment set.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![deny(unsafe_code)]

pub mod assignment;
pub mod group;
