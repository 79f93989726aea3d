#![forbid(unsafe_code)]

//! Integer grid geometry primitives for the blockboard layout engine.
//!
//! Everything here works in whole grid units on a 1-indexed grid. Occupancy
//! is half-open on each axis: a span starting at `s` with length `n` covers
//! `[s, s + n)`. There are no sub-unit coordinates anywhere in the engine.

pub mod geometry;

pub use geometry::{Cell, GridRect, Span};
