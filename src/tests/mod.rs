//! Binary-side test suite. Each child module exercises a slice of the
//! application wiring on top of the library crate.

mod engine_tests;
