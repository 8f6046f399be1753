//! Numeric building blocks shared by the analyzer and the modeler.

pub mod ols;
