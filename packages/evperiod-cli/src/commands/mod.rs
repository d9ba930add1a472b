pub mod batch;
pub mod estimators;
pub mod poles;
pub mod run;
pub mod validate;
