pub mod arm;
pub mod decision;
pub mod error;
pub mod evaluator;
pub mod metric;
pub mod observation;
pub mod posterior;
pub mod records;
