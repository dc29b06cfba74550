pub mod decision;
pub mod observation;
