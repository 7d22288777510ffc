pub mod charts;
pub mod table;
pub mod visual;
