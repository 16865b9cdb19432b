pub mod decision;
pub mod medication;
pub mod screen;
