pub mod category;
pub mod context;
pub mod task;
