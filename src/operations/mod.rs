mod edit_operation;

pub use edit_operation::EditOperation;
