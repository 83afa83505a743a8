pub mod operation;
pub mod work;

pub use operation::OperationNode;
pub use work::Work;
