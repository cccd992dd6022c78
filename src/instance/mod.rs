mod context;
mod view;

pub use context::InstanceContext;
pub use view::InstanceView;
