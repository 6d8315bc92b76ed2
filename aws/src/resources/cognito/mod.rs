pub mod group_model;
pub mod resource_group;

pub use group_model::{ChangedFields, GroupModel};
pub use resource_group::GroupResource;
