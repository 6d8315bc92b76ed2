//! Resource implementations

pub mod cognito;

pub use cognito::GroupResource;

use tfplug::resource::ResourceWithConfigure;

pub fn new_group_resource() -> Box<dyn ResourceWithConfigure> {
    Box::new(GroupResource::new())
}
