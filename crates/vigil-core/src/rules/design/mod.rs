//! Design rules for externally visible API shape

pub mod abstract_type_public_constructor;
pub mod avoid_empty_interfaces;
pub mod avoid_excessive_type_parameters;
pub mod avoid_out_parameters;
pub mod no_static_members_on_generic_types;

pub use abstract_type_public_constructor::{AbstractTypePublicConstructor, MakeConstructorProtected};
pub use avoid_empty_interfaces::AvoidEmptyInterfaces;
pub use avoid_excessive_type_parameters::AvoidExcessiveTypeParameters;
pub use avoid_out_parameters::AvoidOutParameters;
pub use no_static_members_on_generic_types::NoStaticMembersOnGenericTypes;
