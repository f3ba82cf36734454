//! Naming rules for externally visible identifiers

pub mod interface_name_prefix;
pub mod no_underscores_in_identifiers;
pub mod type_parameter_name_prefix;

pub use interface_name_prefix::{AddInterfacePrefix, InterfaceNamePrefix};
pub use no_underscores_in_identifiers::NoUnderscoresInIdentifiers;
pub use type_parameter_name_prefix::{AddTypeParameterPrefix, TypeParameterNamePrefix};
