pub mod validator;

pub use validator::{load_yaml_strict, validate_namespacing};
