/// Human readable description attached to the extension module.
pub const MODULE_DOC: &'static str = "estou-a-ver code extension module";
