/// Width of an opaque runtime-object handle (element, type, allocation,
/// sampler, script) stored inside an allocation.
pub const HANDLE_SIZE_BYTES: usize = 8;
/// Largest vector width an element may carry.
pub const MAX_VECTOR_SIZE: u8 = 4;
/// Upper bound on the byte size of an element or a type, so every
/// allocation fits in one host buffer.
pub const MAX_SIZE_BYTES: usize = isize::MAX as usize;
/// File extensions accepted by `load_config`, by format.
pub const YAML_EXTENSIONS: [&str; 2] = ["yaml", "yml"];
pub const JSON_EXTENSIONS: [&str; 1] = ["json"];
pub const TOML_EXTENSIONS: [&str; 1] = ["toml"];
/// Graph name used in log lines for graphs that were never named.
pub const UNNAMED_GRAPH: &str = "<unnamed>";
