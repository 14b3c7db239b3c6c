pub const APP_NAME: &str = "machbuild";

/// Machines document inside the configuration directory.
pub const MACHINES_FILENAME: &str = "config_machines.json";

/// Compiler settings document inside the configuration directory.
pub const COMPILERS_FILENAME: &str = "config_compilers.json";

/// XML form of the machines document, read when the JSON file is absent.
pub const MACHINES_XML_FILENAME: &str = "config_machines.xml";

/// XML form of the compiler settings document, read when the JSON file is absent.
pub const COMPILERS_XML_FILENAME: &str = "config_compilers.xml";

/// Generated macro file, read by the library's CMake project under this exact name.
pub const MACROS_FILENAME: &str = "PIO_Macros.cmake";

/// Prefix applied to every variable in the macro file.
pub const MACROS_NAMESPACE: &str = "PIO";

/// Overrides hostname-based machine lookup when set.
pub const MACHINE_ENV_VAR: &str = "MACHBUILD_MACHINE";

/// Default configuration directory for the CLI.
pub const CONFIG_DIR_ENV_VAR: &str = "MACHBUILD_CONFIG_DIR";
