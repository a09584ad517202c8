//! Environment contract between the dispatcher and the build worker.
//!
//! The dispatcher is the sole owner of store and bus credentials; it injects
//! them into the worker's environment through the launcher. The worker reads
//! exactly these variables and sources nothing itself.

/// Deployment identity assigned by the dispatcher
pub const DEPLOYMENT_ID: &str = "DEPLOYMENT_ID";

/// Repository to clone and build
pub const GIT_REPO_URL: &str = "GIT_REPO_URL";

/// Artifact store base URL
pub const STORE_BASE_URL: &str = "STORE_BASE_URL";

/// Optional bearer token for the artifact store
pub const STORE_ACCESS_TOKEN: &str = "STORE_ACCESS_TOKEN";

/// Message bus broker host
pub const BUS_HOST: &str = "BUS_HOST";

/// Message bus broker port
pub const BUS_PORT: &str = "BUS_PORT";

/// Optional bus username
pub const BUS_USERNAME: &str = "BUS_USERNAME";

/// Optional bus password
pub const BUS_PASSWORD: &str = "BUS_PASSWORD";

/// "true" to connect to the bus over TLS
pub const BUS_TLS: &str = "BUS_TLS";

/// Optional path to a PEM CA certificate for bus TLS verification
pub const BUS_CA_CERT: &str = "BUS_CA_CERT";

/// Override for the project build command
pub const BUILD_COMMAND: &str = "BUILD_COMMAND";

/// Override for the build output directory, relative to the checkout
pub const OUTPUT_DIR: &str = "OUTPUT_DIR";
