pub mod directory_store;
pub mod install;
pub mod memory_store;
pub mod store_trait;

// Re-export stores
pub use directory_store::DirectoryTrustStore;
pub use install::{install, InstallReport, InstalledCertificate, TrustStores};
pub use memory_store::MemoryTrustStore;
pub use store_trait::TrustStore;
