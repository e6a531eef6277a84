mod flaky_provisioner;
mod module_repository;

pub use flaky_provisioner::FlakyProvisioner;
pub use module_repository::ModuleRepository;
