// Repository Layer
// Access to the package manifests of a workspace on disk

pub mod package_repo;

pub use package_repo::PackageRepository;
