pub mod library_repository;

pub use library_repository::LibraryRepositoryImpl;
