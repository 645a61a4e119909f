pub use self::read_project_document::read_project_document;

mod read_project_document;
