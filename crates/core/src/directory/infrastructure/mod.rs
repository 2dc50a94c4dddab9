pub mod http_directory;
