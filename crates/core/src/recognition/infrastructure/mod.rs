pub mod http_recognizer;
