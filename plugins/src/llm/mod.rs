pub mod http;

pub use http::HttpChatModel;
